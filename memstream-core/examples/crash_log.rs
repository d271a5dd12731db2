//! Crash log example: record exceptions into a preallocated region, then
//! decode and print them as a post-mortem reader would.
//!
//! The region is reserved up front, so recording an exception never
//! allocates. Symbols are resolved only when the log is printed.
//!
//! Run with: cargo run --example crash_log

use memstream_core::{
    ErrorPolicy, Exception, ExceptionKind, IStream, OStream, StreamError, StreamWrite, memory,
};

const LOG_CAPACITY: usize = 16 * 1024;

/// Appends exceptions to a fixed region, dropping them once it is full.
struct CrashLog<'a> {
    os: OStream<'a>,
    records: u32,
    dropped: u32,
}

impl<'a> CrashLog<'a> {
    fn new(region: &'a mut [u8]) -> Self {
        Self {
            os: OStream::with_policy(region, ErrorPolicy::Report),
            records: 0,
            dropped: 0,
        }
    }

    fn record(&mut self, e: &Exception) -> Result<(), StreamError> {
        let start = self.os.pos();
        match self.os.align(<Exception as StreamWrite>::ALIGN).and_then(|os| os.put(e)) {
            Ok(_) => {
                self.records += 1;
                Ok(())
            }
            Err(err) => {
                // Roll back a partial record so the log stays decodable.
                self.os.seek(start)?;
                self.dropped += 1;
                Err(err)
            }
        }
    }
}

#[inline(never)]
fn parse_header(input: &[u8]) -> Result<u32, Exception> {
    if input.len() < 4 {
        return Err(Exception::bad_cast());
    }
    Ok(u32::from_le_bytes([input[0], input[1], input[2], input[3]]))
}

fn main() {
    let mut region = match memory::try_alloc(LOG_CAPACITY, |e| eprintln!("crash log unavailable: {e}")) {
        Ok(region) => region,
        Err(_) => return,
    };

    let mut log = CrashLog::new(&mut region);
    if let Err(e) = parse_header(b"ab") {
        log.record(&e).ok();
    }
    if let Err(e) = memory::try_alloc(usize::MAX, |_| {}) {
        log.record(&e).ok();
    }
    log.record(&Exception::bad_typeid()).ok();

    let (records, dropped, used) = (log.records, log.dropped, log.os.pos());
    drop(log);

    println!("Crash Log");
    println!("=========");
    println!("Records: {records} ({dropped} dropped), {used} of {LOG_CAPACITY} bytes used");
    println!();

    let mut is = IStream::with_policy(&region[..used], ErrorPolicy::Report);
    for index in 0..records {
        let e = match is
            .align(<Exception as StreamWrite>::ALIGN)
            .and_then(|is| is.get::<Exception>())
        {
            Ok(e) => e,
            Err(err) => {
                eprintln!("log is corrupt at record {index}: {err}");
                return;
            }
        };
        if let ExceptionKind::BadAlloc { bytes_requested } = e.kind() {
            println!("[{index}] allocation of {bytes_requested} bytes failed");
        }
        println!("[{index}] {e:#}");
    }
}
