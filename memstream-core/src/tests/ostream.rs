use std::string::ToString;
use std::vec;

use crate::{ErrorPolicy, OStream, SeekDir, StreamError};

#[test]
fn write_advances_cursor() {
    let mut buf = [0u8; 8];
    let mut os = OStream::with_policy(&mut buf, ErrorPolicy::Report);

    os.write(b"abc").unwrap();
    assert_eq!(os.pos(), 3);
    assert_eq!(os.remaining(), 5);
    assert_eq!(os.written(), b"abc");
    assert_eq!(os.stream_size(), 3);
}

#[test]
fn typed_writes_use_native_layout() {
    let mut buf = [0u8; 16];
    let mut os = OStream::with_policy(&mut buf, ErrorPolicy::Report);

    os.put(&0x1234_5678u32).unwrap().put(&0xABCDu16).unwrap();
    assert_eq!(os.pos(), 6);
    drop(os);

    assert_eq!(&buf[..4], &0x1234_5678u32.to_ne_bytes());
    assert_eq!(&buf[4..6], &0xABCDu16.to_ne_bytes());
}

#[test]
fn overrun_reports_requested_and_remaining() {
    let mut buf = [0xAAu8; 16];
    let mut os = OStream::with_policy(&mut buf[..4], ErrorPolicy::Report);

    let err = os.iwrite(&0u64).unwrap_err();
    assert!(matches!(err, StreamError::Overrun { op: "write", .. }));
    assert_eq!(err.requested(), Some(8));
    assert_eq!(err.remaining(), Some(4));
    assert_eq!(err.position(), 0);
    assert_eq!(os.pos(), 0);
    drop(os);

    // Nothing inside or past the region was touched.
    assert!(buf.iter().all(|&b| b == 0xAA));
}

#[test]
fn overrun_near_end_of_region() {
    let mut buf = [0u8; 16];
    let mut os = OStream::with_policy(&mut buf, ErrorPolicy::Report);
    os.seek(13).unwrap();

    let err = os.write(&[1u8; 8]).unwrap_err();
    assert_eq!(
        err,
        StreamError::Overrun {
            op: "write",
            type_name: "binary data",
            requested: 8,
            position: 13,
            remaining: 3,
        }
    );
    assert!(err.to_string().contains("requested 8 bytes at offset 13, only 3 remaining"));
}

#[test]
#[should_panic(expected = "misaligned write of u64 at offset 4")]
fn misaligned_write_panics_under_report_policy() {
    let mut buf = [0u8; 16];
    let mut os = OStream::with_policy(&mut buf, ErrorPolicy::Report);

    os.iwrite(&7u32).unwrap();
    assert_eq!(os.pos(), 4);
    let _ = os.iwrite(&9u64);
}

#[test]
#[should_panic(expected = "buffer overrun")]
fn fatal_policy_panics_on_overrun() {
    let mut buf = [0u8; 2];
    let mut os = OStream::with_policy(&mut buf, ErrorPolicy::Fatal);
    let _ = os.write(b"abc");
}

#[test]
fn align_zero_fills_padding() {
    let mut buf = [0xFFu8; 8];
    let mut os = OStream::with_policy(&mut buf, ErrorPolicy::Report);

    os.put(&1u8).unwrap();
    assert_eq!(os.align_size(4), 3);
    os.align(4).unwrap();
    assert_eq!(os.pos(), 4);
    assert!(os.aligned(4));

    // Already aligned: no padding.
    os.align(4).unwrap();
    assert_eq!(os.pos(), 4);
    drop(os);

    assert_eq!(buf, [1, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF]);
}

#[test]
fn align_past_end_is_an_overrun() {
    let mut buf = [0u8; 6];
    let mut os = OStream::with_policy(&mut buf, ErrorPolicy::Report);
    os.seek(5).unwrap();

    let err = os.align(8).unwrap_err();
    assert!(matches!(err, StreamError::Overrun { op: "align", .. }));
    assert_eq!(err.requested(), Some(3));
    assert_eq!(err.remaining(), Some(1));
}

#[test]
#[should_panic(expected = "not a power of two")]
fn align_rejects_odd_grain() {
    let mut buf = [0u8; 8];
    let mut os = OStream::new(&mut buf);
    let _ = os.align(3);
}

#[test]
fn seek_skip_and_seek_by() {
    let mut buf = [0u8; 10];
    let mut os = OStream::with_policy(&mut buf, ErrorPolicy::Report);

    os.seek(10).unwrap();
    assert_eq!(os.remaining(), 0);

    let err = os.seek(11).unwrap_err();
    assert!(matches!(err, StreamError::Overrun { op: "seek", requested: 11, .. }));
    assert_eq!(os.pos(), 10);

    os.seek_by(2, SeekDir::End).unwrap();
    assert_eq!(os.pos(), 8);
    os.seek_by(-3, SeekDir::Current).unwrap();
    assert_eq!(os.pos(), 5);
    os.skip(4).unwrap();
    assert_eq!(os.pos(), 9);
    os.seek_by(1, SeekDir::Begin).unwrap();
    assert_eq!(os.pos(), 1);

    assert!(os.seek_by(-1, SeekDir::Begin).is_err());
    assert!(os.seek_by(-2, SeekDir::Current).is_err());
    assert!(os.skip(10).is_err());
}

#[test]
fn relink_resets_cursor() {
    let mut first = [0u8; 8];
    let mut second = [0u8; 4];
    let mut os = OStream::with_policy(&mut first, ErrorPolicy::Report);
    os.write(b"12345").unwrap();

    os.relink(&mut second);
    assert_eq!(os.pos(), 0);
    assert_eq!(os.len(), 4);
    os.write(b"ab").unwrap();

    let region = os.unlink().unwrap();
    assert_eq!(region, b"ab\0\0");
    assert!(!os.is_linked());
    assert_eq!(os.len(), 0);
    assert_eq!(os.written(), b"");
}

#[test]
#[should_panic(expected = "detached output stream")]
fn detached_stream_panics() {
    let mut os = OStream::detached(ErrorPolicy::Report);
    let _ = os.write(b"x");
}

#[test]
fn write_strz_appends_terminator() {
    let mut buf = [0xFFu8; 8];
    let mut os = OStream::with_policy(&mut buf, ErrorPolicy::Report);

    os.write_strz("hi").unwrap();
    assert_eq!(os.written(), b"hi\0");

    let err = os.write_strz("hello").unwrap_err();
    assert_eq!(err.requested(), Some(6));
    assert_eq!(err.remaining(), Some(5));
}

#[test]
fn write_strz_rejects_interior_nul() {
    let mut buf = [0xFFu8; 8];
    let mut os = OStream::with_policy(&mut buf, ErrorPolicy::Report);
    os.write(b"x").unwrap();

    let err = os.write_strz("a\0b").unwrap_err();
    assert_eq!(
        err,
        StreamError::InvalidData {
            message: "string contains an interior NUL",
            position: 2,
        }
    );
    assert_eq!(os.pos(), 1);
    drop(os);

    assert_eq!(buf, [b'x', 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
}

#[test]
#[should_panic(expected = "interior NUL")]
fn fatal_policy_panics_on_interior_nul() {
    let mut buf = [0u8; 8];
    let mut os = OStream::with_policy(&mut buf, ErrorPolicy::Fatal);
    let _ = os.put("a\0");
}

#[test]
fn insert_opens_gap_in_written_data() {
    let mut buf = [0u8; 10];
    let mut os = OStream::with_policy(&mut buf, ErrorPolicy::Report);
    os.write(b"abcdef").unwrap();

    os.insert(2, 2).unwrap();
    assert_eq!(os.pos(), 8);
    assert_eq!(os.written(), b"ab\0\0cdef");

    let err = os.insert(0, 3).unwrap_err();
    assert!(matches!(err, StreamError::Overrun { op: "insert", .. }));
    assert_eq!(os.written(), b"ab\0\0cdef");
}

#[test]
fn insert_past_cursor_leaves_cursor() {
    let mut buf = [0u8; 10];
    let mut os = OStream::with_policy(&mut buf, ErrorPolicy::Report);
    os.write(b"ab").unwrap();

    os.insert(5, 2).unwrap();
    assert_eq!(os.pos(), 2);

    let err = os.insert(11, 1).unwrap_err();
    assert_eq!(
        err,
        StreamError::Overrun {
            op: "insert",
            type_name: "gap",
            requested: 11,
            position: 2,
            remaining: 10,
        }
    );
    assert_eq!(os.pos(), 2);
}

#[test]
fn erase_closes_gap() {
    let mut buf = [0u8; 8];
    let mut os = OStream::with_policy(&mut buf, ErrorPolicy::Report);
    os.write(b"abcdef").unwrap();

    os.erase(1, 2).unwrap();
    assert_eq!(os.pos(), 4);
    assert_eq!(os.written(), b"adef");

    // Cursor inside the erased range snaps back to its start.
    os.seek(3).unwrap();
    os.erase(2, 4).unwrap();
    assert_eq!(os.pos(), 2);

    assert_eq!(os.written(), b"ad");

    assert!(os.erase(7, 2).is_err());
}

#[test]
fn put_chains_mixed_values() {
    let mut buf = vec![0u8; 32];
    let mut os = OStream::with_policy(&mut buf, ErrorPolicy::Report);

    os.put(&1u64)
        .unwrap()
        .put(&2u32)
        .unwrap()
        .put(&true)
        .unwrap()
        .put("name")
        .unwrap();
    assert_eq!(os.pos(), 8 + 4 + 1 + 5);
}
