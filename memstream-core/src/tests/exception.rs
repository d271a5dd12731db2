use std::string::String;
use std::vec;
use std::vec::Vec;

use crate::{
    ErrorPolicy, Exception, ExceptionKind, IStream, OStream, StreamError, StreamWrite, format,
    memory,
};

fn write_to_vec(e: &Exception) -> Vec<u8> {
    let mut buf = vec![0u8; e.stream_size()];
    let mut os = OStream::with_policy(&mut buf, ErrorPolicy::Report);
    os.put(e).unwrap();
    assert_eq!(os.pos(), e.stream_size());
    drop(os);
    buf
}

fn read_back(buf: &[u8]) -> Exception {
    let mut is = IStream::with_policy(buf, ErrorPolicy::Report);
    let e: Exception = is.get().unwrap();
    assert_eq!(is.remaining(), 0);
    e
}

fn all_kinds() -> Vec<Exception> {
    vec![
        Exception::new(),
        Exception::bad_cast(),
        Exception::bad_typeid(),
        Exception::bad_alloc(1 << 20),
    ]
}

#[test]
fn format_tags() {
    assert_eq!(Exception::new().format(), format::EXCEPTION);
    assert_eq!(Exception::bad_alloc(1).format(), format::BAD_ALLOC);
    assert_eq!(Exception::bad_cast().format(), format::BAD_CAST);
    assert_eq!(Exception::bad_typeid().format(), format::BAD_TYPEID);
    assert_eq!(Exception::default().kind(), &ExceptionKind::Generic);
}

#[test]
fn every_kind_round_trips() {
    for e in all_kinds() {
        let back = read_back(&write_to_vec(&e));
        assert_eq!(back.kind(), e.kind());
        assert_eq!(back.backtrace().addresses(), e.backtrace().addresses());
        assert_eq!(back, e);
    }
}

#[test]
fn stream_size_tracks_symbol_resolution() {
    for e in all_kinds() {
        let before = e.stream_size();
        e.backtrace().symbols();
        assert!(e.stream_size() > before);

        let buf = write_to_vec(&e);
        let back = read_back(&buf);
        assert!(!back.backtrace().is_resolved());
        assert_eq!(back.kind(), e.kind());
    }
}

#[test]
fn header_carries_tag_and_size() {
    let e = Exception::bad_alloc(4096);
    let buf = write_to_vec(&e);

    assert_eq!(&buf[..4], &format::BAD_ALLOC.to_ne_bytes());
    assert_eq!(&buf[4..8], &(e.stream_size() as u32).to_ne_bytes());
    assert_eq!(&buf[8..16], &4096u64.to_ne_bytes());
}

#[test]
fn unknown_tag_is_preserved() {
    let mut buf = [0u8; 12];
    buf[..4].copy_from_slice(&99u32.to_ne_bytes());
    buf[4..8].copy_from_slice(&12u32.to_ne_bytes());
    buf[8..].copy_from_slice(&[1, 2, 3, 4]);

    let e = read_back(&buf);
    assert_eq!(
        e.kind(),
        &ExceptionKind::Unknown {
            format: 99,
            payload: vec![1, 2, 3, 4],
        }
    );
    assert_eq!(e.format(), 99);
    assert!(e.backtrace().is_empty());
    assert_eq!(e.to_string(), "unknown error (format 99)");

    assert_eq!(write_to_vec(&e), buf);
}

#[test]
#[should_panic(expected = "belongs to a known exception kind")]
fn unknown_kind_rejects_known_tag() {
    let _ = Exception::from_kind(ExceptionKind::Unknown {
        format: format::BAD_CAST,
        payload: vec![],
    });
}

#[test]
fn unknown_kind_accepts_new_tag() {
    assert!(format::is_known(format::BAD_TYPEID));
    assert!(!format::is_known(4));

    let e = Exception::from_kind(ExceptionKind::Unknown {
        format: 4,
        payload: vec![9; 4],
    });
    assert_eq!(read_back(&write_to_vec(&e)).kind(), e.kind());
}

#[test]
fn mismatched_size_is_invalid() {
    let e = Exception::bad_cast();
    let mut buf = write_to_vec(&e);
    let bogus = e.stream_size() as u32 + 8;
    buf[4..8].copy_from_slice(&bogus.to_ne_bytes());

    let mut is = IStream::with_policy(&buf, ErrorPolicy::Report);
    let err = is.get::<Exception>().unwrap_err();
    assert!(matches!(
        err,
        StreamError::InvalidData {
            message: "exception size does not match its contents",
            ..
        }
    ));
}

#[test]
fn size_below_header_is_invalid() {
    let mut buf = [0u8; 16];
    buf[4..8].copy_from_slice(&4u32.to_ne_bytes());
    let mut is = IStream::with_policy(&buf, ErrorPolicy::Report);

    let err = is.get::<Exception>().unwrap_err();
    assert!(matches!(err, StreamError::InvalidData { .. }));
}

#[test]
fn small_region_overruns() {
    let e = Exception::bad_alloc(8);
    let mut buf = vec![0u8; e.stream_size() - 1];
    let mut os = OStream::with_policy(&mut buf, ErrorPolicy::Report);

    let err = os.put(&e).unwrap_err();
    assert!(matches!(err, StreamError::Overrun { .. }));
}

#[test]
fn info_default_messages() {
    let mut msg = String::new();
    Exception::bad_alloc(4096).info(&mut msg, None);
    assert_eq!(msg, "failed to allocate 4096 bytes");

    assert_eq!(Exception::new().to_string(), "error");
    assert_eq!(Exception::bad_cast().to_string(), "bad cast");
    assert_eq!(Exception::bad_typeid().to_string(), "bad typeid");
}

#[test]
fn info_templates() {
    let e = Exception::bad_alloc(12);
    let mut msg = String::from("> ");
    e.info(&mut msg, Some("{what}: {bytes} bytes ({format}) {other}"));
    assert_eq!(msg, "> memory allocation failed: 12 bytes (1) {other}");

    let mut msg = String::new();
    Exception::bad_cast().info(&mut msg, Some("{what} needs {bytes}"));
    assert_eq!(msg, "bad cast needs {bytes}");

    let mut msg = String::new();
    Exception::new().info(&mut msg, Some("oops {what"));
    assert_eq!(msg, "oops {what");
}

#[test]
fn alternate_display_appends_backtrace() {
    let e = Exception::bad_cast();
    let text = std::format!("{e:#}");

    assert!(text.starts_with("bad cast\n"));
    assert_eq!(text.lines().count(), 1 + e.backtrace().len());
    assert!(e.backtrace().is_resolved());
}

#[test]
fn usable_as_std_error() {
    let e: std::boxed::Box<dyn std::error::Error> = std::boxed::Box::new(Exception::bad_typeid());
    assert_eq!(e.to_string(), "bad typeid");
}

#[test]
fn try_alloc_reports_through_hook() {
    let mut calls = 0;
    let err = memory::try_alloc(usize::MAX, |e| {
        calls += 1;
        assert_eq!(e.format(), format::BAD_ALLOC);
    })
    .unwrap_err();

    assert_eq!(calls, 1);
    assert_eq!(
        err.kind(),
        &ExceptionKind::BadAlloc {
            bytes_requested: usize::MAX as u64,
        }
    );
    assert_eq!(memory::try_alloc(16, |_| panic!("allocation failed")).unwrap(), [0; 16]);
}
