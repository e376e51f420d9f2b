use anyhow::Result;
use linesink::{Encoding, LineSinkBuilder, SinkError, SinkState};
use std::fs;
use std::io;

#[test]
fn hundred_items_in_ten_batches() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let dest = tmp.path().join("items.txt");

    let mut sink = LineSinkBuilder::new().from_display(&dest);
    let items: Vec<u32> = (0..100).collect();
    for batch in items.chunks(10) {
        sink.write(batch)?;
    }
    sink.close()?;

    assert_eq!(sink.lines_written(), 100);
    assert_eq!(sink.state(), SinkState::Committed);

    let content = fs::read_to_string(&dest)?;
    let lines: Vec<&str> = content.lines().collect();
    let expected: Vec<String> = (0..100).map(|n| n.to_string()).collect();
    assert_eq!(lines, expected);
    Ok(())
}

#[test]
fn order_preserved_across_uneven_batches() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let dest = tmp.path().join("words.txt");

    let mut sink = LineSinkBuilder::new().from_fn(&dest, |s: &&str| s.to_uppercase());
    sink.write(&["the"])?;
    sink.write(&["quick", "brown", "fox"])?;
    sink.write(&[])?;
    sink.write(&["jumps", "over"])?;
    sink.close()?;

    assert_eq!(
        fs::read_to_string(&dest)?,
        "THE\nQUICK\nBROWN\nFOX\nJUMPS\nOVER\n"
    );
    Ok(())
}

#[test]
fn header_and_footer_written_once() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let dest = tmp.path().join("report.txt");

    let mut sink = LineSinkBuilder::new()
        .header(|out| out.write_str("H"))
        .footer(|out| out.write_str("F"))
        .from_display(&dest);
    sink.write(&[1u32, 2])?;
    sink.write(&[3])?;
    sink.close()?;

    assert_eq!(fs::read_to_string(&dest)?, "H\n1\n2\n3\nF\n");
    assert_eq!(sink.lines_written(), 5);
    Ok(())
}

#[test]
fn close_without_writes_creates_nothing() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let dest = tmp.path().join("never.txt");

    let mut sink: linesink::LineSink<u32> = LineSinkBuilder::new()
        .header(|out| out.write_str("H"))
        .footer(|out| out.write_str("F"))
        .from_display(&dest);
    sink.close()?;
    sink.close()?; // idempotent

    assert_eq!(sink.state(), SinkState::Closed);
    assert_eq!(sink.lines_written(), 0);
    assert!(!dest.exists());
    assert!(fs::read_dir(tmp.path())?.next().is_none());
    Ok(())
}

#[test]
fn committed_sink_rejects_writes() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let dest = tmp.path().join("done.txt");

    let mut sink = LineSinkBuilder::new().from_display(&dest);
    sink.write(&[1u32])?;
    sink.close()?;
    sink.close()?; // no-op after commit

    let err = sink.write(&[2]).unwrap_err();
    assert!(matches!(err, SinkError::State(_)));
    assert_eq!(fs::read_to_string(&dest)?, "1\n");
    Ok(())
}

#[test]
fn custom_line_separator() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let dest = tmp.path().join("crlf.txt");

    let mut sink = LineSinkBuilder::new()
        .line_separator("\r\n")
        .from_display(&dest);
    sink.write(&[1u32, 2])?;
    sink.close()?;

    assert_eq!(fs::read_to_string(&dest)?, "1\r\n2\r\n");
    Ok(())
}

#[test]
fn serializer_failure_aborts_batch() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let dest = tmp.path().join("partial.txt");

    let mut sink = LineSinkBuilder::new().from_try_fn(&dest, |n: &u32| {
        if *n == 3 {
            Err(io::Error::other("record 3 is unserializable"))
        } else {
            Ok(n.to_string())
        }
    });
    sink.write(&[1, 2])?;

    let err = sink.write(&[3, 4]).unwrap_err();
    assert!(matches!(err, SinkError::Serialize(_)));

    // lines before the bad record stay buffered; nothing published
    assert_eq!(sink.lines_written(), 2);
    assert_eq!(sink.state(), SinkState::Open);
    assert!(sink.work_path().unwrap().exists());
    assert!(!dest.exists());
    Ok(())
}

#[test]
fn utf16le_output_bytes() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let dest = tmp.path().join("wide.txt");

    let mut sink = LineSinkBuilder::new()
        .encoding(Encoding::Utf16Le)
        .from_display(&dest);
    sink.write(&["ab"])?;
    sink.close()?;

    assert_eq!(fs::read(&dest)?, vec![b'a', 0, b'b', 0, b'\n', 0]);
    Ok(())
}

#[test]
fn utf16be_output_bytes() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let dest = tmp.path().join("wide_be.txt");

    let mut sink = LineSinkBuilder::new()
        .encoding(Encoding::Utf16Be)
        .from_display(&dest);
    sink.write(&["ab"])?;
    sink.close()?;

    assert_eq!(fs::read(&dest)?, vec![0, b'a', 0, b'b', 0, b'\n']);
    Ok(())
}

#[test]
fn ascii_encoding_rejects_non_ascii() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let dest = tmp.path().join("ascii.txt");

    let mut sink = LineSinkBuilder::new()
        .encoding(Encoding::Ascii)
        .from_display(&dest);
    let err = sink.write(&["héllo"]).unwrap_err();
    assert!(matches!(err, SinkError::Io(_)));
    assert!(!dest.exists());
    Ok(())
}
