//! Buffered, encoding-aware text output over a work file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Text encoding applied by [`TextStream`] when turning text into bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Encoding {
    /// UTF-8, no BOM. The default.
    #[default]
    Utf8,
    /// UTF-16 little-endian, no BOM.
    Utf16Le,
    /// UTF-16 big-endian, no BOM.
    Utf16Be,
    /// 7-bit ASCII; writing a non-ASCII character is an error.
    Ascii,
}

/// Buffered byte sink over one work file.
///
/// All text produced by a sink (header, record lines, separators, footer)
/// passes through [`write_str`], which applies the configured [`Encoding`]
/// and accumulates bytes up to the buffer capacity before touching the disk.
/// Header and footer callbacks receive a `&mut TextStream` as their handle to
/// the open output.
///
/// [`write_str`]: TextStream::write_str
pub struct TextStream {
    out: BufWriter<File>,
    encoding: Encoding,
}

impl TextStream {
    /// Create (or truncate) the file at `path` with the given buffer capacity.
    pub(crate) fn create(path: &Path, encoding: Encoding, buffer_size: usize) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            out: BufWriter::with_capacity(buffer_size, file),
            encoding,
        })
    }

    /// Encode `text` and append it to the buffer.
    ///
    /// # Errors
    /// Returns an error if a buffer flush fails, or if `text` cannot be
    /// represented in the configured encoding.
    pub fn write_str(&mut self, text: &str) -> io::Result<()> {
        match self.encoding {
            Encoding::Utf8 => self.out.write_all(text.as_bytes()),
            Encoding::Utf16Le => {
                for unit in text.encode_utf16() {
                    self.out.write_all(&unit.to_le_bytes())?;
                }
                Ok(())
            }
            Encoding::Utf16Be => {
                for unit in text.encode_utf16() {
                    self.out.write_all(&unit.to_be_bytes())?;
                }
                Ok(())
            }
            Encoding::Ascii => {
                if !text.is_ascii() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "non-ASCII character in ASCII-encoded output",
                    ));
                }
                self.out.write_all(text.as_bytes())
            }
        }
    }

    /// Flush the buffer and sync file contents to the storage device.
    ///
    /// The file handle stays open; dropping the stream closes it.
    pub(crate) fn finish(&mut self) -> io::Result<()> {
        self.out.flush()?;
        self.out.get_ref().sync_all()
    }
}
