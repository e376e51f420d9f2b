//! The sink engine: lifecycle state machine, lazy open, buffered line
//! writing, and the commit protocol.

use std::ffi::OsString;
use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{SinkError, SinkResult};
use crate::publish;
use crate::stream::{Encoding, TextStream};
use crate::txn::TransactionNotifier;

/// Default capacity of the in-memory write buffer, in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Default record separator.
pub const DEFAULT_LINE_SEPARATOR: &str = "\n";

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type SerializeFn<T> = Box<dyn Fn(&T) -> Result<String, BoxError> + Send>;
type StreamFn = Box<dyn FnOnce(&mut TextStream) -> io::Result<()> + Send>;
type WorkPathFn = Box<dyn Fn(&Path) -> PathBuf + Send>;

/// Default work-path strategy: append `.work` to the file name.
pub fn default_work_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".work");
    path.with_file_name(name)
}

/// Externally observable lifecycle state of a [`LineSink`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkState {
    /// No work file exists yet; the first `write` will create one.
    Closed,
    /// A work file holds uncommitted output. Nothing is visible at the
    /// destination. A sink whose commit failed also reports `Open`; it
    /// rejects further use but keeps its work file for inspection.
    Open,
    /// The output was published to the destination. Terminal.
    Committed,
}

enum State {
    Closed,
    Open { work: PathBuf, stream: TextStream },
    /// Commit failed after the stream was finished; the work file is kept
    /// for inspection and the sink rejects further use.
    Failed { work: PathBuf },
    Committed,
}

impl State {
    fn observed(&self) -> SinkState {
        match self {
            State::Closed => SinkState::Closed,
            State::Open { .. } | State::Failed { .. } => SinkState::Open,
            State::Committed => SinkState::Committed,
        }
    }
}

/// Configures and constructs a [`LineSink`].
///
/// All knobs default sensibly; only the destination path and a serializer
/// (chosen via one of the `from_*` terminal methods) are required.
///
/// ```no_run
/// use linesink::LineSinkBuilder;
///
/// # fn main() -> anyhow::Result<()> {
/// let mut sink = LineSinkBuilder::new()
///     .header(|out| out.write_str("# inventory"))
///     .from_display("items.txt");
/// sink.write(&[1u32, 2, 3])?;
/// sink.close()?;
/// # Ok(())
/// # }
/// ```
pub struct LineSinkBuilder {
    separator: String,
    encoding: Encoding,
    buffer_size: usize,
    header: Option<StreamFn>,
    footer: Option<StreamFn>,
    work_path: WorkPathFn,
    notifier: Option<Arc<dyn TransactionNotifier>>,
}

impl LineSinkBuilder {
    pub fn new() -> Self {
        Self {
            separator: DEFAULT_LINE_SEPARATOR.to_string(),
            encoding: Encoding::Utf8,
            buffer_size: DEFAULT_BUFFER_SIZE,
            header: None,
            footer: None,
            work_path: Box::new(default_work_path),
            notifier: None,
        }
    }

    /// Separator appended after every line, header and footer included.
    /// Defaults to `"\n"`.
    pub fn line_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Text encoding of the output file. Defaults to [`Encoding::Utf8`].
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Capacity of the in-memory write buffer. Defaults to
    /// [`DEFAULT_BUFFER_SIZE`].
    pub fn buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes;
        self
    }

    /// Preamble callback, run once right after the work file opens and before
    /// any record line. The sink appends the line separator after it.
    pub fn header<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut TextStream) -> io::Result<()> + Send + 'static,
    {
        self.header = Some(Box::new(f));
        self
    }

    /// Postamble callback, run once right before the stream is closed for
    /// commit. The sink appends the line separator after it.
    pub fn footer<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut TextStream) -> io::Result<()> + Send + 'static,
    {
        self.footer = Some(Box::new(f));
        self
    }

    /// Strategy deriving the work path from the destination path. Defaults to
    /// [`default_work_path`]. Both paths should live on one filesystem, or
    /// the publish step loses atomicity (see [`crate::publish::move_file`]).
    pub fn work_path<F>(mut self, f: F) -> Self
    where
        F: Fn(&Path) -> PathBuf + Send + 'static,
    {
        self.work_path = Box::new(f);
        self
    }

    /// Transaction notifier the sink registers with on first write, so the
    /// commit runs at the transaction's pre-commit phase. Without one, the
    /// caller must invoke [`LineSink::close`] explicitly.
    pub fn transaction(mut self, notifier: Arc<dyn TransactionNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Terminal: serialize records with an infallible function.
    ///
    /// The returned text must not include the line separator; the sink
    /// appends it.
    pub fn from_fn<T, F>(self, destination: impl Into<PathBuf>, serializer: F) -> LineSink<T>
    where
        F: Fn(&T) -> String + Send + 'static,
    {
        self.build(destination.into(), Box::new(move |item| Ok(serializer(item))))
    }

    /// Terminal: serialize records with a fallible function. A serializer
    /// error surfaces as [`SinkError::Serialize`] and aborts the batch. As
    /// with [`from_fn`](Self::from_fn), the text must not include the line
    /// separator.
    pub fn from_try_fn<T, F, E>(self, destination: impl Into<PathBuf>, serializer: F) -> LineSink<T>
    where
        F: Fn(&T) -> Result<String, E> + Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.build(
            destination.into(),
            Box::new(move |item| serializer(item).map_err(Into::into)),
        )
    }

    /// Terminal: serialize records via their [`Display`] impl.
    pub fn from_display<T: Display>(self, destination: impl Into<PathBuf>) -> LineSink<T> {
        self.from_fn(destination, |item: &T| item.to_string())
    }

    pub(crate) fn build<T>(self, destination: PathBuf, serializer: SerializeFn<T>) -> LineSink<T> {
        LineSink {
            inner: Arc::new(Mutex::new(Inner {
                destination,
                separator: self.separator,
                encoding: self.encoding,
                buffer_size: self.buffer_size,
                header: self.header,
                footer: self.footer,
                work_path_fn: self.work_path,
                serializer,
                state: State::Closed,
                lines_written: 0,
            })),
            notifier: self.notifier,
        }
    }
}

impl Default for LineSinkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A transactional, streaming line sink.
///
/// Serializes records to lines of text in a buffered work file and publishes
/// the complete file to its destination by atomic rename — either when the
/// enclosing transaction reaches its pre-commit phase or at an explicit
/// [`close`](LineSink::close). External readers of the destination path see
/// either its prior state or the complete new file, never a partial one.
///
/// The work file is created lazily on the first `write`, so a run that
/// produces no records creates no file at all.
///
/// Designed for sequential use by one caller. The only other access is the
/// host's pre-commit callback, which the host must not run concurrently with
/// `write` (transaction managers serialize pre-commit against application
/// code). Resuming an interrupted run is not supported: after any failure,
/// discard the sink and start over.
pub struct LineSink<T> {
    inner: Arc<Mutex<Inner<T>>>,
    notifier: Option<Arc<dyn TransactionNotifier>>,
}

struct Inner<T> {
    destination: PathBuf,
    separator: String,
    encoding: Encoding,
    buffer_size: usize,
    header: Option<StreamFn>,
    footer: Option<StreamFn>,
    work_path_fn: WorkPathFn,
    serializer: SerializeFn<T>,
    state: State,
    lines_written: u64,
}

impl<T: 'static> LineSink<T> {
    /// Serialize and append a batch of records, in order.
    ///
    /// The first call performs the lazy open: derives the work path, opens
    /// the buffered stream, writes the header (if configured), and registers
    /// the pre-commit callback with the configured transaction notifier.
    ///
    /// # Errors
    /// - [`SinkError::State`] if the sink already committed, or an earlier
    ///   commit failed.
    /// - [`SinkError::Serialize`] if the serializer rejects a record; lines
    ///   already written for earlier records of the same batch stay in the
    ///   buffer.
    /// - [`SinkError::Io`] on any underlying write failure. The stream is
    ///   then in an indeterminate condition and the sink must be abandoned.
    pub fn write(&mut self, items: &[T]) -> SinkResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if matches!(inner.state, State::Closed) {
            inner.open()?;
            if let Some(notifier) = &self.notifier {
                let handle = Arc::clone(&self.inner);
                notifier.on_pre_commit(Box::new(move || handle.lock().unwrap().close()))?;
            }
        }
        inner.write_batch(items)
    }

    /// Commit and publish if the sink is open; a no-op if it never opened or
    /// already committed.
    ///
    /// # Errors
    /// [`SinkError::Io`] if the footer, flush, or publish step fails. The
    /// destination is untouched and the work file is left in place for
    /// inspection; the sink still reports [`SinkState::Open`] and must be
    /// discarded.
    pub fn close(&mut self) -> SinkResult<()> {
        self.inner.lock().unwrap().close()
    }

    /// Number of lines written so far, header and footer included.
    pub fn lines_written(&self) -> u64 {
        self.inner.lock().unwrap().lines_written
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SinkState {
        self.inner.lock().unwrap().state.observed()
    }

    /// The work path, while a work file exists (open and failed sinks).
    pub fn work_path(&self) -> Option<PathBuf> {
        let inner = self.inner.lock().unwrap();
        match &inner.state {
            State::Open { work, .. } | State::Failed { work } => Some(work.clone()),
            State::Closed | State::Committed => None,
        }
    }

    /// The final destination path.
    pub fn destination(&self) -> PathBuf {
        self.inner.lock().unwrap().destination.clone()
    }
}

impl<T> Inner<T> {
    fn open(&mut self) -> SinkResult<()> {
        if !matches!(self.state, State::Closed) {
            return Err(SinkError::State("sink is already open"));
        }
        let work = (self.work_path_fn)(&self.destination);
        let mut stream = TextStream::create(&work, self.encoding, self.buffer_size)?;
        if let Some(header) = self.header.take() {
            header(&mut stream)?;
            stream.write_str(&self.separator)?;
            self.lines_written += 1;
        }
        debug!(work = %work.display(), "opened work file");
        self.state = State::Open { work, stream };
        Ok(())
    }

    fn write_batch(&mut self, items: &[T]) -> SinkResult<()> {
        let stream = match &mut self.state {
            State::Open { stream, .. } => stream,
            State::Failed { .. } => {
                return Err(SinkError::State("sink failed during an earlier commit"));
            }
            State::Closed | State::Committed => {
                return Err(SinkError::State("sink is not open for writing"));
            }
        };
        for item in items {
            let line = (self.serializer)(item).map_err(SinkError::Serialize)?;
            stream.write_str(&line)?;
            stream.write_str(&self.separator)?;
            self.lines_written += 1;
        }
        Ok(())
    }

    fn close(&mut self) -> SinkResult<()> {
        match self.state {
            State::Closed | State::Committed => Ok(()),
            State::Failed { .. } => Err(SinkError::State("sink failed during an earlier commit")),
            State::Open { .. } => self.commit(),
        }
    }

    fn commit(&mut self) -> SinkResult<()> {
        let (work, mut stream) = match std::mem::replace(&mut self.state, State::Closed) {
            State::Open { work, stream } => (work, stream),
            other => {
                self.state = other;
                return Err(SinkError::State("commit requires an open sink"));
            }
        };
        if let Some(footer) = self.footer.take() {
            if let Err(e) = footer(&mut stream).and_then(|()| stream.write_str(&self.separator)) {
                self.state = State::Open { work, stream };
                return Err(e.into());
            }
            self.lines_written += 1;
        }
        if let Err(e) = stream.finish() {
            self.state = State::Open { work, stream };
            return Err(e.into());
        }
        // The file handle must be closed before the rename.
        drop(stream);
        match publish::move_file(&work, &self.destination) {
            Ok(_) => {
                debug!(
                    destination = %self.destination.display(),
                    lines = self.lines_written,
                    "committed"
                );
                self.state = State::Committed;
                Ok(())
            }
            Err(e) => {
                self.state = State::Failed { work };
                Err(e.into())
            }
        }
    }
}
