//! Publish step of the commit protocol: move a finished work file to its
//! final destination.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// How a work file reached its destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveKind {
    /// Single atomic rename; observers saw either the old state of the
    /// destination or the complete new file, never anything in between.
    Renamed,
    /// Copy-then-delete across a filesystem boundary. **Not atomic**: a crash
    /// mid-copy can leave a partial destination file.
    Copied,
}

/// Move `from` to `to`, atomically when the filesystem allows it.
///
/// `fs::rename` is atomic when both paths live on the same filesystem. When
/// it fails with [`io::ErrorKind::CrossesDevices`], the file is copied and
/// the source deleted instead; callers whose work and destination paths span
/// volumes lose the atomicity guarantee and should place both on one volume
/// if they need it.
///
/// # Errors
/// Any rename/copy/delete failure. After a failed rename the source is left
/// in place; a failed copy may leave a partial file at `to`.
pub fn move_file(from: &Path, to: &Path) -> io::Result<MoveKind> {
    move_file_with(|a, b| fs::rename(a, b), from, to)
}

/// [`move_file`] with an injectable rename primitive.
pub(crate) fn move_file_with<R>(rename: R, from: &Path, to: &Path) -> io::Result<MoveKind>
where
    R: Fn(&Path, &Path) -> io::Result<()>,
{
    match rename(from, to) {
        Ok(()) => {
            debug!(from = %from.display(), to = %to.display(), "renamed work file");
            Ok(MoveKind::Renamed)
        }
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            warn!(
                from = %from.display(),
                to = %to.display(),
                "atomic rename unsupported, falling back to copy"
            );
            fs::copy(from, to)?;
            fs::remove_file(from)?;
            Ok(MoveKind::Copied)
        }
        Err(e) => Err(e),
    }
}
