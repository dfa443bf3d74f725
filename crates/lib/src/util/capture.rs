//! Standard-stream capture.
//!
//! A [`StreamSlot`] is a shared, swappable writer. Anything printed through a
//! slot can be observed by temporarily installing the write end of a pipe in
//! it with [`capture`] and reading the returned pipe reader.
//!
//! Sessions must not be nested on the same slot. The reader should be drained
//! after teardown (or from another thread): a writer that fills the pipe
//! buffer with nobody reading blocks.

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::os::fd::OwnedFd;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

type BoxedWriter = Box<dyn Write + Send>;

/// Errors that can occur while starting a capture session.
#[derive(Debug, Error)]
pub enum CaptureError {
  #[error("failed to create pipe: {0}")]
  Pipe(#[source] io::Error),
}

/// Shared handle to a writable stream that can be redirected at runtime.
///
/// Clones share the same underlying writer, so redirecting one redirects all.
#[derive(Clone)]
pub struct StreamSlot {
  inner: Arc<Mutex<BoxedWriter>>,
}

impl StreamSlot {
  pub fn new(writer: impl Write + Send + 'static) -> Self {
    Self {
      inner: Arc::new(Mutex::new(Box::new(writer))),
    }
  }

  pub fn stdout() -> Self {
    Self::new(io::stdout())
  }

  /// Install `writer` and hand back the one it replaced.
  fn replace(&self, writer: BoxedWriter) -> BoxedWriter {
    std::mem::replace(&mut *self.lock(), writer)
  }

  fn lock(&self) -> MutexGuard<'_, BoxedWriter> {
    // A panic while writing leaves the writer itself intact
    self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

impl fmt::Debug for StreamSlot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StreamSlot").finish_non_exhaustive()
  }
}

impl Write for &StreamSlot {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.lock().write(buf)
  }

  fn flush(&mut self) -> io::Result<()> {
    self.lock().flush()
  }
}

impl Write for StreamSlot {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    (&*self).write(buf)
  }

  fn flush(&mut self) -> io::Result<()> {
    (&*self).flush()
  }
}

/// An active redirect of a [`StreamSlot`] into a pipe.
///
/// Holds the slot's previous writer until [`StreamCapture::teardown`] (or drop)
/// puts it back.
pub struct StreamCapture {
  slot: StreamSlot,
  original: Option<BoxedWriter>,
}

impl StreamCapture {
  /// Restore the original writer and close the pipe's write end.
  ///
  /// Only the first call has any effect.
  pub fn teardown(&mut self) {
    let Some(original) = self.original.take() else {
      return;
    };
    let mut pipe = self.slot.replace(original);
    let _ = pipe.flush();
    // Dropping the last write end lets the reader reach EOF
    drop(pipe);
  }

  /// Whether the slot is still redirected.
  pub fn is_active(&self) -> bool {
    self.original.is_some()
  }
}

impl Drop for StreamCapture {
  fn drop(&mut self) {
    self.teardown();
  }
}

impl fmt::Debug for StreamCapture {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StreamCapture")
      .field("active", &self.is_active())
      .finish_non_exhaustive()
  }
}

/// Redirect `slot` through a freshly created pipe.
///
/// Returns the pipe's read end and the session that undoes the redirect. The
/// slot is left untouched if the pipe cannot be created. Both ends are
/// close-on-exec, so processes spawned during the session never hold the
/// write end open past teardown.
pub fn capture(slot: &StreamSlot) -> Result<(File, StreamCapture), CaptureError> {
  let (reader, writer) = cloexec_pipe().map_err(|e| CaptureError::Pipe(e.into()))?;

  let original = slot.replace(Box::new(File::from(writer)));

  Ok((
    File::from(reader),
    StreamCapture {
      slot: slot.clone(),
      original: Some(original),
    },
  ))
}

#[cfg(target_os = "linux")]
fn cloexec_pipe() -> rustix::io::Result<(OwnedFd, OwnedFd)> {
  rustix::pipe::pipe_with(rustix::pipe::PipeFlags::CLOEXEC)
}

#[cfg(not(target_os = "linux"))]
fn cloexec_pipe() -> rustix::io::Result<(OwnedFd, OwnedFd)> {
  use rustix::io::{FdFlags, fcntl_setfd};

  let (reader, writer) = rustix::pipe::pipe()?;
  fcntl_setfd(&reader, FdFlags::CLOEXEC)?;
  fcntl_setfd(&writer, FdFlags::CLOEXEC)?;
  Ok((reader, writer))
}
