use thiserror::Error;

/// Errors surfaced by compression, decompression and introspection calls.
///
/// Every error is local to the call that produced it; there is no global
/// error state to reset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A caller-supplied parameter is out of range.
    #[error("invalid argument: {0}")]
    BadArg(&'static str),

    /// The requested compressor name or on-wire code is unknown, or the
    /// backend was not compiled into this build.
    #[error("compressor not available: {0}")]
    UnsupportedBackend(String),

    /// The destination buffer cannot hold the required output. For
    /// compression this is reported only after the plain-copy fallback
    /// has also been ruled out.
    #[error("destination buffer too small: need {needed} bytes, have {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },

    /// The artifact header or its block start table is inconsistent.
    #[error("corrupt header: {0}")]
    HeaderCorrupt(&'static str),

    /// A codec rejected its input or produced the wrong number of bytes.
    #[error("codec failure: {0}")]
    BackendError(&'static str),

    /// The worker pool for a parallel call could not be built.
    #[error("could not build worker thread pool")]
    ThreadPool,
}

pub type Result<T> = std::result::Result<T, Error>;
