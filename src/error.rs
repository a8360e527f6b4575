use core::fmt::Display;
use std::borrow::Cow;

/// Error types used throughout the `plugin_loader` library.
///
/// Only conditions that must be surfaced to the embedder are represented
/// here. A module that no backend can load and a symbol that is not
/// exported are ordinary outcomes (`BackendKind::None`, `Ok(None)`), not
/// errors.
#[derive(Debug)]
pub enum Error {
    /// The supplied path cannot be represented in the text encoding the
    /// native loader requires.
    ///
    /// Reported immediately at open; the load is aborted and no fallback
    /// backend is attempted.
    PathEncoding {
        /// A descriptive message about the encoding failure.
        msg: Cow<'static, str>,
    },

    /// A symbol name cannot be represented in the text encoding the flat
    /// loader requires.
    ///
    /// Only the flat-library backend converts names; the bundle backend
    /// accepts the richer text type natively and reports an unrepresentable
    /// name as not-found instead.
    SymbolEncoding {
        /// A descriptive message about the encoding failure.
        msg: Cow<'static, str>,
    },

    /// Close was requested while the loaded image must stay resident.
    ///
    /// The native references are intentionally kept alive; the handle
    /// remains valid and the call may be retried (and will fail again).
    UnloadRefused {
        /// A descriptive message naming the refusing module.
        msg: Cow<'static, str>,
    },
}

impl Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::PathEncoding { msg } => write!(f, "Path encoding error: {msg}"),
            Error::SymbolEncoding { msg } => write!(f, "Symbol encoding error: {msg}"),
            Error::UnloadRefused { msg } => write!(f, "Unload refused: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

/// Creates a path encoding error with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn path_encoding_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::PathEncoding { msg: msg.into() }
}

/// Creates a symbol encoding error with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn symbol_encoding_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::SymbolEncoding { msg: msg.into() }
}

/// Creates an unload refusal error with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn unload_refused_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::UnloadRefused { msg: msg.into() }
}
