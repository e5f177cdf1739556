use std::error::Error as _;

use rquickjs::{CatchResultExt as _, Ctx, Exception};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// JS `code` property attached to errors thrown into a module body when a
/// nested `require` cannot resolve its specifier.
pub const MODULE_NOT_FOUND: &str = "MODULE_NOT_FOUND";

/// JS `code` property attached to errors thrown into a module body when a
/// nested `require` resolved but the source could not be read.
pub const MODULE_READ_FAILED: &str = "MODULE_READ_FAILED";

/// The ways a top-level `require` can fail.
///
/// Only the request that first hits a fault observes it. A module that failed
/// to read or execute stays in the session's registry, and later requests for
/// the same identity return its (empty or partial) exports without an error.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The specifier could not be mapped to a canonical identity.
    /// Nothing is cached for a failed resolution.
    #[error("Cannot find module '{specifier}' from {}", .base.as_deref().unwrap_or("<entry>"))]
    Resolution {
        specifier: String,
        base: Option<String>,
        #[source]
        source: BoxError,
    },

    /// The identity was resolved but its source could not be obtained.
    #[error("Failed to read module '{identity}'")]
    Read {
        identity: String,
        #[source]
        source: BoxError,
    },

    /// The module body faulted while executing.
    #[error("Module '{identity}' failed to execute: {message}")]
    Execution { identity: String, message: String },

    /// The engine itself failed outside of any module body.
    #[error("Runtime error: {message}")]
    Runtime { message: String },
}

impl LoadError {
    /// A short, stable name for the kind of fault, used as a metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::Resolution { .. } => "resolution",
            LoadError::Read { .. } => "read",
            LoadError::Execution { .. } => "execution",
            LoadError::Runtime { .. } => "runtime",
        }
    }

    pub(crate) fn resolution(
        specifier: &str,
        base: Option<&str>,
        source: impl Into<BoxError>,
    ) -> Self {
        LoadError::Resolution {
            specifier: specifier.to_string(),
            base: base.map(str::to_string),
            source: source.into(),
        }
    }

    pub(crate) fn read(identity: &str, source: impl Into<BoxError>) -> Self {
        LoadError::Read {
            identity: identity.to_string(),
            source: source.into(),
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            LoadError::Resolution { .. } => Some(MODULE_NOT_FOUND),
            LoadError::Read { .. } => Some(MODULE_READ_FAILED),
            _ => None,
        }
    }
}

/// A fault as it travels through nested `require` calls inside the engine.
///
/// Exceptions raised by a module body are kept pending in the context so that
/// a requiring body sees the original thrown value. They are only rendered into
/// a [`LoadError`] once they reach the host boundary.
#[derive(Debug)]
pub(crate) enum Fault {
    Load(LoadError),
    Thrown {
        identity: String,
        error: rquickjs::Error,
    },
}

impl From<LoadError> for Fault {
    fn from(err: LoadError) -> Self {
        Fault::Load(err)
    }
}

impl Fault {
    pub(crate) fn runtime(err: impl core::fmt::Display) -> Self {
        Fault::Load(LoadError::Runtime {
            message: err.to_string(),
        })
    }

    /// Convert into an error to hand back to the engine from a native function.
    pub(crate) fn throw(self, ctx: &Ctx<'_>) -> rquickjs::Error {
        match self {
            // The exception is still pending in the context, returning the error
            // as is rethrows the original value.
            Fault::Thrown { error, .. } => error,
            Fault::Load(err) => {
                let mut message = err.to_string();
                if let Some(source) = err.source() {
                    message.push_str(": ");
                    message.push_str(&source.to_string());
                }
                let code = err.code();
                let exception = match Exception::from_message(ctx.clone(), &message) {
                    Ok(exception) => exception,
                    Err(e) => return e,
                };
                if let Some(code) = code
                    && let Err(e) = exception.as_object().set("code", code)
                {
                    return e;
                }
                ctx.throw(exception.into_object().into_value())
            }
        }
    }

    /// Convert into a host-facing error, draining any pending exception.
    pub(crate) fn into_load_error(self, ctx: &Ctx<'_>) -> LoadError {
        match self {
            Fault::Load(err) => err,
            Fault::Thrown { identity, error } => {
                let message = match Err::<(), _>(error).catch(ctx) {
                    Ok(()) => String::new(),
                    Err(caught) => caught.to_string(),
                };
                LoadError::Execution { identity, message }
            }
        }
    }
}
