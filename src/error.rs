use std::error::Error as StdError;
use std::io;
use std::result::Result as StdResult;

/// A specialized `Result` type for pg-adapt.
pub type Result<T> = StdResult<T, Error>;

// Convenience type alias for usage within the crate.
pub(crate) type BoxDynError = Box<dyn StdError + 'static + Send + Sync>;

/// Represents all the ways a method can fail within pg-adapt.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Error communicating with the database backend.
    #[error("error communicating with the server: {0}")]
    Io(#[from] io::Error),

    /// Unexpected or invalid data encountered while communicating with the database.
    ///
    /// This should indicate there is a programming error in the calling driver or
    /// something corrupted with the connection to the database itself.
    #[error("encountered unexpected or invalid data: {0}")]
    Protocol(String),

    /// Error occurred while decoding a value.
    #[error("error occurred while decoding: {0}")]
    Decode(#[source] BoxDynError),

    /// Error occurred while encoding a value.
    #[error("error occurred while encoding: {0}")]
    Encode(#[source] BoxDynError),

    /// The named type exists in the catalog but is not an enum type.
    #[error("type {name:?} is not an enum type (found {kind})")]
    UnsupportedType {
        name: String,
        kind: crate::type_info::PgTypeKind,
    },

    /// The native enum and the server enum do not declare the same set of names.
    #[error(
        "cannot bind enum type {type_name:?}: labels missing from the native enum: {missing:?}; \
         native members unknown to the server: {extra:?}"
    )]
    BindingMismatch {
        type_name: String,
        missing: Vec<String>,
        extra: Vec<String>,
    },

    /// A label arrived from the server that the installed binding does not know.
    #[error("enum type {type_name:?} received unknown label {label:?}")]
    UnknownLabel { type_name: String, label: String },
}

impl Error {
    #[inline]
    pub(crate) fn decode(err: impl Into<BoxDynError>) -> Self {
        Error::Decode(err.into())
    }

    #[inline]
    pub(crate) fn encode(err: impl Into<BoxDynError>) -> Self {
        Error::Encode(err.into())
    }
}

// Format an error message as a `Protocol` error
macro_rules! err_protocol {
    ($expr:expr) => {
        $crate::error::Error::Protocol($expr.into())
    };

    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::Error::Protocol(format!($fmt, $($arg)*))
    };
}
