use crate::encode::EncodingError;

/// Represents errors that can occur while operating on a [`HashMap`].
///
/// Lookups that find nothing are not errors; they are reported as `None` or
/// `false`.
///
/// [`HashMap`]: crate::HashMap
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A key could not be converted to its canonical byte sequence
    Encoding(EncodingError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ChainMapError: {self:?}")
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Encoding(e) => Some(e),
        }
    }
}

impl From<EncodingError> for Error {
    fn from(value: EncodingError) -> Self {
        Self::Encoding(value)
    }
}

/// Map result
pub type Result<T> = core::result::Result<T, Error>;
