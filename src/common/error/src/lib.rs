mod error;

pub use error::{
    ConversionError, ErrorKind, IngotError, IngotResult, MismatchKind, TypeMismatchError,
};
