use thiserror::Error;

/// Error returned by every fallible coffer operation.
///
/// The error is a thin box around [`ErrorKind`] so that `Result<T>` stays pointer-sized
/// on the happy path.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn end_of_range() -> Error {
        Error(ErrorKind::EndOfRange.into())
    }

    pub fn allocation_failure(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::AllocationFailure {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidArgument { .. })
    }

    pub fn is_end_of_range(&self) -> bool {
        matches!(self.kind(), ErrorKind::EndOfRange)
    }

    pub fn is_allocation_failure(&self) -> bool {
        matches!(self.kind(), ErrorKind::AllocationFailure { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Malformed construction parameters, an out-of-range seek target,
    /// an unrecognized seek origin or an empty transfer buffer.
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    /// The range was fully consumed or filled by a prior call, or it is closed.
    #[error("end of range")]
    EndOfRange,

    /// The host allocator could not satisfy (or release) an owned allocation.
    #[error("allocation failure for '{context}': {source}")]
    AllocationFailure {
        context: String,
        source: std::io::Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<Error> for std::io::Error {
    fn from(e: Error) -> Self {
        match e.into_kind() {
            kind @ ErrorKind::InvalidArgument { .. } => {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, kind)
            }
            ErrorKind::EndOfRange => {
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, ErrorKind::EndOfRange)
            }
            ErrorKind::AllocationFailure { context, source } => std::io::Error::new(
                source.kind(),
                ErrorKind::AllocationFailure { context, source },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_predicates() {
        let e = Error::invalid_arg("size", "size > 0");
        assert!(e.is_invalid_argument());
        assert!(!e.is_end_of_range());
        assert_eq!(e.to_string(), "invalid argument size: size > 0");

        let e = Error::end_of_range();
        assert!(e.is_end_of_range());
        assert_eq!(e.to_string(), "end of range");

        let e = Error::allocation_failure(
            "allocate",
            std::io::Error::new(std::io::ErrorKind::OutOfMemory, "no memory"),
        );
        assert!(e.is_allocation_failure());
        assert!(e.to_string().starts_with("allocation failure for 'allocate'"));
    }

    #[test]
    fn test_into_io_error() {
        let io: std::io::Error = Error::invalid_arg("whence", "unknown").into();
        assert_eq!(io.kind(), std::io::ErrorKind::InvalidInput);

        let io: std::io::Error = Error::end_of_range().into();
        assert_eq!(io.kind(), std::io::ErrorKind::UnexpectedEof);

        let io: std::io::Error = Error::allocation_failure(
            "allocate",
            std::io::Error::new(std::io::ErrorKind::OutOfMemory, "no memory"),
        )
        .into();
        assert_eq!(io.kind(), std::io::ErrorKind::OutOfMemory);
    }
}
