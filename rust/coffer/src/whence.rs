use coffer_common::error::Error;

/// Origin of a seek request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Whence {
    /// Relative to the first byte of the range.
    Start,
    /// Relative to the current position (the capacity, once end-of-range was reached).
    Current,
    /// Relative to the last byte of the range: `(End, 0)` addresses `capacity - 1`.
    End,
}

/// Accepts the classic `0`/`1`/`2` origin selectors.
impl TryFrom<i32> for Whence {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Whence::Start),
            1 => Ok(Whence::Current),
            2 => Ok(Whence::End),
            _ => Err(Error::invalid_arg(
                "whence",
                format!("unrecognized seek origin {value}"),
            )),
        }
    }
}

impl std::fmt::Display for Whence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Whence::Start => "start",
            Whence::Current => "current",
            Whence::End => "end",
        };
        f.write_str(name)
    }
}
