pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Returns `InvalidArgument` from the enclosing function unless `$expr` holds.
///
/// The error names the argument and carries the stringified condition.
#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_arg(name, condition)
    }
}

#[cold]
pub fn invalid_arg(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidArgument {
        name: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    fn check_len(len: usize) -> crate::Result<usize> {
        verify_arg!(len, len > 0);
        Ok(len)
    }

    #[test]
    fn test_verify_arg() {
        assert_eq!(check_len(3).unwrap(), 3);
        let err = check_len(0).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(err.to_string(), "invalid argument len: len > 0");
    }
}
