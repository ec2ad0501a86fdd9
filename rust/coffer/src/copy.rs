//! Sequential reads and writes on a [`BoundedRange`].
//!
//! Both directions share one shape: take `min(remaining, buffer length)` bytes, move them
//! with [`copy_bytes`], and declare end-of-range whenever the range side is the one that
//! ran out, including the tie where both sides have exactly the same length.

use coffer_common::{Result, error::Error};

use crate::bounded::BoundedRange;

/// Outcome of a read or write that moved at least one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Number of bytes moved.
    pub len: usize,
    /// The transfer exhausted the range; further reads or writes fail with
    /// `EndOfRange` until the next successful seek.
    pub end_of_range: bool,
}

impl std::fmt::Display for Transfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} bytes", self.len)?;
        if self.end_of_range {
            f.write_str(" (end of range)")?;
        }
        Ok(())
    }
}

/// Bulk copy of `len` bytes from `src` to `dst`, with `memmove` semantics.
///
/// # Safety
///
/// `src` must be valid for reads and `dst` valid for writes of `len` bytes.
#[inline]
pub unsafe fn copy_bytes(src: *const u8, dst: *mut u8, len: usize) {
    unsafe { std::ptr::copy(src, dst, len) }
}

impl BoundedRange<'_> {
    /// Copies bytes from the cursor into `dst`.
    ///
    /// Moves `min(remaining(), dst.len())` bytes to the start of `dst`. If that empties
    /// the range the returned [`Transfer`] is flagged `end_of_range`.
    ///
    /// # Errors
    ///
    /// - `EndOfRange` if the range is closed or already at end-of-range.
    /// - `InvalidArgument` if `dst` is empty.
    ///
    /// No bytes are moved on error.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<Transfer> {
        let (n, exhausted) = self.prepare_transfer(dst.len(), "dst")?;
        // SAFETY: `n` bytes from the cursor lie inside the range and `n <= dst.len()`.
        unsafe { copy_bytes(self.cursor_ptr(), dst.as_mut_ptr(), n) };
        Ok(self.complete_transfer(n, exhausted))
    }

    /// Copies bytes from `src` into the range at the cursor.
    ///
    /// Never extends the range: a write that does not fit is truncated to `remaining()`
    /// bytes and flagged `end_of_range`, exactly like [`BoundedRange::read`].
    ///
    /// # Errors
    ///
    /// - `EndOfRange` if the range is closed or already at end-of-range.
    /// - `InvalidArgument` if `src` is empty.
    ///
    /// No bytes are moved on error.
    pub fn write(&mut self, src: &[u8]) -> Result<Transfer> {
        let (n, exhausted) = self.prepare_transfer(src.len(), "src")?;
        // SAFETY: `n <= src.len()` and `n` bytes from the cursor lie inside the range.
        unsafe { copy_bytes(src.as_ptr(), self.cursor_ptr(), n) };
        Ok(self.complete_transfer(n, exhausted))
    }

    /// Returns the number of bytes to move and whether that exhausts the range.
    fn prepare_transfer(&self, requested: usize, buffer: &str) -> Result<(usize, bool)> {
        if !self.is_open() || self.is_eof() {
            return Err(Error::end_of_range());
        }
        if requested == 0 {
            return Err(Error::invalid_arg(buffer, "empty buffer"));
        }
        let available = self.remaining();
        if available == 0 {
            return Err(Error::invalid_arg("self", "open range without remaining capacity"));
        }
        Ok((available.min(requested), available <= requested))
    }

    fn complete_transfer(&mut self, n: usize, exhausted: bool) -> Transfer {
        self.advance(n, exhausted);
        if exhausted {
            log::trace!("range of {} bytes exhausted by a {n}-byte transfer", self.capacity());
        }
        Transfer {
            len: n,
            end_of_range: exhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Transfer;
    use crate::{BoundedRange, Whence};

    #[test]
    fn test_partial_read() {
        let mut buf = *b"abcdef";
        let mut range = BoundedRange::new(&mut buf).unwrap();

        let mut dst = [0u8; 4];
        let t = range.read(&mut dst).unwrap();
        assert_eq!(
            t,
            Transfer {
                len: 4,
                end_of_range: false
            }
        );
        assert_eq!(&dst, b"abcd");
        assert_eq!(range.tell(), 4);
        assert_eq!(range.remaining(), 2);

        let t = range.read(&mut dst).unwrap();
        assert_eq!(t.len, 2);
        assert!(t.end_of_range);
        assert_eq!(&dst[..2], b"ef");
        assert!(range.is_eof());
        assert_eq!(range.tell(), 6);
        assert_eq!(range.remaining(), 0);
    }

    #[test]
    fn test_exact_read_reports_eof() {
        let mut buf = *b"xyz";
        let mut range = BoundedRange::new(&mut buf).unwrap();
        let mut dst = [0u8; 3];
        let t = range.read(&mut dst).unwrap();
        assert_eq!(t.len, 3);
        assert!(t.end_of_range);
        assert_eq!(&dst, b"xyz");
    }

    #[test]
    fn test_exact_write_reports_eof() {
        let mut buf = [0u8; 4];
        {
            let mut range = BoundedRange::new(&mut buf).unwrap();
            range.seek(Whence::Start, 1).unwrap();
            let t = range.write(b"123").unwrap();
            assert_eq!(t.len, 3);
            assert!(t.end_of_range);
            assert!(range.write(b"4").unwrap_err().is_end_of_range());
        }
        assert_eq!(&buf, b"\x00123");
    }

    #[test]
    fn test_empty_buffers_rejected() {
        let mut buf = [7u8; 4];
        let mut range = BoundedRange::new(&mut buf).unwrap();
        assert!(range.read(&mut []).unwrap_err().is_invalid_argument());
        assert!(range.write(&[]).unwrap_err().is_invalid_argument());
        assert_eq!(range.tell(), 0);
        assert!(!range.is_eof());
    }

    #[test]
    fn test_after_eof_reports_end_of_range() {
        let mut buf = [1u8; 2];
        let mut range = BoundedRange::new(&mut buf).unwrap();
        let mut dst = [0u8; 8];
        assert!(range.read(&mut dst).unwrap().end_of_range);

        let mut dst = [9u8; 8];
        assert!(range.read(&mut dst).unwrap_err().is_end_of_range());
        assert!(range.read(&mut []).unwrap_err().is_end_of_range());
        assert!(range.write(b"zz").unwrap_err().is_end_of_range());
        assert_eq!(dst, [9u8; 8]);
    }

    #[test]
    fn test_closed_reports_end_of_range() {
        let mut buf = [1u8; 2];
        let mut range = BoundedRange::new(&mut buf).unwrap();
        range.close();
        let mut dst = [0u8; 2];
        assert!(range.read(&mut dst).unwrap_err().is_end_of_range());
        assert!(range.write(b"ab").unwrap_err().is_end_of_range());
    }

    #[test]
    fn test_seek_clears_eof() {
        let mut buf = *b"hello";
        let mut range = BoundedRange::new(&mut buf).unwrap();
        let mut dst = [0u8; 16];
        assert!(range.read(&mut dst).unwrap().end_of_range);
        assert_eq!(range.resolve_seek(Whence::Current, -2).unwrap(), 3);

        range.seek(Whence::Current, -2).unwrap();
        assert!(!range.is_eof());
        let t = range.read(&mut dst).unwrap();
        assert_eq!(t.len, 2);
        assert_eq!(&dst[..2], b"lo");
    }

    #[test]
    fn test_transfer_display() {
        let t = Transfer {
            len: 5,
            end_of_range: true,
        };
        assert_eq!(t.to_string(), "5 bytes (end of range)");
        let t = Transfer {
            len: 1,
            end_of_range: false,
        };
        assert_eq!(t.to_string(), "1 bytes");
    }
}
