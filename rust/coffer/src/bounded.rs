//! `BoundedRange`: a cursor over a contiguous, externally owned memory range.
//!
//! The range is described by a base address and a length that is validated once at
//! construction (`1 <= len <= isize::MAX`, and `base + len - 1` does not wrap). All
//! later offset arithmetic is derived from that length, so `end - base`,
//! `cursor - base` and `end - cursor` can never wrap.
//!
//! The cursor is a relative offset in `0..=len`. End-of-range and open/closed are
//! tracked by their own flags rather than by sentinel addresses.

use std::marker::PhantomData;

use coffer_common::{Result, error::Error, verify_arg};

use crate::whence::Whence;

/// A bounded, sequential read/write view over `[base, end]`.
///
/// Reads and writes never touch memory outside the range: a transfer that would cross
/// the end is truncated and reports end-of-range. Seeking never extends the range.
///
/// The lifetime `'a` ties a range built from a slice to that slice's borrow. Ranges
/// built from raw parts carry whatever lifetime the caller picks, and the caller
/// guarantees the memory stays valid for it.
///
/// `BoundedRange` performs no synchronization; concurrent use requires an external lock.
pub struct BoundedRange<'a> {
    /// First byte of the range, null once closed.
    base: *mut u8,
    /// Number of bytes in the range, zero once closed.
    len: usize,
    /// Offset of the next byte to transfer, in `0..=len`.
    cursor: usize,
    eof: bool,
    open: bool,
    _marker: PhantomData<&'a mut [u8]>,
}

impl<'a> BoundedRange<'a> {
    /// Creates a range covering the whole of `bytes`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `bytes` is empty.
    pub fn new(bytes: &'a mut [u8]) -> Result<BoundedRange<'a>> {
        verify_arg!(bytes, !bytes.is_empty());
        // SAFETY: the slice is valid for reads and writes of its length for `'a`, and the
        // mutable borrow is held by the returned range.
        unsafe { Self::from_raw_parts(bytes.as_mut_ptr(), bytes.len()) }
    }

    /// Creates a range of `size` bytes starting at `base`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `base` is null, `size` is zero, `size` exceeds `isize::MAX`,
    /// or the last address `base + size - 1` does not fit in the address space.
    ///
    /// # Safety
    ///
    /// `base..base + size` must be valid for reads and writes for `'a`, and must not
    /// be accessed through any other path while the range is open.
    pub unsafe fn from_raw_parts(base: *mut u8, size: usize) -> Result<BoundedRange<'a>> {
        verify_arg!(base, !base.is_null());
        verify_arg!(size, size > 0);
        verify_arg!(size, size <= isize::MAX as usize);
        verify_arg!(size, (base as usize).checked_add(size - 1).is_some());
        Ok(BoundedRange {
            base,
            len: size,
            cursor: 0,
            eof: false,
            open: true,
            _marker: PhantomData,
        })
    }

    /// Creates a range spanning the inclusive address pair `[base, end]`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `base` is null, `base > end`, or the span does not fit
    /// in `isize::MAX` bytes.
    ///
    /// # Safety
    ///
    /// Same contract as [`BoundedRange::from_raw_parts`] for the span `[base, end]`.
    pub unsafe fn from_raw_bounds(base: *mut u8, end: *mut u8) -> Result<BoundedRange<'a>> {
        verify_arg!(base, !base.is_null());
        verify_arg!(end, (base as usize) <= (end as usize));
        let distance = end as usize - base as usize;
        // `base` is non-null, so `distance <= usize::MAX - 1`.
        debug_assert!(distance < usize::MAX);
        unsafe { Self::from_raw_parts(base, distance + 1) }
    }

    /// Offset of the cursor from the base.
    ///
    /// Once end-of-range has been reached this is the full capacity. Zero when closed.
    #[inline]
    pub fn tell(&self) -> usize {
        if self.eof { self.len } else { self.cursor }
    }

    /// Number of bytes in the range; at least 1 while open, 0 when closed.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.len
    }

    /// Offset of the last byte, `capacity() - 1` (0 when closed).
    #[inline]
    pub fn last_offset(&self) -> usize {
        self.len.saturating_sub(1)
    }

    /// Bytes left between the cursor and the end; 0 when closed or at end-of-range.
    #[inline]
    pub fn remaining(&self) -> usize {
        if !self.open || self.eof {
            0
        } else {
            self.len - self.cursor
        }
    }

    /// True iff a previous read or write exhausted the range. Cleared by a successful seek.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Address of the first byte, null when closed.
    #[inline]
    pub fn base(&self) -> *const u8 {
        self.base
    }

    /// Inclusive address of the last byte, null when closed.
    pub fn end(&self) -> *const u8 {
        if self.open {
            self.base.wrapping_add(self.last_offset())
        } else {
            std::ptr::null()
        }
    }

    /// True iff `offset` addresses a byte of the open range.
    pub fn contains_offset(&self, offset: i64) -> bool {
        self.open && offset >= 0 && (offset as u64) < self.len as u64
    }

    /// True iff `ptr` points into `[base, end]` of the open range.
    pub fn contains_address(&self, ptr: *const u8) -> bool {
        if !self.open {
            return false;
        }
        let (start, addr) = (self.base as usize, ptr as usize);
        addr >= start && addr - start < self.len
    }

    /// Checks that `offset` addresses a byte of the range and returns it as `usize`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` naming the offset and the valid interval.
    pub fn ensure_contains_offset(&self, offset: i64) -> Result<usize> {
        if self.contains_offset(offset) {
            Ok(offset as usize)
        } else {
            Err(Error::invalid_arg(
                "offset",
                format!("{offset} is outside [0, {}]", self.len as i64 - 1),
            ))
        }
    }

    /// Translates a seek request into an absolute offset without moving the cursor.
    ///
    /// The result is not range-checked; see [`BoundedRange::seek`].
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the target is not representable as `i64`.
    pub fn resolve_seek(&self, whence: Whence, offset: i64) -> Result<i64> {
        // `len <= isize::MAX`, so both anchors fit in i64.
        let anchor = match whence {
            Whence::Start => 0,
            Whence::Current => self.tell() as i64,
            Whence::End => self.last_offset() as i64,
        };
        anchor.checked_add(offset).ok_or_else(|| {
            Error::invalid_arg("offset", format!("{offset} from {whence} overflows"))
        })
    }

    /// Moves the cursor and clears end-of-range. Returns the new offset.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the range is closed or the target lies outside
    /// `[0, capacity() - 1]`; the cursor is left untouched in both cases.
    pub fn seek(&mut self, whence: Whence, offset: i64) -> Result<usize> {
        if !self.open {
            return Err(Error::invalid_arg("self", "seek on a closed range"));
        }
        let target = self.resolve_seek(whence, offset)?;
        let target = self.ensure_contains_offset(target)?;
        log::trace!("seek {offset} from {whence}: {} -> {target}", self.tell());
        self.cursor = target;
        self.eof = false;
        Ok(target)
    }

    /// Closes the range by zeroing every field. Repeated calls are harmless.
    ///
    /// The memory itself is not touched or released.
    pub fn close(&mut self) {
        self.base = std::ptr::null_mut();
        self.len = 0;
        self.cursor = 0;
        self.eof = false;
        self.open = false;
    }

    /// Pointer to the byte under the cursor. Only meaningful while `remaining() > 0`.
    #[inline]
    pub(crate) fn cursor_ptr(&self) -> *mut u8 {
        debug_assert!(self.cursor < self.len);
        // SAFETY: `cursor < len` and `base + len - 1` was checked not to wrap.
        unsafe { self.base.add(self.cursor) }
    }

    /// Records a transfer of `n` bytes starting at the cursor.
    pub(crate) fn advance(&mut self, n: usize, exhausted: bool) {
        debug_assert!(n <= self.len - self.cursor);
        if exhausted {
            self.cursor = self.len;
            self.eof = true;
        } else {
            self.cursor += n;
        }
    }
}

// SAFETY: a `BoundedRange` is an exclusive view of its memory, comparable to
// `&'a mut [u8]`, and every mutating operation takes `&mut self`.
unsafe impl Send for BoundedRange<'_> {}

impl std::fmt::Debug for BoundedRange<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedRange")
            .field("base", &self.base)
            .field("end", &self.end())
            .field("cursor", &self.cursor)
            .field("eof", &self.eof)
            .field("open", &self.open)
            .finish()
    }
}

impl std::fmt::Display for BoundedRange<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.open {
            return f.write_str("[closed]");
        }
        write!(f, "[{:p}..={:p}] @{}/{}", self.base, self.end(), self.tell(), self.len)?;
        if self.eof {
            f.write_str(" eof")?;
        }
        Ok(())
    }
}
