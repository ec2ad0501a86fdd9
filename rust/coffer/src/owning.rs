//! `OwningRange`: a [`BoundedRange`] over memory it allocated itself.

use coffer_common::{Result, error::Error, verify_arg};
use coffer_page_alloc::{PageKind, PageRegion};

use crate::{bounded::BoundedRange, copy::Transfer, whence::Whence};

/// Allocation settings for [`OwningRange::allocate_with`].
#[derive(Debug, Clone, Default)]
pub struct AllocOptions {
    page_kind: PageKind,
}

impl AllocOptions {
    pub fn new() -> AllocOptions {
        Default::default()
    }

    pub fn with_page_kind(mut self, page_kind: PageKind) -> AllocOptions {
        self.page_kind = page_kind;
        self
    }

    pub fn page_kind(&self) -> PageKind {
        self.page_kind
    }
}

/// A bounded range backed by a zero-filled page allocation that it owns.
///
/// The allocation is released exactly once, by [`OwningRange::close`]. Dropping an
/// `OwningRange` that was never closed does **not** release the memory; the leak is
/// reported through `log::warn!`.
///
/// The range itself is only reachable through `&self` ([`OwningRange::range`]), so the
/// non-owning `close` can never bypass the release.
pub struct OwningRange {
    range: BoundedRange<'static>,
    /// `Some` until the range is closed.
    region: Option<PageRegion>,
}

impl OwningRange {
    /// Allocates `size` bytes of regular pages.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `size` is zero; `AllocationFailure` with the host error if
    /// the pages cannot be mapped.
    pub fn allocate(size: usize) -> Result<OwningRange> {
        Self::allocate_with(size, &AllocOptions::default())
    }

    /// Allocates `size` bytes using the given options.
    pub fn allocate_with(size: usize, options: &AllocOptions) -> Result<OwningRange> {
        verify_arg!(size, size > 0);
        verify_arg!(size, size <= isize::MAX as usize);
        let region = PageRegion::allocate(size, options.page_kind)
            .map_err(|e| Error::allocation_failure(format!("allocate {size} bytes"), e))?;
        // SAFETY: the region is valid for `size` bytes until it is released, which only
        // happens in `close`, after the range has stopped being used.
        let range = match unsafe { BoundedRange::from_raw_parts(region.ptr(), size) } {
            Ok(range) => range,
            Err(e) => {
                if let Err(release_err) = region.release() {
                    log::warn!("failed to release pages of a rejected range: {release_err}");
                }
                return Err(e);
            }
        };
        Ok(OwningRange {
            range,
            region: Some(region),
        })
    }

    /// Releases the allocation, then closes the range.
    ///
    /// A second call finds nothing to release and returns `Ok(())`.
    ///
    /// # Errors
    ///
    /// `AllocationFailure` if the host refused to release the pages. The range is
    /// closed regardless, and the release is never retried.
    pub fn close(&mut self) -> Result<()> {
        let Some(region) = self.region.take() else {
            self.range.close();
            return Ok(());
        };
        let released = region.release();
        self.range.close();
        released.map_err(|e| Error::allocation_failure("release", e))
    }

    /// The underlying range, for inspection.
    #[inline]
    pub fn range(&self) -> &BoundedRange<'static> {
        &self.range
    }

    /// True iff the range uses large pages (`false` once closed).
    pub fn uses_large_pages(&self) -> bool {
        self.region
            .as_ref()
            .is_some_and(|region| region.uses_large_pages())
    }

    /// The owned bytes; empty once closed.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.region {
            // SAFETY: the region is live and exclusively owned by `self`.
            Some(_) => unsafe {
                std::slice::from_raw_parts(self.range.base(), self.range.capacity())
            },
            None => &[],
        }
    }

    /// The owned bytes; empty once closed.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        match &self.region {
            // SAFETY: the region is live and `&mut self` guarantees exclusive access.
            Some(_) => unsafe {
                std::slice::from_raw_parts_mut(
                    self.range.base() as *mut u8,
                    self.range.capacity(),
                )
            },
            None => &mut [],
        }
    }

    pub fn read(&mut self, dst: &mut [u8]) -> Result<Transfer> {
        self.range.read(dst)
    }

    pub fn write(&mut self, src: &[u8]) -> Result<Transfer> {
        self.range.write(src)
    }

    pub fn seek(&mut self, whence: Whence, offset: i64) -> Result<usize> {
        self.range.seek(whence, offset)
    }

    pub fn resolve_seek(&self, whence: Whence, offset: i64) -> Result<i64> {
        self.range.resolve_seek(whence, offset)
    }

    pub fn tell(&self) -> usize {
        self.range.tell()
    }

    pub fn capacity(&self) -> usize {
        self.range.capacity()
    }

    pub fn remaining(&self) -> usize {
        self.range.remaining()
    }

    pub fn is_eof(&self) -> bool {
        self.range.is_eof()
    }

    pub fn is_open(&self) -> bool {
        self.range.is_open()
    }

    pub fn contains_offset(&self, offset: i64) -> bool {
        self.range.contains_offset(offset)
    }

    pub(crate) fn range_mut(&mut self) -> &mut BoundedRange<'static> {
        &mut self.range
    }
}

impl Drop for OwningRange {
    fn drop(&mut self) {
        if let Some(region) = &self.region {
            log::warn!(
                "OwningRange dropped without close(): {} bytes at {:p} are not released",
                region.capacity(),
                region.ptr(),
            );
        }
    }
}

impl std::fmt::Debug for OwningRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwningRange")
            .field("range", &self.range)
            .field("region", &self.region)
            .finish()
    }
}

impl std::fmt::Display for OwningRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "owned {}", self.range)
    }
}
