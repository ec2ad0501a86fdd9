//! Page-granular memory regions handed out by the host allocator.
//!
//! A `PageRegion` is a plain handle: it does **not** release its pages when dropped.
//! The owner decides when the memory goes back to the system by calling
//! [`PageRegion::release`], which consumes the handle and therefore cannot run twice.

use std::ptr::NonNull;
use std::sync::OnceLock;

use crate::mmap;

/// Which kind of pages backs a [`PageRegion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageKind {
    /// Regular pages of [`PageRegion::regular_page_size`] bytes.
    #[default]
    Regular,
    /// Large (huge) pages only; allocation fails if the host cannot provide them.
    Large,
    /// Large pages when available, regular pages otherwise.
    LargeWithFallback,
}

/// A zero-filled, page-aligned memory region obtained from the host.
pub struct PageRegion {
    ptr: NonNull<u8>,
    /// Requested size in bytes.
    len: usize,
    /// Mapped size in bytes, a multiple of the page size.
    capacity: usize,
    uses_large_pages: bool,
}

impl PageRegion {
    pub fn regular_page_size() -> usize {
        mmap::get_page_size()
    }

    pub fn large_page_size() -> usize {
        mmap::get_large_page_size()
    }

    /// Allocates at least `size` bytes using the requested page kind.
    ///
    /// A `size` of zero still maps one page; callers that consider empty regions
    /// meaningless should reject them before getting here.
    ///
    /// # Errors
    ///
    /// Returns the host's error if the pages cannot be mapped. For
    /// [`PageKind::LargeWithFallback`] the error is the one from the regular-page attempt.
    pub fn allocate(size: usize, kind: PageKind) -> std::io::Result<PageRegion> {
        match kind {
            PageKind::Regular => Self::allocate_regular(size),
            PageKind::Large => Self::allocate_large(size),
            PageKind::LargeWithFallback => Self::allocate_large(size).or_else(|e| {
                log::debug!("large pages unavailable ({e}), falling back to regular pages");
                Self::allocate_regular(size)
            }),
        }
    }

    fn allocate_regular(size: usize) -> std::io::Result<PageRegion> {
        let (ptr, capacity) = mmap::allocate(size)?;
        Self::from_mapping(ptr, size, capacity, false)
    }

    fn allocate_large(size: usize) -> std::io::Result<PageRegion> {
        check_and_enable_large_page_support()?;
        let (ptr, capacity) = mmap::allocate_large_pages(size)?;
        Self::from_mapping(ptr, size, capacity, true)
    }

    fn from_mapping(
        ptr: *mut std::ffi::c_void,
        len: usize,
        capacity: usize,
        uses_large_pages: bool,
    ) -> std::io::Result<PageRegion> {
        let ptr = NonNull::new(ptr as *mut u8).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::OutOfMemory, "host returned null pages")
        })?;
        let region = PageRegion {
            ptr,
            len,
            capacity,
            uses_large_pages,
        };
        assert!((ptr.as_ptr() as usize).is_multiple_of(region.alignment()));
        log::debug!(
            "mapped {} bytes at {:p} for a {}-byte request ({} pages)",
            capacity,
            ptr,
            len,
            if uses_large_pages { "large" } else { "regular" },
        );
        Ok(region)
    }

    /// Pointer to the first byte of the region.
    #[inline]
    pub fn ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// The size that was requested, not the mapped capacity.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mapped size, always at least `len()` and a multiple of `alignment()`.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn uses_large_pages(&self) -> bool {
        self.uses_large_pages
    }

    /// The page size used for this region.
    #[inline]
    pub fn alignment(&self) -> usize {
        if self.uses_large_pages {
            mmap::get_large_page_size()
        } else {
            mmap::get_page_size()
        }
    }

    /// Returns the pages to the host.
    ///
    /// The address and capacity are captured before the handle is consumed, so this is
    /// the only path through which a region is ever freed.
    pub fn release(self) -> std::io::Result<()> {
        let (ptr, capacity) = (self.ptr.as_ptr(), self.capacity);
        log::debug!("unmapping {capacity} bytes at {ptr:p}");
        if self.uses_large_pages {
            unsafe { mmap::free_large_pages(ptr as _, capacity) }
        } else {
            unsafe { mmap::free(ptr as _, capacity) }
        }
    }
}

// SAFETY: a `PageRegion` is the sole handle to its pages; moving it between threads
// moves that ownership along with it.
unsafe impl Send for PageRegion {}

impl std::fmt::Debug for PageRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRegion")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("uses_large_pages", &self.uses_large_pages)
            .finish()
    }
}

/// Checks, once per process, whether large pages can be allocated, attempting to enable
/// them through platform-specific means if the first probe fails.
pub fn check_and_enable_large_page_support() -> std::io::Result<()> {
    static RESULT: OnceLock<std::io::Result<()>> = OnceLock::new();
    match RESULT.get_or_init(enable_large_page_support) {
        Ok(()) => Ok(()),
        Err(e) => Err(std::io::Error::new(e.kind(), e.to_string())),
    }
}

fn enable_large_page_support() -> std::io::Result<()> {
    if probe_large_page_allocation().is_err() {
        mmap::try_enable_large_pages()?;
        probe_large_page_allocation()
    } else {
        Ok(())
    }
}

fn probe_large_page_allocation() -> std::io::Result<()> {
    let (ptr, capacity) = mmap::allocate_large_pages(1)?;
    unsafe { mmap::free_large_pages(ptr, capacity) }
}
