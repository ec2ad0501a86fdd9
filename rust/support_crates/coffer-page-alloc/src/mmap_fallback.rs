//! Page allocation emulated on top of the global allocator, for hosts without a
//! native backend.

use std::alloc::{Layout, alloc_zeroed, dealloc};
use std::ffi::c_void;

/// Allocates `size` bytes rounded up to, and aligned on, the emulated large page size.
pub fn allocate_large_pages(size: usize) -> std::io::Result<(*mut c_void, usize)> {
    allocate_aligned(size, get_large_page_size())
}

/// # Safety
///
/// `ptr` and `capacity` must come from the same [`allocate_large_pages`] call, and the
/// region must not have been released already.
pub unsafe fn free_large_pages(ptr: *mut c_void, capacity: usize) -> std::io::Result<()> {
    unsafe { free_aligned(ptr, capacity, get_large_page_size()) }
}

pub fn try_enable_large_pages() -> std::io::Result<()> {
    Ok(())
}

/// Allocates `size` bytes rounded up to, and aligned on, the emulated page size.
pub fn allocate(size: usize) -> std::io::Result<(*mut c_void, usize)> {
    allocate_aligned(size, get_page_size())
}

/// # Safety
///
/// `ptr` and `capacity` must come from the same [`allocate`] call, and the region must
/// not have been released already.
pub unsafe fn free(ptr: *mut c_void, capacity: usize) -> std::io::Result<()> {
    unsafe { free_aligned(ptr, capacity, get_page_size()) }
}

pub fn get_large_page_size() -> usize {
    2 * 1024 * 1024
}

pub fn get_page_size() -> usize {
    4 * 1024
}

fn layout(capacity: usize, page_size: usize) -> std::io::Result<Layout> {
    Layout::from_size_align(capacity, page_size)
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "invalid layout"))
}

fn allocate_aligned(size: usize, page_size: usize) -> std::io::Result<(*mut c_void, usize)> {
    assert!(page_size.is_power_of_two());
    let capacity = size
        .max(1)
        .checked_next_multiple_of(page_size)
        .ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::OutOfMemory, "requested size overflows")
        })?;
    let ptr = unsafe { alloc_zeroed(layout(capacity, page_size)?) };
    if ptr.is_null() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::OutOfMemory,
            "failed to allocate memory",
        ));
    }
    Ok((ptr as *mut c_void, capacity))
}

unsafe fn free_aligned(
    ptr: *mut c_void,
    capacity: usize,
    page_size: usize,
) -> std::io::Result<()> {
    assert!(capacity.is_multiple_of(page_size));
    let layout = layout(capacity, page_size)?;
    unsafe {
        dealloc(ptr as *mut u8, layout);
    }
    Ok(())
}
