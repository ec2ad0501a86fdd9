//! Anonymous `mmap`-backed page allocation.
//!
//! Every function returns or expects the *capacity* of a mapping, i.e. the requested
//! size rounded up to the page size that was used to create it.

use std::ffi::c_void;
use std::sync::OnceLock;

/// Maps `size` bytes (rounded up to whole huge pages) with `MAP_HUGETLB`.
///
/// Succeeds only when the host has huge pages configured, e.g. through
/// `/proc/sys/vm/nr_hugepages` or `/proc/sys/vm/nr_overcommit_hugepages`.
/// The mapping is zero-filled, readable and writable.
///
/// The returned pointer must be unmapped with [`free_large_pages`] and the returned capacity.
pub fn allocate_large_pages(size: usize) -> std::io::Result<(*mut c_void, usize)> {
    map_anonymous(size, get_large_page_size(), libc::MAP_HUGETLB)
}

/// Unmaps a region returned by [`allocate_large_pages`].
///
/// # Safety
///
/// `ptr` and `capacity` must come from the same [`allocate_large_pages`] call, and the
/// region must not have been released already.
pub unsafe fn free_large_pages(ptr: *mut c_void, capacity: usize) -> std::io::Result<()> {
    unsafe { free(ptr, capacity) }
}

/// Huge pages on Linux are configured administratively; there is nothing to toggle
/// from inside the process.
pub fn try_enable_large_pages() -> std::io::Result<()> {
    Ok(())
}

/// Maps `size` bytes (rounded up to whole regular pages).
///
/// The mapping is zero-filled, readable and writable. The returned pointer must be
/// unmapped with [`free`] and the returned capacity.
pub fn allocate(size: usize) -> std::io::Result<(*mut c_void, usize)> {
    map_anonymous(size, get_page_size(), 0)
}

/// Unmaps a region returned by [`allocate`].
///
/// # Safety
///
/// `ptr` and `capacity` must come from the same [`allocate`] call, and the region must
/// not have been released already.
pub unsafe fn free(ptr: *mut c_void, capacity: usize) -> std::io::Result<()> {
    let res = unsafe { libc::munmap(ptr, capacity) };
    if res < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Huge page size, read once from `/proc/meminfo` (2 MiB if unavailable).
pub fn get_large_page_size() -> usize {
    static SIZE: OnceLock<usize> = OnceLock::new();
    *SIZE.get_or_init(|| read_large_page_size().unwrap_or(2 * 1024 * 1024))
}

/// Regular page size, read once through `sysconf(_SC_PAGESIZE)` (4 KiB if unavailable).
pub fn get_page_size() -> usize {
    static SIZE: OnceLock<usize> = OnceLock::new();
    *SIZE.get_or_init(|| read_page_size().unwrap_or(4 * 1024))
}

fn map_anonymous(
    size: usize,
    page_size: usize,
    extra_flags: libc::c_int,
) -> std::io::Result<(*mut c_void, usize)> {
    assert!(page_size.is_power_of_two());
    let capacity = size
        .max(1)
        .checked_next_multiple_of(page_size)
        .ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::OutOfMemory, "requested size overflows")
        })?;
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            capacity,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | extra_flags,
            -1,
            0,
        )
    };
    if ptr.is_null() || ptr == libc::MAP_FAILED {
        return Err(std::io::Error::last_os_error());
    }
    Ok((ptr, capacity))
}

/// Parses the `Hugepagesize:    2048 kB` line of `/proc/meminfo`.
fn read_large_page_size() -> std::io::Result<usize> {
    let meminfo = std::fs::read_to_string("/proc/meminfo")?;
    meminfo
        .lines()
        .find_map(|line| line.strip_prefix("Hugepagesize:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse::<usize>().ok())
        .map(|kb| kb * 1024)
        .ok_or_else(|| std::io::Error::other("failed to read Hugepagesize"))
}

fn read_page_size() -> std::io::Result<usize> {
    let res = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if res <= 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(res as usize)
}
