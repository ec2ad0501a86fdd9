pub mod page_region;

#[cfg_attr(target_os = "linux", path = "mmap_linux.rs")]
#[cfg_attr(not(target_os = "linux"), path = "mmap_fallback.rs")]
pub mod mmap;

pub use page_region::{PageKind, PageRegion};
