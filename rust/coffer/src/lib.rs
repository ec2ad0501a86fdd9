//! Bounded sequential access to raw memory ranges.
//!
//! - [`BoundedRange`]: read/write/seek cursor over an externally owned range, with
//!   end-of-range signaling and no access outside `[base, end]`.
//! - [`OwningRange`]: the same cursor over pages it allocated, released exactly once
//!   on `close()`.
//!
//! Both types also implement `std::io::{Read, Write, Seek}`.

pub mod bounded;
pub mod copy;
pub mod io_adapter;
pub mod owning;
pub mod whence;

pub use bounded::BoundedRange;
pub use coffer_common::{Result, error::Error, error::ErrorKind};
pub use coffer_page_alloc::PageKind;
pub use copy::Transfer;
pub use owning::{AllocOptions, OwningRange};
pub use whence::Whence;
