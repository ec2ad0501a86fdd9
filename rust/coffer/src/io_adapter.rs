//! `std::io::{Read, Write, Seek}` for [`BoundedRange`] and [`OwningRange`].
//!
//! End-of-range becomes the usual `Ok(0)`, and empty buffers are accepted as no-ops.
//! `SeekFrom::End(n)` is anchored one past the last byte, as `std::io` expects, and is
//! translated to `Whence::End` (anchored at the last byte) with `n + 1`.
//! `SeekFrom::Current(0)` is a position query: it reports `tell()` without moving the
//! cursor or clearing end-of-range.

use std::io::SeekFrom;

use crate::{BoundedRange, OwningRange, Whence};

fn read_into(range: &mut BoundedRange<'_>, buf: &mut [u8]) -> std::io::Result<usize> {
    if buf.is_empty() {
        return Ok(0);
    }
    match range.read(buf) {
        Ok(transfer) => Ok(transfer.len),
        Err(e) if e.is_end_of_range() => Ok(0),
        Err(e) => Err(e.into()),
    }
}

fn write_from(range: &mut BoundedRange<'_>, buf: &[u8]) -> std::io::Result<usize> {
    if buf.is_empty() {
        return Ok(0);
    }
    match range.write(buf) {
        Ok(transfer) => Ok(transfer.len),
        Err(e) if e.is_end_of_range() => Ok(0),
        Err(e) => Err(e.into()),
    }
}

fn seek_to(range: &mut BoundedRange<'_>, pos: SeekFrom) -> std::io::Result<u64> {
    if pos == SeekFrom::Current(0) {
        return Ok(range.tell() as u64);
    }
    let (whence, offset) = match pos {
        SeekFrom::Start(offset) => (
            Whence::Start,
            i64::try_from(offset).map_err(|_| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "seek offset too large")
            })?,
        ),
        SeekFrom::Current(offset) => (Whence::Current, offset),
        SeekFrom::End(offset) => (
            Whence::End,
            offset.checked_add(1).ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "seek offset too large")
            })?,
        ),
    };
    Ok(range.seek(whence, offset)? as u64)
}

impl std::io::Read for BoundedRange<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        read_into(self, buf)
    }
}

impl std::io::Write for BoundedRange<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        write_from(self, buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl std::io::Seek for BoundedRange<'_> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        seek_to(self, pos)
    }

    fn stream_position(&mut self) -> std::io::Result<u64> {
        Ok(self.tell() as u64)
    }
}

impl std::io::Read for OwningRange {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        read_into(self.range_mut(), buf)
    }
}

impl std::io::Write for OwningRange {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        write_from(self.range_mut(), buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl std::io::Seek for OwningRange {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        seek_to(self.range_mut(), pos)
    }

    fn stream_position(&mut self) -> std::io::Result<u64> {
        Ok(self.tell() as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Seek, SeekFrom, Write};

    use crate::{BoundedRange, OwningRange};

    #[test]
    fn test_std_read_to_end() {
        let mut buf = *b"Hello, World!";
        let mut range = BoundedRange::new(&mut buf).unwrap();
        let mut out = Vec::new();
        range.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"Hello, World!");
        assert!(range.is_eof());

        let mut small = [0u8; 4];
        assert_eq!(Read::read(&mut range, &mut small).unwrap(), 0);
        assert_eq!(Read::read(&mut range, &mut []).unwrap(), 0);
    }

    #[test]
    fn test_std_write_all_overflow() {
        let mut buf = [0u8; 4];
        let mut range = BoundedRange::new(&mut buf).unwrap();
        range.write_all(b"ab").unwrap();
        let err = range.write_all(b"cdef").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::WriteZero);
        range.flush().unwrap();
        drop(range);
        assert_eq!(&buf, b"abcd");
    }

    #[test]
    fn test_std_seek() {
        let mut buf = *b"0123456789";
        let mut range = BoundedRange::new(&mut buf).unwrap();

        assert_eq!(Seek::seek(&mut range, SeekFrom::Start(3)).unwrap(), 3);
        assert_eq!(Seek::seek(&mut range, SeekFrom::Current(2)).unwrap(), 5);
        assert_eq!(Seek::seek(&mut range, SeekFrom::End(-1)).unwrap(), 9);
        assert_eq!(range.stream_position().unwrap(), 9);

        let err = Seek::seek(&mut range, SeekFrom::End(0)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        let err = Seek::seek(&mut range, SeekFrom::Start(u64::MAX)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        assert_eq!(range.stream_position().unwrap(), 9);

        range.rewind().unwrap();
        let mut out = [0u8; 3];
        range.read_exact(&mut out).unwrap();
        assert_eq!(&out, b"012");
    }

    #[test]
    fn test_std_position_query_at_end_of_range() {
        let mut buf = *b"abcd";
        let mut range = BoundedRange::new(&mut buf).unwrap();
        let mut out = Vec::new();
        range.read_to_end(&mut out).unwrap();
        assert!(range.is_eof());

        let pos = Seek::seek(&mut range, SeekFrom::Current(0)).unwrap();
        assert_eq!(pos, range.stream_position().unwrap());
        assert_eq!(pos, 4);
        assert!(range.is_eof());
        assert_eq!(Read::read(&mut range, &mut [0u8; 2]).unwrap(), 0);

        // Any other relative seek still goes through the bounds check.
        let err = Seek::seek(&mut range, SeekFrom::Current(1)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        assert_eq!(Seek::seek(&mut range, SeekFrom::Current(-1)).unwrap(), 3);
        assert!(!range.is_eof());
    }

    #[test]
    fn test_std_io_on_owning_range() {
        let mut range = OwningRange::allocate(8).unwrap();
        range.write_all(b"coffer!!").unwrap();
        range.rewind().unwrap();
        let mut out = String::new();
        range.read_to_string(&mut out).unwrap();
        assert_eq!(out, "coffer!!");
        assert_eq!(range.stream_position().unwrap(), 8);
        range.close().unwrap();

        let mut dst = [0u8; 2];
        assert_eq!(Read::read(&mut range, &mut dst).unwrap(), 0);
        let err = Seek::seek(&mut range, SeekFrom::Start(0)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}
