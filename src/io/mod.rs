mod local;

pub use local::LocalFileReader;

/// Trait for random access reading from an archive source.
///
/// The ZIP parser walks an archive back to front, so it needs positioned
/// reads rather than a sequential stream.
pub trait ReadAt {
    /// Fill `buf` with the bytes starting at `offset`.
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<()>;

    /// Total size of the data source in bytes.
    fn size(&self) -> u64;
}

/// In-memory archives, used by tests and callers that already hold the
/// whole file.
impl ReadAt for Vec<u8> {
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<()> {
        let start = usize::try_from(offset).map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "offset overflow")
        })?;
        let end = start
            .checked_add(buf.len())
            .filter(|&end| end <= self.len())
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "read past end of buffer")
            })?;
        buf.copy_from_slice(&self[start..end]);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.len() as u64
    }
}
