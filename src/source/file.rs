use std::{
    fs::File,
    io::{Read, Seek, SeekFrom},
    path::Path,
};

use super::{ByteSource, check_range};
use crate::reader::{ReadResult, ReaderError, ReaderErrorKind};

/// A file on disk, read by seeking to each requested offset.
///
/// The length is taken once when the file is opened.
#[derive(Debug)]
pub struct FileSource {
    file: File,
    len: usize,
}

impl FileSource {
    /// Open `path` for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> ReadResult<Self> {
        let file = File::open(path).map_err(|e| ReaderError::new(0, ReaderErrorKind::Io(e)))?;
        Self::from_file(file)
    }

    /// Use an already opened file.
    pub fn from_file(file: File) -> ReadResult<Self> {
        let len = file
            .metadata()
            .map_err(|e| ReaderError::new(0, ReaderErrorKind::Io(e)))?
            .len() as usize;
        Ok(Self { file, len })
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> usize {
        self.len
    }

    fn read_at(&mut self, offset: usize, buf: &mut [u8]) -> ReadResult<()> {
        check_range(offset, buf.len(), self.len)?;
        self.file
            .seek(SeekFrom::Start(offset as u64))
            .and_then(|_| self.file.read_exact(buf))
            .map_err(|e| ReaderError::new(offset, ReaderErrorKind::Io(e)))
    }
}
