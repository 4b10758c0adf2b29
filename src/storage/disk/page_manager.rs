use crate::catalog::TableId;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::PageId;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Block-level access to one table file: page `n` occupies bytes
/// `[n * page_size, (n + 1) * page_size)`.
#[derive(Debug)]
pub struct PageManager {
    file: File,
    page_size: usize,
}

impl PageManager {
    /// Creates (or truncates) the file at `path`.
    #[cfg(test)]
    pub fn create(path: &Path, page_size: usize) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Ok(Self { file, page_size })
    }

    /// Opens the file at `path`, creating an empty one if it does not exist.
    pub fn open(path: &Path, page_size: usize) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        Ok(Self { file, page_size })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Reads exactly one page into `buf`.
    pub fn read_page(&mut self, page_id: PageId, buf: &mut [u8]) -> StorageResult<()> {
        self.check_buffer(buf.len())?;

        let offset = self.page_offset(page_id);
        let file_size = self.file.metadata()?.len();
        if offset >= file_size {
            return Err(StorageError::PageNotFound {
                page_id,
                num_pages: self.num_pages()?,
            });
        }

        self.file.seek(SeekFrom::Start(offset))?;
        let mut read = 0;
        while read < buf.len() {
            match self.file.read(&mut buf[read..])? {
                0 => break,
                n => read += n,
            }
        }
        if read < buf.len() {
            return Err(StorageError::ShortRead {
                page_id,
                read,
                expected: buf.len(),
            });
        }

        Ok(())
    }

    /// Writes one page at its offset, growing the file when needed.
    pub fn write_page(&mut self, page_id: PageId, data: &[u8]) -> StorageResult<()> {
        self.check_buffer(data.len())?;

        let offset = self.page_offset(page_id);
        let file_size = self.file.metadata()?.len();
        if offset > file_size {
            self.file.set_len(offset)?;
        }

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(data)?;
        self.file.sync_data()?;

        Ok(())
    }

    /// Page count derived from the current file length; trailing bytes that
    /// do not fill a whole page are not counted.
    pub fn num_pages(&self) -> StorageResult<u32> {
        let file_size = self.file.metadata()?.len();
        Ok(file_size
            .checked_div(self.page_size as u64)
            .unwrap_or(0) as u32)
    }

    /// Appends a zero-filled page and returns its id.
    pub fn allocate_page(&mut self, table_id: TableId) -> StorageResult<PageId> {
        let page_id = PageId::new(table_id, self.num_pages()?);
        let zeros = vec![0u8; self.page_size];
        self.write_page(page_id, &zeros)?;
        Ok(page_id)
    }

    fn check_buffer(&self, len: usize) -> StorageResult<()> {
        if len != self.page_size {
            return Err(StorageError::InvalidBufferSize {
                expected: self.page_size,
                actual: len,
            });
        }
        Ok(())
    }

    fn page_offset(&self, page_id: PageId) -> u64 {
        page_id.page_number as u64 * self.page_size as u64
    }
}
