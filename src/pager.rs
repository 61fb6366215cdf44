use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::constants::*;

#[derive(Debug)]
pub struct Page {
    pub buffer: [u8; PAGE_SIZE],
}

impl Page {
    fn zeroed() -> Box<Self> {
        Box::new(Page {
            buffer: [0u8; PAGE_SIZE],
        })
    }
}

/// Page cache over a single data file.
///
/// Page `n` lives at byte offset `n * PAGE_SIZE`. Pages are loaded lazily and
/// stay cached until the pager is dropped; nothing is written back until
/// `flush` is called.
pub struct Pager {
    file: File,
    path: PathBuf,
    file_length: u64,
    num_pages: u32,
    max_pages: Option<u32>,
    pages: HashMap<u32, Box<Page>>,
}

#[derive(Debug, Error)]
pub enum PagerError {
    #[error("unable to open {}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("{} is not a whole number of pages ({file_length} bytes), corrupt file", .path.display())]
    CorruptFile { path: PathBuf, file_length: u64 },
    #[error("attempted fetch on out-of-bounds page number {page_num} (max {max_pages})")]
    PageOutOfBounds { page_num: u32, max_pages: u32 },
    #[error("error seeking to page {page_num} of {}", .path.display())]
    Seek {
        path: PathBuf,
        page_num: u32,
        source: io::Error,
    },
    #[error("error reading page {page_num} of {}", .path.display())]
    Read {
        path: PathBuf,
        page_num: u32,
        source: io::Error,
    },
    #[error("error writing page {page_num} of {}", .path.display())]
    Write {
        path: PathBuf,
        page_num: u32,
        source: io::Error,
    },
    #[error("error syncing {}", .path.display())]
    Sync { path: PathBuf, source: io::Error },
    #[error("tried to flush page {page_num}, which was never loaded")]
    PageNotCached { page_num: u32 },
}

impl Pager {
    pub fn new<P>(filename: P, max_pages: Option<u32>) -> Result<Self, PagerError>
    where
        P: AsRef<Path>,
    {
        let path = filename.as_ref().to_path_buf();
        let (file, file_length) = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .and_then(|mut file| file.seek(SeekFrom::End(0)).map(|len| (file, len)))
            .map_err(|source| PagerError::Open {
                path: path.clone(),
                source,
            })?;

        if file_length % PAGE_SIZE as u64 != 0 {
            return Err(PagerError::CorruptFile { path, file_length });
        }

        let num_pages = (file_length / PAGE_SIZE as u64) as u32;
        debug!(path = %path.display(), file_length, num_pages, "opened pager");

        Ok(Pager {
            file,
            path,
            file_length,
            num_pages,
            max_pages,
            pages: HashMap::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pages known to the pager, on disk or materialized since.
    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    pub fn is_cached(&self, page_num: u32) -> bool {
        self.pages.contains_key(&page_num)
    }

    pub fn get_page(&mut self, page_num: u32) -> Result<&mut Page, PagerError> {
        // the page count must stay representable, so u32::MAX is never a page
        let max_pages = self.max_pages.unwrap_or(u32::MAX);
        if page_num >= max_pages {
            return Err(PagerError::PageOutOfBounds {
                page_num,
                max_pages,
            });
        }

        match self.pages.entry(page_num) {
            Entry::Occupied(o) => Ok(&mut **o.into_mut()),
            Entry::Vacant(v) => {
                let mut page = Page::zeroed();

                // pages past the end of the file have never been flushed,
                // so a zeroed buffer is their whole content
                let pages_on_disk = self.file_length / PAGE_SIZE as u64;
                if (page_num as u64) < pages_on_disk {
                    debug!(page_num, "loading page from disk");
                    self.file
                        .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))
                        .map_err(|source| PagerError::Seek {
                            path: self.path.clone(),
                            page_num,
                            source,
                        })?;
                    // a partial page is an error, the format has no short pages
                    self.file
                        .read_exact(&mut page.buffer)
                        .map_err(|source| PagerError::Read {
                            path: self.path.clone(),
                            page_num,
                            source,
                        })?;
                }

                if page_num >= self.num_pages {
                    self.num_pages = page_num + 1;
                }

                Ok(&mut **v.insert(page))
            }
        }
    }

    /// Writes a cached page back to its slot in the file.
    pub fn flush(&mut self, page_num: u32) -> Result<(), PagerError> {
        let page = self
            .pages
            .get(&page_num)
            .ok_or(PagerError::PageNotCached { page_num })?;

        self.file
            .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))
            .map_err(|source| PagerError::Seek {
                path: self.path.clone(),
                page_num,
                source,
            })?;
        self.file
            .write_all(&page.buffer)
            .map_err(|source| PagerError::Write {
                path: self.path.clone(),
                page_num,
                source,
            })?;

        let end = (page_num as u64 + 1) * PAGE_SIZE as u64;
        self.file_length = self.file_length.max(end);
        debug!(page_num, "flushed page");
        Ok(())
    }

    /// Flushes every materialized page in page-number order.
    pub fn flush_all(&mut self) -> Result<(), PagerError> {
        for page_num in 0..self.num_pages {
            if self.pages.contains_key(&page_num) {
                self.flush(page_num)?;
            }
        }
        Ok(())
    }

    pub fn sync(&mut self) -> Result<(), PagerError> {
        self.file.sync_all().map_err(|source| PagerError::Sync {
            path: self.path.clone(),
            source,
        })
    }
}
