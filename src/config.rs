/// Options applied when a table file is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    /// Highest number of pages the cache may hold. `None` leaves the cache
    /// unbounded; pages are never evicted either way.
    pub max_pages: Option<u32>,
    /// Fsync the data file after the final flush on close.
    pub sync_on_close: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_pages: None,
            sync_on_close: true,
        }
    }
}

impl TableConfig {
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn with_sync_on_close(mut self, sync_on_close: bool) -> Self {
        self.sync_on_close = sync_on_close;
        self
    }
}
