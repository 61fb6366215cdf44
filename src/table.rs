use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::btree::LeafNode;
use crate::config::TableConfig;
use crate::constants::*;
use crate::pager::{Pager, PagerError};
use crate::row::{deserialize_row, serialize_row, Row};

/// A single table backed by one page file.
///
/// All rows live in the root leaf page. Dropping a table flushes its pages,
/// but only `close` reports a failed flush to the caller.
pub struct Table {
    pub root_page_num: u32,
    pager: Pager,
    sync_on_close: bool,
    closed: bool,
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Pager(#[from] PagerError),
    #[error("table full: leaf page already holds {max_cells} cells")]
    TableFull { max_cells: usize },
    #[error("duplicate key {key}")]
    DuplicateKey { key: u32 },
    #[error("cursor is past the end of the table")]
    EndOfTable,
    #[error("page {page_num} of {} claims {num_cells} cells (max {max_cells}), corrupt file", .path.display())]
    CorruptPage {
        path: PathBuf,
        page_num: u32,
        num_cells: u32,
        max_cells: usize,
    },
}

impl Table {
    pub fn open<P>(filename: P) -> Result<Self, TableError>
    where
        P: AsRef<Path>,
    {
        Self::open_with_config(filename, &TableConfig::default())
    }

    pub fn open_with_config<P>(filename: P, config: &TableConfig) -> Result<Self, TableError>
    where
        P: AsRef<Path>,
    {
        let mut pager = Pager::new(filename, config.max_pages)?;
        let root_page_num = 0;

        if pager.num_pages() == 0 {
            // new database file, page 0 becomes the root leaf
            let root = pager.get_page(root_page_num)?;
            let mut ln = LeafNode::new(&mut root.buffer[..]);
            ln.initialize();
            ln.set_root(true);
        } else {
            let root = pager.get_page(root_page_num)?;
            let num_cells = LeafNode::new(&root.buffer[..]).num_cells();
            if num_cells as usize > LEAF_NODE_MAX_CELLS {
                return Err(TableError::CorruptPage {
                    path: pager.path().to_path_buf(),
                    page_num: root_page_num,
                    num_cells,
                    max_cells: LEAF_NODE_MAX_CELLS,
                });
            }
        }

        info!(
            path = %pager.path().display(),
            num_pages = pager.num_pages(),
            "opened table"
        );

        Ok(Table {
            root_page_num,
            pager,
            sync_on_close: config.sync_on_close,
            closed: false,
        })
    }

    /// Flushes every cached page and releases the file.
    pub fn close(mut self) -> Result<(), TableError> {
        self.closed = true;
        self.pager.flush_all()?;
        if self.sync_on_close {
            self.pager.sync()?;
        }
        info!(path = %self.pager.path().display(), "closed table");
        Ok(())
    }

    fn root_num_cells(&mut self) -> Result<u32, TableError> {
        let page = self.pager.get_page(self.root_page_num)?;
        Ok(LeafNode::new(&page.buffer[..]).num_cells())
    }

    pub fn start(&mut self) -> Result<Cursor<'_>, TableError> {
        let page_num = self.root_page_num;
        let num_cells = self.root_num_cells()?;

        Ok(Cursor {
            table: self,
            page_num,
            cell_num: 0,
            end_of_table: num_cells == 0,
        })
    }

    pub fn end(&mut self) -> Result<Cursor<'_>, TableError> {
        let page_num = self.root_page_num;
        let num_cells = self.root_num_cells()?;

        Ok(Cursor {
            table: self,
            page_num,
            cell_num: num_cells,
            end_of_table: true,
        })
    }

    /// Positions a cursor at the first cell whose key is `>= key`, or at the
    /// end when every key is smaller.
    pub fn find(&mut self, key: u32) -> Result<Cursor<'_>, TableError> {
        let page_num = self.root_page_num;
        let page = self.pager.get_page(page_num)?;
        let ln = LeafNode::new(&page.buffer[..]);
        let num_cells = ln.num_cells();

        let mut lo = 0;
        let mut hi = num_cells;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if ln.key(mid as usize) < key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        Ok(Cursor {
            table: self,
            page_num,
            cell_num: lo,
            end_of_table: lo == num_cells,
        })
    }

    /// Appends `row` after the last cell, keyed by its id.
    ///
    /// Keys are not compared, so rows come back from `select` in insertion
    /// order.
    pub fn insert(&mut self, row: &Row) -> Result<(), TableError> {
        if self.root_num_cells()? as usize >= LEAF_NODE_MAX_CELLS {
            return Err(TableError::TableFull {
                max_cells: LEAF_NODE_MAX_CELLS,
            });
        }
        self.end()?.insert(row.id, row)
    }

    /// Inserts `row` at its key-ordered position, refusing an existing key.
    pub fn insert_sorted(&mut self, row: &Row) -> Result<(), TableError> {
        if self.root_num_cells()? as usize >= LEAF_NODE_MAX_CELLS {
            return Err(TableError::TableFull {
                max_cells: LEAF_NODE_MAX_CELLS,
            });
        }
        let mut cursor = self.find(row.id)?;
        if !cursor.end_of_table && cursor.key()? == row.id {
            return Err(TableError::DuplicateKey { key: row.id });
        }
        cursor.insert(row.id, row)
    }

    /// Rows of the root leaf in cell order.
    pub fn select(&mut self) -> Result<Rows<'_>, TableError> {
        Ok(Rows {
            cursor: self.start()?,
        })
    }

    pub fn leaf_summary(&mut self) -> Result<LeafSummary, TableError> {
        let page = self.pager.get_page(self.root_page_num)?;
        let ln = LeafNode::new(&page.buffer[..]);
        let num_cells = ln.num_cells();
        let keys = (0..num_cells).map(|i| (i, ln.key(i as usize))).collect();
        Ok(LeafSummary { num_cells, keys })
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.pager.flush_all() {
            error!(
                path = %self.pager.path().display(),
                "dropping table failed to flush pages to disk: {e}"
            );
        }
    }
}

/// Position inside one page of a table.
pub struct Cursor<'table> {
    table: &'table mut Table,
    page_num: u32,
    cell_num: u32,
    pub end_of_table: bool,
}

impl Cursor<'_> {
    pub fn cell_num(&self) -> u32 {
        self.cell_num
    }

    pub fn key(&mut self) -> Result<u32, TableError> {
        if self.end_of_table {
            return Err(TableError::EndOfTable);
        }
        let page = self.table.pager.get_page(self.page_num)?;
        Ok(LeafNode::new(&page.buffer[..]).key(self.cell_num as usize))
    }

    /// Serialized row bytes of the current cell.
    pub fn value(&mut self) -> Result<&[u8], TableError> {
        if self.end_of_table {
            return Err(TableError::EndOfTable);
        }
        let page = self.table.pager.get_page(self.page_num)?;
        Ok(LeafNode::new(&page.buffer[..]).into_value(self.cell_num as usize))
    }

    pub fn advance(&mut self) -> Result<(), TableError> {
        if self.end_of_table {
            return Err(TableError::EndOfTable);
        }
        let page = self.table.pager.get_page(self.page_num)?;
        let num_cells = LeafNode::new(&page.buffer[..]).num_cells();
        self.cell_num += 1;
        if self.cell_num >= num_cells {
            self.end_of_table = true;
        }
        Ok(())
    }

    /// Writes `(key, row)` at the cursor, shifting later cells one slot right.
    ///
    /// Leaves the cursor on the new cell.
    pub fn insert(&mut self, key: u32, row: &Row) -> Result<(), TableError> {
        let page = self.table.pager.get_page(self.page_num)?;
        let mut ln = LeafNode::new(&mut page.buffer[..]);

        let num_cells = ln.num_cells() as usize;
        if num_cells >= LEAF_NODE_MAX_CELLS {
            return Err(TableError::TableFull {
                max_cells: LEAF_NODE_MAX_CELLS,
            });
        }

        let cell_num = self.cell_num as usize;
        // highest index first so no cell is overwritten before it moves
        for i in (cell_num + 1..=num_cells).rev() {
            ln.copy_cell(i - 1, i);
        }

        ln.set_key(cell_num, key);
        serialize_row(row, ln.value_mut(cell_num));
        ln.set_num_cells(num_cells as u32 + 1);
        self.end_of_table = false;

        debug!(page_num = self.page_num, cell_num, key, "inserted cell");
        Ok(())
    }
}

/// Forward-only scan produced by `Table::select`.
pub struct Rows<'table> {
    cursor: Cursor<'table>,
}

impl Iterator for Rows<'_> {
    type Item = Result<Row, TableError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.end_of_table {
            return None;
        }
        let row = match self.cursor.value() {
            Ok(bytes) => deserialize_row(bytes),
            Err(e) => {
                self.cursor.end_of_table = true;
                return Some(Err(e));
            }
        };
        if let Err(e) = self.cursor.advance() {
            self.cursor.end_of_table = true;
            return Some(Err(e));
        }
        Some(Ok(row))
    }
}

/// Cell count and `(index, key)` pairs of the root leaf, for `.btree`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafSummary {
    pub num_cells: u32,
    pub keys: Vec<(u32, u32)>,
}

impl fmt::Display for LeafSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "leaf (size {})", self.num_cells)?;
        for (i, key) in &self.keys {
            write!(f, "\n - {} : {}", i, key)?;
        }
        Ok(())
    }
}
