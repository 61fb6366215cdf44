//! A single-table record store kept in one leaf page of a paged file.
//!
//! Rows are `(id, username, email)` records serialized into fixed-width cells
//! of the root leaf page. The [`pager::Pager`] caches 4096-byte pages of the
//! data file, [`btree::LeafNode`] addresses the cells inside a page and
//! [`table::Cursor`] walks or inserts into them.

pub mod btree;
pub mod config;
pub mod constants;
pub mod pager;
pub mod row;
pub mod table;
pub mod virtual_machine;

pub use config::TableConfig;
pub use row::Row;
pub use table::{Table, TableError};
