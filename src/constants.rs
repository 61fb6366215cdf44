use std::fmt;

/*
 * Row Layout
 */
pub const ID_SIZE: usize = std::mem::size_of::<u32>();
pub const USERNAME_SIZE: usize = std::mem::size_of::<[u8; 32]>();
pub const EMAIL_SIZE: usize = std::mem::size_of::<[u8; 255]>();
pub const ID_OFFSET: usize = 0;
pub const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
pub const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

pub const PAGE_SIZE: usize = 4096;

/*
 * Common Node Header Layout
 */
pub const NODE_TYPE_SIZE: usize = std::mem::size_of::<u8>();
pub const NODE_TYPE_OFFSET: usize = 0;
pub const IS_ROOT_SIZE: usize = std::mem::size_of::<u8>();
pub const IS_ROOT_OFFSET: usize = NODE_TYPE_OFFSET + NODE_TYPE_SIZE;
pub const PARENT_POINTER_SIZE: usize = std::mem::size_of::<u32>();
pub const PARENT_POINTER_OFFSET: usize = IS_ROOT_OFFSET + IS_ROOT_SIZE;
pub const COMMON_NODE_HEADER_SIZE: usize = NODE_TYPE_SIZE + IS_ROOT_SIZE + PARENT_POINTER_SIZE;

/*
 * Leaf Node Header Layout
 */
pub const LEAF_NODE_NUM_CELLS_SIZE: usize = std::mem::size_of::<u32>();
pub const LEAF_NODE_NUM_CELLS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
pub const LEAF_NODE_HEADER_SIZE: usize = COMMON_NODE_HEADER_SIZE + LEAF_NODE_NUM_CELLS_SIZE;

/*
 * Leaf Node Body Layout
 */
pub const LEAF_NODE_KEY_SIZE: usize = std::mem::size_of::<u32>();
pub const LEAF_NODE_KEY_OFFSET: usize = 0;
pub const LEAF_NODE_VALUE_SIZE: usize = ROW_SIZE;
pub const LEAF_NODE_VALUE_OFFSET: usize = LEAF_NODE_KEY_OFFSET + LEAF_NODE_KEY_SIZE;
pub const LEAF_NODE_CELL_SIZE: usize = LEAF_NODE_KEY_SIZE + LEAF_NODE_VALUE_SIZE;
pub const LEAF_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - LEAF_NODE_HEADER_SIZE;
pub const LEAF_NODE_MAX_CELLS: usize = LEAF_NODE_SPACE_FOR_CELLS / LEAF_NODE_CELL_SIZE;

/// Snapshot of the fixed layout, printed by the `.constants` meta command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConstants {
    pub row_size: usize,
    pub common_node_header_size: usize,
    pub leaf_node_header_size: usize,
    pub leaf_node_cell_size: usize,
    pub leaf_node_space_for_cells: usize,
    pub leaf_node_max_cells: usize,
}

pub fn layout_constants() -> LayoutConstants {
    LayoutConstants {
        row_size: ROW_SIZE,
        common_node_header_size: COMMON_NODE_HEADER_SIZE,
        leaf_node_header_size: LEAF_NODE_HEADER_SIZE,
        leaf_node_cell_size: LEAF_NODE_CELL_SIZE,
        leaf_node_space_for_cells: LEAF_NODE_SPACE_FOR_CELLS,
        leaf_node_max_cells: LEAF_NODE_MAX_CELLS,
    }
}

impl fmt::Display for LayoutConstants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ROW_SIZE: {}", self.row_size)?;
        writeln!(f, "COMMON_NODE_HEADER_SIZE: {}", self.common_node_header_size)?;
        writeln!(f, "LEAF_NODE_HEADER_SIZE: {}", self.leaf_node_header_size)?;
        writeln!(f, "LEAF_NODE_CELL_SIZE: {}", self.leaf_node_cell_size)?;
        writeln!(f, "LEAF_NODE_SPACE_FOR_CELLS: {}", self.leaf_node_space_for_cells)?;
        write!(f, "LEAF_NODE_MAX_CELLS: {}", self.leaf_node_max_cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_layout_has_no_padding() {
        assert_eq!(ROW_SIZE, 291);
        assert_eq!(USERNAME_OFFSET, 4);
        assert_eq!(EMAIL_OFFSET, 36);
        assert_eq!(EMAIL_OFFSET + EMAIL_SIZE, ROW_SIZE);
    }

    #[test]
    fn leaf_geometry_fits_page() {
        assert_eq!(COMMON_NODE_HEADER_SIZE, 6);
        assert_eq!(LEAF_NODE_HEADER_SIZE, 10);
        assert_eq!(LEAF_NODE_CELL_SIZE, 295);
        assert_eq!(LEAF_NODE_MAX_CELLS, 13);

        let used = LEAF_NODE_HEADER_SIZE + LEAF_NODE_MAX_CELLS * LEAF_NODE_CELL_SIZE;
        assert!(used <= PAGE_SIZE);
        assert!(PAGE_SIZE < used + LEAF_NODE_CELL_SIZE);
    }

    #[test]
    fn constants_display_matches_meta_command() {
        let printed = layout_constants().to_string();
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(
            lines,
            vec![
                "ROW_SIZE: 291",
                "COMMON_NODE_HEADER_SIZE: 6",
                "LEAF_NODE_HEADER_SIZE: 10",
                "LEAF_NODE_CELL_SIZE: 295",
                "LEAF_NODE_SPACE_FOR_CELLS: 4086",
                "LEAF_NODE_MAX_CELLS: 13",
            ]
        );
    }
}
