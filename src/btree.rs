use crate::constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    Internal = 0,
    Leaf = 1,
}

impl NodeType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(NodeType::Internal),
            1 => Some(NodeType::Leaf),
            _ => None,
        }
    }
}

/// Byte-level view of a leaf page.
///
/// Offsets come straight from `constants`; nothing here checks a cell index
/// against the live cell count. Read accessors work over any byte buffer,
/// writers need a mutable one.
pub struct LeafNode<B> {
    buffer: B,
}

impl<B> LeafNode<B> {
    pub fn new(buffer: B) -> Self {
        LeafNode { buffer }
    }
}

fn cell_offset(cell_num: usize) -> usize {
    LEAF_NODE_HEADER_SIZE + cell_num * LEAF_NODE_CELL_SIZE
}

fn read_u32(buffer: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buffer[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

fn write_u32(buffer: &mut [u8], offset: usize, value: u32) {
    buffer[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

impl<B: AsRef<[u8]>> LeafNode<B> {
    pub fn node_type(&self) -> Option<NodeType> {
        NodeType::from_tag(self.buffer.as_ref()[NODE_TYPE_OFFSET])
    }

    pub fn is_root(&self) -> bool {
        self.buffer.as_ref()[IS_ROOT_OFFSET] != 0
    }

    pub fn parent(&self) -> u32 {
        read_u32(self.buffer.as_ref(), PARENT_POINTER_OFFSET)
    }

    pub fn num_cells(&self) -> u32 {
        read_u32(self.buffer.as_ref(), LEAF_NODE_NUM_CELLS_OFFSET)
    }

    pub fn cell(&self, cell_num: usize) -> &[u8] {
        let offset = cell_offset(cell_num);
        &self.buffer.as_ref()[offset..offset + LEAF_NODE_CELL_SIZE]
    }

    pub fn key(&self, cell_num: usize) -> u32 {
        read_u32(self.cell(cell_num), LEAF_NODE_KEY_OFFSET)
    }

    pub fn value(&self, cell_num: usize) -> &[u8] {
        &self.cell(cell_num)[LEAF_NODE_VALUE_OFFSET..]
    }
}

impl<'a> LeafNode<&'a [u8]> {
    /// Like `value`, but borrows from the underlying buffer rather than the
    /// view.
    pub fn into_value(self, cell_num: usize) -> &'a [u8] {
        let offset = cell_offset(cell_num) + LEAF_NODE_VALUE_OFFSET;
        &self.buffer[offset..offset + LEAF_NODE_VALUE_SIZE]
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> LeafNode<B> {
    /// Marks the page as an empty leaf.
    pub fn initialize(&mut self) {
        self.set_node_type(NodeType::Leaf);
        self.set_num_cells(0);
    }

    pub fn set_node_type(&mut self, node_type: NodeType) {
        self.buffer.as_mut()[NODE_TYPE_OFFSET] = node_type as u8;
    }

    pub fn set_root(&mut self, is_root: bool) {
        self.buffer.as_mut()[IS_ROOT_OFFSET] = u8::from(is_root);
    }

    pub fn set_parent(&mut self, page_num: u32) {
        write_u32(self.buffer.as_mut(), PARENT_POINTER_OFFSET, page_num);
    }

    pub fn set_num_cells(&mut self, num_cells: u32) {
        write_u32(self.buffer.as_mut(), LEAF_NODE_NUM_CELLS_OFFSET, num_cells);
    }

    pub fn cell_mut(&mut self, cell_num: usize) -> &mut [u8] {
        let offset = cell_offset(cell_num);
        &mut self.buffer.as_mut()[offset..offset + LEAF_NODE_CELL_SIZE]
    }

    pub fn set_key(&mut self, cell_num: usize, key: u32) {
        write_u32(self.cell_mut(cell_num), LEAF_NODE_KEY_OFFSET, key);
    }

    pub fn value_mut(&mut self, cell_num: usize) -> &mut [u8] {
        &mut self.cell_mut(cell_num)[LEAF_NODE_VALUE_OFFSET..]
    }

    /// Copies a whole cell over another slot.
    pub fn copy_cell(&mut self, from: usize, to: usize) {
        let src = cell_offset(from);
        self.buffer
            .as_mut()
            .copy_within(src..src + LEAF_NODE_CELL_SIZE, cell_offset(to));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_marks_empty_leaf() {
        let mut buffer = [0xaau8; PAGE_SIZE];
        let mut ln = LeafNode::new(&mut buffer[..]);
        ln.initialize();

        assert_eq!(ln.node_type(), Some(NodeType::Leaf));
        assert_eq!(ln.num_cells(), 0);
        assert_eq!(buffer[NODE_TYPE_OFFSET], 1);
        assert_eq!(&buffer[LEAF_NODE_NUM_CELLS_OFFSET..LEAF_NODE_HEADER_SIZE], &[0, 0, 0, 0]);
    }

    #[test]
    fn header_fields_live_at_fixed_offsets() {
        let mut buffer = [0u8; PAGE_SIZE];
        {
            let mut ln = LeafNode::new(&mut buffer[..]);
            ln.set_root(true);
            ln.set_parent(9);
            ln.set_num_cells(3);
        }
        assert_eq!(buffer[IS_ROOT_OFFSET], 1);
        assert_eq!(&buffer[PARENT_POINTER_OFFSET..PARENT_POINTER_OFFSET + 4], &9u32.to_le_bytes());
        assert_eq!(&buffer[LEAF_NODE_NUM_CELLS_OFFSET..LEAF_NODE_HEADER_SIZE], &3u32.to_le_bytes());

        let ln = LeafNode::new(&buffer[..]);
        assert!(ln.is_root());
        assert_eq!(ln.parent(), 9);
        assert_eq!(ln.num_cells(), 3);
    }

    #[test]
    fn cells_are_packed_after_header() {
        let mut buffer = [0u8; PAGE_SIZE];
        let mut ln = LeafNode::new(&mut buffer[..]);
        ln.set_key(2, 42);
        ln.value_mut(2)[0] = 0x7f;

        let start = LEAF_NODE_HEADER_SIZE + 2 * LEAF_NODE_CELL_SIZE;
        assert_eq!(ln.key(2), 42);
        assert_eq!(ln.value(2).len(), ROW_SIZE);
        assert_eq!(&buffer[start..start + 4], &42u32.to_le_bytes());
        assert_eq!(buffer[start + LEAF_NODE_KEY_SIZE], 0x7f);
    }

    #[test]
    fn into_value_matches_value() {
        let mut buffer = [0u8; PAGE_SIZE];
        LeafNode::new(&mut buffer[..]).value_mut(1).fill(9);

        let ln = LeafNode::new(&buffer[..]);
        assert_eq!(ln.value(1), &[9u8; ROW_SIZE][..]);
        let value = LeafNode::new(&buffer[..]).into_value(1);
        assert_eq!(value, ln.value(1));
        assert_eq!(value.len(), LEAF_NODE_VALUE_SIZE);
    }

    #[test]
    fn last_cell_ends_inside_page() {
        let mut buffer = [0u8; PAGE_SIZE];
        let mut ln = LeafNode::new(&mut buffer[..]);
        let last = LEAF_NODE_MAX_CELLS - 1;
        ln.set_key(last, u32::MAX);
        assert_eq!(ln.key(last), u32::MAX);
        assert_eq!(ln.cell(last).len(), LEAF_NODE_CELL_SIZE);
    }

    #[test]
    fn copy_cell_moves_key_and_value() {
        let mut buffer = [0u8; PAGE_SIZE];
        let mut ln = LeafNode::new(&mut buffer[..]);
        ln.set_key(0, 5);
        ln.value_mut(0).fill(3);
        ln.copy_cell(0, 1);

        assert_eq!(ln.key(1), 5);
        assert!(ln.value(1).iter().all(|&b| b == 3));
    }
}
