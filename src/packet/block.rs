use crate::types::BlockId;

/// Orders two optional block ids treating an absent id as infinity.
///
/// # Returns
/// The smallest present id, or `None` if both are absent.
pub fn earliest(a: Option<BlockId>, b: Option<BlockId>) -> Option<BlockId> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// A fixed length slice of the gradient, tagged with its position and the next
/// nonzero block of its fusion column.
///
/// A block is either valid, with an id and a payload a receiver may consume,
/// or invalid, with neither an id nor a next pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    id: Option<BlockId>,
    next: Option<BlockId>,
    data: Box<[f32]>,
}

impl Block {
    /// Creates a new invalid `Block` with a zeroed payload.
    ///
    /// # Arguments
    /// * `block_size` - The amount of elements in the payload.
    pub fn new(block_size: usize) -> Self {
        Self {
            id: None,
            next: None,
            data: vec![0.; block_size].into_boxed_slice(),
        }
    }

    pub fn id(&self) -> Option<BlockId> {
        self.id
    }

    pub fn next(&self) -> Option<BlockId> {
        self.next
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn is_valid(&self) -> bool {
        self.id.is_some()
    }

    /// Turns this block into block `id` holding a copy of `src`.
    ///
    /// # Arguments
    /// * `id` - The id of the block being carried.
    /// * `next` - The next nonzero block in the same column.
    /// * `src` - The payload, must be exactly one block long.
    ///
    /// # Panics
    /// If `src` isn't the same size as the block.
    pub fn fill(&mut self, id: BlockId, next: Option<BlockId>, src: &[f32]) {
        self.id = Some(id);
        self.next = next;
        self.data.copy_from_slice(src);
    }

    /// Marks this block as carrying block `id` without touching its payload.
    pub(crate) fn claim(&mut self, id: BlockId) {
        self.id = Some(id);
    }

    /// Sets the next pointer of a valid block.
    pub(crate) fn set_next(&mut self, next: Option<BlockId>) {
        if self.is_valid() {
            self.next = next;
        }
    }

    /// Adds `src` element-wise into the payload.
    ///
    /// # Panics
    /// If `src` isn't the same size as the block.
    pub(crate) fn accumulate(&mut self, src: &[f32]) {
        assert_eq!(self.data.len(), src.len(), "block size mismatch");

        self.data
            .iter_mut()
            .zip(src)
            .for_each(|(acc, x)| *acc += x);
    }

    /// Makes the block invalid, its stale payload is left behind.
    pub fn invalidate(&mut self) {
        self.id = None;
        self.next = None;
    }

    /// Makes the block invalid and zeroes its payload.
    pub fn clear(&mut self) {
        self.invalidate();
        self.data.fill(0.);
    }

    /// Overwrites this block with `other` reusing the payload allocation.
    pub(crate) fn copy_from(&mut self, other: &Block) {
        self.id = other.id;
        self.next = other.next;
        self.data.copy_from_slice(&other.data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earliest_treats_absent_as_infinity() {
        assert_eq!(earliest(Some(3), Some(1)), Some(1));
        assert_eq!(earliest(Some(3), None), Some(3));
        assert_eq!(earliest(None, Some(7)), Some(7));
        assert_eq!(earliest(None, None), None);
    }

    #[test]
    fn invalidate_drops_id_and_next() {
        let mut block = Block::new(2);
        block.fill(4, Some(6), &[1., 2.]);
        assert!(block.is_valid());

        block.invalidate();
        assert!(!block.is_valid());
        assert_eq!(block.next(), None);
        assert_eq!(block.data(), [1., 2.]);

        block.clear();
        assert_eq!(block.data(), [0., 0.]);
    }

    #[test]
    fn next_is_only_set_on_valid_blocks() {
        let mut block = Block::new(1);
        block.set_next(Some(3));
        assert_eq!(block.next(), None);

        block.claim(1);
        block.set_next(Some(3));
        assert_eq!(block.next(), Some(3));
    }

    #[test]
    fn accumulate_adds_elementwise() {
        let mut block = Block::new(3);
        block.accumulate(&[1., 2., 3.]);
        block.accumulate(&[1., 1., 1.]);

        assert_eq!(block.data(), [2., 3., 4.]);
    }
}
