//! Handles for documents owned by the coordinator.

use std::fmt;

/// Index of a resolved document in the coordinator's arena.
///
/// Handles are only minted when a document is installed, so every
/// `DocumentId` a coordinator hands out stays valid for its lifetime.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct DocumentId(u32);

impl DocumentId {
    /// # Panics
    ///
    /// If `index` does not fit in a `u32`.
    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "document arena exceeds u32::MAX entries");
        Self(index as u32)
    }

    /// Position in the arena (also the installation order).
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_index() {
        let id = DocumentId::from_index(7);
        assert_eq!(id.index(), 7);
        assert_eq!(id.to_string(), "doc#7");
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    #[should_panic(expected = "document arena exceeds u32::MAX entries")]
    fn test_document_id_rejects_oversized_index() {
        DocumentId::from_index(u32::MAX as usize + 1);
    }

    #[test]
    fn test_document_id_size() {
        assert_eq!(std::mem::size_of::<DocumentId>(), 4);
    }
}
