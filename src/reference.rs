use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Random access to reference bases.
pub trait ReferenceSource: Send + Sync + Debug {
    /// Base at a 1-based position, upper-cased; `None` outside the sequence.
    fn base(&self, contig: &str, position: u32) -> Option<u8>;
}

/// Reference held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReference {
    sequences: HashMap<Arc<str>, Arc<[u8]>>,
}

impl InMemoryReference {
    /// Empty reference; every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a sequence.
    pub fn insert(&mut self, name: impl Into<Arc<str>>, bases: impl Into<Arc<[u8]>>) {
        self.sequences.insert(name.into(), bases.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_sequence(mut self, name: impl Into<Arc<str>>, bases: impl Into<Arc<[u8]>>) -> Self {
        self.insert(name, bases);
        self
    }

    /// Number of sequences.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Whether no sequence is loaded.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

impl ReferenceSource for InMemoryReference {
    fn base(&self, contig: &str, position: u32) -> Option<u8> {
        let bases = self.sequences.get(contig)?;
        let idx = (position as usize).checked_sub(1)?;
        bases.get(idx).map(u8::to_ascii_uppercase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_are_one_based_and_bounded() {
        let reference = InMemoryReference::new().with_sequence("chr1", b"acgtACGT".to_vec());
        assert_eq!(reference.base("chr1", 1), Some(b'A'));
        assert_eq!(reference.base("chr1", 0), None);
        assert_eq!(reference.base("chr1", 9), None);
        assert_eq!(reference.base("chr2", 1), None);
    }
}
