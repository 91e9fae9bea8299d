// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-context key/value cache with property tags.
//!
//! Lookups scan the most recently added entry first, so a later entry shadows
//! an earlier one with the same key. Entries tagged [`CacheProps::INHERIT`]
//! are copied into child contexts.

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CacheProps: u8 {
        /// Copied into every sub-request spawned from the owning context.
        const INHERIT = 1 << 0;
        /// The value is the context's chain id (8 bytes, big endian).
        const CHAIN_ID = 1 << 1;
        /// Marks the canonical text of the request a child was built from.
        const SRC_REQ = 1 << 2;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Empty for property-only entries.
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub props: CacheProps,
}

#[derive(Debug, Clone, Default)]
pub struct Cache {
    // oldest first; iteration runs in reverse
    entries: Vec<CacheEntry>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: Vec<u8>, value: Vec<u8>, props: CacheProps) {
        self.entries.push(CacheEntry { key, value, props });
    }

    /// Value of the newest keyed entry matching `key`.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        if key.is_empty() {
            return None;
        }
        self.iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_slice())
    }

    /// Newest entry carrying all of `props`.
    pub fn find(&self, props: CacheProps) -> Option<&CacheEntry> {
        self.iter().find(|entry| entry.props.contains(props))
    }

    pub fn contains_value(&self, props: CacheProps, value: &[u8]) -> bool {
        self.iter()
            .any(|entry| entry.props.contains(props) && entry.value == value)
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.iter().rev()
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.find(CacheProps::CHAIN_ID)
            .and_then(|entry| <[u8; 8]>::try_from(entry.value.as_slice()).ok())
            .map(u64::from_be_bytes)
    }

    pub fn set_chain_id(&mut self, chain_id: u64) {
        self.add(
            Vec::new(),
            chain_id.to_be_bytes().to_vec(),
            CacheProps::CHAIN_ID | CacheProps::INHERIT,
        );
    }

    /// Copy every `INHERIT` entry into `child`, keeping their relative order.
    /// Returns the number of copied entries.
    pub fn inherit_into(&self, child: &mut Cache) -> usize {
        let before = child.len();
        child.entries.extend(
            self.entries
                .iter()
                .filter(|entry| entry.props.contains(CacheProps::INHERIT))
                .cloned(),
        );
        child.len() - before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_entry_shadows_older() {
        let mut cache = Cache::new();
        cache.add(b"k".to_vec(), b"old".to_vec(), CacheProps::empty());
        cache.add(b"k".to_vec(), b"new".to_vec(), CacheProps::empty());
        assert_eq!(cache.get(b"k"), Some(&b"new"[..]));
        assert_eq!(cache.get(b"missing"), None);
    }

    #[test]
    fn test_property_only_entries_are_not_keyed() {
        let mut cache = Cache::new();
        cache.add(Vec::new(), b"marker".to_vec(), CacheProps::SRC_REQ);
        assert_eq!(cache.get(b""), None);
        assert!(cache.contains_value(CacheProps::SRC_REQ, b"marker"));
        assert!(!cache.contains_value(CacheProps::INHERIT, b"marker"));
    }

    #[test]
    fn test_chain_id_round_trip() {
        let mut cache = Cache::new();
        assert_eq!(cache.chain_id(), None);
        cache.set_chain_id(100);
        cache.set_chain_id(5);
        assert_eq!(cache.chain_id(), Some(5));
    }

    #[test]
    fn test_inherit_copies_only_tagged_entries_in_order() {
        let mut parent = Cache::new();
        parent.set_chain_id(100);
        parent.add(b"local".to_vec(), b"x".to_vec(), CacheProps::empty());
        parent.add(b"shared".to_vec(), b"y".to_vec(), CacheProps::INHERIT);
        parent.set_chain_id(7);

        let mut child = Cache::new();
        child.add(Vec::new(), b"req".to_vec(), CacheProps::SRC_REQ);
        assert_eq!(parent.inherit_into(&mut child), 3);

        assert_eq!(child.chain_id(), Some(7));
        assert_eq!(child.get(b"shared"), Some(&b"y"[..]));
        assert_eq!(child.get(b"local"), None);
        assert_eq!(child.len(), 4);
    }
}
