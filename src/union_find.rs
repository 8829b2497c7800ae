//! Disjoint-set clustering shared by consolidation and identity resolution
//!
//! Keys are stored in insertion order. Grouping reports clusters ordered by
//! their first-inserted member, with members in insertion order, so the
//! output depends only on input order and never on which root won a union.

use std::collections::HashMap;
use std::hash::Hash;

/// Array-backed union-find with path halving
#[derive(Debug, Clone)]
pub struct UnionFind<K> {
    index: HashMap<K, usize>,
    keys: Vec<K>,
    parent: Vec<usize>,
}

impl<K: Clone + Eq + Hash> Default for UnionFind<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Eq + Hash> UnionFind<K> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            keys: Vec::new(),
            parent: Vec::new(),
        }
    }

    /// Build a structure holding every key as its own singleton set
    pub fn from_keys(keys: impl IntoIterator<Item = K>) -> Self {
        let mut uf = Self::new();
        for key in keys {
            uf.insert(key);
        }
        uf
    }

    /// Register a key; already-known keys are left untouched
    pub fn insert(&mut self, key: K) -> usize {
        if let Some(&slot) = self.index.get(&key) {
            return slot;
        }
        let slot = self.keys.len();
        self.index.insert(key.clone(), slot);
        self.keys.push(key);
        self.parent.push(slot);
        slot
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Representative key of the set containing `key` (unknown keys are inserted)
    pub fn find(&mut self, key: &K) -> K {
        let slot = self.insert(key.clone());
        let root = self.root(slot);
        self.keys[root].clone()
    }

    /// Merge the sets of `a` and `b`; `a`'s root is attached under `b`'s
    pub fn union(&mut self, a: &K, b: &K) {
        let ra = {
            let slot = self.insert(a.clone());
            self.root(slot)
        };
        let rb = {
            let slot = self.insert(b.clone());
            self.root(slot)
        };
        if ra != rb {
            self.parent[ra] = rb;
        }
    }

    pub fn connected(&mut self, a: &K, b: &K) -> bool {
        match (self.index.get(a).copied(), self.index.get(b).copied()) {
            (Some(x), Some(y)) => self.root(x) == self.root(y),
            _ => a == b,
        }
    }

    /// Every set, ordered by first-inserted member
    pub fn groups(&mut self) -> Vec<Vec<K>> {
        let mut by_root: HashMap<usize, usize> = HashMap::new();
        let mut groups: Vec<Vec<K>> = Vec::new();

        for slot in 0..self.keys.len() {
            let root = self.root(slot);
            let group = *by_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[group].push(self.keys[slot].clone());
        }

        groups
    }

    fn root(&mut self, mut slot: usize) -> usize {
        while self.parent[slot] != slot {
            self.parent[slot] = self.parent[self.parent[slot]];
            slot = self.parent[slot];
        }
        slot
    }
}
