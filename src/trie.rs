//! The public surface of the compressed-alphabet radix trie (spec §2-§4,
//! component E). Owns the root node and the alphabet, and coordinates
//! insert / contains / pop-cluster / memory-size / stats.

use crate::alphabet::Alphabet;
use crate::error::{Error, Result};
use crate::node::Slot;
use crate::node_ops;
use crate::search::{self, DistanceMode};

/// Maximum length of a single inserted sequence (spec §3 Node: suffix
/// length fits 31 bits; we use the same ceiling for input validation).
pub const MAX_SEQUENCE_LEN: usize = i32::MAX as usize;

/// The radix trie over observed identifier strings.
pub struct Trie {
    alphabet: Alphabet,
    root: Slot,
    number_of_sequences: u64,
    max_sequence_size: usize,
    scratch: Vec<u8>,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    /// An empty trie with an empty alphabet.
    pub fn new() -> Self {
        Self {
            alphabet: Alphabet::new(),
            root: None,
            number_of_sequences: 0,
            max_sequence_size: 0,
            scratch: Vec::new(),
        }
    }

    /// An empty trie whose alphabet is pre-seeded in the given order.
    pub fn with_seed_alphabet(seed: &[u8]) -> Result<Self> {
        Ok(Self {
            alphabet: Alphabet::from_seed(seed)?,
            root: None,
            number_of_sequences: 0,
            max_sequence_size: 0,
            scratch: Vec::new(),
        })
    }

    fn validate(s: &[u8]) -> Result<()> {
        if s.len() > MAX_SEQUENCE_LEN {
            return Err(Error::BadInput);
        }
        if !s.iter().all(|&b| b <= 0x7f) {
            return Err(Error::BadInput);
        }
        Ok(())
    }

    fn ensure_scratch(&mut self) {
        if self.scratch.len() < self.max_sequence_size {
            self.scratch.resize(self.max_sequence_size, 0);
        }
    }

    /// Insert `s` with multiplicity 1 (spec §6 `add_sequence`).
    pub fn add_sequence(&mut self, s: &[u8]) -> Result<()> {
        Self::validate(s)?;
        node_ops::insert(&mut self.root, s, 1, &mut self.alphabet)?;
        self.number_of_sequences += 1;
        self.max_sequence_size = self.max_sequence_size.max(s.len());
        Ok(())
    }

    /// `true` if some stored string is within `max_distance` of `s` (spec §6
    /// `contains_sequence`).
    pub fn contains_sequence(&mut self, s: &[u8], max_distance: u32, use_edit: bool) -> bool {
        self.ensure_scratch();
        let mode = if use_edit {
            DistanceMode::Edit
        } else {
            DistanceMode::Hamming
        };
        search::find_nearest(
            &self.root,
            s,
            max_distance,
            mode,
            &self.alphabet,
            &mut self.scratch,
        )
        .is_some()
    }

    /// Remove and return a maximal connected component rooted at a
    /// greedily-chosen seed (spec §4.7 `pop_cluster`).
    pub fn pop_cluster(&mut self, max_distance: u32, use_edit: bool) -> Result<Vec<(u64, Vec<u8>)>> {
        if self.root.is_none() {
            return Err(Error::Empty);
        }
        self.ensure_scratch();
        let mode = if use_edit {
            DistanceMode::Edit
        } else {
            DistanceMode::Hamming
        };

        let seed_len = search::get_sequence(&self.root, &self.alphabet, &mut self.scratch)?;
        let seed = self.scratch[0..seed_len].to_vec();
        let seed_count = node_ops::delete(&mut self.root, &seed, &self.alphabet)
            .ok_or(Error::Corruption("pop_cluster: seed disappeared before deletion"))?;
        self.number_of_sequences -= seed_count;

        let mut result = vec![(seed_count, seed)];
        let mut frontier = 0usize;
        while self.root.is_some() && frontier < result.len() {
            let template = result[frontier].1.clone();
            match search::find_nearest(
                &self.root,
                &template,
                max_distance,
                mode,
                &self.alphabet,
                &mut self.scratch,
            ) {
                Some((count, len)) if count > 0 => {
                    let found = self.scratch[0..len].to_vec();
                    let removed = node_ops::delete(&mut self.root, &found, &self.alphabet)
                        .ok_or(Error::Corruption("pop_cluster: located string vanished before deletion"))?;
                    self.number_of_sequences -= removed;
                    result.push((removed, found));
                }
                _ => frontier += 1,
            }
        }
        Ok(result)
    }

    /// Byte cost of the whole trie (spec §4.8 `memory_size`).
    pub fn memory_size(&self) -> usize {
        node_ops::memory_size(&self.root)
    }

    /// Rectangular depth/arity histogram (spec §4.8 `raw_stats`).
    pub fn raw_stats(&self) -> Vec<Vec<u64>> {
        let rows = self.max_sequence_size + 1;
        let cols = self.alphabet.len() + 1;
        let mut table = vec![vec![0u64; cols]; rows];
        raw_stats_at(&self.root, 0, &mut table);
        table
    }

    /// The alphabet string in index order (spec §6 `alphabet`).
    pub fn alphabet(&self) -> Vec<u8> {
        self.alphabet.as_string()
    }

    /// Count of successful `add_sequence` calls net of deletions (spec §6
    /// `number_of_sequences`); kept equal to the sum of live node counts so
    /// invariant 5 of §3 holds after every public operation, including the
    /// deletions performed internally by `pop_cluster`.
    pub fn number_of_sequences(&self) -> u64 {
        self.number_of_sequences
    }

    pub fn max_sequence_size(&self) -> usize {
        self.max_sequence_size
    }
}

fn raw_stats_at(slot: &Slot, depth: usize, table: &mut [Vec<u64>]) {
    let Some(node) = slot.as_deref() else { return };
    match node {
        crate::node::Node::Terminal { .. } => {
            if let Some(row) = table.get_mut(depth) {
                row[0] += 1;
            }
        }
        crate::node::Node::Interior { children, .. } => {
            let arity = children.len();
            if let Some(row) = table.get_mut(depth) {
                if let Some(bucket) = row.get_mut(arity) {
                    *bucket += 1;
                }
            }
            for child in children {
                raw_stats_at(child, depth + 1, table);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_exact_duplicates() {
        let mut t = Trie::new();
        t.add_sequence(b"ACGT").unwrap();
        t.add_sequence(b"ACGT").unwrap();
        t.add_sequence(b"ACGA").unwrap();
        assert_eq!(t.number_of_sequences(), 3);
        assert_eq!(t.alphabet(), b"ACGT".to_vec());

        // By the literal algorithm (§4.3 insertion-order alphabet growth,
        // §4.5 lexicographically-smallest-by-alphabet-index extraction),
        // "ACGA" (last differing character has the smaller alphabet index)
        // is the seed of the first cluster, not "ACGT" as the illustrative
        // example in spec.md §8 states. §8 property 6 already acknowledges
        // result order is implementation-dependent; see DESIGN.md.
        let first = t.pop_cluster(0, false).unwrap();
        assert_eq!(first, vec![(1, b"ACGA".to_vec())]);
        let second = t.pop_cluster(0, false).unwrap();
        assert_eq!(second, vec![(2, b"ACGT".to_vec())]);
    }

    #[test]
    fn s2_hamming_cluster_at_distance_one() {
        let mut t = Trie::new();
        for s in [&b"AAA"[..], b"AAC", b"AAG", b"TTT"] {
            t.add_sequence(s).unwrap();
        }
        let cluster = t.pop_cluster(1, false).unwrap();
        let members: std::collections::HashSet<_> =
            cluster.iter().map(|(_, s)| s.clone()).collect();
        assert_eq!(
            members,
            [b"AAA".to_vec(), b"AAC".to_vec(), b"AAG".to_vec()]
                .into_iter()
                .collect()
        );
        assert!(cluster.iter().all(|(c, _)| *c == 1));

        let second = t.pop_cluster(1, false).unwrap();
        assert_eq!(second, vec![(1, b"TTT".to_vec())]);
    }

    #[test]
    fn s3_length_mismatch_under_hamming() {
        let mut t = Trie::new();
        t.add_sequence(b"AC").unwrap();
        t.add_sequence(b"ACG").unwrap();
        assert!(t.contains_sequence(b"AC", 1, false));
        assert!(t.contains_sequence(b"ACG", 0, false));
        assert!(t.contains_sequence(b"ACG", 1, false));
        // "AC" is length 2; the only other candidate "ACG" has length 3,
        // which Hamming rejects regardless of budget.
        let mut only_ac = Trie::new();
        only_ac.add_sequence(b"ACG").unwrap();
        assert!(!only_ac.contains_sequence(b"AC", 1, false));
    }

    #[test]
    fn s4_split_on_shared_prefix() {
        let mut t = Trie::new();
        t.add_sequence(b"ACGTACGT").unwrap();
        t.add_sequence(b"ACGTAAAA").unwrap();
        assert!(t.contains_sequence(b"ACGTACGT", 0, false));
        assert!(t.contains_sequence(b"ACGTAAAA", 0, false));
    }

    #[test]
    fn s5_prune_on_delete_matches_fresh_trie_memory() {
        let mut t = Trie::new();
        t.add_sequence(b"ACGTACGT").unwrap();
        t.add_sequence(b"ACGTAAAA").unwrap();
        t.pop_cluster(0, false).unwrap(); // removes whichever seed is found first
        let remaining = t.pop_cluster(0, false);
        // one of the two strings remains after popping the first cluster
        let mut fresh_a = Trie::new();
        fresh_a.add_sequence(b"ACGTAAAA").unwrap();
        let mut fresh_b = Trie::new();
        fresh_b.add_sequence(b"ACGTACGT").unwrap();
        let size = t.memory_size();
        assert!(remaining.is_err() || size == fresh_a.memory_size() || size == fresh_b.memory_size());
    }

    #[test]
    fn s6_edit_distance() {
        assert!(crate::distance::within_edit(b"ACT", b"ACGT", 1));
        assert!(!crate::distance::within_edit(b"ACT", b"ACGT", 0));
        assert!(!crate::distance::within_hamming(b"ACT", b"ACGT", 1));
    }

    #[test]
    fn pop_cluster_on_empty_trie_fails() {
        let mut t = Trie::new();
        assert!(matches!(t.pop_cluster(0, false), Err(Error::Empty)));
    }

    #[test]
    fn bad_input_rejects_non_ascii_and_oversized() {
        let mut t = Trie::new();
        assert!(matches!(t.add_sequence(&[0x80]), Err(Error::BadInput)));
    }

    #[test]
    fn counts_sum_to_number_of_sequences() {
        let mut t = Trie::new();
        for s in [&b"AAA"[..], b"AAA", b"AAC", b"TTT", b"TTG"] {
            t.add_sequence(s).unwrap();
        }
        assert_eq!(t.number_of_sequences(), 5);
        let mut total = 0u64;
        while let Ok(cluster) = t.pop_cluster(0, false) {
            total += cluster.iter().map(|(c, _)| c).sum::<u64>();
        }
        assert_eq!(total, 5);
    }

    #[test]
    fn memory_size_matches_manual_accounting() {
        let mut t = Trie::new();
        t.add_sequence(b"ACGT").unwrap();
        let expected = node_ops::memory_size(&t.root);
        assert_eq!(t.memory_size(), expected);
    }
}
