//! Allocation, resizing, splitting and memory accounting of a subtree
//! rooted at a node (spec §4.2-§4.3, §4.6, §4.8, component C).
//!
//! Every mutating operation here takes a `&mut Slot` — a mutable reference
//! to the pointer that holds the node — so a node can be replaced wholesale
//! (on split or prune) without its parent needing to learn of the change.
//! This is the slot-pointer pattern of spec §9, expressed with
//! `Option<Box<Node>>` rather than a raw pointer.
//!
//! Destruction (spec §4.2 `Destroy`) needs no code here: dropping a `Slot`
//! recursively drops its owned children in the same post-order the spec
//! describes, for free, via `Box`'s `Drop` impl.

use crate::alphabet::{Alphabet, UNKNOWN};
use crate::error::Result;
use crate::node::{Node, Slot};

/// Insert `s` with multiplicity `count` under `slot` (spec §4.3).
pub fn insert(slot: &mut Slot, s: &[u8], count: u64, alphabet: &mut Alphabet) -> Result<()> {
    if slot.is_none() {
        *slot = Some(Node::new_leaf(s.to_vec(), count));
        return Ok(());
    }

    let is_exact_duplicate = matches!(
        slot.as_deref(),
        Some(Node::Terminal { suffix, .. }) if suffix.as_ref() == s
    );
    if is_exact_duplicate {
        slot.as_mut().unwrap().add_count(count);
        return Ok(());
    }

    if slot.as_deref().unwrap().is_terminal() {
        // Split: the stored suffix doesn't match `s`. Pull it out, demote
        // the node in place to an empty interior, re-insert the saved
        // suffix through the normal interior path, then insert `s`.
        let old = slot.take().unwrap();
        let (saved_suffix, saved_count) = match *old {
            Node::Terminal { suffix, count } => (Vec::from(suffix), count),
            Node::Interior { .. } => unreachable!(),
        };
        *slot = Some(Node::new_interior(0));
        insert(slot, &saved_suffix, saved_count, alphabet)?;
        return insert(slot, s, count, alphabet);
    }

    // Interior node.
    if s.is_empty() {
        slot.as_mut().unwrap().add_count(count);
        return Ok(());
    }
    let c = s[0];
    let i = alphabet.index_of_or_grow(c)? as usize;
    match slot.as_deref_mut().unwrap() {
        Node::Interior { children, .. } => {
            if i >= children.len() {
                children.resize_with(i + 1, || None);
            }
            insert(&mut children[i], &s[1..], count, alphabet)
        }
        Node::Terminal { .. } => unreachable!(),
    }
}

/// Remove `s` from the subtree at `slot`, returning its stored count, or
/// `None` if `s` was not present (spec §4.6). Prunes dead interior nodes on
/// the way back out so invariant 1 of §3 holds after every successful call.
pub fn delete(slot: &mut Slot, s: &[u8], alphabet: &Alphabet) -> Option<u64> {
    match slot.as_deref_mut()? {
        Node::Terminal { suffix, count } => {
            if suffix.as_ref() == s {
                let removed = *count;
                *slot = None;
                Some(removed)
            } else {
                None
            }
        }
        Node::Interior { count, .. } if s.is_empty() => {
            if *count == 0 {
                return None;
            }
            let removed = *count;
            *count = 0;
            prune(slot);
            Some(removed)
        }
        Node::Interior { children, .. } => {
            let i = alphabet.index_of(s[0]);
            if i == UNKNOWN {
                return None;
            }
            let i = i as usize;
            if i >= children.len() {
                return None;
            }
            let removed = delete(&mut children[i], &s[1..], alphabet)?;
            prune(slot);
            Some(removed)
        }
    }
}

/// Collapse an interior node whose children are all empty: if it still
/// carries a non-zero count, replace it with an empty-suffix terminal
/// (preserving the zero-length string); otherwise clear the slot.
fn prune(slot: &mut Slot) {
    let Some(node) = slot.as_deref() else { return };
    let Node::Interior { children, count } = node else {
        return;
    };
    if !children.iter().all(|c| c.is_none()) {
        return;
    }
    *slot = if *count != 0 {
        Some(Node::new_leaf(Vec::new(), *count))
    } else {
        None
    };
}

/// Byte cost of the subtree rooted at `slot` (spec §4.8 `memory_size`).
pub fn memory_size(slot: &Slot) -> usize {
    let Some(node) = slot.as_deref() else {
        return 0;
    };
    let own = node.own_memory_size();
    let children_total: usize = match node {
        Node::Interior { children, .. } => children.iter().map(memory_size).sum(),
        Node::Terminal { .. } => 0,
    };
    own + children_total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ins(slot: &mut Slot, s: &[u8], count: u64, a: &mut Alphabet) {
        insert(slot, s, count, a).unwrap();
    }

    #[test]
    fn insert_into_empty_slot_creates_terminal() {
        let mut slot: Slot = None;
        let mut a = Alphabet::new();
        ins(&mut slot, b"ACGT", 1, &mut a);
        assert!(slot.as_ref().unwrap().is_terminal());
        assert_eq!(slot.as_ref().unwrap().count(), 1);
    }

    #[test]
    fn exact_duplicate_accumulates_count() {
        let mut slot: Slot = None;
        let mut a = Alphabet::new();
        ins(&mut slot, b"ACGT", 1, &mut a);
        ins(&mut slot, b"ACGT", 1, &mut a);
        assert_eq!(slot.as_ref().unwrap().count(), 2);
    }

    #[test]
    fn split_preserves_count_through_transient_interior() {
        let mut slot: Slot = None;
        let mut a = Alphabet::new();
        ins(&mut slot, b"ACGTACGT", 5, &mut a);
        ins(&mut slot, b"ACGTAAAA", 1, &mut a);
        assert!(!slot.as_ref().unwrap().is_terminal());
        let found = delete(&mut slot, b"ACGTACGT", &a).unwrap();
        assert_eq!(found, 5);
        let found2 = delete(&mut slot, b"ACGTAAAA", &a).unwrap();
        assert_eq!(found2, 1);
        assert!(slot.is_none());
    }

    #[test]
    fn delete_missing_returns_none() {
        let mut slot: Slot = None;
        let mut a = Alphabet::new();
        ins(&mut slot, b"ACGT", 1, &mut a);
        assert!(delete(&mut slot, b"TTTT", &a).is_none());
    }

    #[test]
    fn delete_prunes_dead_branch_to_match_fresh_trie() {
        let mut a = Alphabet::new();
        let mut with_both: Slot = None;
        ins(&mut with_both, b"ACGTACGT", 1, &mut a);
        ins(&mut with_both, b"ACGTAAAA", 1, &mut a);
        delete(&mut with_both, b"ACGTACGT", &a).unwrap();

        let mut fresh: Slot = None;
        let mut a2 = Alphabet::new();
        ins(&mut fresh, b"ACGTAAAA", 1, &mut a2);

        assert_eq!(memory_size(&with_both), memory_size(&fresh));
    }

    #[test]
    fn zero_length_sequence_is_representable() {
        let mut slot: Slot = None;
        let mut a = Alphabet::new();
        ins(&mut slot, b"A", 1, &mut a);
        ins(&mut slot, b"", 1, &mut a);
        assert_eq!(delete(&mut slot, b"", &a), Some(1));
        assert_eq!(delete(&mut slot, b"A", &a), Some(1));
        assert!(slot.is_none());
    }
}
