//! Approximate membership search and representative extraction (spec §4.4,
//! §4.5, component D).

use crate::alphabet::{Alphabet, UNKNOWN};
use crate::distance::within_edit;
use crate::error::{Error, Result};
use crate::node::{Node, Slot};

/// Which distance metric `find_nearest` should use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceMode {
    Hamming,
    Edit,
}

fn ensure_len(buf: &mut Vec<u8>, len: usize) {
    if buf.len() < len {
        buf.resize(len, 0);
    }
}

fn write_one(buf: &mut Vec<u8>, pos: usize, byte: u8) {
    ensure_len(buf, pos + 1);
    buf[pos] = byte;
}

fn write_slice(buf: &mut Vec<u8>, pos: usize, bytes: &[u8]) {
    ensure_len(buf, pos + bytes.len());
    buf[pos..pos + bytes.len()].copy_from_slice(bytes);
}

/// Search the subtree at `slot` for a string within `max_distance` of `s`.
/// Returns `(count, length)` of the located string on success; its literal
/// bytes are written into `buf[0..length]`. `buf` is grown as needed and may
/// be left with stale bytes past `length` — callers only read `0..length`.
pub fn find_nearest(
    slot: &Slot,
    s: &[u8],
    max_distance: u32,
    mode: DistanceMode,
    alphabet: &Alphabet,
    buf: &mut Vec<u8>,
) -> Option<(u64, usize)> {
    let node = slot.as_deref()?;
    match mode {
        DistanceMode::Hamming => {
            hamming_search(node, s, max_distance as i64, alphabet, buf, 0).map(|c| (c, s.len()))
        }
        DistanceMode::Edit => edit_search(node, s, max_distance as i64, alphabet, buf, 0),
    }
}

fn hamming_search(
    node: &Node,
    s: &[u8],
    budget: i64,
    alphabet: &Alphabet,
    buf: &mut Vec<u8>,
    depth: usize,
) -> Option<u64> {
    match node {
        Node::Terminal { suffix, count } => {
            if suffix.len() != s.len() {
                return None;
            }
            let mismatches = suffix.iter().zip(s.iter()).filter(|(a, b)| a != b).count() as i64;
            if budget - mismatches >= 0 {
                write_slice(buf, depth, suffix);
                Some(*count)
            } else {
                None
            }
        }
        Node::Interior { children, count } => {
            if s.is_empty() {
                return if *count > 0 { Some(*count) } else { None };
            }
            let matched_index = match alphabet.index_of(s[0]) {
                UNKNOWN => None,
                i => Some(i as usize),
            };
            if let Some(i) = matched_index {
                if let Some(Some(child)) = children.get(i) {
                    write_one(buf, depth, s[0]);
                    if let Some(c) = hamming_search(child, &s[1..], budget, alphabet, buf, depth + 1) {
                        return Some(c);
                    }
                }
            }
            if budget <= 0 {
                return None;
            }
            let next_budget = budget - 1;
            for (j, child) in children.iter().enumerate() {
                if matched_index == Some(j) {
                    continue;
                }
                if let Some(child) = child {
                    write_one(buf, depth, alphabet.char_at(j));
                    if let Some(c) =
                        hamming_search(child, &s[1..], next_budget, alphabet, buf, depth + 1)
                    {
                        return Some(c);
                    }
                }
            }
            None
        }
    }
}

fn edit_search(
    node: &Node,
    s: &[u8],
    budget: i64,
    alphabet: &Alphabet,
    buf: &mut Vec<u8>,
    out_pos: usize,
) -> Option<(u64, usize)> {
    match node {
        Node::Terminal { suffix, count } => {
            if within_edit(s, suffix, budget as u32) {
                write_slice(buf, out_pos, suffix);
                Some((*count, out_pos + suffix.len()))
            } else {
                None
            }
        }
        Node::Interior { children, count } => {
            let matched_index = if s.is_empty() {
                None
            } else {
                match alphabet.index_of(s[0]) {
                    UNKNOWN => None,
                    i => Some(i as usize),
                }
            };
            if s.is_empty() {
                if *count > 0 {
                    return Some((*count, out_pos));
                }
            } else if let Some(i) = matched_index {
                if let Some(Some(child)) = children.get(i) {
                    write_one(buf, out_pos, s[0]);
                    if let Some(result) =
                        edit_search(child, &s[1..], budget, alphabet, buf, out_pos + 1)
                    {
                        return Some(result);
                    }
                }
            }
            if budget <= 0 {
                return None;
            }
            let next_budget = budget - 1;
            // substitution: consume s[0], descend into a different child
            if !s.is_empty() {
                for (j, child) in children.iter().enumerate() {
                    if matched_index == Some(j) {
                        continue;
                    }
                    if let Some(child) = child {
                        write_one(buf, out_pos, alphabet.char_at(j));
                        if let Some(result) =
                            edit_search(child, &s[1..], next_budget, alphabet, buf, out_pos + 1)
                        {
                            return Some(result);
                        }
                    }
                }
            }
            // insertion: stored string has a character here that isn't in s
            for (j, child) in children.iter().enumerate() {
                if let Some(child) = child {
                    write_one(buf, out_pos, alphabet.char_at(j));
                    if let Some(result) =
                        edit_search(child, s, next_budget, alphabet, buf, out_pos + 1)
                    {
                        return Some(result);
                    }
                }
            }
            // deletion: drop s[0] and retry at this same node
            if !s.is_empty() {
                if let Some(result) =
                    edit_search(node, &s[1..], next_budget, alphabet, buf, out_pos)
                {
                    return Some(result);
                }
            }
            None
        }
    }
}

/// Write the lexicographically-smallest (by alphabet index) stored string
/// reachable from `slot` into `buf[0..len]` and return `len` (spec §4.5).
pub fn get_sequence(slot: &Slot, alphabet: &Alphabet, buf: &mut Vec<u8>) -> Result<usize> {
    let node = slot
        .as_deref()
        .ok_or(Error::Corruption("get_sequence called on an empty slot"))?;
    get_sequence_at(node, alphabet, buf, 0)
}

fn get_sequence_at(node: &Node, alphabet: &Alphabet, buf: &mut Vec<u8>, depth: usize) -> Result<usize> {
    match node {
        Node::Terminal { suffix, .. } => {
            write_slice(buf, depth, suffix);
            Ok(depth + suffix.len())
        }
        Node::Interior { children, count } => {
            if *count > 0 {
                return Ok(depth);
            }
            for (j, child) in children.iter().enumerate() {
                if let Some(child) = child {
                    write_one(buf, depth, alphabet.char_at(j));
                    return get_sequence_at(child, alphabet, buf, depth + 1);
                }
            }
            Err(Error::Corruption(
                "interior node has neither a count nor any children",
            ))
        }
    }
}
