//! Parses the `--check-lengths` flag: a comma-separated list of either a
//! single index (`5`) or a Python-style half-open slice (`0:8`, `:8`, `4:`)
//! selecting which bytes of each record's sequence are fed to the trie as
//! its UMI identifier.
//!
//! Ambient supplement: spec.md scopes "prefix/slice selection" out of the
//! trie's concern entirely, but a complete driver needs somewhere to parse
//! the flag described in spec.md §6's CLI contract.

use crate::error::{Error, Result};

/// A single selected region of a sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selector {
    Index(usize),
    Slice { start: usize, end: Option<usize> },
}

impl Selector {
    fn apply<'a>(&self, sequence: &'a [u8]) -> &'a [u8] {
        match *self {
            Selector::Index(i) => {
                if i < sequence.len() {
                    &sequence[i..i + 1]
                } else {
                    &[]
                }
            }
            Selector::Slice { start, end } => {
                let start = start.min(sequence.len());
                let end = end.unwrap_or(sequence.len()).min(sequence.len());
                if start >= end {
                    &[]
                } else {
                    &sequence[start..end]
                }
            }
        }
    }
}

/// An ordered set of selectors; applying concatenates each selector's bytes.
#[derive(Clone, Debug, Default)]
pub struct CheckLengths(Vec<Selector>);

impl CheckLengths {
    pub fn parse(spec: &str) -> Result<Self> {
        let mut selectors = Vec::new();
        for term in spec.split(',') {
            let term = term.trim();
            if term.is_empty() {
                return Err(Error::BadInput);
            }
            selectors.push(parse_term(term)?);
        }
        Ok(CheckLengths(selectors))
    }

    /// Extract and concatenate the selected bytes of `sequence`.
    pub fn extract(&self, sequence: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        for sel in &self.0 {
            out.extend_from_slice(sel.apply(sequence));
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn parse_term(term: &str) -> Result<Selector> {
    if let Some(colon) = term.find(':') {
        let (lo, hi) = term.split_at(colon);
        let hi = &hi[1..];
        let start = if lo.is_empty() {
            0
        } else {
            lo.parse::<usize>().map_err(|_| Error::BadInput)?
        };
        let end = if hi.is_empty() {
            None
        } else {
            Some(hi.parse::<usize>().map_err(|_| Error::BadInput)?)
        };
        if let Some(end) = end {
            if end < start {
                return Err(Error::BadInput);
            }
        }
        Ok(Selector::Slice { start, end })
    } else {
        let i = term.parse::<usize>().map_err(|_| Error::BadInput)?;
        Ok(Selector::Index(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_index_selects_one_byte() {
        let cl = CheckLengths::parse("2").unwrap();
        assert_eq!(cl.extract(b"ACGTACGT"), b"G".to_vec());
    }

    #[test]
    fn bounded_slice_selects_range() {
        let cl = CheckLengths::parse("0:4").unwrap();
        assert_eq!(cl.extract(b"ACGTACGT"), b"ACGT".to_vec());
    }

    #[test]
    fn open_ended_slices() {
        assert_eq!(CheckLengths::parse(":3").unwrap().extract(b"ACGTACGT"), b"ACG".to_vec());
        assert_eq!(CheckLengths::parse("4:").unwrap().extract(b"ACGTACGT"), b"ACGT".to_vec());
    }

    #[test]
    fn comma_separated_terms_concatenate() {
        let cl = CheckLengths::parse("0:2,6:8").unwrap();
        assert_eq!(cl.extract(b"ACGTACGT"), b"ACGT".to_vec());
    }

    #[test]
    fn out_of_range_index_yields_nothing() {
        let cl = CheckLengths::parse("100").unwrap();
        assert_eq!(cl.extract(b"ACGT"), Vec::<u8>::new());
    }

    #[test]
    fn malformed_term_is_rejected() {
        assert!(CheckLengths::parse("abc").is_err());
        assert!(CheckLengths::parse("5:2").is_err());
        assert!(CheckLengths::parse("").is_err());
    }
}
