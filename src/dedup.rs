//! The two-pass write-out loop: ingest FASTQ records into a [`Trie`],
//! filter by average base-call error rate, then drain the trie cluster by
//! cluster and dissect each cluster into output records.
//!
//! Ambient supplement: spec.md excludes the filter and the write-out loop
//! from the trie's concern; this module is the driver that was left
//! external, built the way §6 describes its contract with the core.

use std::collections::HashMap;

use crate::check_lengths::CheckLengths;
use crate::dissection::{self, DissectionMethod};
use crate::error::{Error, Result};
use crate::error_rate::{average_error_rate, DEFAULT_PHRED_OFFSET};
use crate::fastq::Record;
use crate::trie::Trie;

/// Running counts surfaced to the driver for an end-of-run log line.
#[derive(Clone, Copy, Debug, Default)]
pub struct IngestStats {
    pub seen: u64,
    pub filtered_by_quality: u64,
    pub indexed: u64,
}

/// Ties a trie of UMI keys to the first full FASTQ record observed for each
/// key, so a cluster's chosen representative key can be turned back into a
/// record worth writing.
pub struct Deduplicator {
    trie: Trie,
    representatives: HashMap<Vec<u8>, Record>,
    phred_offset: u8,
    stats: IngestStats,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self {
            trie: Trie::new(),
            representatives: HashMap::new(),
            phred_offset: DEFAULT_PHRED_OFFSET,
            stats: IngestStats::default(),
        }
    }

    pub fn with_phred_offset(mut self, offset: u8) -> Self {
        self.phred_offset = offset;
        self
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Index one record's UMI key (as selected by `check_lengths`, or the
    /// whole sequence if empty), rejecting it first if its average error
    /// rate over that same region exceeds `max_average_error_rate`.
    pub fn ingest(
        &mut self,
        record: Record,
        check_lengths: &CheckLengths,
        max_average_error_rate: Option<f64>,
    ) -> Result<()> {
        self.stats.seen += 1;
        let key = if check_lengths.is_empty() {
            record.sequence.clone()
        } else {
            check_lengths.extract(&record.sequence)
        };

        if let Some(threshold) = max_average_error_rate {
            let quality_region = if check_lengths.is_empty() {
                record.quality.clone()
            } else {
                check_lengths.extract(&record.quality)
            };
            let rate = average_error_rate(&quality_region, self.phred_offset);
            if rate > threshold {
                log::trace!(
                    "dropping {:?}: average error rate {:.4} exceeds {:.4}",
                    record.id,
                    rate,
                    threshold
                );
                self.stats.filtered_by_quality += 1;
                return Ok(());
            }
        }

        self.trie.add_sequence(&key)?;
        self.representatives.entry(key).or_insert(record);
        self.stats.indexed += 1;
        Ok(())
    }

    /// Drain every cluster from the trie, dissect each one, and return the
    /// `(count, record)` pairs worth writing. Each returned record is the
    /// first full FASTQ record seen for the cluster's chosen representative
    /// key, annotated with the total count folded into it.
    pub fn drain(
        &mut self,
        max_distance: u32,
        use_edit: bool,
        method: DissectionMethod,
    ) -> Result<Vec<(u64, Record)>> {
        let mut out = Vec::new();
        loop {
            let cluster = match self.trie.pop_cluster(max_distance, use_edit) {
                Ok(cluster) => cluster,
                Err(Error::Empty) => break,
                Err(e) => return Err(e),
            };
            log::debug!("popped cluster of {} member(s)", cluster.len());
            for (count, key) in dissection::dissect(&cluster, method, max_distance, use_edit) {
                let record = self
                    .representatives
                    .get(&key)
                    .cloned()
                    .ok_or(Error::Corruption(
                        "dissection produced a key with no stored representative record",
                    ))?;
                out.push((count, annotate(record, count)));
            }
        }
        if out.is_empty() {
            return Err(Error::Empty);
        }
        Ok(out)
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new()
    }
}

fn annotate(mut record: Record, count: u64) -> Record {
    record.id.extend_from_slice(format!(" umi_count={count}").as_bytes());
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &[u8], seq: &[u8], qual: &[u8]) -> Record {
        Record {
            id: id.to_vec(),
            sequence: seq.to_vec(),
            separator: Vec::new(),
            quality: qual.to_vec(),
        }
    }

    #[test]
    fn exact_duplicates_collapse_with_summed_count() {
        let mut d = Deduplicator::new();
        let cl = CheckLengths::default();
        d.ingest(rec(b"r1", b"ACGT", b"IIII"), &cl, None).unwrap();
        d.ingest(rec(b"r2", b"ACGT", b"IIII"), &cl, None).unwrap();
        let out = d.drain(0, false, DissectionMethod::HighestCount).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, 2);
        assert!(out[0].1.id.ends_with(b"umi_count=2"));
    }

    #[test]
    fn low_quality_records_are_filtered_and_not_indexed() {
        let mut d = Deduplicator::new();
        let cl = CheckLengths::default();
        // '!' is Phred 0, i.e. error rate 1.0 -- always over any threshold < 1.
        d.ingest(rec(b"bad", b"ACGT", b"!!!!"), &cl, Some(0.5))
            .unwrap();
        assert_eq!(d.stats().filtered_by_quality, 1);
        assert_eq!(d.stats().indexed, 0);
        assert!(matches!(
            d.drain(0, false, DissectionMethod::HighestCount),
            Err(Error::Empty)
        ));
    }

    #[test]
    fn check_lengths_selects_umi_region_for_clustering() {
        let mut d = Deduplicator::new();
        let cl = CheckLengths::parse("0:4").unwrap();
        d.ingest(rec(b"r1", b"ACGTAAAA", b"IIIIIIII"), &cl, None)
            .unwrap();
        d.ingest(rec(b"r2", b"ACGTTTTT", b"IIIIIIII"), &cl, None)
            .unwrap();
        let out = d.drain(0, false, DissectionMethod::HighestCount).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, 2);
    }
}
