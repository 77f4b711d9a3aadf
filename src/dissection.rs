//! Cluster dissection methods: turn one `pop_cluster` result (a set of
//! sequences connected transitively by distance, not necessarily all
//! pairwise adjacent) into one or more representative `(count, sequence)`
//! pairs to emit.
//!
//! Ambient supplement: spec.md's trie intentionally produces a single
//! connected component and leaves its interpretation to the driver. This
//! mirrors the real tool's three dissection strategies.

use crate::distance::{within_edit, within_hamming};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DissectionMethod {
    /// Collapse the whole cluster into its single highest-count member.
    HighestCount,
    /// Repeatedly take the highest-count remaining member and absorb every
    /// still-unclaimed member within distance of it.
    Adjacency,
    /// Like `Adjacency`, but a member can only be absorbed by a neighbour
    /// whose count is at least `2*count - 1` (the UMI-tools "directional"
    /// rule), so low-count sequencing errors chain toward their true parent
    /// but two real, comparably-abundant UMIs are kept apart.
    Directional,
}

impl std::str::FromStr for DissectionMethod {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "highest_count" => Ok(DissectionMethod::HighestCount),
            "adjacency" => Ok(DissectionMethod::Adjacency),
            "directional" => Ok(DissectionMethod::Directional),
            _ => Err(crate::error::Error::BadInput),
        }
    }
}

fn within(a: &[u8], b: &[u8], max_distance: u32, use_edit: bool) -> bool {
    if use_edit {
        within_edit(a, b, max_distance)
    } else {
        within_hamming(a, b, max_distance)
    }
}

/// Reduce a cluster to its output representatives, per `method`.
pub fn dissect(
    cluster: &[(u64, Vec<u8>)],
    method: DissectionMethod,
    max_distance: u32,
    use_edit: bool,
) -> Vec<(u64, Vec<u8>)> {
    match method {
        DissectionMethod::HighestCount => vec![highest_count(cluster)],
        DissectionMethod::Adjacency => adjacency(cluster, max_distance, use_edit, false),
        DissectionMethod::Directional => adjacency(cluster, max_distance, use_edit, true),
    }
}

fn highest_count(cluster: &[(u64, Vec<u8>)]) -> (u64, Vec<u8>) {
    let total: u64 = cluster.iter().map(|(c, _)| c).sum();
    let best = cluster
        .iter()
        .max_by_key(|(c, _)| *c)
        .expect("pop_cluster never returns an empty cluster")
        .1
        .clone();
    (total, best)
}

/// Shared implementation of `adjacency` and `directional`: both greedily
/// pick the highest-count unclaimed member as a hub and absorb everything
/// reachable from it, differing only in the edge predicate.
fn adjacency(
    cluster: &[(u64, Vec<u8>)],
    max_distance: u32,
    use_edit: bool,
    directional: bool,
) -> Vec<(u64, Vec<u8>)> {
    let n = cluster.len();
    let mut claimed = vec![false; n];
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(cluster[i].0));

    let edge = |hub: usize, other: usize| -> bool {
        if !within(&cluster[hub].1, &cluster[other].1, max_distance, use_edit) {
            return false;
        }
        if !directional {
            return true;
        }
        cluster[hub].0 >= 2 * cluster[other].0 - 1
    };

    let mut reps = Vec::new();
    for &hub in &order {
        if claimed[hub] {
            continue;
        }
        let mut group = vec![hub];
        claimed[hub] = true;
        // BFS so a chain of directional edges (hub -> mid -> leaf) is
        // absorbed even when the leaf isn't directly reachable from hub.
        let mut frontier = 0;
        while frontier < group.len() {
            let current = group[frontier];
            for other in 0..n {
                if !claimed[other] && edge(current, other) {
                    claimed[other] = true;
                    group.push(other);
                }
            }
            frontier += 1;
        }
        let total: u64 = group.iter().map(|&i| cluster[i].0).sum();
        reps.push((total, cluster[hub].1.clone()));
    }
    reps
}
