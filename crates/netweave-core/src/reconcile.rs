//! Deduplicates directional link observations into canonical links.
//!
//! Every physical link is normally reported twice, once from each endpoint.
//! The first report of a pair is accepted; the reverse-ordering report is the
//! mirror of an already accepted link and is rejected. A repeated report in
//! the *same* direction is a second physical cable between the pair and gets
//! its own canonical link — two genuinely separate cables are never merged.

use crate::topology::LinkObservation;
use std::collections::HashSet;

/// One deduplicated, directionless link. `seq` is a strictly increasing
/// synthetic number that keeps document keys unique when several cables
/// connect the same pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalLink {
    pub seq: u64,
    pub obs: LinkObservation,
}

impl CanonicalLink {
    /// Document key for this link.
    pub fn key(&self) -> String {
        format!("LINK {}-{}-{}", self.obs.local, self.obs.remote, self.seq)
    }
}

/// Unordered pair key for grouping parallel links.
pub fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Per-run reconciliation state. Deliberately not shared across runs; a
/// fresh instance is created for every pipeline pass.
#[derive(Debug, Default)]
pub struct Reconciler {
    accepted: HashSet<(String, String)>,
    next_seq: u64,
    rejected_mirrors: u64,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one observation in arrival order; returns the canonical link if
    /// accepted.
    pub fn push(&mut self, obs: LinkObservation) -> Option<CanonicalLink> {
        if obs.local == obs.remote {
            tracing::debug!(host = %obs.local, "self-loop observation");
            return None;
        }
        let reverse = (obs.remote.clone(), obs.local.clone());
        if self.accepted.contains(&reverse) {
            self.rejected_mirrors += 1;
            tracing::debug!(local = %obs.local, remote = %obs.remote, "mirror of an accepted link");
            return None;
        }
        self.accepted.insert((obs.local.clone(), obs.remote.clone()));
        let seq = self.next_seq;
        self.next_seq += 1;
        Some(CanonicalLink { seq, obs })
    }

    pub fn rejected_mirrors(&self) -> u64 {
        self.rejected_mirrors
    }
}

/// Reconciles a whole observation sequence.
pub fn reconcile(observations: impl IntoIterator<Item = LinkObservation>) -> Vec<CanonicalLink> {
    let mut reconciler = Reconciler::new();
    let links: Vec<CanonicalLink> = observations
        .into_iter()
        .filter_map(|obs| reconciler.push(obs))
        .collect();
    tracing::debug!(
        accepted = links.len(),
        rejected = reconciler.rejected_mirrors(),
        "link reconciliation done"
    );
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(local: &str, remote: &str) -> LinkObservation {
        LinkObservation {
            local: local.to_string(),
            remote: remote.to_string(),
            local_raw: local.to_string(),
            local_port_id: 1,
            local_port: "Te 0/1".to_string(),
            remote_port: "Te 0/2".to_string(),
            speed: 10_000_000_000,
            if_index: 1,
            device_id: 1,
        }
    }

    #[test]
    fn mirror_reports_collapse_to_one_link() {
        let links = reconcile(vec![obs("a", "b"), obs("b", "a")]);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].obs.local, "a");

        // Same physical link, reports arriving in the other order.
        let links = reconcile(vec![obs("b", "a"), obs("a", "b")]);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].obs.local, "b");
    }

    #[test]
    fn parallel_cables_keep_distinct_keys() {
        let links = reconcile(vec![
            obs("a", "b"),
            obs("a", "b"),
            obs("b", "a"),
            obs("b", "a"),
        ]);
        assert_eq!(links.len(), 2);
        assert_ne!(links[0].seq, links[1].seq);
        assert_ne!(links[0].key(), links[1].key());
    }

    #[test]
    fn sequence_numbers_are_global_and_monotonic() {
        let links = reconcile(vec![obs("a", "b"), obs("c", "d"), obs("a", "b")]);
        let seqs: Vec<u64> = links.iter().map(|l| l.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn self_loops_are_guarded() {
        let links = reconcile(vec![obs("a", "a"), obs("a", "b")]);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].obs.remote, "b");
    }

    #[test]
    fn mirror_counter_tracks_rejections() {
        let mut reconciler = Reconciler::new();
        assert!(reconciler.push(obs("a", "b")).is_some());
        assert!(reconciler.push(obs("b", "a")).is_none());
        assert!(reconciler.push(obs("b", "a")).is_none());
        assert_eq!(reconciler.rejected_mirrors(), 2);
    }
}
