// src/sync.rs
//
// Page synchronization state machine. The reading view reports which folio
// anchors currently intersect the viewport trigger region; the controller
// derives a single "current page" from them and gates stale image loads.
// Pure logic, no DOM types, so the transition rules are testable off-wasm.

use std::collections::HashMap;

/// One folio anchor intersecting the trigger region, with its vertical
/// offset from the top of the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorHit {
    pub page: String,
    pub top: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageSync {
    current: Option<String>,
    /// Document rank per folio label, for deterministic tie-breaking.
    ranks: HashMap<String, usize>,
}

impl PageSync {
    /// Initial state: the first anchor in document order, when any exists.
    pub fn new(ordered_pages: &[String]) -> PageSync {
        let ranks = ordered_pages
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), i))
            .collect();
        PageSync {
            current: ordered_pages.first().cloned(),
            ranks,
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Feed one batch of intersecting anchors. The winner is the anchor
    /// nearest the viewport top; exact ties fall back to document rank so
    /// the outcome does not depend on event delivery order. Returns the new
    /// page only when it differs from the current one.
    pub fn observe(&mut self, hits: &[AnchorHit]) -> Option<String> {
        let winner = hits.iter().min_by(|a, b| {
            a.top
                .total_cmp(&b.top)
                .then_with(|| self.rank(&a.page).cmp(&self.rank(&b.page)))
        })?;
        if self.current.as_deref() == Some(winner.page.as_str()) {
            return None;
        }
        self.current = Some(winner.page.clone());
        self.current.clone()
    }

    /// Jump directly to a folio (TOC click, explicit `page=` parameter).
    pub fn select(&mut self, page: &str) -> Option<String> {
        if self.current.as_deref() == Some(page) {
            return None;
        }
        self.current = Some(page.to_string());
        self.current.clone()
    }

    /// Stale-load gate: an image load completing for `page` may only be
    /// applied while `page` is still the current one. Rapid scrolling keeps
    /// several loads in flight; late arrivals for superseded folios are
    /// dropped here.
    pub fn accept_load(&self, page: &str) -> bool {
        self.current.as_deref() == Some(page)
    }

    fn rank(&self, page: &str) -> usize {
        self.ranks.get(page).copied().unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    fn hit(page: &str, top: f64) -> AnchorHit {
        AnchorHit {
            page: page.into(),
            top,
        }
    }

    #[test]
    fn initial_state_is_first_page() {
        let sync = PageSync::new(&pages(&["1.1", "1.2", "2.1"]));
        assert_eq!(sync.current(), Some("1.1"));
        assert_eq!(PageSync::new(&[]).current(), None);
    }

    #[test]
    fn topmost_anchor_wins() {
        let mut sync = PageSync::new(&pages(&["1.1", "1.2", "2.1"]));
        let changed = sync.observe(&[hit("2.1", 340.0), hit("1.2", 12.0)]);
        assert_eq!(changed.as_deref(), Some("1.2"));
        assert_eq!(sync.current(), Some("1.2"));
    }

    #[test]
    fn no_transition_when_winner_unchanged() {
        let mut sync = PageSync::new(&pages(&["1.1", "1.2"]));
        assert_eq!(sync.observe(&[hit("1.1", 5.0)]), None);
        assert_eq!(sync.current(), Some("1.1"));
    }

    #[test]
    fn empty_batch_keeps_current_page() {
        let mut sync = PageSync::new(&pages(&["1.1"]));
        assert_eq!(sync.observe(&[]), None);
        assert_eq!(sync.current(), Some("1.1"));
    }

    #[test]
    fn determinism_is_independent_of_hit_order() {
        let ordered = pages(&["1.1", "1.2", "2.1"]);
        let batch = [hit("2.1", 80.0), hit("1.1", 80.0), hit("1.2", 200.0)];
        let mut forward = PageSync::new(&ordered);
        let mut reversed_batch = batch.to_vec();
        reversed_batch.reverse();
        let mut backward = PageSync::new(&ordered);
        // tie on top offset resolves by document rank either way
        assert_eq!(forward.observe(&batch), backward.observe(&reversed_batch));
        assert_eq!(forward.current(), Some("1.1"));
    }

    #[test]
    fn stale_load_is_rejected() {
        let mut sync = PageSync::new(&pages(&["1.1", "1.2"]));
        // request A, then B before A resolves
        sync.observe(&[hit("1.2", 10.0)]);
        // A resolves late
        assert!(!sync.accept_load("1.1"));
        assert!(sync.accept_load("1.2"));
    }

    #[test]
    fn select_jumps_and_dedupes() {
        let mut sync = PageSync::new(&pages(&["1.1", "1.2"]));
        assert_eq!(sync.select("1.2").as_deref(), Some("1.2"));
        assert_eq!(sync.select("1.2"), None);
    }
}
