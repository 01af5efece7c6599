//! Presence tracking over a sliding window of face detections

use std::collections::VecDeque;

/// Sliding window of per-sample face presence.
///
/// Reports away only once the window is full, and then only when fewer than
/// `away_threshold` samples saw a face. Single missed detections (blur,
/// brief occlusion) therefore never flip the state.
#[derive(Debug, Clone)]
pub struct PresenceTracker {
    window: VecDeque<bool>,
    capacity: usize,
    away_threshold: usize,
}

impl PresenceTracker {
    pub fn new(capacity: usize, away_threshold: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            away_threshold,
        }
    }

    /// Record one sample, evicting the oldest when full
    pub fn observe(&mut self, has_face: bool) {
        if self.window.len() >= self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(has_face);
    }

    pub fn is_away(&self) -> bool {
        self.is_full() && self.present_count() < self.away_threshold
    }

    /// Number of samples in the window that saw a face
    pub fn present_count(&self) -> usize {
        self.window.iter().filter(|&&present| present).count()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.window.len() >= self.capacity
    }

    /// Samples from oldest to newest
    pub fn samples(&self) -> impl Iterator<Item = bool> + '_ {
        self.window.iter().copied()
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn filled(present: usize) -> PresenceTracker {
        let mut tracker = PresenceTracker::new(50, 10);
        for i in 0..50 {
            tracker.observe(i < present);
        }
        tracker
    }

    #[test]
    fn test_threshold_is_strict() {
        assert!(filled(9).is_away());
        assert!(!filled(10).is_away());
        assert!(filled(0).is_away());
        assert!(!filled(50).is_away());
    }

    #[test]
    fn test_not_away_until_full() {
        let mut tracker = PresenceTracker::new(50, 10);
        for _ in 0..49 {
            tracker.observe(false);
            assert!(!tracker.is_away());
        }
        tracker.observe(false);
        assert!(tracker.is_away());
    }

    #[test]
    fn test_return_after_away() {
        let mut tracker = filled(0);
        for _ in 0..9 {
            tracker.observe(true);
        }
        assert!(tracker.is_away());
        tracker.observe(true);
        assert!(!tracker.is_away());
    }

    #[test]
    fn test_clear_restarts_grace_period() {
        let mut tracker = filled(0);
        tracker.clear();
        assert!(tracker.is_empty());
        assert!(!tracker.is_away());
    }

    proptest! {
        #[test]
        fn prop_window_bounded(samples in proptest::collection::vec(any::<bool>(), 0..200)) {
            let mut tracker = PresenceTracker::new(50, 10);
            for &s in &samples {
                tracker.observe(s);
                prop_assert!(tracker.len() <= 50);
            }
            prop_assert_eq!(tracker.len(), samples.len().min(50));
        }

        #[test]
        fn prop_fifo_keeps_newest(samples in proptest::collection::vec(any::<bool>(), 50..200)) {
            let mut tracker = PresenceTracker::new(50, 10);
            for &s in &samples {
                tracker.observe(s);
            }
            let kept: Vec<bool> = tracker.samples().collect();
            prop_assert_eq!(&kept[..], &samples[samples.len() - 50..]);
        }

        #[test]
        fn prop_partial_window_never_away(samples in proptest::collection::vec(any::<bool>(), 0..50)) {
            let mut tracker = PresenceTracker::new(50, 10);
            for &s in &samples {
                tracker.observe(s);
            }
            prop_assert!(!tracker.is_away());
        }
    }
}
