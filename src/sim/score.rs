//! Score ledger
//!
//! A single non-decreasing counter. Observers (HUD text, analytics) subscribe
//! and are called in subscription order with the new score after every change.

use std::fmt;

/// Handle returned by `subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u32);

type Observer = Box<dyn FnMut(u32)>;

#[derive(Default)]
pub struct ScoreLedger {
    score: u32,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u32,
}

impl fmt::Debug for ScoreLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoreLedger")
            .field("score", &self.score)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Add one point and notify observers. Returns the new score.
    pub fn increment(&mut self) -> u32 {
        self.add(1)
    }

    /// Add `points` and notify observers. Returns the new score.
    pub fn add(&mut self, points: u32) -> u32 {
        self.score = self.score.saturating_add(points);
        self.notify();
        self.score
    }

    /// Back to zero (new game only)
    pub fn reset(&mut self) {
        self.score = 0;
        self.notify();
    }

    pub fn subscribe(&mut self, observer: impl FnMut(u32) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    fn notify(&mut self) {
        let score = self.score;
        for (_, observer) in self.observers.iter_mut() {
            observer(score);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_observers_fire_once_per_change() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut ledger = ScoreLedger::new();
        let sink = Rc::clone(&seen);
        let id = ledger.subscribe(move |s| sink.borrow_mut().push(s));

        ledger.increment();
        ledger.increment();
        assert_eq!(*seen.borrow(), vec![1, 2]);

        assert!(ledger.unsubscribe(id));
        ledger.increment();
        assert_eq!(seen.borrow().len(), 2);
        assert!(!ledger.unsubscribe(id));
    }

    #[test]
    fn test_reset_returns_to_zero() {
        let mut ledger = ScoreLedger::new();
        ledger.add(5);
        ledger.reset();
        assert_eq!(ledger.score(), 0);
    }

    proptest! {
        #[test]
        fn score_counts_increments_and_never_decreases(n in 0usize..200) {
            let mut ledger = ScoreLedger::new();
            let mut last = ledger.score();
            for _ in 0..n {
                let next = ledger.increment();
                prop_assert!(next >= last);
                last = next;
            }
            prop_assert_eq!(ledger.score() as usize, n);
        }
    }
}
