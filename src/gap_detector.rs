//! Sequence number gap detection
//!
//! Collects the sequence numbers seen in a snapshot and reports every number
//! in `1..=max` that never arrived. Input order and contiguity are not
//! assumed.

use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct GapDetector {
    seen: HashSet<u32>,
    max_sequence: Option<u32>,
}

impl GapDetector {
    pub fn new() -> Self {
        GapDetector {
            seen: HashSet::new(),
            max_sequence: None,
        }
    }

    /// Record a received sequence number
    pub fn process(&mut self, seq_num: u32) {
        self.seen.insert(seq_num);
        self.max_sequence = Some(self.max_sequence.map_or(seq_num, |m| m.max(seq_num)));
    }

    /// Highest sequence seen so far
    pub fn max_sequence(&self) -> Option<u32> {
        self.max_sequence
    }

    /// Ascending list of sequences in `1..=max` that were never processed
    pub fn missing(&self) -> Vec<u32> {
        match self.max_sequence {
            None => Vec::new(),
            Some(max) => (1..=max).filter(|seq| !self.seen.contains(seq)).collect(),
        }
    }

    /// Count of distinct sequences processed
    pub fn received(&self) -> usize {
        self.seen.len()
    }

    pub fn reset(&mut self) {
        self.seen.clear();
        self.max_sequence = None;
    }
}

impl Extend<u32> for GapDetector {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        for seq in iter {
            self.process(seq);
        }
    }
}

/// Missing sequences for an unordered set of received sequence numbers
pub fn missing_sequences<I>(received: I) -> Vec<u32>
where
    I: IntoIterator<Item = u32>,
{
    let mut detector = GapDetector::new();
    detector.extend(received);
    detector.missing()
}
