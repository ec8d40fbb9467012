use std::sync::atomic::{AtomicU16, Ordering};

/// Issues envelope transaction ids for one session.
///
/// Ids count up from zero and wrap at `u16::MAX`. They are unrelated to the correlation ids
/// the multiplexer puts on frames.
#[derive(Debug, Default)]
pub struct TransactionIdSource {
    next: AtomicU16,
}

impl TransactionIdSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(id: u16) -> Self {
        Self {
            next: AtomicU16::new(id),
        }
    }

    pub fn next(&self) -> u32 {
        u32::from(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc, thread};

    use super::*;

    #[test]
    fn counts_from_zero() {
        let tids = TransactionIdSource::new();
        assert_eq!(tids.next(), 0);
        assert_eq!(tids.next(), 1);
        assert_eq!(tids.next(), 2);
    }

    #[test]
    fn wraps_to_zero() {
        let tids = TransactionIdSource::starting_at(u16::MAX);
        assert_eq!(tids.next(), u16::MAX as u32);
        assert_eq!(tids.next(), 0);
    }

    #[test]
    fn concurrent_callers_never_share_an_id() {
        let tids = Arc::new(TransactionIdSource::new());
        let handles = (0..8)
            .map(|_| {
                let tids = Arc::clone(&tids);
                thread::spawn(move || (0..1000).map(|_| tids.next()).collect::<Vec<_>>())
            })
            .collect::<Vec<_>>();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "transaction id {id} issued twice");
            }
        }
        assert_eq!(seen.len(), 8000);
    }
}
