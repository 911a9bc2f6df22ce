//! Pending batch state for the debounce scheduler.

use edge_markers::MarkerSnapshot;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::ResolverResult;

/// A caller waiting on the pending batch.
///
/// The snapshot is the one captured when the caller enqueued; it is what gets
/// written to the cache, even if markers have changed since.
#[derive(Debug)]
pub(crate) struct Waiter {
    pub section: String,
    pub markers: MarkerSnapshot,
    pub reply: oneshot::Sender<ResolverResult<Value>>,
}

/// Result of adding a waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Enqueued {
    /// The batch was idle and is now armed; the caller must start its timer.
    Armed(u64),
    /// The waiter joined an already armed batch.
    Joined,
}

/// Which flush is claiming the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Claim {
    /// The debounce timer of the given generation fired.
    Timer(u64),
    /// An explicit flush; cancels the armed timer.
    Manual,
}

#[derive(Debug, Default)]
enum BatchState {
    #[default]
    Idle,
    Armed {
        generation: u64,
        waiters: Vec<Waiter>,
        timer: Option<JoinHandle<()>>,
    },
}

/// Two-state pending batch: idle, or armed with waiters and one timer.
///
/// Claiming drains every waiter and clears the timer in one step, so an
/// enqueue racing a flush either makes it into the claimed batch or arms a
/// new one.
#[derive(Debug, Default)]
pub(crate) struct PendingBatch {
    state: BatchState,
    next_generation: u64,
}

impl PendingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, waiter: Waiter) -> Enqueued {
        match &mut self.state {
            BatchState::Armed { waiters, .. } => {
                waiters.push(waiter);
                Enqueued::Joined
            }
            BatchState::Idle => {
                let generation = self.next_generation;
                self.next_generation += 1;
                self.state = BatchState::Armed {
                    generation,
                    waiters: vec![waiter],
                    timer: None,
                };
                Enqueued::Armed(generation)
            }
        }
    }

    /// Attach the timer handle of the armed batch.
    ///
    /// A handle for a batch that was already claimed is aborted.
    pub fn set_timer(&mut self, generation: u64, handle: JoinHandle<()>) {
        match &mut self.state {
            BatchState::Armed {
                generation: armed,
                timer,
                ..
            } if *armed == generation => {
                *timer = Some(handle);
            }
            _ => handle.abort(),
        }
    }

    /// Take every waiter and return to idle.
    ///
    /// A timer claim only succeeds for its own generation; a stale timer gets
    /// `None`. A manual claim aborts the armed timer.
    pub fn claim(&mut self, claim: Claim) -> Option<Vec<Waiter>> {
        let current = match &self.state {
            BatchState::Idle => return None,
            BatchState::Armed { generation, .. } => *generation,
        };

        if let Claim::Timer(generation) = claim {
            if generation != current {
                return None;
            }
        }

        match std::mem::take(&mut self.state) {
            BatchState::Armed { waiters, timer, .. } => {
                if claim == Claim::Manual {
                    if let Some(timer) = timer {
                        timer.abort();
                    }
                }
                Some(waiters)
            }
            BatchState::Idle => None,
        }
    }

    /// Number of waiters in the armed batch.
    pub fn len(&self) -> usize {
        match &self.state {
            BatchState::Idle => 0,
            BatchState::Armed { waiters, .. } => waiters.len(),
        }
    }
}

/// Section names of a batch in first-enqueue order, each listed once.
pub(crate) fn batch_sections(waiters: &[Waiter]) -> Vec<String> {
    let mut sections: Vec<String> = Vec::with_capacity(waiters.len());
    for waiter in waiters {
        if !sections.contains(&waiter.section) {
            sections.push(waiter.section.clone());
        }
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waiter(section: &str) -> (Waiter, oneshot::Receiver<ResolverResult<Value>>) {
        let (reply, rx) = oneshot::channel();
        (
            Waiter {
                section: section.to_string(),
                markers: MarkerSnapshot::new(),
                reply,
            },
            rx,
        )
    }

    #[test]
    fn test_first_enqueue_arms() {
        let mut batch = PendingBatch::new();
        assert_eq!(batch.len(), 0);

        let (a, _rx_a) = waiter("a");
        let (b, _rx_b) = waiter("b");
        assert_eq!(batch.enqueue(a), Enqueued::Armed(0));
        assert_eq!(batch.enqueue(b), Enqueued::Joined);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_claim_drains_and_resets() {
        let mut batch = PendingBatch::new();
        let (a, _rx) = waiter("a");
        batch.enqueue(a);

        let claimed = batch.claim(Claim::Timer(0)).unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(batch.len(), 0);
        assert!(batch.claim(Claim::Timer(0)).is_none());
    }

    #[test]
    fn test_stale_timer_cannot_claim_new_batch() {
        let mut batch = PendingBatch::new();
        let (a, _rx_a) = waiter("a");
        batch.enqueue(a);
        batch.claim(Claim::Manual).unwrap();

        let (b, _rx_b) = waiter("b");
        assert_eq!(batch.enqueue(b), Enqueued::Armed(1));

        // The first window's timer fires late
        assert!(batch.claim(Claim::Timer(0)).is_none());
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.claim(Claim::Timer(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_batch_sections_dedupes_in_order() {
        let waiters: Vec<Waiter> = ["b", "a", "b", "c", "a"]
            .iter()
            .map(|s| waiter(s).0)
            .collect();

        assert_eq!(batch_sections(&waiters), vec!["b", "a", "c"]);
    }
}
