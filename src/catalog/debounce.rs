//! Cancellable single-shot timer for search input.
//!
//! Each call to [`Debouncer::schedule`] bumps a generation counter and spawns a
//! sleep that reports back with the generation it was started for. Only a
//! report carrying the current generation is accepted, so a superseded timer
//! can never apply its value.

use std::time::Duration;
use tokio::sync::mpsc;

/// A timer report delivered on the debouncer's channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<T> {
    generation: u64,
    value: T,
}

/// Debouncer for values of type `T`.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    generation: u64,
    pending: bool,
    tx: mpsc::UnboundedSender<Fired<T>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Create a debouncer and the receiver its timers report on.
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<Fired<T>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            delay,
            generation: 0,
            pending: false,
            tx,
        };
        (debouncer, rx)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start the timer for `value`, superseding any pending one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, value: T) -> u64 {
        self.generation += 1;
        self.pending = true;

        let generation = self.generation;
        let delay = self.delay;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver is gone when the view was closed.
            let _ = tx.send(Fired { generation, value });
        });
        generation
    }

    /// Invalidate the pending timer, if any.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Accept a timer report, returning its value only if it is current.
    pub fn accept(&mut self, fired: Fired<T>) -> Option<T> {
        if self.pending && fired.generation == self.generation {
            self.pending = false;
            Some(fired.value)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<T: Send + 'static>(
        debouncer: &mut Debouncer<T>,
        rx: &mut mpsc::UnboundedReceiver<Fired<T>>,
    ) -> Vec<T> {
        let mut accepted = Vec::new();
        while let Ok(fired) = rx.try_recv() {
            if let Some(value) = debouncer.accept(fired) {
                accepted.push(value);
            }
        }
        accepted
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_fires_once_with_last_value() {
        let (mut debouncer, mut rx) = Debouncer::new(Duration::from_millis(300));

        for query in ["a", "al", "ali", "alie", "alien"] {
            debouncer.schedule(query.to_string());
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(drain(&mut debouncer, &mut rx).is_empty());

        tokio::time::sleep(Duration::from_millis(400)).await;
        let accepted = drain(&mut debouncer, &mut rx);
        assert_eq!(accepted, vec!["alien".to_string()]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_fire_separately() {
        let (mut debouncer, mut rx) = Debouncer::new(Duration::from_millis(300));

        debouncer.schedule(1u32);
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(drain(&mut debouncer, &mut rx), vec![1]);

        debouncer.schedule(2u32);
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(drain(&mut debouncer, &mut rx), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_fires_before_quiet_period() {
        let (mut debouncer, mut rx) = Debouncer::new(Duration::from_millis(300));
        debouncer.schedule("x");
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(drain(&mut debouncer, &mut rx).is_empty());
        assert!(debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_suppresses_pending_timer() {
        let (mut debouncer, mut rx) = Debouncer::new(Duration::from_millis(300));
        debouncer.schedule("gone");
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(drain(&mut debouncer, &mut rx).is_empty());
    }
}
