//! Simulated "typing" delay before a step prompt is shown.
//!
//! Every step transition arms a new timer and cancels the previous one.
//! The generation counter covers the window where an aborted task has
//! already woken up and is waiting for the session lock.

use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct TypingTimer {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl TypingTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the pending prompt, if any. Returns the generation a new
    /// timer must carry.
    pub fn cancel(&mut self) -> u64 {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.generation += 1;
        self.generation
    }

    /// Track the task started for `generation`.
    pub fn arm(&mut self, handle: JoinHandle<()>) {
        self.handle = Some(handle);
    }

    /// Whether a task started for `generation` may still append its prompt.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation && self.handle.is_some()
    }

    /// Called by the task once its prompt is appended.
    pub fn finish(&mut self, generation: u64) {
        if self.generation == generation {
            self.handle = None;
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for TypingTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_bumps_generation_and_aborts() {
        let mut timer = TypingTimer::new();
        let generation = timer.cancel();
        let handle = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        });
        timer.arm(handle);
        assert!(timer.is_current(generation));
        assert!(timer.is_pending());

        let next = timer.cancel();
        assert_ne!(next, generation);
        assert!(!timer.is_current(generation));
        assert!(!timer.is_pending());
    }

    #[tokio::test]
    async fn finish_only_clears_matching_generation() {
        let mut timer = TypingTimer::new();
        let old = timer.cancel();
        let new = timer.cancel();
        timer.arm(tokio::spawn(async {}));

        timer.finish(old);
        assert!(timer.is_pending());

        timer.finish(new);
        assert!(!timer.is_pending());
    }
}
