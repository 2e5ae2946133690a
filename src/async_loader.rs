//! Async loading utilities
//!
//! Comparing many pairs can take a while, so the TUI runs batches on a
//! background thread and polls for the result on ticks.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::batch::{self, BatchReport};
use crate::compare::{Comparator, FilePair};

/// Runs one batch at a time in the background
#[derive(Default)]
pub struct BatchLoader {
    rx: Option<Receiver<BatchReport>>,
    loading: bool,
    /// A reload was requested while a batch was running
    queued: bool,
}

impl BatchLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Spawn background thread to compare `pairs`. If a batch is already
    /// running the request is remembered and `take_queued` reports it.
    pub fn load(&mut self, comparator: Comparator, pairs: Vec<FilePair>) {
        if self.loading {
            self.queued = true;
            return;
        }

        let (tx, rx) = mpsc::channel();
        self.rx = Some(rx);
        self.loading = true;

        thread::spawn(move || {
            let report = batch::run(&comparator, pairs);
            let _ = tx.send(report);
        });
    }

    /// Poll for a completed batch
    pub fn poll(&mut self) -> Option<BatchReport> {
        let rx = self.rx.as_ref()?;
        match rx.try_recv() {
            Ok(report) => {
                self.loading = false;
                self.rx = None;
                Some(report)
            }
            Err(TryRecvError::Disconnected) => {
                log::debug!("Batch loader disconnected");
                self.loading = false;
                self.rx = None;
                None
            }
            Err(TryRecvError::Empty) => None,
        }
    }

    /// Whether a reload was requested during the last run
    pub fn take_queued(&mut self) -> bool {
        std::mem::take(&mut self.queued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for(loader: &mut BatchLoader) -> Option<BatchReport> {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if let Some(report) = loader.poll() {
                return Some(report);
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn load_then_poll_returns_report() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), "x\n").unwrap();
        std::fs::write(dir.path().join("b"), "y\n").unwrap();

        let mut loader = BatchLoader::new();
        assert!(loader.poll().is_none());
        loader.load(
            Comparator::default(),
            vec![FilePair::new(0, dir.path().join("a"), dir.path().join("b"))],
        );
        assert!(loader.is_loading());

        let report = wait_for(&mut loader).expect("batch finished");
        assert_eq!(report.pairs.len(), 1);
        assert!(!loader.is_loading());
    }

    #[test]
    fn load_while_loading_is_queued() {
        let mut loader = BatchLoader::new();
        loader.load(Comparator::default(), Vec::new());
        loader.load(Comparator::default(), Vec::new());
        assert!(loader.take_queued());
        assert!(!loader.take_queued());
        assert!(wait_for(&mut loader).is_some());
    }
}
