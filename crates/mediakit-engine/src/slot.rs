use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use mediakit_contracts::events::{EventPayload, EventWriter};
use serde_json::Value;

use crate::error::MediaError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UiStatus {
    #[default]
    Idle,
    Loading,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome {
    Succeeded,
    Failed(String),
}

struct Completion<T> {
    generation: u64,
    outcome: Result<T, MediaError>,
}

/// One independent async operation of a panel: status, last good result, and the
/// worker that produces the next one.
///
/// Each `start` or `invalidate` bumps a generation counter; a completion carrying an
/// older generation is dropped on arrival so a late reply never lands on changed inputs.
pub struct AsyncSlot<T> {
    name: &'static str,
    status: UiStatus,
    result: Option<T>,
    generation: u64,
    tx: Sender<Completion<T>>,
    rx: Receiver<Completion<T>>,
    events: EventWriter,
}

impl<T: Send + 'static> AsyncSlot<T> {
    pub fn new(name: &'static str, events: EventWriter) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            name,
            status: UiStatus::Idle,
            result: None,
            generation: 0,
            tx,
            rx,
            events,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn status(&self) -> &UiStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == UiStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            UiStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    pub fn take_result(&mut self) -> Option<T> {
        self.result.take()
    }

    /// Runs `job` on a worker thread. Refused while a previous job is in flight.
    pub fn start<F>(&mut self, clear_previous: bool, job: F) -> bool
    where
        F: FnOnce() -> Result<T, MediaError> + Send + 'static,
    {
        if self.is_loading() {
            return false;
        }
        self.generation += 1;
        let generation = self.generation;
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("mediakit-{}", self.name))
            .spawn(move || {
                let outcome = job();
                let _ = tx.send(Completion {
                    generation,
                    outcome,
                });
            });
        if let Err(err) = spawned {
            return self.refuse_start(&err);
        }

        self.status = UiStatus::Loading;
        if clear_previous {
            self.result = None;
        }
        true
    }

    /// No worker runs, so the slot shows the error and keeps its last result.
    fn refuse_start(&mut self, err: &io::Error) -> bool {
        self.status = UiStatus::Error(format!("Could not start {}: {err}", self.name));
        false
    }

    /// Forgets any in-flight job and clears the status. The last result stays.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.status = UiStatus::Idle;
    }

    pub fn reset(&mut self) {
        self.invalidate();
        self.result = None;
    }

    /// Applies whatever completions have arrived without blocking.
    pub fn pump(&mut self) -> Option<SlotOutcome> {
        let mut latest = None;
        while let Ok(completion) = self.rx.try_recv() {
            if let Some(outcome) = self.apply(completion) {
                latest = Some(outcome);
            }
        }
        latest
    }

    /// Blocks until the in-flight job completes or `timeout` elapses.
    pub fn wait(&mut self, timeout: Duration) -> Option<SlotOutcome> {
        let deadline = Instant::now() + timeout;
        while self.is_loading() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(completion) => {
                    if let Some(outcome) = self.apply(completion) {
                        return Some(outcome);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        None
    }

    fn apply(&mut self, completion: Completion<T>) -> Option<SlotOutcome> {
        if completion.generation != self.generation || !self.is_loading() {
            let mut payload = EventPayload::new();
            payload.insert("slot".to_string(), Value::from(self.name));
            payload.insert("generation".to_string(), Value::from(completion.generation));
            payload.insert("current_generation".to_string(), Value::from(self.generation));
            self.events.record("slot_stale_dropped", payload);
            return None;
        }
        match completion.outcome {
            Ok(value) => {
                self.result = Some(value);
                self.status = UiStatus::Idle;
                Some(SlotOutcome::Succeeded)
            }
            Err(err) => {
                let message = err.to_string();
                self.status = UiStatus::Error(message.clone());
                Some(SlotOutcome::Failed(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::mpsc;

    use anyhow::anyhow;

    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn success_stores_result_and_returns_to_idle() {
        let mut slot = AsyncSlot::new("describe", EventWriter::disabled());
        assert!(slot.start(false, || Ok("a fox".to_string())));
        assert!(slot.is_loading());
        assert_eq!(slot.wait(WAIT), Some(SlotOutcome::Succeeded));
        assert_eq!(slot.status(), &UiStatus::Idle);
        assert_eq!(slot.result().map(String::as_str), Some("a fox"));
    }

    #[test]
    fn failure_keeps_previous_result() {
        let mut slot = AsyncSlot::new("describe", EventWriter::disabled());
        slot.start(false, || Ok("first".to_string()));
        slot.wait(WAIT);

        slot.start(false, || {
            Err(MediaError::gateway(
                "Failed to generate description from image.",
                anyhow!("timeout"),
            ))
        });
        assert_eq!(
            slot.wait(WAIT),
            Some(SlotOutcome::Failed(
                "Failed to generate description from image.".to_string()
            ))
        );
        assert!(!slot.is_loading());
        assert_eq!(slot.error(), Some("Failed to generate description from image."));
        assert_eq!(slot.result().map(String::as_str), Some("first"));
    }

    #[test]
    fn clear_previous_drops_result_at_start() {
        let mut slot = AsyncSlot::new("enhance", EventWriter::disabled());
        slot.start(true, || Ok(1_u32));
        slot.wait(WAIT);
        let (release, gate) = mpsc::channel::<()>();
        slot.start(true, move || {
            let _ = gate.recv_timeout(WAIT);
            Ok(2_u32)
        });
        assert_eq!(slot.result(), None);
        let _ = release.send(());
        slot.wait(WAIT);
        assert_eq!(slot.result(), Some(&2));
    }

    #[test]
    fn worker_spawn_failure_reports_not_started() {
        let mut slot = AsyncSlot::new("enhance", EventWriter::disabled());
        slot.start(false, || Ok(1_u32));
        slot.wait(WAIT);

        let err = io::Error::new(io::ErrorKind::WouldBlock, "no threads left");
        assert!(!slot.refuse_start(&err));
        assert!(!slot.is_loading());
        assert_eq!(slot.error(), Some("Could not start enhance: no threads left"));
        assert_eq!(slot.result(), Some(&1));
        assert!(slot.start(false, || Ok(2_u32)));
    }

    #[test]
    fn start_is_refused_while_loading() {
        let mut slot = AsyncSlot::new("enhance", EventWriter::disabled());
        let (release, gate) = mpsc::channel::<()>();
        assert!(slot.start(false, move || {
            let _ = gate.recv_timeout(WAIT);
            Ok(1_u32)
        }));
        assert!(!slot.start(false, || Ok(2_u32)));
        let _ = release.send(());
        slot.wait(WAIT);
        assert_eq!(slot.result(), Some(&1));
    }

    #[test]
    fn invalidated_completion_is_dropped_and_logged() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let mut slot = AsyncSlot::new("video", EventWriter::new(&path, "s"));
        let (release, gate) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        slot.start(true, move || {
            let _ = gate.recv_timeout(WAIT);
            let _ = done_tx.send(());
            Ok("stale".to_string())
        });
        slot.invalidate();
        assert_eq!(slot.status(), &UiStatus::Idle);

        release.send(())?;
        done_rx.recv_timeout(WAIT)?;
        // The worker sends right after signalling; give the channel a moment.
        let deadline = Instant::now() + WAIT;
        while !fs::metadata(&path).map(|meta| meta.len() > 0).unwrap_or(false)
            && Instant::now() < deadline
        {
            assert_eq!(slot.pump(), None);
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(slot.result(), None);
        assert!(fs::read_to_string(&path)?.contains("slot_stale_dropped"));
        Ok(())
    }
}
