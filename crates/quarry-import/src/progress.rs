//! Progress reporting for import runs.
//!
//! The pipeline calls [`ProgressSink::report`] synchronously from its own
//! thread: once with fraction `0.0` and a status line, then once per chunk
//! coordinate. Delivery is best-effort; sinks swallow their own failures.

use crossbeam_channel::{Receiver, Sender};

/// Receives fractional completion and optional status text.
pub trait ProgressSink {
    /// Reports `fraction` in `0.0..=1.0`.
    ///
    /// Must return promptly. `status` is only set when the status line
    /// changes.
    fn report(&mut self, fraction: f64, status: Option<&str>);
}

impl<F> ProgressSink for F
where
    F: FnMut(f64, Option<&str>),
{
    fn report(&mut self, fraction: f64, status: Option<&str>) {
        self(fraction, status)
    }
}

/// Discards every report.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _fraction: f64, _status: Option<&str>) {}
}

/// One delivered report.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressEvent {
    /// Completion in `0.0..=1.0`.
    pub fraction: f64,
    /// Status text, if it changed with this report.
    pub status: Option<String>,
}

impl ProgressEvent {
    fn new(fraction: f64, status: Option<&str>) -> Self {
        Self {
            fraction,
            status: status.map(str::to_owned),
        }
    }
}

/// Keeps every report in order.
#[derive(Clone, Debug, Default)]
pub struct ProgressRecorder {
    events: Vec<ProgressEvent>,
}

impl ProgressRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports received so far.
    pub fn events(&self) -> &[ProgressEvent] {
        &self.events
    }

    /// Just the fractions, in order.
    pub fn fractions(&self) -> Vec<f64> {
        self.events.iter().map(|e| e.fraction).collect()
    }

    /// Consumes the recorder.
    pub fn into_events(self) -> Vec<ProgressEvent> {
        self.events
    }
}

impl ProgressSink for ProgressRecorder {
    fn report(&mut self, fraction: f64, status: Option<&str>) {
        self.events.push(ProgressEvent::new(fraction, status));
    }
}

/// Forwards reports over a channel, e.g. to a UI thread.
///
/// The channel is unbounded so reporting never blocks. Once the receiver is
/// dropped, reports are silently discarded.
#[derive(Clone, Debug)]
pub struct ChannelProgress {
    tx: Sender<ProgressEvent>,
}

impl ChannelProgress {
    /// Creates a sink and the receiver that drains it.
    pub fn new() -> (Self, Receiver<ProgressEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&mut self, fraction: f64, status: Option<&str>) {
        if self.tx.send(ProgressEvent::new(fraction, status)).is_err() {
            tracing::trace!("progress receiver gone, dropping report");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_a_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |fraction: f64, status: Option<&str>| {
                seen.push((fraction, status.map(str::to_owned)));
            };
            sink.report(0.0, Some("Importing a.construction"));
            sink.report(1.0, None);
        }
        assert_eq!(
            seen,
            vec![(0.0, Some("Importing a.construction".to_string())), (1.0, None)]
        );
    }

    #[test]
    fn test_recorder_keeps_order() {
        let mut recorder = ProgressRecorder::new();
        recorder.report(0.0, Some("start"));
        recorder.report(0.5, None);
        recorder.report(1.0, None);
        assert_eq!(recorder.fractions(), vec![0.0, 0.5, 1.0]);
        assert_eq!(recorder.events()[0].status.as_deref(), Some("start"));
        assert_eq!(recorder.into_events().len(), 3);
    }

    #[test]
    fn test_channel_delivers_across_threads() {
        let (mut sink, rx) = ChannelProgress::new();
        let handle = std::thread::spawn(move || {
            sink.report(0.0, Some("start"));
            sink.report(1.0, None);
        });
        handle.join().unwrap();
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], ProgressEvent { fraction: 1.0, status: None });
    }

    #[test]
    fn test_channel_tolerates_dropped_receiver() {
        let (mut sink, rx) = ChannelProgress::new();
        drop(rx);
        sink.report(0.5, None);
    }
}
