//! Copy Controller
//!
//! Reads one physical record at a time from a `TapeSource` and encodes
//! each outcome into the image. A tape drive rarely reports the physical
//! end of the tape; it shows up as a run of read errors instead, so after
//! `max_consecutive_errors` error units the next failure ends the image
//! with an end-of-medium unit.

use crate::config::CopyPolicy;
use crate::image::{ImageWriter, WriteStats};
use crate::tape::{error_message, ReadOutcome, TapeSource};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CopyState {
    #[default]
    Reading,
    /// At least one read error since the last record or mark
    Erroring,
    Terminated,
}

/// Per-run counters, owned by the controller and threaded through `step`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    pub state: CopyState,
    /// Marks written since the last record
    pub consecutive_marks: u32,
    /// Read errors since the last record or mark
    pub consecutive_errors: u32,
}

impl RunState {
    pub fn on_record(self) -> Self {
        Self {
            state: CopyState::Reading,
            consecutive_marks: 0,
            consecutive_errors: 0,
        }
    }

    pub fn on_mark(self) -> Self {
        Self {
            state: CopyState::Reading,
            consecutive_marks: self.consecutive_marks.saturating_add(1),
            consecutive_errors: 0,
        }
    }

    pub fn on_error(self) -> Self {
        Self {
            state: CopyState::Erroring,
            consecutive_errors: self.consecutive_errors.saturating_add(1),
            ..self
        }
    }

    pub fn terminate(self) -> Self {
        Self {
            state: CopyState::Terminated,
            ..self
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.state == CopyState::Terminated
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// Too many consecutive read errors; end of medium assumed
    EndOfMedium,
    /// Stopped on request between two reads
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopySummary {
    pub records: u64,
    pub marks: u64,
    pub errors: u64,
    /// Data outcomes the encoder refused
    pub rejected: u64,
    /// Payload bytes read from the tape
    pub bytes_read: u64,
    pub write: WriteStats,
    pub outcome: CopyOutcome,
}

pub struct CopyController<S: TapeSource, W: Write> {
    source: S,
    writer: ImageWriter<W>,
    buffer: Vec<u8>,
    max_consecutive_errors: u32,
    records: u64,
    marks: u64,
    errors: u64,
    rejected: u64,
    bytes_read: u64,
}

impl<S: TapeSource, W: Write> CopyController<S, W> {
    pub fn new(source: S, sink: W, policy: &CopyPolicy) -> Self {
        Self {
            source,
            writer: ImageWriter::new(sink).with_end_of_tape_marks(policy.end_of_tape_marks),
            buffer: vec![0u8; policy.record_buffer_size],
            max_consecutive_errors: policy.max_consecutive_errors,
            records: 0,
            marks: 0,
            errors: 0,
            rejected: 0,
            bytes_read: 0,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_parts(self) -> (S, W) {
        (self.source, self.writer.into_inner())
    }

    /// Perform one read and encode its outcome
    pub fn step(&mut self, state: RunState) -> RunState {
        if state.is_terminated() {
            return state;
        }

        let outcome = self.source.read_next(&mut self.buffer);
        match outcome {
            ReadOutcome::Data(data) => {
                debug!("{}", outcome);
                match self.writer.write_record(data) {
                    Ok(()) => {
                        self.records += 1;
                        self.bytes_read += data.len() as u64;
                        state.on_record()
                    }
                    Err(e) => {
                        warn!("Record rejected: {}", e);
                        self.rejected += 1;
                        state
                    }
                }
            }
            ReadOutcome::TapeMark => {
                info!("{}", outcome);
                self.writer.write_mark();
                self.marks += 1;
                state.on_mark()
            }
            ReadOutcome::Error(code) if state.consecutive_errors >= self.max_consecutive_errors => {
                info!(
                    "Guessing physical end of tape after {} consecutive read errors ({})",
                    state.consecutive_errors,
                    error_message(code)
                );
                self.writer.write_end_of_medium();
                state.terminate()
            }
            ReadOutcome::Error(code) => {
                warn!("{}", outcome);
                self.writer.write_error(code as u32);
                self.errors += 1;
                state.on_error()
            }
        }
    }

    /// Copy until the end-of-medium guess or until `cancel` is set.
    /// A cancelled image is closed with end-of-tape marks.
    pub fn run(&mut self, cancel: &AtomicBool) -> CopySummary {
        let mut state = RunState::default();
        let mut outcome = CopyOutcome::EndOfMedium;

        while !state.is_terminated() {
            if cancel.load(Ordering::Relaxed) {
                let padded = self.writer.write_end_of_tape();
                warn!("Copy cancelled; closed image with {} end-of-tape marks", padded);
                self.marks += u64::from(padded);
                state.consecutive_marks += padded;
                debug_assert_eq!(state.consecutive_marks, self.writer.trailing_marks());
                state = state.terminate();
                outcome = CopyOutcome::Cancelled;
                break;
            }
            state = self.step(state);
            debug_assert_eq!(state.consecutive_marks, self.writer.trailing_marks());
        }

        self.writer.flush();
        self.summary(outcome)
    }

    fn summary(&self, outcome: CopyOutcome) -> CopySummary {
        CopySummary {
            records: self.records,
            marks: self.marks,
            errors: self.errors,
            rejected: self.rejected,
            bytes_read: self.bytes_read,
            write: self.writer.stats(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{ImageReader, ImageUnit};
    use crate::tape::EIO;
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    enum Scripted {
        Data(Vec<u8>),
        Mark,
        Error(i32),
    }

    /// Plays back a fixed script, then fails every read with `tail_error`
    struct ScriptedSource {
        script: VecDeque<Scripted>,
        tail_error: i32,
        reads: usize,
        cancel_after: Option<(usize, Arc<AtomicBool>)>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Scripted>, tail_error: i32) -> Self {
            Self {
                script: script.into(),
                tail_error,
                reads: 0,
                cancel_after: None,
            }
        }
    }

    impl TapeSource for ScriptedSource {
        fn read_next<'a>(&mut self, buffer: &'a mut [u8]) -> ReadOutcome<'a> {
            self.reads += 1;
            if let Some((n, flag)) = &self.cancel_after {
                if self.reads >= *n {
                    flag.store(true, Ordering::Relaxed);
                }
            }
            match self.script.pop_front() {
                Some(Scripted::Data(data)) => {
                    buffer[..data.len()].copy_from_slice(&data);
                    ReadOutcome::Data(&buffer[..data.len()])
                }
                Some(Scripted::Mark) => ReadOutcome::TapeMark,
                Some(Scripted::Error(code)) => ReadOutcome::Error(code),
                None => ReadOutcome::Error(self.tail_error),
            }
        }
    }

    fn small_policy() -> CopyPolicy {
        CopyPolicy {
            record_buffer_size: 1024,
            ..Default::default()
        }
    }

    fn decode(image: Vec<u8>) -> Vec<ImageUnit> {
        let mut reader = ImageReader::new(Cursor::new(image)).unwrap();
        let mut units = Vec::new();
        while let Some(unit) = reader.next_unit().unwrap() {
            units.push(unit);
        }
        units
    }

    fn run_script(script: Vec<Scripted>, tail_error: i32, policy: &CopyPolicy) -> (CopySummary, ScriptedSource, Vec<u8>) {
        let mut controller = CopyController::new(ScriptedSource::new(script, tail_error), Vec::new(), policy);
        let summary = controller.run(&AtomicBool::new(false));
        let (source, image) = controller.into_parts();
        (summary, source, image)
    }

    #[test]
    fn test_scenario_record_mark_then_error_run() {
        let script = vec![Scripted::Data(b"AB".to_vec()), Scripted::Mark];
        let (summary, source, image) = run_script(script, 5, &small_policy());

        let mut expected = vec![2, 0, 0, 0, b'A', b'B', 2, 0, 0, 0, 0, 0, 0, 0];
        for _ in 0..20 {
            expected.extend_from_slice(&[5, 0, 0, 0x80]);
        }
        expected.extend_from_slice(&[0xFF; 4]);

        assert_eq!(image, expected);
        assert_eq!(source.reads, 2 + 21);
        assert_eq!(summary.outcome, CopyOutcome::EndOfMedium);
        assert_eq!(summary.records, 1);
        assert_eq!(summary.marks, 1);
        assert_eq!(summary.errors, 20);
    }

    #[test]
    fn test_all_errors_emit_twenty_then_end_of_medium() {
        let (_, source, image) = run_script(Vec::new(), EIO, &small_policy());

        let units = decode(image);
        assert_eq!(units.len(), 21);
        assert!(units[..20].iter().all(|u| *u == ImageUnit::Error(EIO as u32)));
        assert_eq!(units[20], ImageUnit::EndOfMedium);
        assert_eq!(source.reads, 21);
    }

    #[test]
    fn test_error_threshold_is_configurable() {
        let policy = CopyPolicy {
            max_consecutive_errors: 3,
            ..small_policy()
        };
        let (summary, source, _) = run_script(Vec::new(), EIO, &policy);
        assert_eq!(summary.errors, 3);
        assert_eq!(source.reads, 4);

        let policy = CopyPolicy {
            max_consecutive_errors: 0,
            ..small_policy()
        };
        let (summary, _, image) = run_script(Vec::new(), EIO, &policy);
        assert_eq!(summary.errors, 0);
        assert_eq!(decode(image), vec![ImageUnit::EndOfMedium]);
    }

    #[test]
    fn test_data_resets_error_run() {
        let mut script: Vec<Scripted> = (0..19).map(|_| Scripted::Error(EIO)).collect();
        script.push(Scripted::Data(b"x".to_vec()));
        script.extend((0..19).map(|_| Scripted::Error(EIO)));
        script.push(Scripted::Mark);

        let (summary, source, image) = run_script(script, EIO, &small_policy());

        // 19 + 19 interrupted runs, then a fresh run of 20
        assert_eq!(summary.errors, 19 + 19 + 20);
        assert_eq!(source.reads, 19 + 1 + 19 + 1 + 21);
        assert_eq!(decode(image).last(), Some(&ImageUnit::EndOfMedium));
    }

    #[test]
    fn test_step_updates_run_state() {
        let script = vec![
            Scripted::Mark,
            Scripted::Mark,
            Scripted::Error(5),
            Scripted::Data(b"abc".to_vec()),
            Scripted::Error(5),
            Scripted::Mark,
        ];
        let mut controller = CopyController::new(ScriptedSource::new(script, EIO), Vec::new(), &small_policy());

        let mut state = RunState::default();
        state = controller.step(state);
        state = controller.step(state);
        assert_eq!(state.consecutive_marks, 2);
        assert_eq!(controller.writer.trailing_marks(), 2);

        state = controller.step(state);
        assert_eq!(state.state, CopyState::Erroring);
        assert_eq!(state.consecutive_errors, 1);
        assert_eq!(state.consecutive_marks, 2);

        state = controller.step(state);
        assert_eq!(state, RunState::default());
        assert_eq!(controller.writer.trailing_marks(), 0);

        state = controller.step(state);
        state = controller.step(state);
        assert_eq!(
            state,
            RunState {
                state: CopyState::Reading,
                consecutive_marks: 1,
                consecutive_errors: 0,
            }
        );
        assert_eq!(controller.writer.trailing_marks(), 1);
    }

    #[test]
    fn test_terminated_state_does_not_read() {
        let mut controller = CopyController::new(ScriptedSource::new(Vec::new(), EIO), Vec::new(), &small_policy());
        let state = RunState::default().terminate();

        assert_eq!(controller.step(state), state);
        assert_eq!(controller.source().reads, 0);
    }

    #[test]
    fn test_empty_data_is_rejected_without_state_change() {
        let script = vec![Scripted::Mark, Scripted::Data(Vec::new())];
        let mut controller = CopyController::new(ScriptedSource::new(script, EIO), Vec::new(), &small_policy());

        let state = controller.step(RunState::default());
        let after = controller.step(state);
        assert_eq!(after, state);

        let (_, image) = controller.into_parts();
        assert_eq!(image, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_cancellation_pads_end_of_tape() {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut source = ScriptedSource::new(
            vec![Scripted::Data(b"one".to_vec()), Scripted::Mark, Scripted::Data(b"two".to_vec())],
            EIO,
        );
        source.cancel_after = Some((3, cancel.clone()));

        let mut controller = CopyController::new(source, Vec::new(), &small_policy());
        let summary = controller.run(&cancel);
        let (source, image) = controller.into_parts();

        assert_eq!(summary.outcome, CopyOutcome::Cancelled);
        assert_eq!(source.reads, 3);
        assert_eq!(
            decode(image),
            vec![
                ImageUnit::Record(b"one".to_vec()),
                ImageUnit::Mark,
                ImageUnit::Record(b"two".to_vec()),
                ImageUnit::Mark,
                ImageUnit::Mark,
            ]
        );
        assert_eq!(summary.marks, 3);
    }

    #[test]
    fn test_run_state_transitions() {
        let s = RunState::default().on_mark().on_mark();
        assert_eq!(s.consecutive_marks, 2);

        let s = s.on_error().on_error();
        assert_eq!(s.state, CopyState::Erroring);
        assert_eq!(s.consecutive_errors, 2);
        assert_eq!(s.consecutive_marks, 2);

        let s = s.on_mark();
        assert_eq!(s.consecutive_errors, 0);
        assert_eq!(s.consecutive_marks, 3);

        let s = s.on_record();
        assert_eq!(s, RunState::default());
    }
}
