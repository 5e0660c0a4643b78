// ui.rs

use crate::score::{ScoreDocument, ScoreHandle};
use crate::state::RecordingState;
use crossbeam::channel::RecvTimeoutError;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const REFRESH: Duration = Duration::from_millis(100);

pub fn create_measure_progress(capacity: u64) -> ProgressBar {
    let pb = ProgressBar::new(capacity);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:.bold} [{bar:40.cyan}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("⣀⣤⣦⣶⣷⣿ "),
    );
    pb.set_prefix("Measure");
    pb
}

pub fn create_state_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix("Score");
    pb
}

/// One-line summary shown next to the spinner.
pub fn status_line(state: RecordingState, document: &ScoreDocument) -> String {
    format!(
        "{} | {} part(s) | {} measure(s) | {} note(s) | rev {}",
        state,
        document.parts.len(),
        document.measure_count(),
        document.note_count(),
        document.revision
    )
}

/// Divisions filled in the newest measure of the longest part.
fn current_measure_fill(document: &ScoreDocument) -> u64 {
    document
        .parts
        .iter()
        .filter_map(|part| part.measures.last().map(|m| (part.measures.len(), m.filled())))
        .max()
        .map_or(0, |(_, filled)| filled)
}

pub struct StatusDisplay {
    #[allow(dead_code)]
    multi_progress: MultiProgress,
    measure_pb: ProgressBar,
    state_pb: ProgressBar,
    handle: ScoreHandle,
}

impl StatusDisplay {
    pub fn new(handle: ScoreHandle) -> Self {
        let multi_progress = MultiProgress::with_draw_target(ProgressDrawTarget::stderr());
        let capacity = handle
            .current_document()
            .header
            .time_signature
            .measure_divisions();
        let measure_pb = multi_progress.add(create_measure_progress(capacity));
        let state_pb = multi_progress.add(create_state_spinner());

        StatusDisplay {
            multi_progress,
            measure_pb,
            state_pb,
            handle,
        }
    }

    pub fn refresh(&self) {
        let document = self.handle.current_document();
        self.measure_pb.set_position(current_measure_fill(&document));
        self.state_pb
            .set_message(status_line(self.handle.recording_state(), &document));
        self.state_pb.tick();
    }

    /// Redraws on every score update, and at least every 100 ms, until
    /// `running` is cleared.
    pub fn spawn(self, running: Arc<AtomicBool>) -> JoinHandle<()> {
        let updates = self.handle.subscribe();
        thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                self.refresh();
                match updates.recv_timeout(REFRESH) {
                    Ok(_) | Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            self.state_pb.finish_and_clear();
            self.measure_pb.finish_and_clear();
        })
    }
}
