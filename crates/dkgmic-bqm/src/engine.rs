//! Contract with the external G'MIC filter engine.
//!
//! The engine is a black box: it receives planar images, a command line and
//! an environment string, and returns images plus status lines. Progress and
//! cancellation go through a shared [`JobControl`].

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crate::buffer::EngineImage;

/// Command given to the engine when no preview is wanted.
pub const NO_PREVIEW_COMMAND: &str = "skip 0";

/// Layers handed to the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// No input image.
    NoInput = 0,
    /// Active layer only.
    #[default]
    Active = 1,
    /// Every layer.
    All = 2,
    /// Active layer and the ones below it.
    ActiveAndBelow = 3,
    /// Active layer and the ones above it.
    ActiveAndAbove = 4,
    /// Visible layers.
    AllVisible = 5,
    /// Hidden layers.
    AllInvisible = 6,
}

/// Where the filter output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Replace the input.
    #[default]
    InPlace = 0,
    /// Add new layers.
    NewLayers = 1,
    /// Add new active layers.
    NewActiveLayers = 2,
    /// Create a new image.
    NewImage = 3,
}

/// Verbosity of engine status messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMessageMode {
    /// No messages.
    Quiet = 0,
    /// Messages on the console.
    #[default]
    VerboseConsole = 2,
    /// Messages in a log file.
    VerboseLogFile = 3,
    /// Detailed messages on the console.
    VeryVerboseConsole = 4,
    /// Detailed messages in a log file.
    VeryVerboseLogFile = 5,
    /// Debug output on the console.
    DebugConsole = 6,
    /// Debug output in a log file.
    DebugLogFile = 7,
}

/// Environment variables passed to the engine, in its `name=value` syntax.
pub fn environment(input: InputMode, output: OutputMode, messages: OutputMessageMode) -> String {
    format!(
        "_input_layers={} _output_mode={} _output_messages={}",
        input as i32, output as i32, messages as i32
    )
}

/// One engine invocation.
#[derive(Debug, Clone)]
pub struct EngineJob {
    /// Command run on the full image.
    pub command: String,
    /// Command run for previews.
    pub preview_command: String,
    /// Environment string, see [`environment`].
    pub environment: String,
    /// Input images.
    pub images: Vec<EngineImage>,
    /// Image names, one per image, in the engine `pos(x,y),name(..)` form.
    pub image_names: Vec<String>,
}

/// What the engine hands back.
#[derive(Debug, Clone)]
pub struct EngineOutcome {
    /// Output images on success, error message (possibly empty) on failure.
    pub result: Result<Vec<EngineImage>, String>,
    /// Status lines reported by the command.
    pub status: Vec<String>,
}

impl Default for EngineOutcome {
    fn default() -> Self {
        Self {
            result: Ok(Vec::new()),
            status: Vec::new(),
        }
    }
}

/// External filter engine.
pub trait FilterEngine: Send + Sync {
    /// Version string recorded in the image history.
    fn version(&self) -> String;

    /// Runs `job` to completion.
    ///
    /// Implementations update `control` with progress and return early once
    /// [`JobControl::is_aborted`] turns true.
    fn run(&self, job: EngineJob, control: &JobControl) -> EngineOutcome;
}

#[derive(Default)]
struct ControlState {
    progress: AtomicU32,
    abort: AtomicBool,
}

/// Progress and abort flag shared between a job and its owner.
///
/// Clones share the same state.
#[derive(Clone, Default)]
pub struct JobControl {
    state: Arc<ControlState>,
}

impl JobControl {
    /// Fresh control, progress 0 and not aborted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress in percent, 0..=100.
    pub fn progress(&self) -> f32 {
        f32::from_bits(self.state.progress.load(Ordering::Relaxed))
    }

    /// Stores the progress, clamped to 0..=100.
    pub fn set_progress(&self, percent: f32) {
        let percent = percent.clamp(0.0, 100.0);
        self.state.progress.store(percent.to_bits(), Ordering::Relaxed);
    }

    /// Requests cancellation.
    pub fn abort(&self) {
        self.state.abort.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation was requested.
    pub fn is_aborted(&self) -> bool {
        self.state.abort.load(Ordering::SeqCst)
    }

    /// Clears progress and the abort flag.
    pub fn reset(&self) {
        self.state.progress.store(0f32.to_bits(), Ordering::Relaxed);
        self.state.abort.store(false, Ordering::SeqCst);
    }
}

impl fmt::Debug for JobControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobControl")
            .field("progress", &self.progress())
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environment() {
        let env = environment(InputMode::default(), OutputMode::default(), OutputMessageMode::default());
        assert_eq!(env, "_input_layers=1 _output_mode=0 _output_messages=2");
    }

    #[test]
    fn control_is_shared() {
        let control = JobControl::new();
        let worker = control.clone();

        worker.set_progress(42.5);
        assert_eq!(control.progress(), 42.5);
        worker.set_progress(250.0);
        assert_eq!(control.progress(), 100.0);

        control.abort();
        assert!(worker.is_aborted());

        control.reset();
        assert!(!worker.is_aborted());
        assert_eq!(worker.progress(), 0.0);
    }
}
