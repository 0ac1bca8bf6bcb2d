//! Runs one G'MIC command on one image in a worker thread.
//!
//! The caller sets the input image and the command, starts the job, polls
//! [`BqmProcessor::progress`] or blocks in [`BqmProcessor::wait`], and reads
//! the output image once the job is done.

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::buffer::{engine_to_host, host_to_engine, HostImage};
use crate::engine::{
    environment, EngineJob, EngineOutcome, FilterEngine, InputMode, JobControl, OutputMessageMode, OutputMode,
    NO_PREVIEW_COMMAND,
};
use crate::error::{BqmError, BqmResult};

/// Interval between progress reports while waiting.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

/// Failure message used when the engine gives none.
pub const DEFAULT_FAILURE_MESSAGE: &str = "G'MIC Filter execution failed without error message.";

/// Name given to the processed image inside the engine.
const IMAGE_NAME: &str = "Batch Queue Manager";

/// Longest command shown in the filter name.
const FILTER_NAME_COMMAND_WIDTH: usize = 35;

/// Shortens `text` to `width` characters, ending with "..." when cut.
pub fn elided(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

struct RunningJob {
    done: Receiver<EngineOutcome>,
    worker: JoinHandle<()>,
    sixteen_bit: bool,
}

/// Threaded G'MIC job runner.
pub struct BqmProcessor {
    engine: Arc<dyn FilterEngine>,
    control: JobControl,
    input: Option<HostImage>,
    output: Option<HostImage>,
    command: String,
    filter_name: String,
    status: Vec<String>,
    completed: bool,
    job: Option<RunningJob>,
}

impl BqmProcessor {
    /// Creates a processor with its own job control.
    pub fn new(engine: Arc<dyn FilterEngine>) -> Self {
        Self::with_control(engine, JobControl::new())
    }

    /// Creates a processor sharing `control`, so another owner can cancel
    /// the job.
    pub fn with_control(engine: Arc<dyn FilterEngine>, control: JobControl) -> Self {
        Self {
            engine,
            control,
            input: None,
            output: None,
            command: String::new(),
            filter_name: String::new(),
            status: Vec::new(),
            completed: false,
            job: None,
        }
    }

    /// Sets the image to process.
    pub fn set_input_image(&mut self, image: HostImage) {
        self.input = Some(image);
    }

    /// Sets the command. Empty commands are rejected.
    pub fn set_processing_command(&mut self, command: &str) -> BqmResult<()> {
        if command.is_empty() {
            warn!("The G'MIC command is empty.");
            return Err(BqmError::EmptyCommand);
        }

        self.command = command.to_string();
        self.filter_name = format!("Custom command ({})", elided(command, FILTER_NAME_COMMAND_WIDTH));
        Ok(())
    }

    /// The command set by [`set_processing_command`](Self::set_processing_command).
    pub fn processing_command(&self) -> &str {
        &self.command
    }

    /// Display name of the filter, recorded in the image history.
    pub fn filter_name(&self) -> &str {
        &self.filter_name
    }

    /// Engine version string.
    pub fn engine_version(&self) -> String {
        self.engine.version()
    }

    /// Starts the job in a worker thread.
    pub fn start_processing(&mut self) -> BqmResult<()> {
        if self.job.is_some() {
            return Err(BqmError::Busy);
        }
        if self.command.is_empty() {
            return Err(BqmError::EmptyCommand);
        }
        let input = self.input.as_ref().ok_or(BqmError::NoInput)?;

        debug!(width = input.width(), height = input.height(), "processing image");
        debug!(command = %self.command, "G'MIC");

        let job = EngineJob {
            command: self.command.clone(),
            preview_command: NO_PREVIEW_COMMAND.to_string(),
            environment: environment(InputMode::default(), OutputMode::default(), OutputMessageMode::default()),
            images: vec![host_to_engine(input)],
            image_names: vec![format!("pos(0,0),name({IMAGE_NAME})")],
        };
        let sixteen_bit = input.sixteen_bit();

        self.completed = false;
        self.output = None;
        self.status.clear();
        self.control.reset();

        let (tx, rx) = channel();
        let engine = Arc::clone(&self.engine);
        let control = self.control.clone();
        let worker = thread::spawn(move || {
            let outcome = engine.run(job, &control);
            let _ = tx.send(outcome);
        });

        self.job = Some(RunningJob {
            done: rx,
            worker,
            sixteen_bit,
        });
        Ok(())
    }

    /// Returns true while a job is in flight.
    pub fn is_running(&self) -> bool {
        self.job.is_some()
    }

    /// Last progress reported by the engine, in percent.
    pub fn progress(&self) -> f32 {
        self.control.progress()
    }

    /// Requests cancellation of the running job.
    pub fn cancel(&self) {
        if self.job.is_some() {
            self.control.abort();
        }
    }

    /// Finishes the job if the engine is done, without blocking.
    ///
    /// Returns the error message (empty on success or abort) once finished.
    pub fn try_finish(&mut self) -> Option<String> {
        let job = self.job.as_ref()?;
        let outcome = match job.done.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => None,
        };
        Some(self.finish(outcome))
    }

    /// Blocks until the job is done. Returns the error message, empty on
    /// success or abort, or `None` without a running job.
    pub fn wait(&mut self) -> Option<String> {
        self.wait_with_progress(|_| {})
    }

    /// Like [`wait`](Self::wait), calling `on_progress` every
    /// [`PROGRESS_INTERVAL`].
    pub fn wait_with_progress(&mut self, mut on_progress: impl FnMut(f32)) -> Option<String> {
        let job = self.job.as_ref()?;
        let outcome = loop {
            match job.done.recv_timeout(PROGRESS_INTERVAL) {
                Ok(outcome) => break Some(outcome),
                Err(RecvTimeoutError::Timeout) => on_progress(self.control.progress()),
                Err(RecvTimeoutError::Disconnected) => break None,
            }
        };
        Some(self.finish(outcome))
    }

    fn finish(&mut self, outcome: Option<EngineOutcome>) -> String {
        let Some(job) = self.job.take() else {
            return String::new();
        };
        if job.worker.join().is_err() {
            warn!("G'MIC worker thread panicked");
        }

        let Some(outcome) = outcome else {
            self.completed = false;
            return DEFAULT_FAILURE_MESSAGE.to_string();
        };

        debug!(status = ?outcome.status, "G'MIC Filter status");
        self.status = outcome.status;

        match outcome.result {
            Err(message) => {
                warn!("G'MIC Filter execution failed!");
                let message = if message.is_empty() {
                    DEFAULT_FAILURE_MESSAGE.to_string()
                } else {
                    message
                };
                debug!("{message}");
                self.completed = false;
                message
            }
            Ok(_) if self.control.is_aborted() => {
                warn!("G'MIC Filter execution aborted...");
                self.completed = false;
                String::new()
            }
            Ok(images) => match images.first().map(|image| engine_to_host(image, job.sixteen_bit)) {
                Some(Ok(image)) => {
                    debug!("G'MIC Filter execution completed!");
                    self.output = Some(image);
                    self.completed = true;
                    String::new()
                }
                Some(Err(e)) => {
                    warn!("G'MIC Filter output rejected: {e}");
                    self.completed = false;
                    e.to_string()
                }
                None => {
                    warn!("G'MIC Filter returned no image");
                    self.completed = false;
                    DEFAULT_FAILURE_MESSAGE.to_string()
                }
            },
        }
    }

    /// Returns true if the last job produced an output image.
    pub fn processing_complete(&self) -> bool {
        self.completed
    }

    /// Output of the last completed job.
    pub fn output_image(&self) -> Option<&HostImage> {
        self.output.as_ref()
    }

    /// Takes the output of the last completed job.
    pub fn take_output_image(&mut self) -> Option<HostImage> {
        self.output.take()
    }

    /// Status lines of the last job.
    pub fn status(&self) -> &[String] {
        &self.status
    }
}

impl Drop for BqmProcessor {
    fn drop(&mut self) {
        if let Some(job) = self.job.take() {
            self.control.abort();
            let _ = job.worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{EngineImage, HostPixels};
    use std::sync::Mutex;

    /// Inverts every sample; fails on "fail", waits for abort on "hang".
    struct InvertEngine {
        seen: Mutex<Option<EngineJob>>,
    }

    impl InvertEngine {
        fn new() -> Arc<Self> {
            Arc::new(Self { seen: Mutex::new(None) })
        }
    }

    impl FilterEngine for InvertEngine {
        fn version(&self) -> String {
            "3.4.0".into()
        }

        fn run(&self, job: EngineJob, control: &JobControl) -> EngineOutcome {
            *self.seen.lock().unwrap() = Some(job.clone());
            match job.command.as_str() {
                "fail" => EngineOutcome {
                    result: Err("unknown command".into()),
                    status: vec!["error".into()],
                },
                "fail quietly" => EngineOutcome {
                    result: Err(String::new()),
                    status: Vec::new(),
                },
                "hang" => {
                    while !control.is_aborted() {
                        control.set_progress(50.0);
                        thread::sleep(Duration::from_millis(5));
                    }
                    EngineOutcome::default()
                }
                "panic" => panic!("engine crashed"),
                _ => {
                    let images: Vec<EngineImage> = job
                        .images
                        .into_iter()
                        .map(|mut image| {
                            image.data.iter_mut().for_each(|v| *v = 255.0 - *v);
                            image
                        })
                        .collect();
                    control.set_progress(100.0);
                    EngineOutcome {
                        result: Ok(images),
                        status: vec!["done".into()],
                    }
                }
            }
        }
    }

    fn image() -> HostImage {
        HostImage::from_pixels(1, 1, false, HostPixels::U8(vec![0, 100, 255, 255])).unwrap()
    }

    #[test]
    fn filter_name_elides() {
        assert_eq!(elided("short", 35), "short");
        assert_eq!(elided("abcdefghij", 8), "abcde...");

        let mut p = BqmProcessor::new(InvertEngine::new());
        assert!(matches!(p.set_processing_command(""), Err(BqmError::EmptyCommand)));
        p.set_processing_command("fx_sharpen 50,0 fx_frame 10,10,255,255,255,255").unwrap();
        assert_eq!(p.filter_name(), "Custom command (fx_sharpen 50,0 fx_frame 10,10,2...)");
    }

    #[test]
    fn start_requires_input() {
        let mut p = BqmProcessor::new(InvertEngine::new());
        p.set_processing_command("negate").unwrap();
        assert!(matches!(p.start_processing(), Err(BqmError::NoInput)));
        assert!(p.wait().is_none());
    }

    #[test]
    fn runs_engine() {
        let engine = InvertEngine::new();
        let mut p = BqmProcessor::new(engine.clone());
        p.set_input_image(image());
        p.set_processing_command("negate").unwrap();
        p.start_processing().unwrap();
        assert!(matches!(p.start_processing(), Err(BqmError::Busy)));

        assert_eq!(p.wait().as_deref(), Some(""));
        assert!(p.processing_complete());
        assert!(!p.is_running());
        assert_eq!(p.status(), ["done"]);
        assert_eq!(p.output_image().unwrap().pixel(0, 0), Some([255, 155, 0, 255]));

        let seen = engine.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.environment, "_input_layers=1 _output_mode=0 _output_messages=2");
        assert_eq!(seen.preview_command, "skip 0");
        assert_eq!(seen.image_names, ["pos(0,0),name(Batch Queue Manager)"]);
    }

    #[test]
    fn failure_messages() {
        let mut p = BqmProcessor::new(InvertEngine::new());
        p.set_input_image(image());

        p.set_processing_command("fail").unwrap();
        p.start_processing().unwrap();
        assert_eq!(p.wait().as_deref(), Some("unknown command"));
        assert!(!p.processing_complete());
        assert!(p.output_image().is_none());

        p.set_processing_command("fail quietly").unwrap();
        p.start_processing().unwrap();
        assert_eq!(p.wait().as_deref(), Some(DEFAULT_FAILURE_MESSAGE));

        p.set_processing_command("panic").unwrap();
        p.start_processing().unwrap();
        assert_eq!(p.wait().as_deref(), Some(DEFAULT_FAILURE_MESSAGE));
        assert!(!p.processing_complete());
    }

    #[test]
    fn cancel_aborts() {
        let mut p = BqmProcessor::new(InvertEngine::new());
        p.set_input_image(image());
        p.set_processing_command("hang").unwrap();
        p.start_processing().unwrap();

        while p.progress() < 50.0 {
            thread::sleep(Duration::from_millis(1));
        }
        p.cancel();

        let mut message = None;
        while message.is_none() {
            message = p.try_finish();
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(message.as_deref(), Some(""));
        assert!(!p.processing_complete());
    }
}
