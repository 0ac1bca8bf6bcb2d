//! Batch queue tool applying the selected G'MIC filter to each queued image.

use std::sync::Arc;

use tracing::debug;

use dkgmic_filters::FilterManager;

use crate::action::gmic_filter_action;
use crate::engine::{FilterEngine, InputMode, JobControl, OutputMode};
use crate::error::{BqmError, BqmResult};
use crate::host::BatchHost;
use crate::processor::BqmProcessor;
use crate::settings::ToolSettings;

/// Name of the tool in the batch queue.
pub const TOOL_NAME: &str = "GmicBqmTool";

/// G'MIC batch tool.
pub struct BqmTool {
    engine: Arc<dyn FilterEngine>,
    settings: ToolSettings,
    control: JobControl,
}

impl BqmTool {
    /// Creates the tool with default settings.
    pub fn new(engine: Arc<dyn FilterEngine>) -> Self {
        Self {
            engine,
            settings: Self::default_settings(),
            control: JobControl::new(),
        }
    }

    /// Settings of a freshly added tool: no command, no path.
    pub fn default_settings() -> ToolSettings {
        ToolSettings::default()
    }

    /// Current settings.
    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    /// Replaces the settings.
    pub fn set_settings(&mut self, settings: ToolSettings) {
        self.settings = settings;
    }

    /// Restores the stored filter selection in the manager.
    pub fn assign_settings(&self, manager: &mut FilterManager) {
        manager.set_current_path(self.settings.path.clone());
    }

    /// Takes command and path from the manager selection. Returns true if
    /// the settings changed.
    pub fn update_settings(&mut self, manager: &FilterManager) -> bool {
        let settings = ToolSettings::from_selection(manager);
        if settings == self.settings {
            return false;
        }
        debug!(path = %settings.path, "G'MIC tool settings changed");
        self.settings = settings;
        true
    }

    /// Handle to cancel the running job from another thread.
    pub fn cancel_handle(&self) -> JobControl {
        self.control.clone()
    }

    /// Cancels the running job.
    pub fn cancel(&self) {
        self.control.abort();
    }

    /// Runs the configured command on the host image.
    ///
    /// On success the host image is replaced, the run is recorded in its
    /// history and the image is saved. On failure the host image is left
    /// as loaded.
    pub fn tool_operations(&mut self, host: &mut dyn BatchHost) -> BqmResult<()> {
        let image = host.load_image().inspect_err(|e| debug!("GmicBqmTool: cannot load image! {e}"))?;

        let path = self.settings.path.clone();
        debug!(path = %path, "GmicBqmTool: running G'MIC filter");

        let command = self.settings.command.clone();
        if command.is_empty() {
            debug!("GmicBqmTool: G'MIC filter command is null!");
            return Err(BqmError::EmptyCommand);
        }

        let mut processor = BqmProcessor::with_control(Arc::clone(&self.engine), self.control.clone());
        processor.set_input_image(image);
        processor
            .set_processing_command(&command)
            .inspect_err(|_| debug!("GmicBqmTool: cannot setup G'MIC filter!"))?;
        processor.start_processing()?;

        debug!("GmicBqmTool: started G'MIC filter...");
        let message = processor.wait_with_progress(|percent| host.progress(percent)).unwrap_or_default();

        debug!(completed = processor.processing_complete(), "GmicBqmTool: G'MIC filter completed");

        let Some(output) = processor.take_output_image() else {
            return Err(if self.control.is_aborted() {
                BqmError::Aborted
            } else {
                BqmError::Engine(message)
            });
        };
        host.put_image(output);
        host.add_filter_action(gmic_filter_action(
            &command,
            &path,
            InputMode::default(),
            OutputMode::default(),
            processor.filter_name(),
            &processor.engine_version(),
        ));

        host.save_image()?;
        debug!("GmicBqmTool: G'MIC flush image data completed");
        Ok(())
    }
}
