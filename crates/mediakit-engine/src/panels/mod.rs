mod camera_motion;
mod enhancer;
mod image_to_text;

use std::time::{Duration, Instant};

pub use camera_motion::CameraMotionPanel;
pub use enhancer::ImageEnhancerPanel;
pub use image_to_text::{CopyTarget, ImageToTextPanel};

use crate::slot::SlotOutcome;
use crate::transcoder::ImageSource;
use crate::workbench::Tab;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteOutcome {
    Accepted,
    /// The panel already has an image or does not take images.
    Ignored,
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    SuggestionApplied { name: &'static str },
    Completed { slot: &'static str },
    Failed { slot: &'static str, message: String },
}

impl PanelEvent {
    pub(crate) fn from_outcome(slot: &'static str, outcome: SlotOutcome) -> Self {
        match outcome {
            SlotOutcome::Succeeded => Self::Completed { slot },
            SlotOutcome::Failed(message) => Self::Failed { slot, message },
        }
    }
}

/// What the workbench needs from whichever panel is mounted.
pub trait PanelController {
    fn tab(&self) -> Tab;

    fn paste(&mut self, source: ImageSource) -> PasteOutcome;

    /// Bare text typed into the shell; each panel routes it to its main input.
    fn set_text(&mut self, text: &str) -> bool;

    fn pump_at(&mut self, now: Instant) -> Vec<PanelEvent>;

    /// Blocks until every in-flight slot settles or `timeout` passes.
    fn wait(&mut self, timeout: Duration) -> Vec<PanelEvent>;

    fn is_busy(&self) -> bool;

    fn error(&self) -> Option<String>;

    fn clear_all(&mut self);
}
