use std::time::{Duration, Instant};

use indexmap::IndexSet;
use mediakit_contracts::media::{EnhancedPrompt, UploadedImage};
use mediakit_contracts::templates::{find_style, TargetModel, STYLE_SEPARATOR};

use super::{PanelController, PanelEvent, PasteOutcome};
use crate::clipboard::{ClipboardSink, CopyFeedback, CopyStatus};
use crate::gateway::AiGateway;
use crate::slot::{AsyncSlot, UiStatus};
use crate::transcoder::{self, ImageSource};
use crate::workbench::Tab;

const DESCRIBE_SLOT: &str = "describe_image";
const PROMPT_SLOT: &str = "enhance_text_prompt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyTarget {
    Description,
    Positive,
    Negative,
}

impl CopyTarget {
    pub fn from_name(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "description" | "desc" => Some(Self::Description),
            "positive" | "pos" => Some(Self::Positive),
            "negative" | "neg" => Some(Self::Negative),
            _ => None,
        }
    }
}

/// Two independent tools on one tab: caption an image, and turn a short prompt into
/// a positive/negative pair for a chosen text-to-image model.
pub struct ImageToTextPanel {
    gateway: AiGateway,
    image: Option<UploadedImage>,
    input_error: Option<String>,
    describe: AsyncSlot<String>,
    base_prompt: String,
    negative_prompt: String,
    target_model: TargetModel,
    styles: IndexSet<&'static str>,
    enhance: AsyncSlot<EnhancedPrompt>,
    copy_description: CopyFeedback,
    copy_positive: CopyFeedback,
    copy_negative: CopyFeedback,
}

impl ImageToTextPanel {
    pub fn new(gateway: AiGateway) -> Self {
        let events = gateway.events().clone();
        Self {
            gateway,
            image: None,
            input_error: None,
            describe: AsyncSlot::new(DESCRIBE_SLOT, events.clone()),
            base_prompt: String::new(),
            negative_prompt: String::new(),
            target_model: TargetModel::default(),
            styles: IndexSet::new(),
            enhance: AsyncSlot::new(PROMPT_SLOT, events),
            copy_description: CopyFeedback::default(),
            copy_positive: CopyFeedback::default(),
            copy_negative: CopyFeedback::default(),
        }
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        self.image.as_ref()
    }

    pub fn description(&self) -> &str {
        self.describe.result().map(String::as_str).unwrap_or_default()
    }

    pub fn describe_status(&self) -> &UiStatus {
        self.describe.status()
    }

    pub fn prompt_status(&self) -> &UiStatus {
        self.enhance.status()
    }

    pub fn base_prompt(&self) -> &str {
        &self.base_prompt
    }

    pub fn negative_prompt(&self) -> &str {
        &self.negative_prompt
    }

    pub fn target_model(&self) -> TargetModel {
        self.target_model
    }

    pub fn positive_output(&self) -> &str {
        self.enhance.result().map(EnhancedPrompt::positive).unwrap_or_default()
    }

    /// Empty until a prompt has been enhanced; the fallback text after that.
    pub fn negative_output(&self) -> &str {
        self.enhance.result().map(EnhancedPrompt::negative).unwrap_or_default()
    }

    pub fn styles(&self) -> Vec<String> {
        self.styles.iter().map(|style| style.to_string()).collect()
    }

    pub fn joined_styles(&self) -> String {
        self.styles
            .iter()
            .copied()
            .collect::<Vec<_>>()
            .join(STYLE_SEPARATOR)
    }

    /// A new image clears the old description; the prompt tool is untouched.
    pub fn accept_image(&mut self, source: &ImageSource) -> bool {
        match transcoder::load_from_source(source) {
            Ok(image) => {
                self.image = Some(image);
                self.describe.reset();
                self.input_error = None;
                true
            }
            Err(err) => {
                self.input_error = Some(err.to_string());
                false
            }
        }
    }

    pub fn clear_image(&mut self) {
        self.image = None;
        self.describe.reset();
    }

    pub fn can_describe(&self) -> bool {
        self.image.is_some() && !self.describe.is_loading()
    }

    /// A failed describe keeps the previous description.
    pub fn generate_description(&mut self) -> bool {
        let Some(image) = self.image.clone() else {
            return false;
        };
        let gateway = self.gateway.clone();
        self.describe
            .start(false, move || gateway.describe_image(&image))
    }

    pub fn set_base_prompt(&mut self, text: &str) {
        self.base_prompt = text.to_string();
        self.prompt_inputs_changed();
    }

    pub fn set_negative_prompt(&mut self, text: &str) {
        self.negative_prompt = text.to_string();
        self.prompt_inputs_changed();
    }

    pub fn select_model(&mut self, model: TargetModel) {
        self.target_model = model;
        self.prompt_inputs_changed();
    }

    pub fn select_model_by_name(&mut self, name: &str) -> bool {
        match TargetModel::from_name(name) {
            Some(model) => {
                self.select_model(model);
                true
            }
            None => false,
        }
    }

    /// `Some(true)` when the style was added, `Some(false)` when removed,
    /// `None` for a name outside the catalog.
    pub fn toggle_style(&mut self, name: &str) -> Option<bool> {
        let style = find_style(name)?;
        let added = !self.styles.shift_remove(style);
        if added {
            self.styles.insert(style);
        }
        self.prompt_inputs_changed();
        Some(added)
    }

    pub fn clear_styles(&mut self) {
        self.styles.clear();
        self.prompt_inputs_changed();
    }

    /// A prompt being enhanced from the old inputs is abandoned; an idle edit keeps
    /// the last outputs on screen.
    fn prompt_inputs_changed(&mut self) {
        if self.enhance.is_loading() {
            self.enhance.invalidate();
        }
    }

    pub fn can_enhance(&self) -> bool {
        !self.base_prompt.is_empty() && !self.enhance.is_loading()
    }

    pub fn enhance_prompt(&mut self) -> bool {
        if self.base_prompt.is_empty() {
            return false;
        }
        let gateway = self.gateway.clone();
        let base = self.base_prompt.clone();
        let negative = self.negative_prompt.clone();
        let target = self.target_model;
        let styles = self.styles();
        self.enhance.start(true, move || {
            gateway.enhance_text_prompt(&base, &negative, target, &styles)
        })
    }

    pub fn copy(
        &mut self,
        target: CopyTarget,
        sink: &dyn ClipboardSink,
        now: Instant,
    ) -> Option<CopyStatus> {
        let text = match target {
            CopyTarget::Description => self.description(),
            CopyTarget::Positive => self.positive_output(),
            CopyTarget::Negative => self.negative_output(),
        }
        .to_string();
        self.feedback_mut(target).copy(sink, &text, now)
    }

    pub fn copy_status(&self, target: CopyTarget, now: Instant) -> Option<CopyStatus> {
        match target {
            CopyTarget::Description => self.copy_description.status(now),
            CopyTarget::Positive => self.copy_positive.status(now),
            CopyTarget::Negative => self.copy_negative.status(now),
        }
    }

    fn feedback_mut(&mut self, target: CopyTarget) -> &mut CopyFeedback {
        match target {
            CopyTarget::Description => &mut self.copy_description,
            CopyTarget::Positive => &mut self.copy_positive,
            CopyTarget::Negative => &mut self.copy_negative,
        }
    }
}

impl PanelController for ImageToTextPanel {
    fn tab(&self) -> Tab {
        Tab::ImageToText
    }

    fn paste(&mut self, source: ImageSource) -> PasteOutcome {
        if self.image.is_some() || !source.is_declared_image() {
            return PasteOutcome::Ignored;
        }
        if self.accept_image(&source) {
            PasteOutcome::Accepted
        } else {
            PasteOutcome::Rejected(self.input_error.clone().unwrap_or_default())
        }
    }

    fn set_text(&mut self, text: &str) -> bool {
        self.set_base_prompt(text);
        true
    }

    fn pump_at(&mut self, _now: Instant) -> Vec<PanelEvent> {
        let mut events = Vec::new();
        if let Some(outcome) = self.describe.pump() {
            events.push(PanelEvent::from_outcome(DESCRIBE_SLOT, outcome));
        }
        if let Some(outcome) = self.enhance.pump() {
            events.push(PanelEvent::from_outcome(PROMPT_SLOT, outcome));
        }
        events
    }

    fn wait(&mut self, timeout: Duration) -> Vec<PanelEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::new();
        if let Some(outcome) = self.describe.wait(timeout) {
            events.push(PanelEvent::from_outcome(DESCRIBE_SLOT, outcome));
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if let Some(outcome) = self.enhance.wait(remaining) {
            events.push(PanelEvent::from_outcome(PROMPT_SLOT, outcome));
        }
        events
    }

    fn is_busy(&self) -> bool {
        self.describe.is_loading() || self.enhance.is_loading()
    }

    fn error(&self) -> Option<String> {
        self.input_error
            .clone()
            .or_else(|| self.describe.error().map(str::to_string))
            .or_else(|| self.enhance.error().map(str::to_string))
    }

    fn clear_all(&mut self) {
        self.clear_image();
        self.input_error = None;
        self.base_prompt.clear();
        self.negative_prompt.clear();
        self.target_model = TargetModel::default();
        self.styles.clear();
        self.enhance.reset();
    }
}
