use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use mediakit_contracts::media::UploadedImage;
use mediakit_contracts::templates::{
    find_suggestion, find_upscale_option, PromptTemplate, DEFAULT_UPSCALE_FACTOR,
    UPSCALE_2X_PROMPT,
};

use super::{PanelController, PanelEvent, PasteOutcome};
use crate::debounce::{DebouncedTask, SUGGESTION_DELAY};
use crate::gateway::AiGateway;
use crate::slot::{AsyncSlot, UiStatus};
use crate::transcoder::{self, ImageSource};
use crate::workbench::Tab;

const ENHANCE_SLOT: &str = "enhance_image";

/// Upload an image, choose a prompt and factor, get an AI-enhanced copy back.
pub struct ImageEnhancerPanel {
    gateway: AiGateway,
    original: Option<UploadedImage>,
    prompt: String,
    upscale_factor: f64,
    enhance: AsyncSlot<UploadedImage>,
    suggestion: DebouncedTask<&'static PromptTemplate>,
    input_error: Option<String>,
}

impl ImageEnhancerPanel {
    pub fn new(gateway: AiGateway) -> Self {
        let events = gateway.events().clone();
        Self {
            gateway,
            original: None,
            prompt: UPSCALE_2X_PROMPT.to_string(),
            upscale_factor: DEFAULT_UPSCALE_FACTOR,
            enhance: AsyncSlot::new(ENHANCE_SLOT, events),
            suggestion: DebouncedTask::new(SUGGESTION_DELAY),
            input_error: None,
        }
    }

    pub fn original(&self) -> Option<&UploadedImage> {
        self.original.as_ref()
    }

    pub fn enhanced(&self) -> Option<&UploadedImage> {
        self.enhance.result()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn upscale_factor(&self) -> f64 {
        self.upscale_factor
    }

    pub fn status(&self) -> &UiStatus {
        self.enhance.status()
    }

    /// True while a suggestion is pending; the prompt is read-only meanwhile.
    pub fn is_suggesting(&self) -> bool {
        self.suggestion.is_pending()
    }

    pub fn pending_suggestion(&self) -> Option<&'static str> {
        self.suggestion.pending().map(|template| template.name)
    }

    pub fn can_submit(&self) -> bool {
        self.original.is_some() && !self.enhance.is_loading()
    }

    /// Replaces the original image and discards the previous result and error.
    pub fn accept_image(&mut self, source: &ImageSource) -> bool {
        match transcoder::load_from_source(source) {
            Ok(image) => {
                self.original = Some(image);
                self.enhance.reset();
                self.input_error = None;
                true
            }
            Err(err) => {
                self.input_error = Some(err.to_string());
                false
            }
        }
    }

    /// Removes the original only. An in-flight enhancement is abandoned.
    pub fn clear_image(&mut self) {
        self.original = None;
        self.enhance.invalidate();
    }

    pub fn set_prompt(&mut self, prompt: &str) -> bool {
        if self.suggestion.is_pending() {
            return false;
        }
        self.prompt = prompt.to_string();
        self.inputs_changed();
        true
    }

    pub fn apply_suggestion(&mut self, name: &str, now: Instant) -> bool {
        match find_suggestion(name) {
            Some(template) => {
                self.schedule(template, now);
                true
            }
            None => false,
        }
    }

    /// Switches the factor right away; the matching prompt follows after the delay.
    pub fn select_upscale_factor(&mut self, factor: f64, now: Instant) -> bool {
        let Some(option) = find_upscale_option(factor) else {
            return false;
        };
        self.upscale_factor = factor;
        self.inputs_changed();
        self.schedule(option, now);
        true
    }

    fn schedule(&mut self, template: &'static PromptTemplate, now: Instant) {
        self.suggestion.schedule(template, now);
    }

    /// An enhancement started from the old prompt or factor no longer applies.
    fn inputs_changed(&mut self) {
        if self.enhance.is_loading() {
            self.enhance.invalidate();
        }
    }

    pub fn submit(&mut self) -> bool {
        let Some(original) = self.original.clone() else {
            self.input_error = Some("Please upload an image first.".to_string());
            return false;
        };
        if self.enhance.is_loading() {
            return false;
        }
        self.input_error = None;
        let gateway = self.gateway.clone();
        let prompt = self.prompt.clone();
        let factor = self.upscale_factor;
        self.enhance.start(true, move || {
            let input = if factor > 1.0 {
                transcoder::resize(&original, factor)?
            } else {
                original
            };
            gateway.enhance_image(&input, &prompt)
        })
    }

    pub fn download(&self, target: Option<&Path>) -> Result<PathBuf> {
        let Some(image) = self.enhance.result() else {
            bail!("No enhanced image to download yet.");
        };
        transcoder::save_image(image, target)
    }
}

impl PanelController for ImageEnhancerPanel {
    fn tab(&self) -> Tab {
        Tab::Enhancer
    }

    /// First paste wins: an image already on screen is never replaced by a paste.
    fn paste(&mut self, source: ImageSource) -> PasteOutcome {
        if self.original.is_some() || !source.is_declared_image() {
            return PasteOutcome::Ignored;
        }
        if self.accept_image(&source) {
            PasteOutcome::Accepted
        } else {
            PasteOutcome::Rejected(self.input_error.clone().unwrap_or_default())
        }
    }

    fn set_text(&mut self, text: &str) -> bool {
        self.set_prompt(text)
    }

    fn pump_at(&mut self, now: Instant) -> Vec<PanelEvent> {
        let mut events = Vec::new();
        if let Some(template) = self.suggestion.poll(now) {
            self.prompt = template.text.to_string();
            if let Some(factor) = template.scale_factor {
                self.upscale_factor = factor;
            }
            self.inputs_changed();
            events.push(PanelEvent::SuggestionApplied {
                name: template.name,
            });
        }
        if let Some(outcome) = self.enhance.pump() {
            events.push(PanelEvent::from_outcome(ENHANCE_SLOT, outcome));
        }
        events
    }

    fn wait(&mut self, timeout: Duration) -> Vec<PanelEvent> {
        self.enhance
            .wait(timeout)
            .map(|outcome| PanelEvent::from_outcome(ENHANCE_SLOT, outcome))
            .into_iter()
            .collect()
    }

    fn is_busy(&self) -> bool {
        self.enhance.is_loading()
    }

    fn error(&self) -> Option<String> {
        self.input_error
            .clone()
            .or_else(|| self.enhance.error().map(str::to_string))
    }

    fn clear_all(&mut self) {
        self.original = None;
        self.enhance.reset();
        self.suggestion.cancel();
        self.input_error = None;
        self.upscale_factor = DEFAULT_UPSCALE_FACTOR;
        self.prompt = UPSCALE_2X_PROMPT.to_string();
    }
}
