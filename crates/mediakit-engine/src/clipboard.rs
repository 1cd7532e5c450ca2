use std::time::{Duration, Instant};

use anyhow::Result;

use crate::transcoder::ImageSource;

/// How long a copy confirmation stays visible.
pub const COPY_FEEDBACK_DURATION: Duration = Duration::from_secs(2);

pub trait ClipboardSink {
    fn write_text(&self, text: &str) -> Result<()>;
}

pub trait ClipboardImageSource {
    /// `Ok(None)` when the clipboard holds no image.
    fn read_image(&self) -> Result<Option<ImageSource>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    Copied,
    Failed,
}

impl CopyStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Copied => "Copied!",
            Self::Failed => "Failed",
        }
    }
}

/// Transient copy confirmation for one copyable field.
#[derive(Debug, Clone, Default)]
pub struct CopyFeedback {
    shown: Option<(CopyStatus, Instant)>,
}

impl CopyFeedback {
    /// Empty text is never copied.
    pub fn copy(&mut self, sink: &dyn ClipboardSink, text: &str, now: Instant) -> Option<CopyStatus> {
        if text.is_empty() {
            return None;
        }
        let status = match sink.write_text(text) {
            Ok(()) => CopyStatus::Copied,
            Err(_) => CopyStatus::Failed,
        };
        self.shown = Some((status, now));
        Some(status)
    }

    pub fn status(&self, now: Instant) -> Option<CopyStatus> {
        self.shown
            .filter(|(_, at)| now.saturating_duration_since(*at) < COPY_FEEDBACK_DURATION)
            .map(|(status, _)| status)
    }
}
