use std::error::Error as _;

use thiserror::Error;

/// Failures a panel can surface. Every variant renders as a user-facing message;
/// `detail()` adds the underlying cause chain for the event log.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    Read(String),
    #[error("{0}")]
    Render(String),
    #[error("The model returned a text response instead of an image: \"{0}\"")]
    ModelRefusal(String),
    #[error("Upscaling failed: No image data was returned from the API.")]
    EmptyResponse,
    #[error("{message}")]
    Gateway {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl MediaError {
    pub fn gateway(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Gateway {
            message: message.into(),
            source,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Read(_) => "read",
            Self::Render(_) => "render",
            Self::ModelRefusal(_) => "model_refusal",
            Self::EmptyResponse => "empty_response",
            Self::Gateway { .. } => "gateway",
        }
    }

    pub fn detail(&self) -> String {
        let mut parts = vec![self.to_string()];
        let mut cause = self.source();
        while let Some(err) = cause {
            let text = err.to_string();
            let trimmed = text.trim();
            if !trimmed.is_empty() && parts.last().map(String::as_str) != Some(trimmed) {
                parts.push(trimmed.to_string());
            }
            cause = err.source();
        }
        parts.join(" | caused by: ")
    }
}
