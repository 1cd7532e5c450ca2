use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::templates::{NO_NEGATIVE_PROMPT_PLACEHOLDER, PROMPT_SEPARATOR};

/// An image captured by a panel, held as a self-contained data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub encoded_data: String,
    pub mime_type: String,
}

impl UploadedImage {
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self::from_base64(mime_type, &BASE64.encode(bytes))
    }

    pub fn from_base64(mime_type: &str, payload: &str) -> Self {
        Self {
            encoded_data: format!("data:{mime_type};base64,{payload}"),
            mime_type: mime_type.to_string(),
        }
    }

    pub fn from_data_uri(data_uri: &str) -> Result<Self> {
        let Some(rest) = data_uri.strip_prefix("data:") else {
            bail!("Invalid data URL format");
        };
        let Some((mime_type, payload)) = rest.split_once(";base64,") else {
            bail!("Invalid data URL format");
        };
        if mime_type.is_empty() || payload.is_empty() {
            bail!("Invalid data URL format");
        }
        Ok(Self {
            encoded_data: data_uri.to_string(),
            mime_type: mime_type.to_string(),
        })
    }

    /// Base64 payload without the `data:<mime>;base64,` prefix.
    pub fn payload(&self) -> &str {
        self.encoded_data
            .split_once(";base64,")
            .map(|(_, payload)| payload)
            .unwrap_or_default()
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.payload().as_bytes())
            .context("image data URI payload is not valid base64")
    }
}

/// Result of the dual positive/negative prompt request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnhancedPrompt {
    Split { positive: String, negative: String },
    /// The model omitted the separator or left the negative half blank.
    PositiveOnly { positive: String },
}

impl EnhancedPrompt {
    /// Only the first two separator-delimited segments are used.
    pub fn parse(raw: &str) -> Self {
        let mut segments = raw.split(PROMPT_SEPARATOR);
        let positive = segments.next().unwrap_or_default().trim().to_string();
        match segments.next().map(str::trim) {
            Some(negative) if !negative.is_empty() => Self::Split {
                positive,
                negative: negative.to_string(),
            },
            _ => Self::PositiveOnly { positive },
        }
    }

    pub fn positive(&self) -> &str {
        match self {
            Self::Split { positive, .. } | Self::PositiveOnly { positive } => positive,
        }
    }

    pub fn negative(&self) -> &str {
        match self {
            Self::Split { negative, .. } => negative,
            Self::PositiveOnly { .. } => NO_NEGATIVE_PROMPT_PLACEHOLDER,
        }
    }
}
