use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Map, Value};

use crate::config::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPart {
    Text(String),
    InlineImage { mime_type: String, data: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Image,
    Text,
}

impl Modality {
    fn as_str(self) -> &'static str {
        match self {
            Self::Image => "IMAGE",
            Self::Text => "TEXT",
        }
    }
}

/// A single-turn `generateContent` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    pub parts: Vec<RequestPart>,
    pub response_modalities: Vec<Modality>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, parts: Vec<RequestPart>) -> Self {
        Self {
            model: model.into(),
            system_instruction: None,
            parts,
            response_modalities: Vec::new(),
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_modalities(mut self, modalities: &[Modality]) -> Self {
        self.response_modalities = modalities.to_vec();
        self
    }

    /// All text parts, newline-joined.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                RequestPart::Text(text) => Some(text.as_str()),
                RequestPart::InlineImage { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_payload(&self) -> Value {
        let parts: Vec<Value> = self
            .parts
            .iter()
            .map(|part| match part {
                RequestPart::Text(text) => json!({ "text": text }),
                RequestPart::InlineImage { mime_type, data } => json!({
                    "inlineData": { "mimeType": mime_type, "data": data }
                }),
            })
            .collect();

        let mut payload = Map::new();
        payload.insert(
            "contents".to_string(),
            json!([{ "role": "user", "parts": parts }]),
        );
        if let Some(instruction) = self.system_instruction.as_deref() {
            payload.insert(
                "systemInstruction".to_string(),
                json!({ "parts": [{ "text": instruction }] }),
            );
        }
        if !self.response_modalities.is_empty() {
            let modalities: Vec<&str> = self
                .response_modalities
                .iter()
                .map(|modality| modality.as_str())
                .collect();
            payload.insert(
                "generationConfig".to_string(),
                json!({ "responseModalities": modalities }),
            );
        }
        Value::Object(payload)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    Text(String),
    InlineData { mime_type: String, data: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateResponse {
    pub parts: Vec<ResponsePart>,
}

impl GenerateResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![ResponsePart::Text(text.into())],
        }
    }

    /// Reads the first candidate. Accepts both camelCase and snake_case part keys.
    pub fn from_payload(payload: &Value) -> Self {
        let mut parts = Vec::new();
        let candidate_parts = payload
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array);
        for part in candidate_parts.into_iter().flatten() {
            let inline = part.get("inlineData").or_else(|| part.get("inline_data"));
            if let Some(inline) = inline.and_then(Value::as_object) {
                let data = inline.get("data").and_then(Value::as_str).unwrap_or("");
                if data.is_empty() {
                    continue;
                }
                let mime_type = inline
                    .get("mimeType")
                    .or_else(|| inline.get("mime_type"))
                    .and_then(Value::as_str)
                    .unwrap_or("image/png");
                parts.push(ResponsePart::InlineData {
                    mime_type: mime_type.to_string(),
                    data: data.to_string(),
                });
            } else if let Some(text) = part.get("text").and_then(Value::as_str) {
                parts.push(ResponsePart::Text(text.to_string()));
            }
        }
        Self { parts }
    }

    pub fn first_inline_data(&self) -> Option<(&str, &str)> {
        self.parts.iter().find_map(|part| match part {
            ResponsePart::InlineData { mime_type, data } => Some((mime_type.as_str(), data.as_str())),
            ResponsePart::Text(_) => None,
        })
    }

    /// Concatenated text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ResponsePart::Text(text) => Some(text.as_str()),
                ResponsePart::InlineData { .. } => None,
            })
            .collect()
    }
}

/// The network seam under `AiGateway`.
pub trait GenerativeTransport: Send + Sync {
    fn name(&self) -> &str;

    fn generate(&self, api_key: &str, request: &GenerateRequest) -> Result<GenerateResponse>;
}

pub struct GeminiTransport {
    api_base: String,
    http: HttpClient,
}

impl GeminiTransport {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.api_base.clone(), config.request_timeout)
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let model = model.trim().trim_start_matches("models/");
        format!("{}/models/{model}:generateContent", self.api_base)
    }
}

impl GenerativeTransport for GeminiTransport {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate(&self, api_key: &str, request: &GenerateRequest) -> Result<GenerateResponse> {
        let endpoint = self.endpoint_for_model(&request.model);
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key)])
            .json(&request.to_payload())
            .send()
            .with_context(|| format!("Gemini request failed ({endpoint})"))?;
        let payload = response_json_or_error("Gemini", response)?;
        Ok(GenerateResponse::from_payload(&payload))
    }
}

fn response_json_or_error(provider: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .with_context(|| format!("{provider} response body read failed"))?;
    if !status.is_success() {
        bail!(
            "{provider} request failed ({code}): {}",
            truncate_text(&body, 512)
        );
    }
    serde_json::from_str(&body).with_context(|| format!("{provider} returned invalid JSON payload"))
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
