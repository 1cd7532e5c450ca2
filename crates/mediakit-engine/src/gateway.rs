use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use mediakit_contracts::events::{EventPayload, EventWriter};
use mediakit_contracts::media::{EnhancedPrompt, UploadedImage};
use mediakit_contracts::models::{Capability, ModelSelector};
use mediakit_contracts::templates::{
    TargetModel, CAPTION_INSTRUCTION, CINEMATOGRAPHER_INSTRUCTION, NO_NEGATIVE_HINTS_PLACEHOLDER,
    PROMPT_ENGINEER_CLOSING, PROMPT_ENGINEER_INSTRUCTION, STYLE_SEPARATOR,
};
use serde_json::Value;

use crate::config::{require_api_key, AppConfig, CredentialSource, EnvCredentials};
use crate::error::MediaError;
use crate::transport::{
    GeminiTransport, GenerateRequest, GenerateResponse, GenerativeTransport, Modality, RequestPart,
};

pub const IMAGE_FAILURE_MESSAGE: &str =
    "Failed to communicate with the AI model. Please check your prompt and try again.";
pub const DESCRIBE_FAILURE_MESSAGE: &str = "Failed to generate description from image.";
pub const PROMPT_FAILURE_MESSAGE: &str = "Failed to enhance prompt.";
pub const VIDEO_FAILURE_MESSAGE: &str = "Failed to enhance video prompt.";

/// Model names the gateway sends for each capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayModels {
    pub image_edit: String,
    pub vision: String,
    pub text: String,
}

impl Default for GatewayModels {
    fn default() -> Self {
        Self {
            image_edit: "gemini-2.5-flash-image".to_string(),
            vision: "gemini-2.5-flash".to_string(),
            text: "gemini-2.5-pro".to_string(),
        }
    }
}

impl GatewayModels {
    pub fn select(config: &AppConfig, events: &EventWriter) -> Result<Self> {
        let selector = ModelSelector::new(None);
        let pick = |requested: Option<&str>, capability: Capability| -> Result<String> {
            let selection = selector
                .select(requested, capability)
                .map_err(|message| anyhow!(message))?;
            let mut payload = EventPayload::new();
            payload.insert("capability".to_string(), serde_json::to_value(capability)?);
            payload.insert("model".to_string(), Value::from(selection.model.name.clone()));
            payload.insert(
                "model_capabilities".to_string(),
                serde_json::to_value(&selection.model.capabilities)?,
            );
            payload.insert(
                "requested".to_string(),
                selection.requested.clone().map(Value::from).unwrap_or(Value::Null),
            );
            payload.insert(
                "fallback_reason".to_string(),
                selection
                    .fallback_reason
                    .clone()
                    .map(Value::from)
                    .unwrap_or(Value::Null),
            );
            events.record("model_selected", payload);
            Ok(selection.model.name)
        };
        Ok(Self {
            image_edit: pick(config.image_model.as_deref(), Capability::ImageEdit)?,
            vision: pick(config.vision_model.as_deref(), Capability::Vision)?,
            text: pick(config.text_model.as_deref(), Capability::Text)?,
        })
    }
}

/// The four generative operations. Cheap to clone; panels hand clones to worker threads.
#[derive(Clone)]
pub struct AiGateway {
    transport: Arc<dyn GenerativeTransport>,
    credentials: Arc<dyn CredentialSource>,
    models: GatewayModels,
    events: EventWriter,
}

impl AiGateway {
    pub fn new(
        transport: Arc<dyn GenerativeTransport>,
        credentials: Arc<dyn CredentialSource>,
        models: GatewayModels,
        events: EventWriter,
    ) -> Self {
        Self {
            transport,
            credentials,
            models,
            events,
        }
    }

    pub fn from_config(config: &AppConfig, events: EventWriter) -> Result<Self> {
        let transport = GeminiTransport::from_config(config)?;
        let models = GatewayModels::select(config, &events)?;
        Ok(Self::new(
            Arc::new(transport),
            Arc::new(EnvCredentials::default()),
            models,
            events,
        ))
    }

    pub fn models(&self) -> &GatewayModels {
        &self.models
    }

    pub fn events(&self) -> &EventWriter {
        &self.events
    }

    pub fn enhance_image(
        &self,
        image: &UploadedImage,
        prompt: &str,
    ) -> Result<UploadedImage, MediaError> {
        let request = GenerateRequest::new(
            self.models.image_edit.clone(),
            vec![
                RequestPart::InlineImage {
                    mime_type: image.mime_type.clone(),
                    data: image.payload().to_string(),
                },
                RequestPart::Text(prompt.to_string()),
            ],
        )
        .with_modalities(&[Modality::Image]);

        let response = self.call("enhance_image", &request, IMAGE_FAILURE_MESSAGE)?;
        if let Some((mime_type, data)) = response.first_inline_data() {
            return Ok(UploadedImage::from_base64(mime_type, data));
        }
        let text = response.text();
        let err = if text.trim().is_empty() {
            MediaError::EmptyResponse
        } else {
            MediaError::ModelRefusal(text)
        };
        Err(self.failed("enhance_image", &request.model, err))
    }

    pub fn describe_image(&self, image: &UploadedImage) -> Result<String, MediaError> {
        let request = GenerateRequest::new(
            self.models.vision.clone(),
            vec![
                RequestPart::InlineImage {
                    mime_type: image.mime_type.clone(),
                    data: image.payload().to_string(),
                },
                RequestPart::Text(CAPTION_INSTRUCTION.to_string()),
            ],
        );
        let response = self.call("describe_image", &request, DESCRIBE_FAILURE_MESSAGE)?;
        let text = response.text();
        if text.trim().is_empty() {
            let err = MediaError::gateway(
                DESCRIBE_FAILURE_MESSAGE,
                anyhow!("model returned no description text"),
            );
            return Err(self.failed("describe_image", &request.model, err));
        }
        Ok(text)
    }

    pub fn enhance_text_prompt(
        &self,
        base_prompt: &str,
        negative_hints: &str,
        target: TargetModel,
        styles: &[String],
    ) -> Result<EnhancedPrompt, MediaError> {
        let request = GenerateRequest::new(
            self.models.text.clone(),
            vec![RequestPart::Text(prompt_engineer_request(
                base_prompt,
                negative_hints,
                target,
                styles,
            ))],
        )
        .with_system_instruction(prompt_engineer_system_instruction(target));
        let response = self.call("enhance_text_prompt", &request, PROMPT_FAILURE_MESSAGE)?;
        Ok(EnhancedPrompt::parse(&response.text()))
    }

    pub fn enhance_video_prompt(&self, composite: &str) -> Result<String, MediaError> {
        let request = GenerateRequest::new(
            self.models.text.clone(),
            vec![RequestPart::Text(composite.to_string())],
        )
        .with_system_instruction(CINEMATOGRAPHER_INSTRUCTION);
        let response = self.call("enhance_video_prompt", &request, VIDEO_FAILURE_MESSAGE)?;
        Ok(response.text())
    }

    fn call(
        &self,
        operation: &str,
        request: &GenerateRequest,
        failure_message: &str,
    ) -> Result<GenerateResponse, MediaError> {
        let api_key = require_api_key(self.credentials.as_ref())
            .map_err(|err| self.failed(operation, &request.model, err))?;

        let mut payload = EventPayload::new();
        payload.insert("operation".to_string(), Value::from(operation));
        payload.insert("model".to_string(), Value::from(request.model.clone()));
        payload.insert("transport".to_string(), Value::from(self.transport.name()));
        payload.insert(
            "prompt_chars".to_string(),
            Value::from(request.text().chars().count()),
        );
        self.events.record("gateway_request", payload);

        let started = Instant::now();
        match self.transport.generate(&api_key, request) {
            Ok(response) => {
                let mut payload = EventPayload::new();
                payload.insert("operation".to_string(), Value::from(operation));
                payload.insert("model".to_string(), Value::from(request.model.clone()));
                payload.insert(
                    "elapsed_ms".to_string(),
                    Value::from(started.elapsed().as_millis() as u64),
                );
                payload.insert("parts".to_string(), Value::from(response.parts.len()));
                self.events.record("gateway_response", payload);
                Ok(response)
            }
            Err(source) => Err(self.failed(
                operation,
                &request.model,
                MediaError::gateway(failure_message, source),
            )),
        }
    }

    fn failed(&self, operation: &str, model: &str, err: MediaError) -> MediaError {
        let mut payload = EventPayload::new();
        payload.insert("operation".to_string(), Value::from(operation));
        payload.insert("model".to_string(), Value::from(model));
        payload.insert("kind".to_string(), Value::from(err.kind()));
        payload.insert("message".to_string(), Value::from(err.to_string()));
        payload.insert("detail".to_string(), Value::from(err.detail()));
        self.events.record("gateway_failed", payload);
        err
    }
}

pub fn prompt_engineer_system_instruction(target: TargetModel) -> String {
    format!(
        "{PROMPT_ENGINEER_INSTRUCTION}\n\n**Model-Specific Instructions:**\n{}\n\n{PROMPT_ENGINEER_CLOSING}",
        target.guidance()
    )
}

/// Empty style lists and blank negative hints leave no trace of either in the request.
pub fn prompt_engineer_request(
    base_prompt: &str,
    negative_hints: &str,
    target: TargetModel,
    styles: &[String],
) -> String {
    let style_clause = if styles.is_empty() {
        String::new()
    } else {
        format!(
            " with a blend of the following style(s): \"{}\"",
            styles.join(STYLE_SEPARATOR)
        )
    };
    let negative = if negative_hints.trim().is_empty() {
        NO_NEGATIVE_HINTS_PLACEHOLDER
    } else {
        negative_hints
    };
    format!(
        "Enhance this prompt for the {} model{style_clause}.\nBase prompt: \"{base_prompt}\"\nUser's negative prompt ideas: \"{negative}\"",
        target.id()
    )
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use mediakit_contracts::templates::{CINEMATOGRAPHER_INSTRUCTION, UPSCALE_2X_PROMPT};

    use super::*;
    use crate::config::StaticCredentials;
    use crate::testing::{gateway_with, image_response, png_image, ScriptedTransport};

    #[test]
    fn enhance_image_sends_image_then_prompt_and_returns_first_image() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(image_response("image/png", b"enhanced-bytes"));
        let gateway = gateway_with(transport.clone());

        let result = gateway.enhance_image(&png_image(4, 4)?, UPSCALE_2X_PROMPT)?;
        assert_eq!(result.mime_type, "image/png");
        assert_eq!(result.decode_bytes()?, b"enhanced-bytes".to_vec());

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gemini-2.5-flash-image");
        assert_eq!(requests[0].response_modalities, vec![Modality::Image]);
        assert!(matches!(requests[0].parts[0], RequestPart::InlineImage { .. }));
        assert_eq!(requests[0].parts[1], RequestPart::Text(UPSCALE_2X_PROMPT.to_string()));
        Ok(())
    }

    #[test]
    fn enhance_image_surfaces_text_reply_as_refusal() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(GenerateResponse::from_text("I cannot edit images of people."));
        let gateway = gateway_with(transport);

        let err = gateway.enhance_image(&png_image(2, 2)?, "sharpen").err();
        assert_eq!(
            err.map(|err| err.to_string()).as_deref(),
            Some("The model returned a text response instead of an image: \"I cannot edit images of people.\"")
        );
        Ok(())
    }

    #[test]
    fn enhance_image_with_no_parts_is_empty_response() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(GenerateResponse::default());
        let gateway = gateway_with(transport);

        let err = gateway.enhance_image(&png_image(2, 2)?, "sharpen").err();
        assert!(matches!(err, Some(MediaError::EmptyResponse)));
        Ok(())
    }

    #[test]
    fn transport_failure_maps_to_operation_message() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_err("connection reset");
        transport.push_err("connection reset");
        transport.push_err("connection reset");
        transport.push_err("connection reset");
        let gateway = gateway_with(transport);
        let image = png_image(2, 2)?;

        let messages = [
            gateway.enhance_image(&image, "x").err().map(|e| e.to_string()),
            gateway.describe_image(&image).err().map(|e| e.to_string()),
            gateway
                .enhance_text_prompt("cat", "", TargetModel::Flux, &[])
                .err()
                .map(|e| e.to_string()),
            gateway.enhance_video_prompt("cat").err().map(|e| e.to_string()),
        ];
        assert_eq!(
            messages,
            [
                Some(IMAGE_FAILURE_MESSAGE.to_string()),
                Some(DESCRIBE_FAILURE_MESSAGE.to_string()),
                Some(PROMPT_FAILURE_MESSAGE.to_string()),
                Some(VIDEO_FAILURE_MESSAGE.to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn describe_image_returns_text_verbatim_and_rejects_blank() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(GenerateResponse::from_text("A red fox in snow.\n"));
        transport.push_ok(GenerateResponse::from_text("   "));
        let gateway = gateway_with(transport.clone());
        let image = png_image(2, 2)?;

        assert_eq!(gateway.describe_image(&image)?, "A red fox in snow.\n");
        let err = gateway.describe_image(&image).err();
        assert_eq!(
            err.map(|e| e.kind()),
            Some("gateway"),
            "blank description is a gateway failure"
        );
        let requests = transport.requests();
        assert_eq!(requests[0].model, "gemini-2.5-flash");
        assert_eq!(requests[0].parts[1], RequestPart::Text(CAPTION_INSTRUCTION.to_string()));
        Ok(())
    }

    #[test]
    fn prompt_request_embeds_all_four_inputs() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(GenerateResponse::from_text("POS TEXT---NEG TEXT"));
        let gateway = gateway_with(transport.clone());

        let styles = vec!["Anime".to_string(), "Cyberpunk".to_string()];
        let result =
            gateway.enhance_text_prompt("a cat on a roof", "blurry", TargetModel::Sdxl, &styles)?;
        assert_eq!(result.positive(), "POS TEXT");
        assert_eq!(result.negative(), "NEG TEXT");

        let request = &transport.requests()[0];
        let text = request.text();
        assert!(text.contains("a cat on a roof"));
        assert!(text.contains("blurry"));
        assert!(text.contains("sdxl"));
        assert!(text.contains("\"Anime, Cyberpunk\""));
        let system = request.system_instruction.clone().unwrap_or_default();
        assert!(system.contains("(word:1.2)"));
        assert!(system.ends_with(PROMPT_ENGINEER_CLOSING));
        assert_eq!(request.model, "gemini-2.5-pro");
        Ok(())
    }

    #[test]
    fn robot_cat_request_carries_no_hints_placeholder() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(GenerateResponse::from_text("POS TEXT---NEG TEXT"));
        let gateway = gateway_with(transport.clone());

        let styles = vec!["Cyberpunk".to_string()];
        let result = gateway.enhance_text_prompt(
            "a robot cat in a futuristic city",
            "",
            TargetModel::Sdxl,
            &styles,
        )?;
        assert_eq!(result.positive(), "POS TEXT");
        assert_eq!(result.negative(), "NEG TEXT");

        let text = transport.requests()[0].text();
        assert!(text.contains("a robot cat in a futuristic city"));
        assert!(text.contains(NO_NEGATIVE_HINTS_PLACEHOLDER));
        assert!(text.contains("sdxl"));
        assert!(text.contains("\"Cyberpunk\""));
        Ok(())
    }

    #[test]
    fn prompt_without_separator_falls_back_to_placeholder() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(GenerateResponse::from_text("just a positive prompt"));
        let gateway = gateway_with(transport);

        let result = gateway.enhance_text_prompt("cat", "", TargetModel::Flux, &[])?;
        assert_eq!(result.positive(), "just a positive prompt");
        assert_eq!(result.negative(), "No negative prompt was generated.");
        Ok(())
    }

    #[test]
    fn empty_styles_and_hints_leave_no_clause() {
        let text = prompt_engineer_request("cat", "  ", TargetModel::Qwen, &[]);
        assert_eq!(
            text,
            "Enhance this prompt for the qwen model.\nBase prompt: \"cat\"\nUser's negative prompt ideas: \"None, use standard negative prompts.\""
        );
    }

    #[test]
    fn video_prompt_uses_cinematographer_instruction() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(GenerateResponse::from_text("  A golden-hour dolly shot.\n"));
        let gateway = gateway_with(transport.clone());

        assert_eq!(
            gateway.enhance_video_prompt("\"a dragon\". Zoom")?,
            "  A golden-hour dolly shot.\n"
        );
        let request = &transport.requests()[0];
        assert_eq!(
            request.system_instruction.as_deref(),
            Some(CINEMATOGRAPHER_INSTRUCTION)
        );
        assert_eq!(request.text(), "\"a dragon\". Zoom");
        Ok(())
    }

    #[test]
    fn missing_credentials_fail_before_any_request() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        let gateway = AiGateway::new(
            transport.clone(),
            Arc::new(StaticCredentials(None)),
            GatewayModels::default(),
            EventWriter::disabled(),
        );
        let err = gateway.enhance_video_prompt("cat").err();
        assert_eq!(err.map(|e| e.kind()), Some("configuration"));
        assert!(transport.requests().is_empty());
        Ok(())
    }

    #[test]
    fn gateway_logs_request_and_failure_events() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(GenerateResponse::from_text("fine"));
        transport.push_err("503 upstream");
        let gateway = AiGateway::new(
            transport,
            Arc::new(StaticCredentials(Some("k".to_string()))),
            GatewayModels::default(),
            EventWriter::new(&path, "session-1"),
        );

        gateway.enhance_video_prompt("cat")?;
        assert!(gateway.enhance_video_prompt("cat").is_err());

        let types: Vec<String> = fs::read_to_string(&path)?
            .lines()
            .filter_map(|line| serde_json::from_str::<Value>(line).ok())
            .filter_map(|event| event["type"].as_str().map(str::to_string))
            .collect();
        assert_eq!(
            types,
            [
                "gateway_request",
                "gateway_response",
                "gateway_request",
                "gateway_failed"
            ]
        );
        Ok(())
    }

    #[test]
    fn model_overrides_flow_through_selection() -> anyhow::Result<()> {
        let config = AppConfig {
            text_model: Some("gemini-2.5-flash".to_string()),
            image_model: Some("gemini-2.5-pro".to_string()),
            ..AppConfig::default()
        };
        let models = GatewayModels::select(&config, &EventWriter::disabled())?;
        assert_eq!(models.text, "gemini-2.5-flash");
        // gemini-2.5-pro is known but cannot edit images.
        assert_eq!(models.image_edit, "gemini-2.5-flash-image");
        assert_eq!(models.vision, "gemini-2.5-flash");
        Ok(())
    }
}
