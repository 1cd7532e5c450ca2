use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{ImageFormat, Rgba, RgbaImage};
use mediakit_contracts::events::EventWriter;
use mediakit_contracts::media::UploadedImage;

use crate::clipboard::ClipboardSink;
use crate::config::StaticCredentials;
use crate::gateway::{AiGateway, GatewayModels};
use crate::transcoder::ImageSource;
use crate::transport::{GenerateRequest, GenerateResponse, GenerativeTransport, ResponsePart};

/// Replays queued replies in order and records every request it sees.
/// A gated transport holds each reply until the test releases it.
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<GenerateResponse, String>>>,
    requests: Mutex<Vec<GenerateRequest>>,
    gate: Option<Mutex<Receiver<()>>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub(crate) fn gated() -> (Self, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let mut transport = Self::new();
        transport.gate = Some(Mutex::new(rx));
        (transport, tx)
    }

    pub(crate) fn push_ok(&self, response: GenerateResponse) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Ok(response));
        }
    }

    pub(crate) fn push_err(&self, message: &str) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Err(message.to_string()));
        }
    }

    pub(crate) fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl GenerativeTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    fn generate(&self, _api_key: &str, request: &GenerateRequest) -> Result<GenerateResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if let Some(gate) = self.gate.as_ref() {
            let gate = gate.lock().map_err(|_| anyhow!("gate poisoned"))?;
            gate.recv_timeout(Duration::from_secs(10))
                .map_err(|_| anyhow!("gate never released"))?;
        }
        let reply = self
            .replies
            .lock()
            .map_err(|_| anyhow!("replies poisoned"))?
            .pop_front();
        match reply {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted reply left")),
        }
    }
}

pub(crate) fn gateway_with(transport: Arc<ScriptedTransport>) -> AiGateway {
    AiGateway::new(
        transport,
        Arc::new(StaticCredentials(Some("test-key".to_string()))),
        GatewayModels::default(),
        EventWriter::disabled(),
    )
}

pub(crate) fn image_response(mime_type: &str, bytes: &[u8]) -> GenerateResponse {
    GenerateResponse {
        parts: vec![ResponsePart::InlineData {
            mime_type: mime_type.to_string(),
            data: BASE64.encode(bytes),
        }],
    }
}

pub(crate) fn encoded(width: u32, height: u32, format: ImageFormat) -> Result<Vec<u8>> {
    let canvas = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 40 % 256) as u8, (y * 40 % 256) as u8, 128, 255])
    });
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(canvas)
        .to_rgb8()
        .write_to(&mut Cursor::new(&mut bytes), format)?;
    Ok(bytes)
}

pub(crate) fn png_bytes(width: u32, height: u32) -> Result<Vec<u8>> {
    encoded(width, height, ImageFormat::Png)
}

pub(crate) fn png_image(width: u32, height: u32) -> Result<UploadedImage> {
    Ok(UploadedImage::from_bytes("image/png", &png_bytes(width, height)?))
}

pub(crate) fn png_source(width: u32, height: u32) -> Result<ImageSource> {
    Ok(ImageSource::Clipboard {
        mime_type: Some("image/png".to_string()),
        bytes: png_bytes(width, height)?,
    })
}

#[derive(Default)]
pub(crate) struct MemoryClipboard {
    pub(crate) text: RefCell<Option<String>>,
    pub(crate) broken: bool,
}

impl ClipboardSink for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        if self.broken {
            bail!("clipboard unavailable");
        }
        *self.text.borrow_mut() = Some(text.to_string());
        Ok(())
    }
}
