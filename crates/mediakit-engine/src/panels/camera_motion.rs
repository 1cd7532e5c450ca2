use std::time::{Duration, Instant};

use mediakit_contracts::templates::{find_camera_motion, CameraMotion, CAMERA_COMPOSITE_PLACEHOLDER};

use super::{PanelController, PanelEvent, PasteOutcome};
use crate::clipboard::{ClipboardSink, CopyFeedback, CopyStatus};
use crate::gateway::AiGateway;
use crate::slot::{AsyncSlot, SlotOutcome, UiStatus};
use crate::transcoder::ImageSource;
use crate::workbench::Tab;

const VIDEO_SLOT: &str = "enhance_video_prompt";

pub fn compose(scene: &str, motion: &CameraMotion) -> String {
    if scene.is_empty() {
        motion.prompt_fragment.to_string()
    } else {
        format!("\"{scene}\". {}", motion.prompt_fragment)
    }
}

/// Scene text plus a camera move, optionally embellished by the model.
pub struct CameraMotionPanel {
    gateway: AiGateway,
    scene: String,
    motion: Option<&'static CameraMotion>,
    composite: String,
    enhance: AsyncSlot<String>,
    copy_feedback: CopyFeedback,
}

impl CameraMotionPanel {
    pub fn new(gateway: AiGateway) -> Self {
        let events = gateway.events().clone();
        Self {
            gateway,
            scene: String::new(),
            motion: None,
            composite: CAMERA_COMPOSITE_PLACEHOLDER.to_string(),
            enhance: AsyncSlot::new(VIDEO_SLOT, events),
            copy_feedback: CopyFeedback::default(),
        }
    }

    pub fn scene(&self) -> &str {
        &self.scene
    }

    pub fn motion(&self) -> Option<&'static CameraMotion> {
        self.motion
    }

    pub fn composite(&self) -> &str {
        &self.composite
    }

    pub fn status(&self) -> &UiStatus {
        self.enhance.status()
    }

    /// Without a motion, clearing the scene restores the placeholder and any
    /// other edit leaves the composite alone.
    pub fn set_scene(&mut self, scene: &str) {
        self.scene = scene.to_string();
        self.enhance.invalidate();
        match self.motion {
            Some(motion) => self.composite = compose(&self.scene, motion),
            None if self.scene.is_empty() => {
                self.composite = CAMERA_COMPOSITE_PLACEHOLDER.to_string();
            }
            None => {}
        }
    }

    pub fn select_motion(&mut self, name: &str) -> bool {
        let Some(motion) = find_camera_motion(name) else {
            return false;
        };
        self.motion = Some(motion);
        self.enhance.invalidate();
        self.composite = compose(&self.scene, motion);
        true
    }

    pub fn can_enhance(&self) -> bool {
        !self.scene.is_empty() && self.motion.is_some() && !self.enhance.is_loading()
    }

    /// Shows the plain composite at once, then swaps in the model's version.
    pub fn enhance(&mut self) -> bool {
        let Some(motion) = self.motion else {
            return false;
        };
        if !self.can_enhance() {
            return false;
        }
        let composite = compose(&self.scene, motion);
        self.composite = composite.clone();
        let gateway = self.gateway.clone();
        self.enhance
            .start(true, move || gateway.enhance_video_prompt(&composite))
    }

    pub fn copy(&mut self, sink: &dyn ClipboardSink, now: Instant) -> Option<CopyStatus> {
        let text = self.composite.clone();
        self.copy_feedback.copy(sink, &text, now)
    }

    pub fn copy_status(&self, now: Instant) -> Option<CopyStatus> {
        self.copy_feedback.status(now)
    }

    fn settle(&mut self, outcome: Option<SlotOutcome>) -> Vec<PanelEvent> {
        let Some(outcome) = outcome else {
            return Vec::new();
        };
        if outcome == SlotOutcome::Succeeded {
            if let Some(enhanced) = self.enhance.take_result() {
                self.composite = enhanced;
            }
        }
        vec![PanelEvent::from_outcome(VIDEO_SLOT, outcome)]
    }
}

impl PanelController for CameraMotionPanel {
    fn tab(&self) -> Tab {
        Tab::CameraMotion
    }

    fn paste(&mut self, _source: ImageSource) -> PasteOutcome {
        PasteOutcome::Ignored
    }

    fn set_text(&mut self, text: &str) -> bool {
        self.set_scene(text);
        true
    }

    fn pump_at(&mut self, _now: Instant) -> Vec<PanelEvent> {
        let outcome = self.enhance.pump();
        self.settle(outcome)
    }

    fn wait(&mut self, timeout: Duration) -> Vec<PanelEvent> {
        let outcome = self.enhance.wait(timeout);
        self.settle(outcome)
    }

    fn is_busy(&self) -> bool {
        self.enhance.is_loading()
    }

    fn error(&self) -> Option<String> {
        self.enhance.error().map(str::to_string)
    }

    fn clear_all(&mut self) {
        self.scene.clear();
        self.motion = None;
        self.enhance.reset();
        self.composite = CAMERA_COMPOSITE_PLACEHOLDER.to_string();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{gateway_with, MemoryClipboard, ScriptedTransport};
    use crate::transport::GenerateResponse;

    const WAIT: Duration = Duration::from_secs(5);
    const ZOOM_IN: &str =
        "A steady and slow zoom in on the main subject, creating focus and tension.";

    fn panel(transport: &Arc<ScriptedTransport>) -> CameraMotionPanel {
        CameraMotionPanel::new(gateway_with(transport.clone()))
    }

    #[test]
    fn composite_follows_scene_and_motion() {
        let mut panel = panel(&Arc::new(ScriptedTransport::new()));
        assert_eq!(panel.composite(), CAMERA_COMPOSITE_PLACEHOLDER);

        assert!(panel.select_motion("Zoom In"));
        assert_eq!(panel.composite(), ZOOM_IN);

        panel.set_scene("a dragon");
        assert_eq!(panel.composite(), format!("\"a dragon\". {ZOOM_IN}"));
        assert!(!panel.select_motion("Barrel Roll"));
    }

    #[test]
    fn scene_without_motion_leaves_placeholder_until_cleared() {
        let mut panel = panel(&Arc::new(ScriptedTransport::new()));
        panel.set_scene("a dragon");
        assert_eq!(panel.composite(), CAMERA_COMPOSITE_PLACEHOLDER);
        panel.set_scene("");
        assert_eq!(panel.composite(), CAMERA_COMPOSITE_PLACEHOLDER);
        assert!(!panel.can_enhance());
    }

    #[test]
    fn enhance_replaces_composite_with_model_text() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(GenerateResponse::from_text("A dragon at golden hour, slow zoom."));
        let mut panel = panel(&transport);
        panel.set_scene("a dragon");
        panel.select_motion("zoom in");

        assert!(panel.enhance());
        assert_eq!(panel.composite(), format!("\"a dragon\". {ZOOM_IN}"));
        assert_eq!(
            panel.wait(WAIT),
            vec![PanelEvent::Completed { slot: "enhance_video_prompt" }]
        );
        assert_eq!(panel.composite(), "A dragon at golden hour, slow zoom.");
        assert_eq!(
            transport.requests()[0].text(),
            format!("\"a dragon\". {ZOOM_IN}")
        );
    }

    #[test]
    fn failed_enhance_keeps_plain_composite() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_err("timeout");
        let mut panel = panel(&transport);
        panel.set_scene("a dragon");
        panel.select_motion("Zoom In");
        panel.enhance();
        panel.wait(WAIT);

        assert_eq!(panel.error().as_deref(), Some("Failed to enhance video prompt."));
        assert_eq!(panel.composite(), format!("\"a dragon\". {ZOOM_IN}"));
        assert!(!panel.is_busy());
    }

    #[test]
    fn editing_scene_drops_in_flight_reply() -> anyhow::Result<()> {
        let (transport, release) = ScriptedTransport::gated();
        let transport = Arc::new(transport);
        transport.push_ok(GenerateResponse::from_text("stale embellishment"));
        let mut panel = panel(&transport);
        panel.set_scene("a dragon");
        panel.select_motion("Zoom In");
        panel.enhance();

        panel.set_scene("a phoenix");
        release.send(())?;
        std::thread::sleep(Duration::from_millis(50));
        panel.pump_at(Instant::now());
        assert_eq!(panel.composite(), format!("\"a phoenix\". {ZOOM_IN}"));
        Ok(())
    }

    #[test]
    fn copy_uses_current_composite() {
        let mut panel = panel(&Arc::new(ScriptedTransport::new()));
        let clipboard = MemoryClipboard::default();
        panel.select_motion("Zoom In");
        let now = Instant::now();
        assert_eq!(panel.copy(&clipboard, now), Some(CopyStatus::Copied));
        assert_eq!(clipboard.text.borrow().as_deref(), Some(ZOOM_IN));
        assert_eq!(panel.copy_status(now).map(CopyStatus::label), Some("Copied!"));
    }
}
