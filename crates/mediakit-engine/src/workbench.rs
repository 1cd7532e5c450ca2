use std::time::{Duration, Instant};

use mediakit_contracts::events::{EventPayload, EventWriter};
use serde_json::Value;

use crate::gateway::AiGateway;
use crate::panels::{
    CameraMotionPanel, ImageEnhancerPanel, ImageToTextPanel, PanelController, PanelEvent,
    PasteOutcome,
};
use crate::transcoder::ImageSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Enhancer,
    ImageToText,
    CameraMotion,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Enhancer, Tab::ImageToText, Tab::CameraMotion];

    pub fn id(self) -> &'static str {
        match self {
            Self::Enhancer => "enhancer",
            Self::ImageToText => "img2txt",
            Self::CameraMotion => "camera",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Enhancer => "Image Upscaler",
            Self::ImageToText => "Image to Text & Prompting",
            Self::CameraMotion => "Camera Motion Prompts",
        }
    }

    /// Accepts the id, the label, or the 1-based position.
    pub fn from_name(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        if let Ok(index) = needle.parse::<usize>() {
            return index.checked_sub(1).and_then(|i| Self::ALL.get(i).copied());
        }
        Self::ALL.into_iter().find(|tab| {
            tab.id().eq_ignore_ascii_case(needle) || tab.label().eq_ignore_ascii_case(needle)
        })
    }
}

pub enum MountedPanel {
    Enhancer(ImageEnhancerPanel),
    ImageToText(ImageToTextPanel),
    CameraMotion(CameraMotionPanel),
}

impl MountedPanel {
    fn mount(tab: Tab, gateway: AiGateway) -> Self {
        match tab {
            Tab::Enhancer => Self::Enhancer(ImageEnhancerPanel::new(gateway)),
            Tab::ImageToText => Self::ImageToText(ImageToTextPanel::new(gateway)),
            Tab::CameraMotion => Self::CameraMotion(CameraMotionPanel::new(gateway)),
        }
    }

    pub fn controller(&self) -> &dyn PanelController {
        match self {
            Self::Enhancer(panel) => panel,
            Self::ImageToText(panel) => panel,
            Self::CameraMotion(panel) => panel,
        }
    }

    pub fn controller_mut(&mut self) -> &mut dyn PanelController {
        match self {
            Self::Enhancer(panel) => panel,
            Self::ImageToText(panel) => panel,
            Self::CameraMotion(panel) => panel,
        }
    }
}

/// Tab host. Exactly one panel is mounted; switching tabs mounts a fresh one, so
/// panel state never survives a tab change and replies for the old panel go nowhere.
pub struct Workbench {
    gateway: AiGateway,
    events: EventWriter,
    mounted: MountedPanel,
}

impl Workbench {
    pub fn new(gateway: AiGateway) -> Self {
        let events = gateway.events().clone();
        let mounted = MountedPanel::mount(Tab::default(), gateway.clone());
        Self {
            gateway,
            events,
            mounted,
        }
    }

    pub fn active_tab(&self) -> Tab {
        self.mounted.controller().tab()
    }

    pub fn panel(&self) -> &MountedPanel {
        &self.mounted
    }

    pub fn panel_mut(&mut self) -> &mut MountedPanel {
        &mut self.mounted
    }

    /// Returns false when `tab` is already active.
    pub fn switch(&mut self, tab: Tab) -> bool {
        let previous = self.active_tab();
        if previous == tab {
            return false;
        }
        self.mounted = MountedPanel::mount(tab, self.gateway.clone());

        let mut payload = EventPayload::new();
        payload.insert("from".to_string(), Value::from(previous.id()));
        payload.insert("to".to_string(), Value::from(tab.id()));
        self.events.record("tab_switched", payload);
        true
    }

    pub fn paste(&mut self, source: ImageSource) -> PasteOutcome {
        self.mounted.controller_mut().paste(source)
    }

    pub fn set_text(&mut self, text: &str) -> bool {
        self.mounted.controller_mut().set_text(text)
    }

    pub fn pump_at(&mut self, now: Instant) -> Vec<PanelEvent> {
        self.mounted.controller_mut().pump_at(now)
    }

    pub fn wait(&mut self, timeout: Duration) -> Vec<PanelEvent> {
        self.mounted.controller_mut().wait(timeout)
    }

    pub fn is_busy(&self) -> bool {
        self.mounted.controller().is_busy()
    }

    pub fn error(&self) -> Option<String> {
        self.mounted.controller().error()
    }

    pub fn clear_all(&mut self) {
        self.mounted.controller_mut().clear_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{gateway_with, png_source, ScriptedTransport};

    fn workbench() -> Workbench {
        Workbench::new(gateway_with(Arc::new(ScriptedTransport::new())))
    }

    #[test]
    fn starts_on_enhancer_tab() {
        let bench = workbench();
        assert_eq!(bench.active_tab(), Tab::Enhancer);
        assert!(matches!(bench.panel(), MountedPanel::Enhancer(_)));
    }

    #[test]
    fn tab_names_resolve() {
        assert_eq!(Tab::from_name("img2txt"), Some(Tab::ImageToText));
        assert_eq!(Tab::from_name("camera motion prompts"), Some(Tab::CameraMotion));
        assert_eq!(Tab::from_name("1"), Some(Tab::Enhancer));
        assert_eq!(Tab::from_name("0"), None);
        assert_eq!(Tab::from_name("4"), None);
        assert_eq!(Tab::from_name("gallery"), None);
    }

    #[test]
    fn switching_away_and_back_discards_panel_state() -> anyhow::Result<()> {
        let mut bench = workbench();
        assert_eq!(bench.paste(png_source(2, 2)?), PasteOutcome::Accepted);
        assert!(!bench.switch(Tab::Enhancer));
        let MountedPanel::Enhancer(panel) = bench.panel() else {
            anyhow::bail!("expected enhancer");
        };
        assert!(panel.original().is_some());

        assert!(bench.switch(Tab::CameraMotion));
        assert!(bench.switch(Tab::Enhancer));
        let MountedPanel::Enhancer(panel) = bench.panel() else {
            anyhow::bail!("expected enhancer");
        };
        assert!(panel.original().is_none());
        Ok(())
    }

    #[test]
    fn paste_routes_to_mounted_panel() -> anyhow::Result<()> {
        let mut bench = workbench();
        bench.switch(Tab::CameraMotion);
        assert_eq!(bench.paste(png_source(2, 2)?), PasteOutcome::Ignored);

        bench.switch(Tab::ImageToText);
        assert_eq!(bench.paste(png_source(2, 2)?), PasteOutcome::Accepted);
        let MountedPanel::ImageToText(panel) = bench.panel() else {
            anyhow::bail!("expected image-to-text");
        };
        assert!(panel.image().is_some());
        Ok(())
    }

    #[test]
    fn bare_text_goes_to_each_panels_main_input() -> anyhow::Result<()> {
        let mut bench = workbench();
        bench.switch(Tab::CameraMotion);
        assert!(bench.set_text("a dragon"));
        let MountedPanel::CameraMotion(panel) = bench.panel() else {
            anyhow::bail!("expected camera");
        };
        assert_eq!(panel.scene(), "a dragon");
        Ok(())
    }
}
