pub mod clipboard;
pub mod config;
pub mod debounce;
pub mod error;
pub mod gateway;
pub mod panels;
pub mod slot;
pub mod transcoder;
pub mod transport;
pub mod workbench;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{AppConfig, CredentialSource, EnvCredentials, StaticCredentials};
pub use error::MediaError;
pub use gateway::{AiGateway, GatewayModels};
pub use panels::{
    CameraMotionPanel, CopyTarget, ImageEnhancerPanel, ImageToTextPanel, PanelController,
    PanelEvent, PasteOutcome,
};
pub use slot::{AsyncSlot, SlotOutcome, UiStatus};
pub use transcoder::ImageSource;
pub use transport::{GeminiTransport, GenerativeTransport};
pub use workbench::{MountedPanel, Tab, Workbench};
