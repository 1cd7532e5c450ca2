//! Static prompt catalog shared by every panel.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub text: &'static str,
    pub scale_factor: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CameraMotion {
    pub name: &'static str,
    pub prompt_fragment: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tip {
    pub title: &'static str,
    pub body: &'static str,
}

pub const UPSCALE_2X_PROMPT: &str = "This image has been digitally enlarged 2 times. Please enhance its quality by sharpening details, reducing pixelation, and improving overall clarity to make it look like a native high-resolution photo. Do not add or remove any objects. Keep the original style and composition intact.";
pub const DEFAULT_ENHANCE_PROMPT: &str = "Subtly enhance this image's resolution. Improve fine details, clarity, and lighting to be more natural. Do not add or remove any objects. Keep the original style and composition intact.";
pub const VIBRANT_PROMPT: &str = "Boost the color saturation and vibrancy of this image. Make the colors pop without looking unnatural. Enhance the contrast slightly.";
pub const CINEMATIC_PROMPT: &str = "Give this image a cinematic look. Adjust the color grading to be more dramatic, add a subtle film grain, and enhance the lighting to create more depth.";
pub const SHARPEN_PROMPT: &str = "Focus on sharpening the fine details in this image. Increase the definition of edges and textures without introducing halos or artifacts.";

pub const DEFAULT_UPSCALE_FACTOR: f64 = 2.0;

pub const UPSCALE_OPTIONS: &[PromptTemplate] = &[
    PromptTemplate {
        name: "Enhance Only",
        text: DEFAULT_ENHANCE_PROMPT,
        scale_factor: Some(1.0),
    },
    PromptTemplate {
        name: "Upscale 2x",
        text: UPSCALE_2X_PROMPT,
        scale_factor: Some(2.0),
    },
];

pub const SUGGESTIONS: &[PromptTemplate] = &[
    PromptTemplate {
        name: "2x Upscale",
        text: UPSCALE_2X_PROMPT,
        scale_factor: Some(2.0),
    },
    PromptTemplate {
        name: "Default Enhance",
        text: DEFAULT_ENHANCE_PROMPT,
        scale_factor: Some(1.0),
    },
    PromptTemplate {
        name: "Vibrant Colors",
        text: VIBRANT_PROMPT,
        scale_factor: None,
    },
    PromptTemplate {
        name: "Cinematic Look",
        text: CINEMATIC_PROMPT,
        scale_factor: None,
    },
    PromptTemplate {
        name: "Sharpen Details",
        text: SHARPEN_PROMPT,
        scale_factor: None,
    },
];

pub const CAMERA_MOTIONS: &[CameraMotion] = &[
    CameraMotion {
        name: "Pan Left",
        prompt_fragment: "A smooth camera pan from right to left, revealing the scene.",
    },
    CameraMotion {
        name: "Pan Right",
        prompt_fragment: "A smooth camera pan from left to right, revealing the scene.",
    },
    CameraMotion {
        name: "Tilt Up",
        prompt_fragment: "A smooth camera tilt upwards, starting from a low angle and moving high.",
    },
    CameraMotion {
        name: "Tilt Down",
        prompt_fragment: "A smooth camera tilt downwards, starting from a high angle and moving low.",
    },
    CameraMotion {
        name: "Zoom In",
        prompt_fragment: "A steady and slow zoom in on the main subject, creating focus and tension.",
    },
    CameraMotion {
        name: "Zoom Out",
        prompt_fragment: "A steady and slow zoom out, revealing the broader context of the environment.",
    },
    CameraMotion {
        name: "Dolly Forward",
        prompt_fragment: "A dolly shot moving forward, smoothly advancing towards the subject.",
    },
    CameraMotion {
        name: "Crane Shot",
        prompt_fragment: "A crane shot that starts low and moves high up, providing an aerial perspective of the scene.",
    },
    CameraMotion {
        name: "Tracking Shot",
        prompt_fragment: "A tracking shot that follows a moving subject, keeping them centered in the frame.",
    },
    CameraMotion {
        name: "Orbit Shot",
        prompt_fragment: "An orbit shot circling the subject, capturing a 360-degree view of their form and surroundings.",
    },
    CameraMotion {
        name: "Dutch Angle",
        prompt_fragment: "A shot with a tilted camera angle, creating a sense of unease, tension, or dynamic action.",
    },
    CameraMotion {
        name: "Crash Zoom",
        prompt_fragment: "A very fast zoom-in, creating a jarring, dramatic, or comedic effect.",
    },
    CameraMotion {
        name: "Slow Motion",
        prompt_fragment: "The scene is captured in slow motion, emphasizing every detail of the action.",
    },
    CameraMotion {
        name: "Time-lapse",
        prompt_fragment: "A time-lapse shot, showing a long period of time passing quickly.",
    },
    CameraMotion {
        name: "First-Person POV",
        prompt_fragment: "A point-of-view shot, showing the scene from the perspective of a character.",
    },
];

pub const ART_STYLES: &[&str] = &[
    "2D Vector",
    "3D Detailed Unreal Engine Render",
    "3D Disney Pixar",
    "Abstract",
    "Anime",
    "Chinese Ink Drawing",
    "Cinematic",
    "Comic Book",
    "Cyberpunk",
    "Fantasy Art",
    "Flat Illustration",
    "Graffiti",
    "Icon",
    "Impressionism",
    "Isometric",
    "Line Art",
    "Low Poly",
    "Minimalist",
    "Pencil Drawing",
    "Photorealistic",
    "Sketchup",
    "Steampunk",
    "Sticker",
    "Surrealism",
    "Watercolor",
];

pub const STYLE_SEPARATOR: &str = ", ";
pub const PROMPT_SEPARATOR: &str = "---";
pub const NO_NEGATIVE_PROMPT_PLACEHOLDER: &str = "No negative prompt was generated.";
pub const NO_NEGATIVE_HINTS_PLACEHOLDER: &str = "None, use standard negative prompts.";
pub const CAMERA_COMPOSITE_PLACEHOLDER: &str =
    "1. Describe a scene. 2. Select a motion. 3. Click Enhance for extra AI detail!";

pub const CAPTION_INSTRUCTION: &str = "Describe this image in detail for a text-to-image prompt. Focus on the subject, setting, style, and composition.";

pub const PROMPT_ENGINEER_INSTRUCTION: &str = "You are a master prompt engineer for text-to-image AI models. Your goal is to expand a user's simple prompt into a rich, detailed, and effective positive prompt, and generate a corresponding negative prompt based on user input and general best practices.

**Output Format:**
You MUST return the positive and negative prompts separated by \"---\".
Example:
[Positive Prompt Here]
---
[Negative Prompt Here]";

pub const PROMPT_ENGINEER_CLOSING: &str =
    "Do not include any other explanations, just the formatted prompts.";

pub const CINEMATOGRAPHER_INSTRUCTION: &str = "You are a master cinematographer and AI video prompt engineer. Your task is to take a user's prompt, which includes a scene description and a camera motion, and embellish it with vivid details. Add descriptive adjectives, specify lighting conditions (e.g., 'golden hour light', 'ominous moonlight'), and suggest atmospheric elements (e.g., 'wisps of fog', 'dust motes dancing in the air') to make the final prompt more cinematic and evocative. Do not change the core subject or the camera motion. Output only the enhanced prompt.";

/// Text-to-image model the prompt enhancer writes for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TargetModel {
    #[default]
    Flux,
    Qwen,
    Sdxl,
}

impl TargetModel {
    pub const ALL: [TargetModel; 3] = [TargetModel::Flux, TargetModel::Qwen, TargetModel::Sdxl];

    pub fn id(self) -> &'static str {
        match self {
            Self::Flux => "flux",
            Self::Qwen => "qwen",
            Self::Sdxl => "sdxl",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Flux => "Flux Dev",
            Self::Qwen => "Qwen",
            Self::Sdxl => "SDXL",
        }
    }

    pub fn guidance(self) -> &'static str {
        match self {
            Self::Flux => "- **Flux:** Use natural, descriptive language for the positive prompt. The negative prompt should also be in natural language.",
            Self::Qwen => "- **Qwen:** Be more direct and keyword-focused for the positive prompt. The negative prompt should list undesirable concepts.",
            Self::Sdxl => "- **SDXL:** Generate a highly detailed positive prompt using comma-separated keywords, artistic styles, and camera details. Use weighting like (word:1.2) for emphasis. The negative prompt should be a comprehensive list of common negative embeddings and concepts like 'ugly, tiling, poorly drawn hands, poorly drawn feet, out of frame, extra limbs, disfigured, deformed, body out of frame, blurry, bad anatomy, blurred, watermark, grainy, signature, cut off, draft'.",
        }
    }

    /// Accepts the id or the display name, case-insensitively.
    pub fn from_name(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        Self::ALL.into_iter().find(|model| {
            model.id().eq_ignore_ascii_case(needle) || model.display_name().eq_ignore_ascii_case(needle)
        })
    }
}

pub const TIPS: &[Tip] = &[
    Tip {
        title: "Start with Quality",
        body: "For best results, upload a clear, well-lit image. The AI works best when it has good details to enhance.",
    },
    Tip {
        title: "Be Descriptive",
        body: "Modify the prompt to guide the AI. Try phrases like \"enhance the facial details\", \"make the colors more vibrant\", or \"add a cinematic feel\".",
    },
    Tip {
        title: "Powerful Upscaling",
        body: "Use the \"Upscale 2x\" option to dramatically increase your image's dimensions. The AI will intelligently add new details for a crisp, high-resolution result.",
    },
    Tip {
        title: "Experiment & Iterate",
        body: "Don't be afraid to try the same image with different prompts. Small changes in wording can lead to unique and interesting results.",
    },
    Tip {
        title: "Subtle is often Better",
        body: "The default prompt aims for subtle, realistic enhancement. Overly aggressive prompts might introduce artifacts.",
    },
    Tip {
        title: "Patience is Key",
        body: "The enhancement process can take a moment, especially for larger images. The high-quality result is worth the wait!",
    },
];

fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

pub fn find_suggestion(name: &str) -> Option<&'static PromptTemplate> {
    let needle = normalize(name);
    SUGGESTIONS.iter().find(|item| normalize(item.name) == needle)
}

pub fn find_upscale_option(factor: f64) -> Option<&'static PromptTemplate> {
    UPSCALE_OPTIONS
        .iter()
        .find(|option| option.scale_factor == Some(factor))
}

pub fn find_camera_motion(name: &str) -> Option<&'static CameraMotion> {
    let needle = normalize(name);
    CAMERA_MOTIONS
        .iter()
        .find(|motion| normalize(motion.name) == needle)
}

/// Canonical spelling of a catalog style.
pub fn find_style(name: &str) -> Option<&'static str> {
    let needle = normalize(name);
    ART_STYLES
        .iter()
        .copied()
        .find(|style| normalize(style) == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_ignore_case_and_padding() {
        assert_eq!(
            find_suggestion("  vibrant colors ").map(|item| item.text),
            Some(VIBRANT_PROMPT)
        );
        assert_eq!(
            find_camera_motion("zoom in").map(|motion| motion.name),
            Some("Zoom In")
        );
        assert_eq!(find_style("cyberPUNK"), Some("Cyberpunk"));
        assert_eq!(find_style("Vaporwave"), None);
    }

    #[test]
    fn upscale_options_cover_both_factors() {
        assert_eq!(find_upscale_option(1.0).map(|o| o.text), Some(DEFAULT_ENHANCE_PROMPT));
        assert_eq!(find_upscale_option(2.0).map(|o| o.text), Some(UPSCALE_2X_PROMPT));
        assert!(find_upscale_option(3.0).is_none());
    }

    #[test]
    fn target_models_resolve_by_id_or_display_name() {
        assert_eq!(TargetModel::from_name("sdxl"), Some(TargetModel::Sdxl));
        assert_eq!(TargetModel::from_name("Flux Dev"), Some(TargetModel::Flux));
        assert_eq!(TargetModel::from_name("midjourney"), None);
        assert_eq!(TargetModel::default(), TargetModel::Flux);
        assert!(TargetModel::Sdxl.guidance().contains("(word:1.2)"));
    }

    #[test]
    fn catalog_sizes_match_the_panels() {
        assert_eq!(CAMERA_MOTIONS.len(), 15);
        assert_eq!(ART_STYLES.len(), 25);
        assert_eq!(SUGGESTIONS.len(), 5);
        assert_eq!(TIPS.len(), 6);
    }
}
