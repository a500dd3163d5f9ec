//! Model family

use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// The prompt/response dialect of a model
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    /// Tag-channel dialect (gpt-oss)
    Harmony,

    /// Markup-turn dialect with `<|im_start|>` blocks (qwen2.5 and friends)
    #[serde(alias = "chat_ml", alias = "chat-ml")]
    ChatMl,

    /// ChatML with `/think` and `/no_think` directives
    Qwen3,

    /// Header-delimited dialect from Meta
    Llama3,

    /// Tool-section dialect from Moonshot
    Kimi,

    /// Image generation, no chat rendering
    Diffusion,

    /// Audio transcription and synthesis, no chat rendering
    Speech,

    /// Anything we could not resolve
    #[default]
    Unknown,
}

impl ModelFamily {
    /// All families, in declaration order
    pub const ALL: [ModelFamily; 8] = [
        ModelFamily::Harmony,
        ModelFamily::ChatMl,
        ModelFamily::Qwen3,
        ModelFamily::Llama3,
        ModelFamily::Kimi,
        ModelFamily::Diffusion,
        ModelFamily::Speech,
        ModelFamily::Unknown,
    ];

    /// Whether the family produces and consumes chat text
    pub fn is_text(&self) -> bool {
        !matches!(self, ModelFamily::Diffusion | ModelFamily::Speech)
    }

    /// The kebab-case name of the family
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::Harmony => "harmony",
            ModelFamily::ChatMl => "chatml",
            ModelFamily::Qwen3 => "qwen3",
            ModelFamily::Llama3 => "llama3",
            ModelFamily::Kimi => "kimi",
            ModelFamily::Diffusion => "diffusion",
            ModelFamily::Speech => "speech",
            ModelFamily::Unknown => "unknown",
        }
    }
}

impl From<&str> for ModelFamily {
    fn from(s: &str) -> Self {
        Self::from_str(s).unwrap_or_default()
    }
}

impl Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModelFamily {
    type Err = std::convert::Infallible;

    /// Resolve a family name or a model identifier.
    ///
    /// Never fails: unrecognised names resolve to [`ModelFamily::Unknown`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let model = s
            .trim()
            .to_lowercase()
            .replace(['-', '_', ' '], "")
            .replace("instruct", "");

        // Exact family names first.
        if let Some(family) = Self::ALL
            .iter()
            .find(|family| family.as_str() == model)
        {
            return Ok(*family);
        }

        let family = match model.as_str() {
            m if m.starts_with("gptoss") || m.starts_with("openaigptoss") => ModelFamily::Harmony,
            m if m.starts_with("qwen3") || m.starts_with("qwq") => ModelFamily::Qwen3,
            m if m.starts_with("qwen") || m.starts_with("hermes") => ModelFamily::ChatMl,
            m if m.starts_with("llama3") || m.starts_with("metallama3") => ModelFamily::Llama3,
            m if m.starts_with("kimi") || m.starts_with("moonshot") => ModelFamily::Kimi,
            m if m.contains("diffusion") || m.starts_with("flux") || m.starts_with("sdxl") => {
                ModelFamily::Diffusion
            }
            m if m.starts_with("whisper") || m.contains("tts") => ModelFamily::Speech,
            _ => {
                tracing::warn!("unrecognised model family {s}, using unknown");
                ModelFamily::Unknown
            }
        };

        Ok(family)
    }
}
