//! Counselor personas
//!
//! A persona's name doubles as the system instruction sent with every
//! dispatch.

use serde::{Deserialize, Serialize};

/// Name used when no persona was chosen
pub const DEFAULT_PERSONA_NAME: &str = "상담사";

const DEFAULT_IMAGE: &str = "/assets/img/default_bot.png";
const DEFAULT_BACKGROUND: &str = "/assets/img/bg_default.png";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub description: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl Persona {
    fn builtin(name: &str, description: &str, image: &str, background: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            image: image.to_string(),
            background: Some(background.to_string()),
        }
    }

    /// The generic counselor
    pub fn counselor() -> Self {
        Self::custom(DEFAULT_PERSONA_NAME)
    }

    /// Persona that is not on the roster; only its name matters
    pub fn custom(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            image: DEFAULT_IMAGE.to_string(),
            background: Some(DEFAULT_BACKGROUND.to_string()),
        }
    }
}

/// The selectable characters, in carousel order
#[derive(Debug, Clone)]
pub struct Roster {
    personas: Vec<Persona>,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new(vec![
            Persona::builtin(
                "70대 교회 목사님",
                "따뜻하고 인자한 말투로 인생 상담을 해주는 목사님",
                "/assets/img/3.png",
                "/assets/img/bg3.png",
            ),
            Persona::builtin(
                "30대 비즈니스맨",
                "속도감 있고 날카로운 조언을 해주는 커리어 전문가",
                "/assets/img/1.png",
                "/assets/img/bg1.png",
            ),
            Persona::builtin(
                "정 많은 할머니",
                "사투리가 섞인 푸근한 조언을 해주는 이웃집 할머니",
                "/assets/img/2.png",
                "/assets/img/bg2.png",
            ),
        ])
    }
}

impl Roster {
    pub fn new(personas: Vec<Persona>) -> Self {
        Self { personas }
    }

    pub fn personas(&self) -> &[Persona] {
        &self.personas
    }

    pub fn find(&self, name: &str) -> Option<&Persona> {
        let name = name.trim();
        self.personas.iter().find(|p| p.name == name)
    }

    /// Roster entry for `name`, or a custom persona when there is none.
    /// Blank names fall back to the default counselor.
    pub fn resolve(&self, name: &str) -> Persona {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Persona::counselor();
        }
        self.find(trimmed)
            .cloned()
            .unwrap_or_else(|| Persona::custom(trimmed))
    }

    /// Carousel step forward, wrapping at the end
    #[allow(dead_code)] // Navigation for carousel clients
    pub fn next(&self, index: usize) -> usize {
        if self.personas.is_empty() {
            return 0;
        }
        let len = self.personas.len();
        (index % len + 1) % len
    }

    /// Carousel step back, wrapping at the start
    #[allow(dead_code)] // Navigation for carousel clients
    pub fn prev(&self, index: usize) -> usize {
        let len = self.personas.len();
        if len == 0 {
            return 0;
        }
        (index % len + len - 1) % len
    }
}
