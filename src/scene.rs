// src/scene.rs

//! The fixed catalog of ambient scenes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one of the built-in soundscapes.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SceneId {
    Rain,
    Ocean,
    Asmr,
    Soft,
    #[default]
    Xmas,
}

impl SceneId {
    pub const ALL: [SceneId; 5] = [
        SceneId::Rain,
        SceneId::Ocean,
        SceneId::Asmr,
        SceneId::Soft,
        SceneId::Xmas,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SceneId::Rain => "rain",
            SceneId::Ocean => "ocean",
            SceneId::Asmr => "asmr",
            SceneId::Soft => "soft",
            SceneId::Xmas => "xmas",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == raw.trim())
    }

    /// Unknown identifiers are coerced to the default scene.
    pub fn from_str_or_default(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_else(|| {
            log::warn!("Unknown scene id {:?}, falling back to '{}'", raw, SceneId::default());
            SceneId::default()
        })
    }

    pub fn scene(self) -> &'static Scene {
        scene(self)
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scene {
    pub id: SceneId,
    pub label: &'static str,
    /// Opaque locator, resolved by the audio backend.
    pub src: &'static str,
    pub subtitle: &'static str,
}

pub static SCENES: [Scene; 5] = [
    Scene { id: SceneId::Rain, label: "Rain", src: "audio/rain.mp3", subtitle: "Rain on the glass" },
    Scene { id: SceneId::Ocean, label: "Ocean", src: "audio/ocean.mp3", subtitle: "Slow waves" },
    Scene { id: SceneId::Asmr, label: "ASMR", src: "audio/asmr.mp3", subtitle: "Soft sounds" },
    Scene { id: SceneId::Soft, label: "Soft", src: "audio/soft.mp3", subtitle: "Warm background" },
    Scene { id: SceneId::Xmas, label: "Xmas", src: "audio/xmas.mp3", subtitle: "Christmas mood" },
];

pub fn scene(id: SceneId) -> &'static Scene {
    match id {
        SceneId::Rain => &SCENES[0],
        SceneId::Ocean => &SCENES[1],
        SceneId::Asmr => &SCENES[2],
        SceneId::Soft => &SCENES[3],
        SceneId::Xmas => &SCENES[4],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lookup_matches_ids() {
        for id in SceneId::ALL {
            assert_eq!(scene(id).id, id);
            assert!(scene(id).src.ends_with(&format!("{}.mp3", id.as_str())));
        }
    }

    #[test]
    fn parse_rejects_unknown_ids() {
        assert_eq!(SceneId::parse("ocean"), Some(SceneId::Ocean));
        assert_eq!(SceneId::parse("forest"), None);
        assert_eq!(SceneId::from_str_or_default("forest"), SceneId::Xmas);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&SceneId::Asmr).unwrap(), "\"asmr\"");
        let id: SceneId = serde_json::from_str("\"rain\"").unwrap();
        assert_eq!(id, SceneId::Rain);
    }
}
