use crate::scene::Color;
use serde::Deserialize;
use std::collections::HashMap;

/// One immutable entity descriptor from the metadata document. Loaded once,
/// never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct MetaEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub classification: Classification,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub model: Option<ModelAsset>,
    #[serde(default)]
    pub info: Option<Info>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Classification {
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default)]
    pub subgroup: Option<String>,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            group: default_group(),
            subgroup: None,
        }
    }
}

/// Unclassified entries land in a catch-all group.
fn default_group() -> String {
    "other".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelAsset {
    /// Key of the variant to load, e.g. "draco".
    #[serde(default)]
    pub current: Option<String>,
    #[serde(default)]
    pub variants: HashMap<String, Variant>,
    #[serde(default)]
    pub default_color: Option<Color>,
    #[serde(default)]
    pub highlight_color: Option<Color>,
    /// Euler XYZ rotation in radians.
    #[serde(default)]
    pub rotation: Option<[f32; 3]>,
    #[serde(default)]
    pub scale: Option<[f32; 3]>,
    #[serde(default = "default_true")]
    pub visible_by_default: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct Variant {
    pub filename: String,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Links {
    /// Foundational Model of Anatomy identifier, the fallback entity id.
    #[serde(default)]
    pub fma: Option<String>,
}

impl MetaEntry {
    /// Stable entity id: the explicit id, or the FMA link as fallback.
    /// Entries with neither are unloadable and skipped during indexing.
    pub fn entity_id(&self) -> Option<&str> {
        let id = self.id.trim();
        if !id.is_empty() {
            return Some(id);
        }
        self.info
            .as_ref()
            .and_then(|i| i.links.fma.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The variant selected by `model.current` (default "draco").
    pub fn current_variant(&self) -> Option<&Variant> {
        let model = self.model.as_ref()?;
        let key = model.current.as_deref().unwrap_or("draco");
        model.variants.get(key)
    }

    pub fn label_en(&self) -> Option<&str> {
        self.labels.get("en").map(String::as_str)
    }

    /// Human readable name: english label, else the asset filename, else the id.
    pub fn display_name(&self) -> &str {
        self.label_en()
            .or_else(|| self.current_variant().map(|v| v.filename.as_str()))
            .or_else(|| self.entity_id())
            .unwrap_or("<unnamed>")
    }

    pub fn group(&self) -> &str {
        &self.classification.group
    }

    pub fn subgroup(&self) -> Option<&str> {
        self.classification.subgroup.as_deref()
    }
}
