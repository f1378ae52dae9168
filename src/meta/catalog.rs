use crate::error::ViewerError;
use crate::meta::types::MetaEntry;
use crate::scene::Color;
use itertools::Itertools;
use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Loads and indexes the metadata document: group buckets plus id and
/// filename reverse lookups. Read-only after construction.
#[derive(Debug)]
pub struct MetaCatalog {
    by_group: HashMap<String, Vec<Arc<MetaEntry>>>,
    by_id: HashMap<String, Arc<MetaEntry>>,
    by_file: HashMap<String, Arc<MetaEntry>>,
    group_colors: HashMap<&'static str, Color>,
    entry_count: usize,
}

/// Default tint per anatomical group, used when an entry carries no color of
/// its own.
fn builtin_group_colors() -> HashMap<&'static str, Color> {
    HashMap::from([
        ("bones", Color(0xcccccc)),
        ("teeth", Color(0xffffff)),
        ("muscles", Color(0xff0000)),
        ("tendons", Color(0xffffff)),
        ("arteries", Color(0xaa0000)),
        ("brain", Color(0xffa500)),
        ("cartilage", Color(0xadd8e6)),
        ("ear", Color(0xf5deb3)),
        ("eyes", Color(0x0000ff)),
        ("glands", Color(0x800080)),
        ("heart", Color(0xb22222)),
        ("ligaments", Color(0xffffff)),
        ("lungs", Color(0xffc0cb)),
        ("nerves", Color(0xffff00)),
        ("organs", Color(0x8b008b)),
        ("skin_hair", Color(0xffd700)),
        ("veins", Color(0x00008b)),
    ])
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn strip_ext(file: &str) -> &str {
    match file.rfind('.') {
        Some(dot) if dot > 0 => &file[..dot],
        _ => file,
    }
}

impl MetaCatalog {
    pub fn from_json_str(json: &str) -> Result<Self, ViewerError> {
        let entries: Vec<MetaEntry> = serde_json::from_str(json)?;
        Ok(Self::from_entries(entries))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ViewerError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn from_entries(entries: Vec<MetaEntry>) -> Self {
        let mut by_group: HashMap<String, Vec<Arc<MetaEntry>>> = HashMap::new();
        let mut by_id = HashMap::new();
        let mut by_file = HashMap::new();
        let mut entry_count = 0;

        for entry in entries {
            let entry = Arc::new(entry);
            let Some(id) = entry.entity_id() else {
                warn!("metadata entry without id or FMA link skipped ({})", entry.display_name());
                continue;
            };
            entry_count += 1;
            by_id.insert(id.to_string(), entry.clone());
            if let Some(fma) = entry.info.as_ref().and_then(|i| i.links.fma.as_deref()) {
                if fma != id {
                    by_id.insert(fma.to_string(), entry.clone());
                }
            }
            if let Some(variant) = entry.current_variant() {
                let file = basename(&variant.filename);
                by_file.insert(file.to_string(), entry.clone());
                by_file.insert(strip_ext(file).to_string(), entry.clone());
            }
            by_group
                .entry(entry.group().to_string())
                .or_default()
                .push(entry);
        }

        info!(
            "metadata indexed: {} entries across {} groups",
            entry_count,
            by_group.len()
        );

        Self {
            by_group,
            by_id,
            by_file,
            group_colors: builtin_group_colors(),
            entry_count,
        }
    }

    pub fn len(&self) -> usize {
        self.entry_count
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// All group names, sorted for deterministic iteration.
    pub fn groups(&self) -> Vec<&str> {
        self.by_group.keys().map(String::as_str).sorted().collect()
    }

    /// Entries of a group, optionally narrowed to one subgroup.
    pub fn entries_for(&self, group: &str, subgroup: Option<&str>) -> Vec<Arc<MetaEntry>> {
        let Some(entries) = self.by_group.get(group) else {
            return Vec::new();
        };
        entries
            .iter()
            .filter(|e| subgroup.is_none() || e.subgroup() == subgroup)
            .cloned()
            .collect()
    }

    pub fn entry_by_id(&self, id: &str) -> Option<Arc<MetaEntry>> {
        self.by_id.get(id.trim()).cloned()
    }

    /// Reverse lookup by asset filename; accepts full paths, bare filenames
    /// and extension-less stems.
    pub fn entry_by_filename(&self, filename: &str) -> Option<Arc<MetaEntry>> {
        let file = basename(filename);
        self.by_file
            .get(file)
            .or_else(|| self.by_file.get(strip_ext(file)))
            .cloned()
    }

    /// Default tint for a group, falling back to the neutral grey.
    pub fn default_color_for(&self, group: &str) -> Color {
        self.group_colors
            .get(group)
            .copied()
            .unwrap_or(Color::DEFAULT_GREY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const META: &str = r#"[
        {
            "id": "fma7163",
            "classification": { "group": "bones", "subgroup": "arm" },
            "labels": { "en": "Humerus" },
            "model": {
                "current": "draco",
                "variants": { "draco": { "filename": "humerus_draco.glb", "path": "bones" } }
            }
        },
        {
            "id": "",
            "classification": { "group": "bones" },
            "info": { "links": { "fma": "fma9611" } },
            "model": {
                "variants": { "draco": { "filename": "radius_draco.glb", "path": "bones" } }
            }
        },
        {
            "id": "fma7203",
            "classification": { "group": "muscles", "subgroup": "arm" },
            "model": {
                "variants": { "draco": { "filename": "biceps_draco.glb", "path": "muscles" } }
            }
        },
        {
            "id": "",
            "classification": { "group": "bones" }
        }
    ]"#;

    #[test]
    fn indexes_by_id_file_and_group() -> Result<(), anyhow::Error> {
        let catalog = MetaCatalog::from_json_str(META)?;
        // the id-less, fma-less entry is dropped
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.groups(), vec!["bones", "muscles"]);

        assert!(catalog.entry_by_id("fma7163").is_some());
        // fma fallback id
        assert!(catalog.entry_by_id("fma9611").is_some());

        let by_file = catalog.entry_by_filename("humerus_draco.glb").unwrap();
        assert_eq!(by_file.entity_id(), Some("fma7163"));
        // stem and path-qualified lookups resolve too
        assert!(catalog.entry_by_filename("radius_draco").is_some());
        assert!(catalog.entry_by_filename("models/bones/biceps_draco.glb").is_some());
        Ok(())
    }

    #[test]
    fn subgroup_filter_narrows_entries() -> Result<(), anyhow::Error> {
        let catalog = MetaCatalog::from_json_str(META)?;
        assert_eq!(catalog.entries_for("bones", None).len(), 2);
        assert_eq!(catalog.entries_for("bones", Some("arm")).len(), 1);
        assert_eq!(catalog.entries_for("bones", Some("leg")).len(), 0);
        assert_eq!(catalog.entries_for("nerves", None).len(), 0);
        Ok(())
    }

    #[test]
    fn group_color_defaults() -> Result<(), anyhow::Error> {
        let catalog = MetaCatalog::from_json_str(META)?;
        assert_eq!(catalog.default_color_for("muscles"), Color(0xff0000));
        assert_eq!(catalog.default_color_for("unknown"), Color::DEFAULT_GREY);
        Ok(())
    }
}
