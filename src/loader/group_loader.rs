use crate::error::ViewerError;
use crate::loader::path::PathResolver;
use crate::loader::AssetLoader;
use crate::meta::{MetaCatalog, MetaEntry};
use crate::scene::{Scene, SceneNode};
use crate::store::{AppearanceStore, GroupStateStore, ModelRoot, PickRegistry};
use crate::visibility::set_subtree_visibility;
use dashmap::DashMap;
use glam::{Affine3A, EulerRot, Quat, Vec3};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Upper bound on a single entry's fetch. Exceeding it fails that entry
/// only, never the group operation.
const ENTRY_TIMEOUT: Duration = Duration::from_secs(10);

/// Aggregated outcome of one group load. Entry failures end up here instead
/// of aborting siblings.
#[derive(Debug)]
pub struct LoadSummary {
    pub group: String,
    pub subgroup: Option<String>,
    pub requested: usize,
    /// Entity ids loaded and attached by this call.
    pub loaded: Vec<String>,
    /// Entity ids that were already present (or lost a load race and found
    /// the winner's result in place).
    pub skipped: Vec<String>,
    pub failed: Vec<(String, ViewerError)>,
    /// Camera framing is the embedder's concern; the flag is merely echoed.
    pub center_camera: bool,
}

impl LoadSummary {
    fn new(group: &str, subgroup: Option<&str>, center_camera: bool) -> Self {
        Self {
            group: group.to_string(),
            subgroup: subgroup.map(str::to_string),
            requested: 0,
            loaded: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            center_camera,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

enum EntryOutcome {
    Loaded,
    AlreadyPresent,
}

/// Orchestrates fetching the entries of a group/subgroup: catalog filter,
/// per-entity-id deduplication, attach, pick registration, bookkeeping.
///
/// All store mutations happen synchronously between suspension points; the
/// only await is inside [`AssetLoader::load`]. Two overlapping `load_group`
/// calls for the same entity serialize on the entity's in-flight guard, and
/// the loser re-checks the store instead of loading a duplicate.
pub struct GroupLoader<L: AssetLoader> {
    catalog: Arc<MetaCatalog>,
    asset_loader: L,
    scene: Arc<Scene>,
    store: Arc<GroupStateStore>,
    picks: Arc<PickRegistry>,
    appearance: Arc<AppearanceStore>,
    paths: PathResolver,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl<L: AssetLoader> GroupLoader<L> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<MetaCatalog>,
        asset_loader: L,
        scene: Arc<Scene>,
        store: Arc<GroupStateStore>,
        picks: Arc<PickRegistry>,
        appearance: Arc<AppearanceStore>,
        paths: PathResolver,
    ) -> Self {
        Self {
            catalog,
            asset_loader,
            scene,
            store,
            picks,
            appearance,
            paths,
            in_flight: DashMap::new(),
        }
    }

    /// Loads every entry of `group` (narrowed to `subgroup` if given) that is
    /// not already present, by stable entity id. Idempotent per entity id.
    pub async fn load_group(
        &self,
        group: &str,
        subgroup: Option<&str>,
        center_camera: bool,
    ) -> LoadSummary {
        let mut summary = LoadSummary::new(group, subgroup, center_camera);
        let entries = self.catalog.entries_for(group, subgroup);
        if entries.is_empty() {
            warn!("no models found for group \"{group}\" (subgroup {subgroup:?})");
            return summary;
        }
        summary.requested = entries.len();

        let started = Instant::now();
        for entry in entries {
            // entries without an id were dropped at indexing
            let id = entry.entity_id().unwrap_or_default().to_string();
            match self.load_entry(group, &id, &entry).await {
                Ok(EntryOutcome::Loaded) => summary.loaded.push(id),
                Ok(EntryOutcome::AlreadyPresent) => summary.skipped.push(id),
                Err(err) => {
                    error!("load of {id} in group \"{group}\" failed: {err}");
                    summary.failed.push((id, err));
                }
            }
        }

        self.store.mark_visible(group);
        info!(
            "group \"{group}\" loaded in {}ms: {} new, {} skipped, {} failed",
            started.elapsed().as_millis(),
            summary.loaded.len(),
            summary.skipped.len(),
            summary.failed.len()
        );
        summary
    }

    async fn load_entry(
        &self,
        group: &str,
        id: &str,
        entry: &Arc<MetaEntry>,
    ) -> Result<EntryOutcome, ViewerError> {
        if self.store.contains_entity(group, id) {
            debug!("model {id} already loaded, skipped");
            return Ok(EntryOutcome::AlreadyPresent);
        }

        let guard = self
            .in_flight
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _locked = guard.lock().await;

        // Re-check after acquiring the guard: losing the race means the
        // winner already attached this entity.
        if self.store.contains_entity(group, id) {
            debug!(
                "suppressed: {}",
                ViewerError::DuplicateLoadAttempt { id: id.to_string() }
            );
            drop(_locked);
            drop(guard);
            self.release_guard(id);
            return Ok(EntryOutcome::AlreadyPresent);
        }

        let result = self.fetch_and_attach(group, id, entry).await;
        drop(_locked);
        drop(guard);
        self.release_guard(id);
        result
    }

    /// Drops the in-flight entry only once no other task still holds the
    /// guard. Removing it under a waiter would let a later caller mint a
    /// fresh mutex and race the waiter for the same entity.
    fn release_guard(&self, id: &str) {
        self.in_flight
            .remove_if(id, |_, mutex| Arc::strong_count(mutex) == 1);
    }

    async fn fetch_and_attach(
        &self,
        group: &str,
        id: &str,
        entry: &Arc<MetaEntry>,
    ) -> Result<EntryOutcome, ViewerError> {
        let variant = entry
            .current_variant()
            .ok_or(ViewerError::MetadataMalformed {
                id: id.to_string(),
                reason: "no usable model variant",
            })?;
        if variant.filename.is_empty() || variant.path.is_empty() {
            return Err(ViewerError::MetadataMalformed {
                id: id.to_string(),
                reason: "variant misses filename or path",
            });
        }
        let url = self.paths.model_url(&variant.path, &variant.filename);

        let node = match tokio::time::timeout(ENTRY_TIMEOUT, self.asset_loader.load(&url)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ViewerError::AssetTimeout {
                    url,
                    secs: ENTRY_TIMEOUT.as_secs(),
                });
            }
        };

        // Synchronous from here on: attach and bookkeeping cannot interleave
        // with other mutations, so no entity is ever attached-but-untracked.
        self.apply_entry_defaults(group, entry, &node);
        let root = Arc::new(ModelRoot::new(
            entry.clone(),
            node.clone(),
            variant.filename.clone(),
        ));
        self.scene.attach(node.clone());
        self.store.append_root(group, root);
        self.picks.register_pickables(&node);

        if !entry.model.as_ref().is_none_or(|m| m.visible_by_default) {
            set_subtree_visibility(&node, false, &self.picks, &self.appearance);
            self.store
                .record_model_visibility(group, &variant.filename, false);
        }

        debug!("model {id} attached from {url}");
        Ok(EntryOutcome::Loaded)
    }

    /// Default material and transform from the metadata: group tint, else the
    /// entry's own color, else the group's builtin default.
    fn apply_entry_defaults(&self, group: &str, entry: &MetaEntry, node: &SceneNode) {
        let color = self
            .store
            .tint(group)
            .or_else(|| entry.model.as_ref().and_then(|m| m.default_color))
            .unwrap_or_else(|| self.catalog.default_color_for(group));
        node.for_each_mesh(&mut |_, surface| {
            for material in surface.materials() {
                material.write().expect("material write lock").color = color;
            }
        });

        if let Some(model) = entry.model.as_ref() {
            let rotation = model
                .rotation
                .map(|[x, y, z]| Quat::from_euler(EulerRot::XYZ, x, y, z))
                .unwrap_or(Quat::IDENTITY);
            let scale = model.scale.map(Vec3::from).unwrap_or(Vec3::ONE);
            node.set_transform(Affine3A::from_scale_rotation_translation(
                scale,
                rotation,
                Vec3::ZERO,
            ));
        }
    }

    /// Removes every matching root: pick unregistration, resource disposal,
    /// detach, bookkeeping cleanup. Returns the number of removed models.
    pub fn unload_group(&self, group: &str, subgroup: Option<&str>) -> usize {
        let removed = self.store.remove_matching(group, |root| {
            subgroup.is_none() || root.entry.subgroup() == subgroup
        });
        for root in &removed {
            self.tear_down(root);
        }
        info!(
            "unloaded {} models from group \"{group}\"{}",
            removed.len(),
            subgroup.map(|s| format!(", subgroup \"{s}\"")).unwrap_or_default()
        );
        removed.len()
    }

    /// Removes a single model by its asset filename.
    pub fn unload_model(&self, group: &str, filename: &str) -> bool {
        let removed = self.store.remove_matching(group, |root| root.filename() == filename);
        if removed.is_empty() {
            warn!("model \"{filename}\" not found in group \"{group}\"");
            return false;
        }
        for root in &removed {
            self.tear_down(root);
        }
        true
    }

    fn tear_down(&self, root: &ModelRoot) {
        self.picks.unregister_pickables(&root.node);
        self.appearance.forget(&root.node);
        root.node.dispose();
        self.scene.detach(root.node.id());
    }
}
