//! Application facade wiring the catalog, loader and stores together. This
//! is the surface the embedding UI talks to; all stores are constructor
//! injected, nothing lives in ambient global state.

use crate::loader::{AssetLoader, GroupLoader, LoadSummary, PathResolver};
use crate::meta::MetaCatalog;
use crate::scene::{Color, Scene};
use crate::store::{AppearanceStore, GroupStateStore, ModelRoot, PickRegistry, GHOST_OPACITY};
use crate::visibility::VisibilityController;
use std::sync::Arc;

pub struct Viewer<L: AssetLoader> {
    catalog: Arc<MetaCatalog>,
    scene: Arc<Scene>,
    store: Arc<GroupStateStore>,
    picks: Arc<PickRegistry>,
    appearance: Arc<AppearanceStore>,
    visibility: VisibilityController,
    loader: GroupLoader<Arc<L>>,
}

impl<L: AssetLoader> Viewer<L> {
    pub fn new(catalog: Arc<MetaCatalog>, asset_loader: Arc<L>, paths: PathResolver) -> Self {
        let scene = Arc::new(Scene::new());
        let store = Arc::new(GroupStateStore::new());
        let picks = Arc::new(PickRegistry::new());
        let appearance = Arc::new(AppearanceStore::new(picks.clone()));
        let visibility =
            VisibilityController::new(store.clone(), picks.clone(), appearance.clone());
        let loader = GroupLoader::new(
            catalog.clone(),
            asset_loader,
            scene.clone(),
            store.clone(),
            picks.clone(),
            appearance.clone(),
            paths,
        );
        Self {
            catalog,
            scene,
            store,
            picks,
            appearance,
            visibility,
            loader,
        }
    }

    // --- loading -----------------------------------------------------------

    pub async fn load_group(
        &self,
        group: &str,
        subgroup: Option<&str>,
        center_camera: bool,
    ) -> LoadSummary {
        self.loader.load_group(group, subgroup, center_camera).await
    }

    pub fn unload_group(&self, group: &str, subgroup: Option<&str>) -> usize {
        self.loader.unload_group(group, subgroup)
    }

    pub fn unload_model(&self, group: &str, filename: &str) -> bool {
        self.loader.unload_model(group, filename)
    }

    // --- visibility --------------------------------------------------------

    pub fn set_group_visibility(&self, group: &str, visible: bool) {
        self.visibility.set_group_visibility(group, visible);
    }

    pub fn set_model_visibility(&self, root: &ModelRoot, visible: bool) {
        self.visibility.set_model_visibility(root, visible);
    }

    pub fn toggle_model_visibility(&self, root: &ModelRoot) {
        self.visibility.toggle_model_visibility(root);
    }

    pub fn restore_group_visibility(&self, group: &str) {
        self.visibility.restore_group_visibility(group);
    }

    pub fn hide_all_groups(&self) {
        self.visibility.hide_all_groups();
    }

    pub fn show_all_groups(&self) {
        self.visibility.show_all_groups();
    }

    // --- appearance --------------------------------------------------------

    pub fn set_opacity(&self, root: &ModelRoot, value: f32) {
        self.appearance.set_opacity(&root.node, value);
    }

    pub fn set_group_opacity(&self, group: &str, value: f32) {
        for root in self.store.roots(group) {
            self.appearance.set_opacity(&root.node, value);
        }
    }

    pub fn set_ghost(&self, root: &ModelRoot, opacity: Option<f32>) {
        self.appearance
            .set_ghost(&root.node, opacity.unwrap_or(GHOST_OPACITY));
    }

    pub fn clear_ghost(&self, root: &ModelRoot) {
        self.appearance.clear_ghost(&root.node);
    }

    pub fn set_group_ghost(&self, group: &str, opacity: Option<f32>) {
        for root in self.store.roots(group) {
            self.appearance
                .set_ghost(&root.node, opacity.unwrap_or(GHOST_OPACITY));
        }
    }

    pub fn clear_group_ghost(&self, group: &str) {
        for root in self.store.roots(group) {
            self.appearance.clear_ghost(&root.node);
        }
    }

    pub fn set_color(&self, root: &ModelRoot, color: Color) {
        self.appearance.set_color(&root.node, color);
    }

    /// Tints every loaded model of the group and records the tint for models
    /// loaded later.
    pub fn set_group_color(&self, group: &str, color: Color) {
        self.store.set_tint(group, Some(color));
        for root in self.store.roots(group) {
            self.appearance.set_color(&root.node, color);
        }
    }

    // --- read access for the UI -------------------------------------------

    pub fn catalog(&self) -> &MetaCatalog {
        &self.catalog
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn store(&self) -> &GroupStateStore {
        &self.store
    }

    pub fn picks(&self) -> &PickRegistry {
        &self.picks
    }

    pub fn appearance(&self) -> &AppearanceStore {
        &self.appearance
    }

    pub fn visibility(&self) -> &VisibilityController {
        &self.visibility
    }
}
