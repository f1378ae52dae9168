//! Render/pick visibility at group, model and object granularity.
//!
//! The invariant every operation here preserves: a mesh sits in the pick
//! pool exactly when its root is visible and it is not ghosted.

use crate::error::ViewerError;
use crate::scene::{LayerMask, SceneNode};
use crate::store::{AppearanceStore, GroupStateStore, GroupVisibility, ModelRoot, PickRegistry};
use log::info;
use std::sync::Arc;

/// Recursively flips the render flag on `root` and every descendant, routing
/// the pick bit through the registry. Ghosted meshes never regain pick
/// eligibility from a visibility toggle.
pub(crate) fn set_subtree_visibility(
    root: &SceneNode,
    visible: bool,
    picks: &PickRegistry,
    appearance: &AppearanceStore,
) {
    root.for_each(&mut |node| {
        node.set_visible(visible);
        node.set_layer(LayerMask::RENDER, visible);
        if node.surface().is_some() {
            picks.set_pickable(node, visible && !appearance.is_ghosted(node.id()));
        }
    });
}

pub struct VisibilityController {
    store: Arc<GroupStateStore>,
    picks: Arc<PickRegistry>,
    appearance: Arc<AppearanceStore>,
}

impl VisibilityController {
    pub fn new(
        store: Arc<GroupStateStore>,
        picks: Arc<PickRegistry>,
        appearance: Arc<AppearanceStore>,
    ) -> Self {
        Self {
            store,
            picks,
            appearance,
        }
    }

    pub fn set_group_visibility(&self, group: &str, visible: bool) {
        for root in self.store.roots(group) {
            set_subtree_visibility(&root.node, visible, &self.picks, &self.appearance);
        }
        self.store.record_group_visibility(group, visible);
    }

    pub fn set_model_visibility(&self, root: &ModelRoot, visible: bool) {
        set_subtree_visibility(&root.node, visible, &self.picks, &self.appearance);
        self.store
            .record_model_visibility(root.entry.group(), root.filename(), visible);
    }

    pub fn toggle_model_visibility(&self, root: &ModelRoot) {
        self.set_model_visibility(root, !root.node.is_visible());
    }

    pub fn is_model_visible(&self, root: &ModelRoot) -> bool {
        root.node.is_visible()
    }

    pub fn hide_all_groups(&self) {
        for group in self.store.group_names() {
            self.set_group_visibility(&group, false);
        }
        info!("all managed models hidden");
    }

    pub fn show_all_groups(&self) {
        for group in self.store.group_names() {
            self.set_group_visibility(&group, true);
        }
        info!("all managed models shown");
    }

    /// Re-applies the recorded visibility of a group: blanket flag, per-model
    /// map (unlisted models default to visible), or everything visible when
    /// nothing was recorded.
    pub fn restore_group_visibility(&self, group: &str) {
        match self.store.visibility(group) {
            GroupVisibility::All(visible) => self.set_group_visibility(group, visible),
            GroupVisibility::PerModel(map) => {
                for root in self.store.roots(group) {
                    let visible = map.get(root.filename()).copied().unwrap_or(true);
                    set_subtree_visibility(&root.node, visible, &self.picks, &self.appearance);
                }
            }
        }
    }

    pub fn count_visible_in_group(&self, group: &str) -> usize {
        self.store
            .roots(group)
            .iter()
            .filter(|r| r.node.is_visible())
            .count()
    }

    /// Groups with at least one visible model.
    pub fn visible_groups(&self) -> Vec<String> {
        self.store
            .group_names()
            .into_iter()
            .filter(|g| self.count_visible_in_group(g) > 0)
            .collect()
    }

    /// Verifies the pick pool against the render/ghost state of every loaded
    /// mesh. A violation is a programming error, not a runtime condition.
    pub fn check_invariants(&self) -> Result<(), ViewerError> {
        for group in self.store.group_names() {
            for root in self.store.roots(&group) {
                let mut violation = None;
                root.node.for_each_mesh(&mut |mesh, _| {
                    let expected = mesh.is_visible() && !self.appearance.is_ghosted(mesh.id());
                    if self.picks.is_pickable(mesh.id()) != expected && violation.is_none() {
                        violation = Some(format!(
                            "mesh {:?} of {} in \"{group}\": pickable={}, visible={}, ghosted={}",
                            mesh.id(),
                            root.filename(),
                            self.picks.is_pickable(mesh.id()),
                            mesh.is_visible(),
                            self.appearance.is_ghosted(mesh.id()),
                        ));
                    }
                });
                if let Some(detail) = violation {
                    return Err(ViewerError::StateInvariantViolation { detail });
                }
            }
        }
        Ok(())
    }
}
