use crate::meta::MetaEntry;
use crate::scene::{Color, SceneNode};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// The attached render subtree of one successfully loaded entity, tagged with
/// its originating descriptor. Exclusively owned by the [`GroupStateStore`]
/// once attached.
#[derive(Debug)]
pub struct ModelRoot {
    pub entry: Arc<MetaEntry>,
    pub node: Arc<SceneNode>,
    filename: String,
    entity_id: String,
}

impl ModelRoot {
    pub fn new(entry: Arc<MetaEntry>, node: Arc<SceneNode>, filename: String) -> Self {
        let entity_id = entry
            .entity_id()
            .expect("loaded entries always carry an id")
            .to_string();
        Self {
            entry,
            node,
            filename,
            entity_id,
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

/// Visibility record of a group: a blanket flag, or per-model flags keyed by
/// asset filename once individual models were toggled.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupVisibility {
    All(bool),
    PerModel(HashMap<String, bool>),
}

impl Default for GroupVisibility {
    fn default() -> Self {
        GroupVisibility::All(false)
    }
}

#[derive(Debug, Default)]
struct GroupState {
    roots: Vec<Arc<ModelRoot>>,
    visibility: GroupVisibility,
    tint: Option<Color>,
}

/// Authoritative bookkeeping: group name → loaded roots, visibility record,
/// tint. Group states are created lazily and cleared (not deleted) on full
/// unload.
#[derive(Debug, Default)]
pub struct GroupStateStore {
    groups: RwLock<HashMap<String, GroupState>>,
}

impl GroupStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_entity(&self, group: &str, entity_id: &str) -> bool {
        self.groups
            .read()
            .expect("group store read lock")
            .get(group)
            .is_some_and(|g| g.roots.iter().any(|r| r.entity_id() == entity_id))
    }

    /// Appends a freshly loaded root and records it visible.
    pub fn append_root(&self, group: &str, root: Arc<ModelRoot>) {
        let mut groups = self.groups.write().expect("group store write lock");
        let state = groups.entry(group.to_string()).or_default();
        let filename = root.filename().to_string();
        state.roots.push(root);
        Self::set_model_record(state, &filename, true);
    }

    pub fn roots(&self, group: &str) -> Vec<Arc<ModelRoot>> {
        self.groups
            .read()
            .expect("group store read lock")
            .get(group)
            .map(|g| g.roots.clone())
            .unwrap_or_default()
    }

    pub fn root_count(&self, group: &str) -> usize {
        self.groups
            .read()
            .expect("group store read lock")
            .get(group)
            .map(|g| g.roots.len())
            .unwrap_or(0)
    }

    pub fn find_root(&self, group: &str, filename: &str) -> Option<Arc<ModelRoot>> {
        self.groups
            .read()
            .expect("group store read lock")
            .get(group)?
            .roots
            .iter()
            .find(|r| r.filename() == filename)
            .cloned()
    }

    /// Takes every root matching the predicate out of the group, clearing
    /// their per-model visibility records along the way.
    pub fn remove_matching(
        &self,
        group: &str,
        mut predicate: impl FnMut(&ModelRoot) -> bool,
    ) -> Vec<Arc<ModelRoot>> {
        let mut groups = self.groups.write().expect("group store write lock");
        let Some(state) = groups.get_mut(group) else {
            return Vec::new();
        };
        let (removed, kept): (Vec<_>, Vec<_>) =
            state.roots.drain(..).partition(|r| predicate(r.as_ref()));
        state.roots = kept;
        if let GroupVisibility::PerModel(map) = &mut state.visibility {
            for root in &removed {
                map.remove(root.filename());
            }
        }
        removed
    }

    pub fn record_group_visibility(&self, group: &str, visible: bool) {
        let mut groups = self.groups.write().expect("group store write lock");
        let state = groups.entry(group.to_string()).or_default();
        state.visibility = GroupVisibility::All(visible);
    }

    pub fn record_model_visibility(&self, group: &str, filename: &str, visible: bool) {
        let mut groups = self.groups.write().expect("group store write lock");
        let state = groups.entry(group.to_string()).or_default();
        Self::set_model_record(state, filename, visible);
    }

    /// A blanket `All(false)` becomes `All(true)`; per-model records are left
    /// alone (the load path already recorded the new models visible).
    pub fn mark_visible(&self, group: &str) {
        let mut groups = self.groups.write().expect("group store write lock");
        let state = groups.entry(group.to_string()).or_default();
        if state.visibility == GroupVisibility::All(false) {
            state.visibility = GroupVisibility::All(true);
        }
    }

    pub fn visibility(&self, group: &str) -> GroupVisibility {
        self.groups
            .read()
            .expect("group store read lock")
            .get(group)
            .map(|g| g.visibility.clone())
            .unwrap_or_default()
    }

    pub fn set_tint(&self, group: &str, tint: Option<Color>) {
        let mut groups = self.groups.write().expect("group store write lock");
        groups.entry(group.to_string()).or_default().tint = tint;
    }

    pub fn tint(&self, group: &str) -> Option<Color> {
        self.groups
            .read()
            .expect("group store read lock")
            .get(group)
            .and_then(|g| g.tint)
    }

    /// Every group name ever referenced, loaded or not.
    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .groups
            .read()
            .expect("group store read lock")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    fn set_model_record(state: &mut GroupState, filename: &str, visible: bool) {
        match &mut state.visibility {
            GroupVisibility::PerModel(map) => {
                map.insert(filename.to_string(), visible);
            }
            GroupVisibility::All(blanket) => {
                // switching granularity: seed the map with the blanket value
                let mut map: HashMap<String, bool> = state
                    .roots
                    .iter()
                    .map(|r| (r.filename().to_string(), *blanket))
                    .collect();
                map.insert(filename.to_string(), visible);
                state.visibility = GroupVisibility::PerModel(map);
            }
        }
    }
}
