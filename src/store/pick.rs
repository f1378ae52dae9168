use crate::scene::{LayerMask, NodeId, SceneNode};
use std::collections::HashSet;
use std::sync::RwLock;

/// The set of meshes eligible for ray-hit testing, independent of render
/// visibility. Pool membership and the PICK layer bit of a mesh only ever
/// change together, through [`PickRegistry::set_pickable`].
#[derive(Debug, Default)]
pub struct PickRegistry {
    pool: RwLock<HashSet<NodeId>>,
}

impl PickRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single source of truth for pick eligibility. Non-mesh nodes are
    /// ignored, they carry no hit-testable surface.
    pub fn set_pickable(&self, mesh: &SceneNode, on: bool) {
        if mesh.surface().is_none() {
            return;
        }
        mesh.set_layer(LayerMask::PICK, on);
        let mut pool = self.pool.write().expect("pick pool write lock");
        if on {
            pool.insert(mesh.id());
        } else {
            pool.remove(&mesh.id());
        }
    }

    pub fn is_pickable(&self, id: NodeId) -> bool {
        self.pool.read().expect("pick pool read lock").contains(&id)
    }

    /// Registers every mesh under `root` as pickable (load path).
    pub fn register_pickables(&self, root: &SceneNode) {
        root.for_each_mesh(&mut |mesh, _| self.set_pickable(mesh, true));
    }

    /// Removes every mesh under `root` from the pool (unload path).
    pub fn unregister_pickables(&self, root: &SceneNode) {
        root.for_each_mesh(&mut |mesh, _| self.set_pickable(mesh, false));
    }

    pub fn pickable_count(&self) -> usize {
        self.pool.read().expect("pick pool read lock").len()
    }

    /// Snapshot for the ray tester.
    pub fn snapshot(&self) -> HashSet<NodeId> {
        self.pool.read().expect("pick pool read lock").clone()
    }
}
