//! Typed stand-in for the render graph of the embedding engine.
//!
//! The real renderer is an external collaborator; the state manager only
//! needs a tree it can attach/detach subtrees to, walk with a typed node
//! interface and flip per-node render/pick state on. Nodes are shared via
//! [`std::sync::Arc`], mutable state sits behind per-node `RwLock`s, the
//! child list is immutable after construction.

pub mod material;

pub use material::{Color, Material};

use bitflags::bitflags;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

bitflags! {
    /// Layer scheme of the viewer: layer 0 renders, layer 1 is ray-hit
    /// tested. The raycaster only ever tests the PICK layer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LayerMask: u8 {
        const RENDER = 1 << 0;
        const PICK = 1 << 1;
    }
}

/// Process-unique node identity, the key for every side table (pick pool,
/// appearance backups). Stable for the lifetime of the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

fn next_node_id() -> NodeId {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NodeId(NEXT.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug, Clone, Copy)]
struct NodeFlags {
    visible: bool,
    layers: LayerMask,
}

impl Default for NodeFlags {
    fn default() -> Self {
        // PICK is only ever granted through the pick registry
        Self {
            visible: true,
            layers: LayerMask::RENDER,
        }
    }
}

/// Opaque geometry payload produced by the asset loader. The state manager
/// never reads vertex data, it only owns disposal.
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    pub vertex_count: u32,
    pub index_count: u32,
}

/// Renderable leaf payload: live material slots plus the geometry handle.
#[derive(Debug)]
pub struct MeshSurface {
    materials: RwLock<Vec<Arc<RwLock<Material>>>>,
    geometry: RwLock<Option<Geometry>>,
}

impl MeshSurface {
    pub fn new(materials: Vec<Material>, geometry: Geometry) -> Self {
        Self {
            materials: RwLock::new(
                materials
                    .into_iter()
                    .map(|m| Arc::new(RwLock::new(m)))
                    .collect(),
            ),
            geometry: RwLock::new(Some(geometry)),
        }
    }

    /// Snapshot of the currently installed material slots.
    pub fn materials(&self) -> Vec<Arc<RwLock<Material>>> {
        self.materials
            .read()
            .expect("material slot read lock")
            .clone()
    }

    /// Replaces the installed materials wholesale (backup/restore path).
    pub fn set_materials(&self, materials: Vec<Arc<RwLock<Material>>>) {
        *self.materials.write().expect("material slot write lock") = materials;
    }

    /// Releases geometry and material resources. Idempotent.
    pub fn dispose(&self) {
        self.geometry.write().expect("geometry write lock").take();
        self.materials
            .write()
            .expect("material slot write lock")
            .clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.geometry.read().expect("geometry read lock").is_none()
    }
}

/// Discriminated node payload; replaces duck-typed `.isMesh` probing with a
/// typed interface.
#[derive(Debug)]
pub enum NodeKind {
    Group,
    Mesh(MeshSurface),
}

#[derive(Debug)]
pub struct SceneNode {
    id: NodeId,
    name: String,
    kind: NodeKind,
    children: Vec<Arc<SceneNode>>,
    transform: RwLock<glam::Affine3A>,
    flags: RwLock<NodeFlags>,
}

impl SceneNode {
    pub fn group(name: impl Into<String>, children: Vec<Arc<SceneNode>>) -> Arc<Self> {
        Arc::new(Self {
            id: next_node_id(),
            name: name.into(),
            kind: NodeKind::Group,
            children,
            transform: RwLock::new(glam::Affine3A::IDENTITY),
            flags: RwLock::new(NodeFlags::default()),
        })
    }

    pub fn mesh(name: impl Into<String>, surface: MeshSurface) -> Arc<Self> {
        Arc::new(Self {
            id: next_node_id(),
            name: name.into(),
            kind: NodeKind::Mesh(surface),
            children: Vec::new(),
            transform: RwLock::new(glam::Affine3A::IDENTITY),
            flags: RwLock::new(NodeFlags::default()),
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn children(&self) -> &[Arc<SceneNode>] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn surface(&self) -> Option<&MeshSurface> {
        match &self.kind {
            NodeKind::Mesh(surface) => Some(surface),
            NodeKind::Group => None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.flags.read().expect("node flag read lock").visible
    }

    pub fn set_visible(&self, visible: bool) {
        self.flags.write().expect("node flag write lock").visible = visible;
    }

    pub fn has_layer(&self, layer: LayerMask) -> bool {
        self.flags
            .read()
            .expect("node flag read lock")
            .layers
            .contains(layer)
    }

    pub fn set_layer(&self, layer: LayerMask, on: bool) {
        let mut flags = self.flags.write().expect("node flag write lock");
        flags.layers.set(layer, on);
    }

    pub fn transform(&self) -> glam::Affine3A {
        *self.transform.read().expect("transform read lock")
    }

    pub fn set_transform(&self, transform: glam::Affine3A) {
        *self.transform.write().expect("transform write lock") = transform;
    }

    /// Depth-first walk over this node and all descendants.
    pub fn for_each(&self, f: &mut impl FnMut(&SceneNode)) {
        f(self);
        for child in &self.children {
            child.for_each(&mut *f);
        }
    }

    /// Depth-first walk visiting only mesh leaves.
    pub fn for_each_mesh(&self, f: &mut impl FnMut(&SceneNode, &MeshSurface)) {
        self.for_each(&mut |node| {
            if let NodeKind::Mesh(surface) = &node.kind {
                f(node, surface);
            }
        });
    }

    /// Releases the resources of every mesh under this node.
    pub fn dispose(&self) {
        self.for_each_mesh(&mut |_, surface| surface.dispose());
    }

    pub fn mesh_count(&self) -> usize {
        let mut n = 0;
        self.for_each_mesh(&mut |_, _| n += 1);
        n
    }
}

/// The attachment point the real engine would consume: a flat list of
/// attached model roots.
#[derive(Debug, Default)]
pub struct Scene {
    roots: RwLock<Vec<Arc<SceneNode>>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, root: Arc<SceneNode>) {
        self.roots.write().expect("scene write lock").push(root);
    }

    pub fn detach(&self, id: NodeId) -> bool {
        let mut roots = self.roots.write().expect("scene write lock");
        let before = roots.len();
        roots.retain(|r| r.id() != id);
        roots.len() != before
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.roots
            .read()
            .expect("scene read lock")
            .iter()
            .any(|r| r.id() == id)
    }

    pub fn attached_count(&self) -> usize {
        self.roots.read().expect("scene read lock").len()
    }
}
