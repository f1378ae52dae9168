use crate::scene::{Color, Material, MeshSurface, NodeId, SceneNode};
use crate::store::pick::PickRegistry;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Translucency applied to ghosted models unless the caller chooses one.
pub const GHOST_OPACITY: f32 = 0.15;

/// Per-mesh clone-on-write backup: the original material instances plus the
/// override channels currently applied on top of them. One entry per mesh;
/// opacity and ghost compose inside the same entry instead of fighting over
/// two independent backups.
#[derive(Debug)]
struct AppearanceBackup {
    originals: Vec<Arc<RwLock<Material>>>,
    opacity: Option<f32>,
    ghost: Option<f32>,
}

impl AppearanceBackup {
    /// Ghost translucency wins over plain opacity while both are requested.
    fn effective_opacity(&self) -> Option<f32> {
        self.ghost.or(self.opacity)
    }

    fn is_clear(&self) -> bool {
        self.opacity.is_none() && self.ghost.is_none()
    }
}

#[derive(Clone, Copy)]
enum Channel {
    Opacity(Option<f32>),
    Ghost(Option<f32>),
}

/// Side table owning every material backup and tint record, keyed by mesh
/// identity. Restores hand back the original material instances, so pointer
/// identity survives any override sequence.
#[derive(Debug)]
pub struct AppearanceStore {
    picks: Arc<PickRegistry>,
    backups: RwLock<HashMap<NodeId, AppearanceBackup>>,
    tints: RwLock<HashMap<NodeId, Color>>,
}

impl AppearanceStore {
    pub fn new(picks: Arc<PickRegistry>) -> Self {
        Self {
            picks,
            backups: RwLock::new(HashMap::new()),
            tints: RwLock::new(HashMap::new()),
        }
    }

    /// Sets the render opacity of every mesh under `root`. Values `>= 1`
    /// restore the original materials (idempotently); values `< 1` install
    /// translucent clones, backing up the originals once.
    pub fn set_opacity(&self, root: &SceneNode, value: f32) {
        let value = value.clamp(0.0, 1.0);
        root.for_each_mesh(&mut |mesh, surface| {
            if value >= 1.0 {
                self.update_channel(mesh, surface, Channel::Opacity(None));
            } else {
                self.update_channel(mesh, surface, Channel::Opacity(Some(value)));
            }
        });
    }

    /// Ghost mode: still rendered, translucent, excluded from picking. The
    /// render flag is not touched.
    pub fn set_ghost(&self, root: &SceneNode, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        root.for_each_mesh(&mut |mesh, surface| {
            self.update_channel(mesh, surface, Channel::Ghost(Some(opacity)));
            self.picks.set_pickable(mesh, false);
        });
    }

    /// Reverts ghost mode. Pick eligibility returns only for meshes whose
    /// render flag is still on (hidden models stay out of the pool).
    pub fn clear_ghost(&self, root: &SceneNode) {
        root.for_each_mesh(&mut |mesh, surface| {
            self.update_channel(mesh, surface, Channel::Ghost(None));
            self.picks.set_pickable(mesh, mesh.is_visible());
        });
    }

    /// Tints the live materials in place and records the tint, so a later
    /// backup restore can re-apply it to the restored instances.
    pub fn set_color(&self, root: &SceneNode, color: Color) {
        let mut tints = self.tints.write().expect("tint write lock");
        root.for_each_mesh(&mut |mesh, surface| {
            tints.insert(mesh.id(), color);
            for material in surface.materials() {
                material.write().expect("material write lock").color = color;
            }
        });
    }

    pub fn is_ghosted(&self, id: NodeId) -> bool {
        self.backups
            .read()
            .expect("backup read lock")
            .get(&id)
            .is_some_and(|b| b.ghost.is_some())
    }

    pub fn has_backup(&self, id: NodeId) -> bool {
        self.backups
            .read()
            .expect("backup read lock")
            .contains_key(&id)
    }

    /// Drops every backup and tint record under `root` (unload path). The
    /// materials themselves are left alone, the caller disposes them.
    pub fn forget(&self, root: &SceneNode) {
        let mut backups = self.backups.write().expect("backup write lock");
        let mut tints = self.tints.write().expect("tint write lock");
        root.for_each_mesh(&mut |mesh, _| {
            backups.remove(&mesh.id());
            tints.remove(&mesh.id());
        });
    }

    fn update_channel(&self, mesh: &SceneNode, surface: &MeshSurface, change: Channel) {
        let mut backups = self.backups.write().expect("backup write lock");

        let clearing = matches!(change, Channel::Opacity(None) | Channel::Ghost(None));
        if clearing && !backups.contains_key(&mesh.id()) {
            // nothing backed up; force the live materials back to opaque
            for material in surface.materials() {
                material.write().expect("material write lock").force_opaque();
            }
            return;
        }

        let backup = backups.entry(mesh.id()).or_insert_with(|| {
            debug!("backing up materials of mesh {:?}", mesh.id());
            AppearanceBackup {
                originals: surface.materials(),
                opacity: None,
                ghost: None,
            }
        });
        match change {
            Channel::Opacity(v) => backup.opacity = v,
            Channel::Ghost(v) => backup.ghost = v,
        }

        match backup.effective_opacity() {
            Some(opacity) => {
                let tint = self.tints.read().expect("tint read lock").get(&mesh.id()).copied();
                let overrides = backup
                    .originals
                    .iter()
                    .map(|original| {
                        let mut m = *original.read().expect("material read lock");
                        if let Some(color) = tint {
                            m.color = color;
                        }
                        m.transparent = true;
                        m.opacity = opacity;
                        m.depth_write = false;
                        Arc::new(RwLock::new(m))
                    })
                    .collect();
                surface.set_materials(overrides);
            }
            None => {
                debug_assert!(backup.is_clear());
                let originals = backup.originals.clone();
                if let Some(color) = self.tints.read().expect("tint read lock").get(&mesh.id()) {
                    for material in &originals {
                        material.write().expect("material write lock").color = *color;
                    }
                }
                surface.set_materials(originals);
                backups.remove(&mesh.id());
            }
        }
    }
}
