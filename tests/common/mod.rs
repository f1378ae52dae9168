use anatlas::error::ViewerError;
use anatlas::loader::{AssetLoader, PathResolver};
use anatlas::meta::MetaCatalog;
use anatlas::scene::{Geometry, Material, MeshSurface, SceneNode};
use anatlas::store::ModelRoot;
use anatlas::Viewer;
use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Catalog used across the integration tests: three bones (two meshes each
/// once loaded), two muscles split over two subgroups, and one bone entry
/// without any model block.
pub const META: &str = r##"[
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
        "id": "fma23463",
        "classification": { "group": "bones", "subgroup": "arm" },
        "model": {
            "variants": { "draco": { "filename": "radius_draco.glb", "path": "bones" } }
        }
    },
    {
        "id": "fma23466",
        "classification": { "group": "bones", "subgroup": "leg" },
        "model": {
            "variants": { "draco": { "filename": "tibia_draco.glb", "path": "bones" } }
        }
    },
    {
        "id": "fma37370",
        "classification": { "group": "muscles", "subgroup": "arm" },
        "model": {
            "default_color": "#aa3366",
            "variants": { "draco": { "filename": "biceps_draco.glb", "path": "muscles" } }
        }
    },
    {
        "id": "fma22428",
        "classification": { "group": "muscles", "subgroup": "leg" },
        "model": {
            "visible_by_default": false,
            "variants": { "draco": { "filename": "soleus_draco.glb", "path": "muscles" } }
        }
    },
    {
        "id": "fma9666",
        "classification": { "group": "bones", "subgroup": "arm" }
    }
]"##;

/// Asset loader double: fabricates a two-mesh subtree per URL, optionally
/// failing or delaying configured URLs, and counts real fetches.
#[derive(Debug, Default)]
pub struct MockLoader {
    fail: RwLock<HashSet<String>>,
    fail_once: RwLock<HashSet<String>>,
    delay: RwLock<Option<Duration>>,
    calls: AtomicUsize,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_url(&self, url: &str) {
        self.fail.write().unwrap().insert(url.to_string());
    }

    /// Fails only the next fetch of `url`; retries succeed.
    pub fn fail_once_url(&self, url: &str) {
        self.fail_once.write().unwrap().insert(url.to_string());
    }

    pub fn delay_every_load(&self, delay: Duration) {
        *self.delay.write().unwrap() = Some(delay);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AssetLoader for MockLoader {
    fn load(&self, url: &str) -> impl Future<Output = Result<Arc<SceneNode>, ViewerError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self.fail.read().unwrap().contains(url)
            || self.fail_once.write().unwrap().remove(url);
        let delay = *self.delay.read().unwrap();
        let url = url.to_string();
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if failing {
                return Err(ViewerError::AssetNotFound { url });
            }
            let geometry = Geometry {
                vertex_count: 24,
                index_count: 36,
            };
            let stem = url
                .rsplit('/')
                .next()
                .and_then(|f| f.split('.').next())
                .unwrap_or("model");
            Ok(SceneNode::group(
                stem,
                vec![
                    SceneNode::mesh(
                        format!("{stem}:0"),
                        MeshSurface::new(vec![Material::default()], geometry),
                    ),
                    SceneNode::mesh(
                        format!("{stem}:1"),
                        MeshSurface::new(vec![Material::default()], geometry),
                    ),
                ],
            ))
        }
    }
}

pub fn viewer_with(loader: Arc<MockLoader>) -> Viewer<MockLoader> {
    let catalog = Arc::new(MetaCatalog::from_json_str(META).expect("fixture metadata parses"));
    Viewer::new(catalog, loader, PathResolver::new(""))
}

pub fn viewer() -> (Viewer<MockLoader>, Arc<MockLoader>) {
    let loader = Arc::new(MockLoader::new());
    (viewer_with(loader.clone()), loader)
}

/// All live material slots of every mesh under the model root.
pub fn live_materials(root: &ModelRoot) -> Vec<Arc<RwLock<Material>>> {
    let mut mats = Vec::new();
    root.node
        .for_each_mesh(&mut |_, surface| mats.extend(surface.materials()));
    mats
}

pub fn mesh_ids(root: &ModelRoot) -> Vec<anatlas::scene::NodeId> {
    let mut ids = Vec::new();
    root.node.for_each_mesh(&mut |mesh, _| ids.push(mesh.id()));
    ids
}
