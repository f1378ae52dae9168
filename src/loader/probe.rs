use crate::error::ViewerError;
use crate::loader::AssetLoader;
use crate::scene::{Geometry, Material, MeshSurface, SceneNode};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

/// Asset loader that checks presence on disk instead of decoding: for every
/// URL it probes `<root>/<url>` and fabricates a single-mesh placeholder
/// subtree. Backs the catalog-check binary, where the interesting outcome is
/// which referenced assets are missing, not their geometry.
#[derive(Debug)]
pub struct FileProbeLoader {
    root: PathBuf,
}

impl FileProbeLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn stem_of(url: &str) -> &str {
        let file = url.rsplit('/').next().unwrap_or(url);
        file.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file)
    }
}

impl AssetLoader for FileProbeLoader {
    fn load(&self, url: &str) -> impl Future<Output = Result<Arc<SceneNode>, ViewerError>> + Send {
        let path = self.root.join(url);
        let url = url.to_string();
        async move {
            let meta = tokio::fs::metadata(&path)
                .await
                .map_err(|_| ViewerError::AssetNotFound { url: url.clone() })?;
            if !meta.is_file() {
                return Err(ViewerError::AssetNotFound { url });
            }

            let stem = Self::stem_of(&url);
            let surface = MeshSurface::new(
                vec![Material::default()],
                Geometry {
                    vertex_count: 0,
                    index_count: 0,
                },
            );
            Ok(SceneNode::group(
                stem,
                vec![SceneNode::mesh(format!("{stem}:mesh"), surface)],
            ))
        }
    }
}
