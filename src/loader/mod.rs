pub mod group_loader;
pub mod path;
pub mod probe;

pub use group_loader::{GroupLoader, LoadSummary};
pub use path::PathResolver;
pub use probe::FileProbeLoader;

use crate::error::ViewerError;
use crate::scene::SceneNode;
use std::future::Future;
use std::sync::Arc;

/// Fetches and decodes one model, producing the render subtree for it.
/// Opaque to the state manager; this is the only place the load pipeline
/// suspends. Implementations may fail per asset, the group loader decides
/// what that means for the surrounding operation (it does not retry).
pub trait AssetLoader {
    fn load(&self, url: &str) -> impl Future<Output = Result<Arc<SceneNode>, ViewerError>> + Send;
}

impl<L: AssetLoader> AssetLoader for Arc<L> {
    fn load(&self, url: &str) -> impl Future<Output = Result<Arc<SceneNode>, ViewerError>> + Send {
        self.as_ref().load(url)
    }
}
