//! State management core for an interactive 3D anatomy atlas viewer.
//!
//! The crate tracks, for every loadable anatomical entity, whether it is
//! loaded, attached to the scene, visible, pickable, tinted or ghosted, and
//! keeps those axes consistent while the embedding UI issues overlapping
//! asynchronous load/unload/toggle operations. Rendering, model decoding and
//! widget construction are external collaborators behind narrow seams
//! ([`loader::AssetLoader`], [`scene::Scene`]).

pub mod error;
pub mod loader;
pub mod meta;
pub mod scene;
pub mod settings;
pub mod store;
pub mod viewer;
pub mod visibility;

pub use error::ViewerError;
pub use viewer::Viewer;
