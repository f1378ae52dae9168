pub mod catalog;
pub mod types;

pub use catalog::MetaCatalog;
pub use types::{Classification, MetaEntry, ModelAsset, Variant};
