pub mod appearance;
pub mod group_state;
pub mod pick;

pub use appearance::{AppearanceStore, GHOST_OPACITY};
pub use group_state::{GroupStateStore, GroupVisibility, ModelRoot};
pub use pick::PickRegistry;
