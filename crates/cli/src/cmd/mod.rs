mod artifacts;
mod inspect;
mod transform;

pub use artifacts::cmd_artifacts;
pub use inspect::cmd_inspect;
pub use transform::{TransformOptions, cmd_transform};
