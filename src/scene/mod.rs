mod graph;
mod layers;
mod node;
mod types;

pub use graph::*;
pub use layers::*;
pub use node::*;
pub use types::*;
