//! WebGL2 backdrop: the workspace, page and shadow graphics of the scene,
//! tessellated with lyon and drawn through wgpu.

mod renderer;
mod tessellation;
mod vertex;

pub use renderer::Renderer;
pub use tessellation::Tessellator;
pub use vertex::{Mesh, Uniforms, Vertex};
