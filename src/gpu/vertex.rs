use bytemuck::{Pod, Zeroable};

/// Stage-space position with a straight RGBA colour
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    pub const fn new(position: [f32; 2], color: [f32; 4]) -> Self {
        Self { position, color }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Projection from stage pixels to clip space
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Uniforms {
    /// Column-major
    pub view_proj: [[f32; 4]; 4],
}

impl Uniforms {
    /// Stage pixels (0,0)-(width,height), y pointing down
    pub fn for_surface(width: u32, height: u32) -> Self {
        let (sx, sy) = (2.0 / width.max(1) as f32, -2.0 / height.max(1) as f32);
        Self {
            view_proj: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [-1.0, 1.0, 0.0, 1.0],
            ],
        }
    }

    pub fn project(&self, x: f32, y: f32) -> [f32; 2] {
        let [c0, c1, _, c3] = self.view_proj;
        [c0[0] * x + c1[0] * y + c3[0], c0[1] * x + c1[1] * y + c3[1]]
    }
}

/// Indexed triangle list
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `other`, rebasing its indices
    pub fn append(&mut self, other: Mesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| base + i));
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_maps_surface_corners() {
        let uniforms = Uniforms::for_surface(800, 600);
        assert_eq!(uniforms.project(0.0, 0.0), [-1.0, 1.0]);
        assert_eq!(uniforms.project(800.0, 600.0), [1.0, -1.0]);
        assert_eq!(uniforms.project(400.0, 300.0), [0.0, 0.0]);
    }

    #[test]
    fn test_append_rebases_indices() {
        let triangle = || Mesh {
            vertices: vec![Vertex::new([0.0, 0.0], [1.0; 4]); 3],
            indices: vec![0, 1, 2],
        };
        let mut mesh = Mesh::new();
        assert!(mesh.is_empty());
        mesh.append(triangle());
        mesh.append(triangle());
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
    }
}
