use bytemuck::{Pod, Zeroable};
use std::f32::consts::PI;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Indexed triangle mesh in unit local space.
pub(crate) struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

/// Unit cube centred on the origin, one quad per face so normals stay flat.
pub(crate) fn cube() -> MeshData {
    // (normal, u axis, v axis) per face; u x v = normal keeps CCW winding.
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (n, u, v) in faces {
        let base = vertices.len() as u16;
        for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            let position = [0, 1, 2].map(|i| n[i] * 0.5 + u[i] * su + v[i] * sv);
            vertices.push(Vertex { position, normal: n });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    MeshData { vertices, indices }
}

/// Unit-radius UV sphere.
pub(crate) fn sphere(stacks: u16, slices: u16) -> MeshData {
    let mut vertices = Vec::new();
    for i in 0..=stacks {
        let phi = PI * f32::from(i) / f32::from(stacks);
        for j in 0..=slices {
            let theta = 2.0 * PI * f32::from(j) / f32::from(slices);
            let n = [phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin()];
            vertices.push(Vertex {
                position: n,
                normal: n,
            });
        }
    }
    let row = slices + 1;
    let mut indices = Vec::new();
    for i in 0..stacks {
        for j in 0..slices {
            let a = i * row + j;
            let b = a + row;
            indices.extend_from_slice(&[a, a + 1, b, b, a + 1, b + 1]);
        }
    }
    MeshData { vertices, indices }
}

/// Unit square in the XZ plane facing +Y.
pub(crate) fn plane() -> MeshData {
    let n = [0.0, 1.0, 0.0];
    let vertices = [(-0.5, 0.5), (0.5, 0.5), (0.5, -0.5), (-0.5, -0.5)]
        .map(|(x, z)| Vertex {
            position: [x, 0.0, z],
            normal: n,
        })
        .to_vec();
    MeshData {
        vertices,
        indices: vec![0, 1, 2, 2, 3, 0],
    }
}

/// The twelve edges of the unit cube as a line list.
pub(crate) fn wire_cube() -> Vec<Vertex> {
    let corner = |i: u8| Vertex {
        position: [
            if i & 1 == 0 { -0.5 } else { 0.5 },
            if i & 2 == 0 { -0.5 } else { 0.5 },
            if i & 4 == 0 { -0.5 } else { 0.5 },
        ],
        normal: [0.0; 3],
    };
    let mut lines = Vec::with_capacity(24);
    for a in 0u8..8 {
        for bit in [1u8, 2, 4] {
            if a & bit == 0 {
                lines.push(corner(a));
                lines.push(corner(a | bit));
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    #[test]
    fn cube_faces_wind_outward() {
        let mesh = cube();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|k| mesh.vertices[tri[k] as usize]);
            let face = cross(sub(b.position, a.position), sub(c.position, a.position));
            let dot: f32 = (0..3).map(|i| face[i] * a.normal[i]).sum();
            assert!(dot > 0.0);
        }
        for v in &mesh.vertices {
            assert!(v.position.iter().all(|c| c.abs() == 0.5));
        }
    }

    #[test]
    fn sphere_is_unit() {
        let mesh = sphere(8, 12);
        assert_eq!(mesh.vertices.len(), 9 * 13);
        for v in &mesh.vertices {
            let len: f32 = v.position.iter().map(|c| c * c).sum::<f32>().sqrt();
            assert!((len - 1.0).abs() < 1e-5);
        }
        let max = *mesh.indices.iter().max().unwrap() as usize;
        assert!(max < mesh.vertices.len());
    }

    #[test]
    fn plane_faces_up() {
        let mesh = plane();
        let [a, b, c] = [0, 1, 2].map(|k| mesh.vertices[mesh.indices[k] as usize].position);
        let n = cross(sub(b, a), sub(c, a));
        assert!(n[1] > 0.0);
    }

    #[test]
    fn wire_cube_has_twelve_edges() {
        let lines = wire_cube();
        assert_eq!(lines.len(), 24);
        for pair in lines.chunks(2) {
            let diff = sub(pair[0].position, pair[1].position);
            let changed = diff.iter().filter(|d| d.abs() > 0.0).count();
            assert_eq!(changed, 1);
        }
    }
}
