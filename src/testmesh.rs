//! Hand-wound closed meshes for tests. Winding is CCW viewed from outside,
//! so volumes come out positive.

use crate::vlist::{Primitive, VertexList};

/// Axis-aligned box spanning `[-hx, hx] x [-hy, hy] x [-hz, hz]` as 12
/// triangles.
pub(crate) fn box_tris(hx: f32, hy: f32, hz: f32) -> VertexList {
    let (x, y, z) = (hx, hy, hz);
    let tris: [[[f32; 3]; 3]; 12] = [
        // +z
        [[-x, -y, z], [x, -y, z], [x, y, z]],
        [[-x, -y, z], [x, y, z], [-x, y, z]],
        // -z
        [[-x, -y, -z], [-x, y, -z], [x, y, -z]],
        [[-x, -y, -z], [x, y, -z], [x, -y, -z]],
        // +x
        [[x, -y, -z], [x, y, -z], [x, y, z]],
        [[x, -y, -z], [x, y, z], [x, -y, z]],
        // -x
        [[-x, -y, -z], [-x, -y, z], [-x, y, z]],
        [[-x, -y, -z], [-x, y, z], [-x, y, -z]],
        // +y
        [[-x, y, -z], [-x, y, z], [x, y, z]],
        [[-x, y, -z], [x, y, z], [x, y, -z]],
        // -y
        [[-x, -y, -z], [x, -y, -z], [x, -y, z]],
        [[-x, -y, -z], [x, -y, z], [-x, -y, z]],
    ];
    let mut vl = VertexList::new(3, Primitive::Triangle);
    for tri in &tris {
        for v in tri {
            vl.add(v).expect("cannot build box");
        }
    }
    vl
}

/// L-shaped prism: a 2x2x2 box with the `x > 1, y > 1` quarter removed.
/// The cross-section is the L polygon (0,0) (2,0) (2,1) (1,1) (1,2) (0,2),
/// extruded along z over `[0, 2]`. Volume is 6.
pub(crate) fn lshape_tris() -> VertexList {
    // CCW boundary of the cross-section.
    let outline: [[f32; 2]; 6] = [
        [0., 0.],
        [2., 0.],
        [2., 1.],
        [1., 1.],
        [1., 2.],
        [0., 2.],
    ];
    // Cap triangulation of the L as two rectangles.
    let cap: [[[f32; 2]; 3]; 4] = [
        [[0., 0.], [2., 0.], [2., 1.]],
        [[0., 0.], [2., 1.], [0., 1.]],
        [[0., 1.], [1., 1.], [1., 2.]],
        [[0., 1.], [1., 2.], [0., 2.]],
    ];
    let mut vl = VertexList::new(3, Primitive::Triangle);
    let add = |vl: &mut VertexList, p: [f32; 2], z: f32| {
        vl.add(&[p[0], p[1], z]).expect("cannot build l-shape");
    };
    for tri in &cap {
        // Top cap faces +z.
        for p in tri {
            add(&mut vl, *p, 2.0);
        }
        // Bottom cap reversed, facing -z.
        for p in [tri[0], tri[2], tri[1]] {
            add(&mut vl, p, 0.0);
        }
    }
    for i in 0..outline.len() {
        let a = outline[i];
        let b = outline[(i + 1) % outline.len()];
        // Wall quad (a0, b0, b2, a2), outward to the right of a->b.
        add(&mut vl, a, 0.0);
        add(&mut vl, b, 0.0);
        add(&mut vl, b, 2.0);
        add(&mut vl, a, 0.0);
        add(&mut vl, b, 2.0);
        add(&mut vl, a, 2.0);
    }
    vl
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{mass::mass_properties, vef::Vef};

    #[test]
    fn t_box_closed() {
        let vl = box_tris(1.0, 1.0, 1.0);
        assert_eq!(vl.num_verts(), 8);
        assert_eq!(vl.num_indices(), 36);
        let vef = Vef::new(&vl).expect("vef failed");
        assert_eq!(vef.edges.len(), 18);
        for edge in &vef.edges {
            assert!(edge.faces[1].is_some());
        }
    }

    #[test]
    fn t_lshape_closed() {
        let vl = lshape_tris();
        assert_eq!(vl.num_indices(), 60);
        let vef = Vef::new(&vl).expect("vef failed");
        for edge in &vef.edges {
            assert!(edge.faces[1].is_some());
        }
        let props = mass_properties(&vl).expect("mass failed");
        assert!((props.volume - 6.0).abs() < 1e-4);
    }
}
