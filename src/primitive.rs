//! Parametric primitive generators. All of them are faceted approximations;
//! the cube, cylinder and uv sphere generate a point cloud and take its
//! convex hull, the icosphere subdivides an icosahedron directly.

use crate::{
    error::Error,
    hull::convex_hull,
    vlist::{Primitive, VertexList},
};
use glam::Vec3;
use std::f32::consts::PI;

/// Axis-aligned box with half extents `(x, y, z)`.
pub fn cube(x: f32, y: f32, z: f32) -> Result<VertexList, Error> {
    let mut pts = VertexList::new(3, Primitive::Point);
    for sx in [1.0f32, -1.0] {
        for sy in [1.0f32, -1.0] {
            for sz in [1.0f32, -1.0] {
                pts.add(&[sx * x, sy * y, sz * z])?;
            }
        }
    }
    convex_hull(&pts)
}

/// Cylinder of radius `r` and height `h` along z, approximated with
/// `pts_per_rev` points per revolution (at least 3).
pub fn cylinder(r: f32, h: f32, pts_per_rev: i32) -> Result<VertexList, Error> {
    let pts_per_rev = pts_per_rev.max(3);
    let mut pts = VertexList::new(3, Primitive::Point);
    let incr = 2.0 * PI / pts_per_rev as f32;
    let zz = h / 2.0;
    let mut ang = 0.0f32;
    for _ in 0..pts_per_rev {
        let xx = r * ang.cos();
        let yy = r * ang.sin();
        pts.add(&[xx, yy, zz])?;
        pts.add(&[xx, yy, -zz])?;
        ang += incr;
    }
    convex_hull(&pts)
}

/// Sphere of radius `radius` as `segs` segments around the axis (at least 3)
/// and `rings` stacks pole to pole (at least 2).
pub fn uv_sphere(radius: f32, segs: i32, rings: i32) -> Result<VertexList, Error> {
    let segs = segs.max(3);
    let rings = rings.max(2);
    let mut pts = VertexList::new(3, Primitive::Point);
    pts.add(&[0.0, 0.0, radius])?;
    pts.add(&[0.0, 0.0, -radius])?;
    let ang_incr = 2.0 * PI / segs as f32;
    let azi_incr = PI / rings as f32;
    let mut ang = 0.0f32;
    let mut azi = azi_incr - PI / 2.0;
    for _ in 1..rings {
        let rr = radius * azi.cos();
        let zz = radius * azi.sin();
        for _ in 0..segs {
            pts.add(&[rr * ang.cos(), rr * ang.sin(), zz])?;
            ang += ang_incr;
        }
        azi += azi_incr;
    }
    convex_hull(&pts)
}

fn add_tri(vl: &mut VertexList, v1: Vec3, v2: Vec3, v3: Vec3) -> Result<(), Error> {
    vl.add(&[v1.x, v1.y, v1.z])?;
    vl.add(&[v2.x, v2.y, v2.z])?;
    vl.add(&[v3.x, v3.y, v3.z])?;
    Ok(())
}

fn find_mid(a: Vec3, b: Vec3, radius: f32) -> Vec3 {
    (a + b).normalize_or_zero() * radius
}

fn make_icosahedron(radius: f32) -> Result<VertexList, Error> {
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;
    let scale = radius / (1.0 + t * t).sqrt();
    let t = t * scale;
    let s = scale;
    let vv = [
        Vec3::new(-s, t, 0.),
        Vec3::new(s, t, 0.),
        Vec3::new(-s, -t, 0.),
        Vec3::new(s, -t, 0.),
        Vec3::new(0., -s, t),
        Vec3::new(0., s, t),
        Vec3::new(0., -s, -t),
        Vec3::new(0., s, -t),
        Vec3::new(t, 0., -s),
        Vec3::new(t, 0., s),
        Vec3::new(-t, 0., -s),
        Vec3::new(-t, 0., s),
    ];
    const TRIS: [[usize; 3]; 20] = [
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    let mut out = VertexList::new(3, Primitive::Triangle);
    for tri in TRIS {
        add_tri(&mut out, vv[tri[0]], vv[tri[1]], vv[tri[2]])?;
    }
    Ok(out)
}

fn subdivide(vl: &VertexList, radius: f32) -> Result<VertexList, Error> {
    let mut out = VertexList::new(3, Primitive::Triangle);
    let num = vl.num_indices();
    let mut i = 0;
    while i + 2 < num {
        let v1 = vl.lookup_pos(i);
        let v2 = vl.lookup_pos(i + 1);
        let v3 = vl.lookup_pos(i + 2);
        let aa = find_mid(v1, v2, radius);
        let bb = find_mid(v1, v3, radius);
        let cc = find_mid(v2, v3, radius);
        add_tri(&mut out, v1, aa, bb)?;
        add_tri(&mut out, v2, cc, aa)?;
        add_tri(&mut out, v3, bb, cc)?;
        add_tri(&mut out, aa, cc, bb)?;
        i += 3;
    }
    Ok(out)
}

/// Sphere of radius `radius` as a subdivided icosahedron. The triangle count
/// is `20 * 4^num_subdiv`.
pub fn ico_sphere(radius: f32, num_subdiv: i32) -> Result<VertexList, Error> {
    let mut cur = make_icosahedron(radius)?;
    for _ in 0..num_subdiv {
        cur = subdivide(&cur, radius)?;
    }
    Ok(cur)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mass::mass_properties;
    use std::f64::consts::PI as PI64;

    #[test]
    fn t_cube() {
        let vl = cube(1.0, 1.0, 1.0).expect("cannot create a cube");
        assert_eq!(vl.num_verts(), 8);
        assert_eq!(vl.num_indices(), 36);
        let props = mass_properties(&vl).expect("mass failed");
        assert!((props.volume - 8.0).abs() < 1e-5);
        for c in props.center_of_mass {
            assert!(c.abs() < 1e-6);
        }
        let expected = 8.0 * 2.0 / 3.0;
        for i in [0, 4, 8] {
            assert!((props.inertia_tensor[i] - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn t_rect_cube() {
        let vl = cube(0.5, 1.0, 2.0).expect("cannot create a cube");
        let props = mass_properties(&vl).expect("mass failed");
        assert!((props.volume - 8.0).abs() < 1e-4);
    }

    #[test]
    fn t_cylinder() {
        let vl = cylinder(1.0, 2.0, 64).expect("cannot create a cylinder");
        let props = mass_properties(&vl).expect("mass failed");
        // Faceted volume approaches pi r^2 h from below.
        assert!(props.volume < 2.0 * PI64);
        assert!(props.volume > 2.0 * PI64 * 0.98);
        assert!(props.center_of_mass[2].abs() < 1e-5);
    }

    #[test]
    fn t_cylinder_min_points() {
        let vl = cylinder(1.0, 1.0, 0).expect("cannot create a cylinder");
        // Clamped to a triangular prism.
        assert_eq!(vl.num_verts(), 6);
    }

    #[test]
    fn t_uv_sphere() {
        let vl = uv_sphere(1.0, 16, 16).expect("cannot create a sphere");
        let props = mass_properties(&vl).expect("mass failed");
        let full = 4.0 * PI64 / 3.0;
        assert!(props.volume < full);
        assert!(props.volume > full * 0.95);
    }

    #[test]
    fn t_ico_sphere_base() {
        let vl = ico_sphere(1.0, 0).expect("cannot create an icosphere");
        assert_eq!(vl.num_verts(), 12);
        assert_eq!(vl.num_indices(), 60);
        for i in 0..vl.num_verts() {
            assert!((vl.pos(i).length() - 1.0).abs() < 1e-6);
        }
        // Outward-facing triangles.
        for i in (0..vl.num_indices()).step_by(3) {
            let (p1, p2, p3) = (
                vl.lookup_pos(i),
                vl.lookup_pos(i + 1),
                vl.lookup_pos(i + 2),
            );
            let n = (p2 - p1).cross(p3 - p2);
            let centroid = (p1 + p2 + p3) / 3.0;
            assert!(n.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn t_ico_sphere_subdivided() {
        let vl = ico_sphere(2.0, 2).expect("cannot create an icosphere");
        assert_eq!(vl.num_indices() / 3, 20 * 16);
        // Shared midpoints dedup: V = 2 + T/2 for a closed triangulated
        // sphere (Euler).
        assert_eq!(vl.num_verts(), 2 + 20 * 16 / 2);
        for i in 0..vl.num_verts() {
            assert!((vl.pos(i).length() - 2.0).abs() < 1e-5);
        }
    }
}
