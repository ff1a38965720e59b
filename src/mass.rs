//! Exact mass properties of a closed triangle mesh.
//!
//! Reference: Fast and Accurate Computation of Polyhedral Mass Properties,
//! Brian Mirtich. Surface integrals are accumulated in f64 about the mean
//! vertex and shifted back at the end, which keeps the cancellation in
//! check for meshes far from the origin.

use crate::{error::Error, vlist::VertexList};
use glam::DVec3;

/// Volume, center of mass and inertia tensor (about the center of mass, for
/// unit density) of a closed polyhedron.
#[derive(Debug, Clone, Copy, Default)]
pub struct MassProperties {
    pub volume: f64,
    pub center_of_mass: [f64; 3],
    /// Row-major 3x3 tensor.
    pub inertia_tensor: [f64; 9],
}

struct FaceData {
    norm: DVec3,
    w: f64,
    verts: [DVec3; 3],
}

struct Axes {
    a: usize,
    b: usize,
    c: usize,
}

#[derive(Default)]
struct ProjInt {
    p1: f64,
    pa: f64,
    pb: f64,
    paa: f64,
    pab: f64,
    pbb: f64,
    paaa: f64,
    paab: f64,
    pabb: f64,
    pbbb: f64,
}

#[derive(Default)]
struct FaceInt {
    fa: f64,
    fb: f64,
    fc: f64,
    faa: f64,
    fbb: f64,
    fcc: f64,
    faaa: f64,
    fbbb: f64,
    fccc: f64,
    faab: f64,
    fbbc: f64,
    fcca: f64,
}

/// Green's-theorem integrals of the face's projection onto its (a, b)
/// plane.
fn proj_int(axes: &Axes, face: &FaceData) -> ProjInt {
    let mut pi = ProjInt::default();
    for i in 0..3 {
        let a0 = face.verts[i][axes.a];
        let b0 = face.verts[i][axes.b];
        let a1 = face.verts[(i + 1) % 3][axes.a];
        let b1 = face.verts[(i + 1) % 3][axes.b];
        let da = a1 - a0;
        let db = b1 - b0;
        let (a0_2, a0_3) = (a0 * a0, a0 * a0 * a0);
        let a0_4 = a0_3 * a0;
        let (b0_2, b0_3) = (b0 * b0, b0 * b0 * b0);
        let b0_4 = b0_3 * b0;
        let (a1_2, a1_3) = (a1 * a1, a1 * a1 * a1);
        let (b1_2, b1_3) = (b1 * b1, b1 * b1 * b1);

        let c1 = a1 + a0;
        let ca = a1 * c1 + a0_2;
        let caa = a1 * ca + a0_3;
        let caaa = a1 * caa + a0_4;
        let cb = b1 * (b1 + b0) + b0_2;
        let cbb = b1 * cb + b0_3;
        let cbbb = b1 * cbb + b0_4;
        let cab = 3.0 * a1_2 + 2.0 * a1 * a0 + a0_2;
        let kab = a1_2 + 2.0 * a1 * a0 + 3.0 * a0_2;
        let caab = a0 * cab + 4.0 * a1_3;
        let kaab = a1 * kab + 4.0 * a0_3;
        let cabb = 4.0 * b1_3 + 3.0 * b1_2 * b0 + 2.0 * b1 * b0_2 + b0_3;
        let kabb = b1_3 + 2.0 * b1_2 * b0 + 3.0 * b1 * b0_2 + 4.0 * b0_3;

        pi.p1 += db * c1;
        pi.pa += db * ca;
        pi.paa += db * caa;
        pi.paaa += db * caaa;
        pi.pb += da * cb;
        pi.pbb += da * cbb;
        pi.pbbb += da * cbbb;
        pi.pab += db * (b1 * cab + b0 * kab);
        pi.paab += db * (b1 * caab + b0 * kaab);
        pi.pabb += da * (a1 * cabb + a0 * kabb);
    }
    pi.p1 /= 2.0;
    pi.pa /= 6.0;
    pi.paa /= 12.0;
    pi.paaa /= 20.0;
    pi.pb /= -6.0;
    pi.pbb /= -12.0;
    pi.pbbb /= -20.0;
    pi.pab /= 24.0;
    pi.paab /= 60.0;
    pi.pabb /= -60.0;
    pi
}

fn face_int(axes: &Axes, face: &FaceData) -> FaceInt {
    let pi = proj_int(axes, face);
    let w = face.w;
    let na = face.norm[axes.a];
    let nb = face.norm[axes.b];
    let nc = face.norm[axes.c];
    let k1 = 1.0 / nc;
    let k2 = k1 * k1;
    let k3 = k2 * k1;
    let k4 = k3 * k1;
    let mut fi = FaceInt::default();

    fi.fa = k1 * pi.pa;
    fi.fb = k1 * pi.pb;
    fi.fc = -k2 * (na * pi.pa + nb * pi.pb + w * pi.p1);

    fi.faa = k1 * pi.paa;
    fi.fbb = k1 * pi.pbb;
    fi.fcc = k3
        * (na * na * pi.paa
            + 2.0 * na * nb * pi.pab
            + nb * nb * pi.pbb
            + w * (2.0 * (na * pi.pa + nb * pi.pb) + w * pi.p1));

    fi.faaa = k1 * pi.paaa;
    fi.fbbb = k1 * pi.pbbb;
    fi.fccc = -k4
        * (na * na * na * pi.paaa
            + 3.0 * na * na * nb * pi.paab
            + 3.0 * na * nb * nb * pi.pabb
            + nb * nb * nb * pi.pbbb
            + 3.0 * w * (na * na * pi.paa + 2.0 * na * nb * pi.pab + nb * nb * pi.pbb)
            + w * w * (3.0 * (na * pi.pa + nb * pi.pb) + w * pi.p1));

    fi.faab = k1 * pi.paab;
    fi.fbbc = -k2 * (na * pi.pabb + nb * pi.pbbb + w * pi.pbb);
    fi.fcca = k3
        * (na * na * pi.paaa
            + 2.0 * na * nb * pi.paab
            + nb * nb * pi.pabb
            + w * (2.0 * (na * pi.paa + nb * pi.pab) + w * pi.pa));
    fi
}

/// Integrate volume, first and second moments over the surface of `vl`.
pub fn mass_properties(vl: &VertexList) -> Result<MassProperties, Error> {
    if vl.floats_per_vert() < 3 {
        return Err(Error::TooFewCoords { needed: 3, got: vl.floats_per_vert() });
    }
    let num_verts = vl.num_verts();
    if num_verts == 0 {
        return Ok(MassProperties::default());
    }
    let mut offset = DVec3::ZERO;
    for i in 0..num_verts {
        offset += vl.pos(i).as_dvec3();
    }
    offset /= num_verts as f64;

    let mut t0 = 0.0f64;
    let mut t1 = DVec3::ZERO;
    let mut t2 = DVec3::ZERO;
    let mut tp = DVec3::ZERO;

    let num = vl.num_indices();
    let mut i = 0;
    while i + 2 < num {
        let verts = [
            vl.lookup_pos(i).as_dvec3() - offset,
            vl.lookup_pos(i + 1).as_dvec3() - offset,
            vl.lookup_pos(i + 2).as_dvec3() - offset,
        ];
        i += 3;
        let n = (verts[1] - verts[0]).cross(verts[2] - verts[1]);
        let len = n.length();
        if len == 0.0 {
            // Zero-area faces contribute nothing.
            continue;
        }
        let norm = n / len;
        let face = FaceData { norm, w: -norm.dot(verts[0]), verts };

        let (nx, ny, nz) = (norm.x.abs(), norm.y.abs(), norm.z.abs());
        let c = if nx > ny && nx > nz {
            0
        } else if ny > nz {
            1
        } else {
            2
        };
        let axes = Axes { a: (c + 1) % 3, b: (c + 2) % 3, c };
        let fi = face_int(&axes, &face);

        t0 += face.norm.x
            * if axes.a == 0 {
                fi.fa
            } else if axes.b == 0 {
                fi.fb
            } else {
                fi.fc
            };
        t1[axes.a] += face.norm[axes.a] * fi.faa;
        t1[axes.b] += face.norm[axes.b] * fi.fbb;
        t1[axes.c] += face.norm[axes.c] * fi.fcc;
        t2[axes.a] += face.norm[axes.a] * fi.faaa;
        t2[axes.b] += face.norm[axes.b] * fi.fbbb;
        t2[axes.c] += face.norm[axes.c] * fi.fccc;
        tp[axes.a] += face.norm[axes.a] * fi.faab;
        tp[axes.b] += face.norm[axes.b] * fi.fbbc;
        tp[axes.c] += face.norm[axes.c] * fi.fcca;
    }
    t1 /= 2.0;
    t2 /= 3.0;
    tp /= 2.0;

    let mut props = MassProperties {
        volume: t0,
        ..Default::default()
    };
    let r = t1 / t0;
    props.center_of_mass = [r.x + offset.x, r.y + offset.y, r.z + offset.z];

    let it = &mut props.inertia_tensor;
    it[0] = t2.y + t2.z;
    it[4] = t2.z + t2.x;
    it[8] = t2.x + t2.y;
    it[1] = -tp.x;
    it[5] = -tp.y;
    it[2] = -tp.z;
    // Shift to the center of mass.
    it[0] -= t0 * (r.y * r.y + r.z * r.z);
    it[4] -= t0 * (r.z * r.z + r.x * r.x);
    it[8] -= t0 * (r.x * r.x + r.y * r.y);
    it[1] += t0 * r.x * r.y;
    it[5] += t0 * r.y * r.z;
    it[2] += t0 * r.z * r.x;
    it[3] = it[1];
    it[7] = it[5];
    it[6] = it[2];
    Ok(props)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testmesh::{box_tris, lshape_tris};
    use approx::assert_relative_eq;

    #[test]
    fn t_unit_cube() {
        let props = mass_properties(&box_tris(1.0, 1.0, 1.0)).expect("mass failed");
        assert_relative_eq!(props.volume, 8.0, epsilon = 1e-5);
        for c in props.center_of_mass {
            assert!(c.abs() < 1e-6);
        }
        // Inertia of a solid box: m/3 * (hy^2 + hz^2) on the diagonal for
        // half extents, m = 8.
        let expected = 8.0 * 2.0 / 3.0;
        for (i, v) in props.inertia_tensor.iter().enumerate() {
            if i % 4 == 0 {
                assert_relative_eq!(*v, expected, epsilon = 1e-5);
            } else {
                assert!(v.abs() < 1e-5);
            }
        }
    }

    #[test]
    fn t_rect_box() {
        let props = mass_properties(&box_tris(1.0, 2.0, 3.0)).expect("mass failed");
        let m = 8.0 * 6.0;
        assert_relative_eq!(props.volume, m, epsilon = 1e-4);
        assert_relative_eq!(props.inertia_tensor[0], m * (4.0 + 9.0) / 3.0, epsilon = 1e-3);
        assert_relative_eq!(props.inertia_tensor[4], m * (1.0 + 9.0) / 3.0, epsilon = 1e-3);
        assert_relative_eq!(props.inertia_tensor[8], m * (1.0 + 4.0) / 3.0, epsilon = 1e-3);
    }

    #[test]
    fn t_translation_invariance() {
        // Volume and inertia about the center of mass do not depend on
        // where the shape sits.
        let near = box_tris(1.0, 1.0, 1.0);
        let mut far = crate::vlist::VertexList::new(3, crate::vlist::Primitive::Triangle);
        for i in 0..near.num_indices() {
            let p = near.lookup_pos(i);
            far.add(&[p.x + 100.0, p.y - 50.0, p.z + 25.0]).expect("add failed");
        }
        let a = mass_properties(&near).expect("mass failed");
        let b = mass_properties(&far).expect("mass failed");
        assert_relative_eq!(a.volume, b.volume, epsilon = 1e-4);
        assert_relative_eq!(b.center_of_mass[0], 100.0, epsilon = 1e-3);
        assert_relative_eq!(b.center_of_mass[1], -50.0, epsilon = 1e-3);
        assert_relative_eq!(b.center_of_mass[2], 25.0, epsilon = 1e-3);
        for i in 0..9 {
            assert_relative_eq!(a.inertia_tensor[i], b.inertia_tensor[i], epsilon = 1e-2);
        }
    }

    #[test]
    fn t_lshape_volume() {
        let props = mass_properties(&lshape_tris()).expect("mass failed");
        assert_relative_eq!(props.volume, 6.0, epsilon = 1e-4);
    }
}
