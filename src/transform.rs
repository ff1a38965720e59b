//! Rigid-body transforms as a rotation quaternion plus a translation.

use crate::{error::Error, vlist::VertexList};
use glam::{Quat, Vec3};

/// Skip the translation part; transforms a direction instead of a point.
pub const NO_OFFSET: u32 = 1;
/// Apply the inverse transform instead.
pub const INVERT: u32 = 2;

/// A rotation followed by a translation.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    rot: Quat,
    trans: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    pub fn new() -> Self {
        Transform { rot: Quat::IDENTITY, trans: Vec3::ZERO }
    }

    pub fn set_identity(&mut self) {
        *self = Transform::new();
    }

    /// Extract the rotation and translation from a row-major 4x4 matrix.
    /// The rotation block must be orthonormal up to scale; the quaternion
    /// signs are recovered with copysign from the skew entries.
    pub fn from_matrix4x4(m: &[f32; 16]) -> Self {
        let i33 = 1.0 / m[15];
        let m00 = m[0] * i33;
        let m11 = m[5] * i33;
        let m22 = m[10] * i33;
        let w = 0.5 * (1.0 + m00 + m11 + m22).max(0.0).sqrt();
        let x = 0.5 * (1.0 + m00 - m11 - m22).max(0.0).sqrt();
        let y = 0.5 * (1.0 - m00 + m11 - m22).max(0.0).sqrt();
        let z = 0.5 * (1.0 - m00 - m11 + m22).max(0.0).sqrt();
        let rot = Quat::from_xyzw(
            x.copysign((m[9] - m[6]) * i33),
            y.copysign((m[2] - m[8]) * i33),
            z.copysign((m[4] - m[1]) * i33),
            w,
        )
        .normalize();
        Transform {
            rot,
            trans: Vec3::new(m[3] * i33, m[7] * i33, m[11] * i33),
        }
    }

    pub fn translate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.trans += Vec3::new(dx, dy, dz);
    }

    /// Prepend a rotation of `angle_rad` about `axis`.
    pub fn rotate(&mut self, angle_rad: f32, axis: Vec3) {
        if angle_rad == 0.0 {
            return;
        }
        let rot = Transform {
            rot: Quat::from_axis_angle(axis.normalize(), angle_rad),
            trans: Vec3::ZERO,
        };
        *self = Transform::combine(&rot, self);
    }

    /// Prepend a rotation given as a unit quaternion.
    pub fn apply_quaternion(&mut self, rot: Quat) {
        let rot = Transform { rot, trans: Vec3::ZERO };
        *self = Transform::combine(&rot, self);
    }

    /// The transform applying `b` first, then `a`.
    pub fn combine(a: &Transform, b: &Transform) -> Transform {
        Transform {
            rot: (a.rot * b.rot).normalize(),
            trans: a.rot * b.trans + a.trans,
        }
    }

    pub fn invert(&mut self) {
        self.rot = self.rot.conjugate();
        self.trans = self.rot * -self.trans;
    }

    /// Transform a point, honoring [`NO_OFFSET`] and [`INVERT`] in
    /// `options`.
    pub fn apply_point(&self, src: Vec3, options: u32) -> Vec3 {
        if options & INVERT != 0 {
            let src = if options & NO_OFFSET == 0 {
                src - self.trans
            } else {
                src
            };
            return self.rot.conjugate() * src;
        }
        let dest = self.rot * src;
        if options & NO_OFFSET == 0 {
            dest + self.trans
        } else {
            dest
        }
    }

    /// Transform every vertex of `src` into a fresh 3-float list.
    pub fn apply_vertex_list(&self, src: &VertexList, options: u32) -> Result<VertexList, Error> {
        if src.floats_per_vert() < 3 {
            return Err(Error::TooFewCoords { needed: 3, got: src.floats_per_vert() });
        }
        let mut transformed = Vec::with_capacity(src.num_verts() as usize);
        for i in 0..src.num_verts() {
            transformed.push(self.apply_point(src.pos(i), options));
        }
        let mut out = VertexList::new(3, src.primitive());
        for index in src.indices() {
            let p = transformed[*index as usize];
            out.add(&[p.x, p.y, p.z])?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use glam::vec3;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn t_identity() {
        let t = Transform::new();
        let p = vec3(1., 2., 3.);
        assert_eq!(t.apply_point(p, 0), p);
        assert_eq!(t.apply_point(p, NO_OFFSET), p);
    }

    #[test]
    fn t_translate() {
        let mut t = Transform::new();
        t.translate(1., 2., 3.);
        assert_eq!(t.apply_point(Vec3::ZERO, 0), vec3(1., 2., 3.));
        assert_eq!(t.apply_point(Vec3::ZERO, NO_OFFSET), Vec3::ZERO);
    }

    #[test]
    fn t_rotate_quarter_turn() {
        let mut t = Transform::new();
        t.rotate(FRAC_PI_2, vec3(0., 0., 1.));
        let p = t.apply_point(vec3(1., 0., 0.), 0);
        assert!((p - vec3(0., 1., 0.)).length() < 1e-6);
    }

    #[test]
    fn t_rotate_then_invert_recovers() {
        let mut t = Transform::new();
        t.translate(0.5, -1.0, 2.0);
        t.rotate(1.1, vec3(1., 2., -0.5));
        let mut inv = t;
        inv.invert();
        let p = vec3(0.3, 0.7, -0.2);
        let q = inv.apply_point(t.apply_point(p, 0), 0);
        assert!((q - p).length() < 1e-5);
    }

    #[test]
    fn t_invert_option_matches_inverted() {
        let mut t = Transform::new();
        t.rotate(0.8, vec3(0., 1., 0.));
        t.translate(1., 2., 3.);
        let mut inv = t;
        inv.invert();
        let p = vec3(-2., 0.5, 4.);
        let a = t.apply_point(p, INVERT);
        let b = inv.apply_point(p, 0);
        assert!((a - b).length() < 1e-5);
    }

    #[test]
    fn t_combine_order() {
        // combine(a, b) applies b first.
        let mut rot = Transform::new();
        rot.rotate(FRAC_PI_2, vec3(0., 0., 1.));
        let mut shift = Transform::new();
        shift.translate(1., 0., 0.);
        let t = Transform::combine(&rot, &shift);
        // Shift (1,0,0) to (2,0,0), then rotate to (0,2,0).
        let p = t.apply_point(vec3(1., 0., 0.), 0);
        assert!((p - vec3(0., 2., 0.)).length() < 1e-6);
    }

    #[test]
    fn t_from_matrix() {
        // Rotation by pi about z with a translation.
        let m = [
            -1., 0., 0., 5.,
            0., -1., 0., 6.,
            0., 0., 1., 7.,
            0., 0., 0., 1.,
        ];
        let t = Transform::from_matrix4x4(&m);
        let p = t.apply_point(vec3(1., 0., 0.), 0);
        assert!((p - vec3(4., 6., 7.)).length() < 1e-5);
        let mut by_parts = Transform::new();
        by_parts.rotate(PI, vec3(0., 0., 1.));
        by_parts.translate(5., 6., 7.);
        let q = by_parts.apply_point(vec3(1., 0., 0.), 0);
        assert!((p - q).length() < 1e-5);
    }

    #[test]
    fn t_vertex_list() {
        let mut vl = VertexList::new(3, crate::vlist::Primitive::Point);
        vl.add(&[1., 0., 0.]).expect("add failed");
        vl.add(&[0., 1., 0.]).expect("add failed");
        let mut t = Transform::new();
        t.translate(0., 0., 1.);
        let out = t.apply_vertex_list(&vl, 0).expect("transform failed");
        assert_eq!(out.lookup_pos(0), vec3(1., 0., 1.));
        assert_eq!(out.lookup_pos(1), vec3(0., 1., 1.));
    }
}
