use crate::{
    element::{Coord2d, DihedralFrame, Edge, Face, Handle, Vertex, EH, FH, VH},
    error::Error,
    math::{basis_vectors, plane_norm},
    vlist::VertexList,
};
use glam::{vec2, Vec2, Vec3};
use std::collections::{HashMap, HashSet, VecDeque};

fn point_key(p: Vec3) -> [u32; 3] {
    [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
}

/// Shared vertex/edge/face topology of a triangle mesh.
///
/// Built by inserting faces one at a time; vertices are shared by coordinate
/// bit pattern and edges by their unordered vertex pair, so triangles that
/// touch end up wired to the same elements. Also tracks the AABB of the
/// inserted vertices, which scales the tolerances of the convex probes.
pub(crate) struct Vef {
    pub(crate) verts: Vec<Vertex>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) faces: Vec<Face>,
    vmap: HashMap<[u32; 3], VH>,
    pub(crate) min: Vec3,
    pub(crate) max: Vec3,
}

impl Vef {
    pub fn new(vl: &VertexList) -> Result<Self, Error> {
        if vl.floats_per_vert() < 3 {
            return Err(Error::TooFewCoords {
                needed: 3,
                got: vl.floats_per_vert(),
            });
        }
        let mut vef = Vef {
            verts: Vec::new(),
            edges: Vec::new(),
            faces: Vec::new(),
            vmap: HashMap::new(),
            min: Vec3::INFINITY,
            max: Vec3::NEG_INFINITY,
        };
        let mut i = 0;
        while i + 2 < vl.num_indices() {
            vef.add_face(vl.lookup_pos(i), vl.lookup_pos(i + 1), vl.lookup_pos(i + 2));
            i += 3;
        }
        Ok(vef)
    }

    fn add_vert(&mut self, p: Vec3) -> VH {
        if let Some(v) = self.vmap.get(&point_key(p)) {
            return *v;
        }
        self.min = self.min.min(p);
        self.max = self.max.max(p);
        let v: VH = (self.verts.len() as u32).into();
        self.verts.push(Vertex {
            point: p,
            edges: Vec::new(),
        });
        self.vmap.insert(point_key(p), v);
        v
    }

    fn find_edge(&self, v1: VH, v2: VH) -> Option<EH> {
        self.verts[v1.index() as usize]
            .edges
            .iter()
            .copied()
            .find(|e| {
                let verts = self.edges[e.index() as usize].verts;
                verts[0] == v2 || verts[1] == v2
            })
    }

    fn add_edge(&mut self, v1: VH, v2: VH) -> EH {
        if let Some(e) = self.find_edge(v1, v2) {
            return e;
        }
        let e: EH = (self.edges.len() as u32).into();
        self.edges.push(Edge {
            verts: [v1, v2],
            faces: [None, None],
            frame: None,
        });
        self.verts[v1.index() as usize].edges.push(e);
        self.verts[v2.index() as usize].edges.push(e);
        e
    }

    pub fn add_face(&mut self, p1: Vec3, p2: Vec3, p3: Vec3) -> FH {
        let norm = plane_norm(p1, p2, p3);
        let dist = norm.dot(p1);
        let verts = [self.add_vert(p1), self.add_vert(p2), self.add_vert(p3)];
        let f: FH = (self.faces.len() as u32).into();
        let mut edges = [EH::from(0); 3];
        for i in 0..3 {
            let e = self.add_edge(verts[i], verts[(i + 1) % 3]);
            edges[i] = e;
            let faces = &mut self.edges[e.index() as usize].faces;
            let slot = if faces[0].is_none() { 0 } else { 1 };
            faces[slot] = Some(f);
        }
        self.faces.push(Face {
            verts,
            edges,
            norm,
            dist,
            basis: None,
            coord2d: None,
        });
        f
    }

    pub fn point(&self, v: VH) -> Vec3 {
        self.verts[v.index() as usize].point
    }

    /// The face on the other side of `face`'s `i`-th edge.
    pub fn face_adj(&self, face: FH, i: usize) -> Option<FH> {
        let e = &self.edges[self.faces[face.index() as usize].edges[i].index() as usize];
        if e.faces[0] == Some(face) {
            e.faces[1]
        } else {
            e.faces[0]
        }
    }

    fn other_face(&self, e: EH, face: FH) -> Option<FH> {
        let e = &self.edges[e.index() as usize];
        if e.faces[0] == Some(face) {
            e.faces[1]
        } else {
            e.faces[0]
        }
    }

    /// Fill the dihedral frame of `e`: unit edge direction `z`, `x` in the
    /// plane of the first face perpendicular to `z`, and the angle from the
    /// first face to the second about `z`, normalized to `[0, 2π)`.
    pub fn calc_info(&mut self, e: EH) -> Result<DihedralFrame, Error> {
        let edge = &self.edges[e.index() as usize];
        if let Some(frame) = edge.frame {
            return Ok(frame);
        }
        let f1 = edge.faces[1].ok_or(Error::TopologyBroken("edge with a single face"))?;
        let f0 = edge.faces[0].ok_or(Error::TopologyBroken("edge with no face"))?;
        let z = (self.point(edge.verts[1]) - self.point(edge.verts[0])).normalize_or_zero();
        let y = self.faces[f0.index() as usize].norm;
        let x = y.cross(z).normalize_or_zero();
        let n1 = self.faces[f1.index() as usize].norm;
        let dx = -n1.dot(y);
        let dy = n1.dot(x);
        let mut ang = dy.atan2(dx);
        if ang < 0.0 {
            ang += 2.0 * std::f32::consts::PI;
        }
        let frame = DihedralFrame { x, z, ang };
        self.edges[e.index() as usize].frame = Some(frame);
        Ok(frame)
    }

    /// Fill the face's in-plane basis: `x` along its first edge, `y`
    /// completing a right-handed frame with the normal.
    pub fn calc_basis(&mut self, f: FH) -> (Vec3, Vec3) {
        let face = &self.faces[f.index() as usize];
        if let Some(basis) = face.basis {
            return basis;
        }
        let x = (self.point(face.verts[1]) - self.point(face.verts[0])).normalize_or_zero();
        let y = face.norm.cross(x).normalize_or_zero();
        self.faces[f.index() as usize].basis = Some((x, y));
        (x, y)
    }

    /// Fill the 2D coordinates of the face's second and third vertices in its
    /// basis. The first vertex is the origin.
    pub fn calc_coord2d(&mut self, f: FH) -> Coord2d {
        if let Some(c) = self.faces[f.index() as usize].coord2d {
            return c;
        }
        let (x, y) = self.calc_basis(f);
        let face = &self.faces[f.index() as usize];
        let p0 = self.point(face.verts[0]);
        let d1 = self.point(face.verts[1]) - p0;
        let d2 = self.point(face.verts[2]) - p0;
        let c = Coord2d {
            v1_x: d1.dot(x),
            v2_pos: vec2(d2.dot(x), d2.dot(y)),
        };
        self.faces[f.index() as usize].coord2d = Some(c);
        c
    }

    /// Signed distance from `pt` to the closest boundary face of a convex
    /// closed mesh, positive inside. BFS over face adjacency from `start`
    /// (or the first face), pruning faces that cannot beat the running
    /// minimum; a face the point is clearly outside of ends the search
    /// immediately. `start` receives the closest face found.
    pub fn convex_interior_dist(
        &self,
        pt: Vec3,
        start: &mut Option<FH>,
    ) -> Result<f32, Error> {
        let tol = 1e-6 * self.max.distance(self.min);
        if self.vmap.contains_key(&point_key(pt)) {
            return Ok(0.0);
        }
        if self.faces.is_empty() {
            return Err(Error::TopologyBroken("convex query on an empty mesh"));
        }
        let face = start.unwrap_or_else(|| 0u32.into());
        let mut visited: HashSet<FH> = HashSet::new();
        let mut queue: VecDeque<FH> = VecDeque::new();
        visited.insert(face);
        queue.push_back(face);
        let mut min = f32::INFINITY;
        let mut min_face = None;
        while let Some(face) = queue.pop_front() {
            let f = &self.faces[face.index() as usize];
            let dist = f.dist - f.norm.dot(pt);
            if dist < -tol {
                min = dist;
                min_face = Some(face);
                break;
            }
            if dist > min + tol {
                continue;
            }
            if dist < min {
                min = dist;
                min_face = Some(face);
            }
            for i in 0..3 {
                let adj = self
                    .face_adj(face, i)
                    .ok_or(Error::TopologyBroken("edge with a single face"))?;
                if visited.insert(adj) {
                    queue.push_back(adj);
                }
            }
        }
        *start = min_face;
        Ok(min)
    }

    /// Distance along `dir` from `pt` to the boundary of a convex mesh.
    /// Walks across faces: each face either contains the exit point of the
    /// ray (done) or names the boundary edge the walk leaves through. A
    /// visited set turns numerical loops into an error. `start` seeds the
    /// walk and receives the exit face.
    pub fn convex_ray_dist(
        &mut self,
        pt: Vec3,
        dir: Vec3,
        start: &mut Option<FH>,
    ) -> Result<f32, Error> {
        let tol = 2e-6 * self.max.distance(self.min);
        if self.faces.is_empty() {
            return Err(Error::TopologyBroken("convex query on an empty mesh"));
        }
        let mut face = start.unwrap_or_else(|| 0u32.into());
        let mut visited: HashSet<FH> = HashSet::new();
        let dist;
        loop {
            if !visited.insert(face) {
                return Err(Error::Degenerate("ray walk revisited a face"));
            }
            let c2 = self.calc_coord2d(face);
            let (bx, by) = self.calc_basis(face);
            let f = &self.faces[face.index() as usize];
            let com = vec2((c2.v2_pos.x + c2.v1_x) / 3.0, c2.v2_pos.y / 3.0);
            let scale = 2.0 * (c2.v2_pos.length() + c2.v1_x.abs());
            let div = dir.dot(f.norm);
            let mut edge = None;
            if div < -0.5 || div >= 1e-6 {
                let tt = (f.dist - pt.dot(f.norm)) / div;
                let rel = pt + dir * tt - self.point(f.verts[0]);
                let mut pt2d = vec2(rel.dot(bx), rel.dot(by));
                if div < 0.0 {
                    // The ray leaves through the back; classify against the
                    // reflected direction instead so the walk still makes
                    // progress toward the exit face.
                    pt2d = (pt2d - com).normalize_or_zero() * -scale + com;
                }
                let sel = edge2d(pt2d, c2.v1_x, c2.v2_pos, tol);
                if div > 0.0 && sel >= 3 {
                    dist = tt;
                    break;
                }
                edge = Some(sel);
            }
            let sel = match edge {
                Some(sel) => sel,
                None => {
                    let mut pt2d = vec2(dir.dot(bx), dir.dot(by));
                    pt2d = pt2d.normalize_or_zero() * scale + com;
                    edge2d(pt2d, c2.v1_x, c2.v2_pos, tol)
                }
            };
            if sel >= 3 {
                return Err(Error::Degenerate("ray walk could not pick an exit edge"));
            }
            let e = self.faces[face.index() as usize].edges[sel];
            face = self
                .other_face(e, face)
                .ok_or(Error::TopologyBroken("edge with a single face"))?;
        }
        *start = Some(face);
        Ok(dist)
    }
}

/// Classify a 2D point against the canonical triangle `(0,0)`, `(v1_x,0)`,
/// `v2_pos`: the index of the edge the point is furthest outside of, or 3
/// when it is inside within `tol`.
fn edge2d(pt: Vec2, v1_x: f32, v2_pos: Vec2, tol: f32) -> usize {
    if v1_x <= 0.0 {
        tracing::warn!(v1_x, "degenerate face basis: first edge has non-positive length");
    }
    if v2_pos.y <= 0.0 {
        tracing::warn!(v2_y = v2_pos.y, "degenerate face basis: third vertex is not above the first edge");
    }
    let mut max = -pt.y;
    let mut edge = 0;
    let norm = vec2(v2_pos.y, -(v2_pos.x - v1_x)).normalize_or_zero();
    let dist = (pt - vec2(v1_x, 0.0)).dot(norm);
    if dist > max {
        max = dist;
        edge = 1;
    }
    let norm = vec2(-v2_pos.y, v2_pos.x).normalize_or_zero();
    let dist = pt.dot(norm);
    if dist > max {
        max = dist;
        edge = 2;
    }
    if max < tol {
        return 3;
    }
    edge
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vlist::Primitive;
    use glam::vec3;
    use std::f32::consts::PI;

    fn tetra() -> VertexList {
        let mut vl = VertexList::new(3, Primitive::Triangle);
        let tris: [[f32; 9]; 4] = [
            [0., 0., 0., 0., 1., 0., 1., 0., 0.],
            [0., 0., 0., 0., 0., 1., 0., 1., 0.],
            [0., 0., 0., 1., 0., 0., 0., 0., 1.],
            [1., 0., 0., 0., 1., 0., 0., 0., 1.],
        ];
        for t in &tris {
            for v in t.chunks(3) {
                vl.add(v).expect("add failed");
            }
        }
        vl
    }

    #[test]
    fn t_build_tetra() {
        let vef = Vef::new(&tetra()).expect("cannot build vef");
        assert_eq!(vef.verts.len(), 4);
        assert_eq!(vef.edges.len(), 6);
        assert_eq!(vef.faces.len(), 4);
        for edge in &vef.edges {
            assert!(edge.faces[0].is_some() && edge.faces[1].is_some());
        }
        assert_eq!(vef.min, Vec3::ZERO);
        assert_eq!(vef.max, Vec3::ONE);
    }

    #[test]
    fn t_face_edges_match_verts() {
        let vef = Vef::new(&tetra()).expect("cannot build vef");
        for face in &vef.faces {
            for i in 0..3 {
                let e = &vef.edges[face.edges[i].index() as usize];
                let (a, b) = (face.verts[i], face.verts[(i + 1) % 3]);
                assert!(e.verts == [a, b] || e.verts == [b, a]);
            }
        }
    }

    #[test]
    fn t_dihedral_flat_pair() {
        let mut vl = VertexList::new(3, Primitive::Triangle);
        for v in [
            [0., 0., 0.],
            [1., 0., 0.],
            [0., 1., 0.],
            [1., 0., 0.],
            [1., 1., 0.],
            [0., 1., 0.],
        ] {
            vl.add(&v).expect("add failed");
        }
        let mut vef = Vef::new(&vl).expect("cannot build vef");
        // The shared edge is the first face's second edge.
        let e = vef.faces[0].edges[1];
        let frame = vef.calc_info(e).expect("no dihedral frame");
        assert!((frame.ang - PI).abs() < 1e-5);
    }

    #[test]
    fn t_dihedral_right_angle() {
        let mut vl = VertexList::new(3, Primitive::Triangle);
        for v in [
            // Top of a box corner, normal +z.
            [1., -1., 1.],
            [1., 1., 1.],
            [-1., 1., 1.],
            // Side, normal +x, sharing the first face's first edge.
            [1., 1., 1.],
            [1., -1., 1.],
            [1., -1., -1.],
        ] {
            vl.add(&v).expect("add failed");
        }
        let mut vef = Vef::new(&vl).expect("cannot build vef");
        let e = vef.faces[0].edges[0];
        let frame = vef.calc_info(e).expect("no dihedral frame");
        assert!((frame.ang - 3.0 * PI / 2.0).abs() < 1e-5);
        assert!((frame.z - vec3(0., 1., 0.)).length() < 1e-6);
    }

    #[test]
    fn t_coord2d() {
        let vef_vl = tetra();
        let mut vef = Vef::new(&vef_vl).expect("cannot build vef");
        for f in 0..vef.faces.len() as u32 {
            let c = vef.calc_coord2d(f.into());
            assert!(c.v1_x > 0.0);
            assert!(c.v2_pos.y > 0.0);
        }
    }

    #[test]
    fn t_interior_dist() {
        let vef = Vef::new(&tetra()).expect("cannot build vef");
        let mut start = None;
        let d = vef
            .convex_interior_dist(vec3(0.2, 0.2, 0.2), &mut start)
            .expect("query failed");
        // Closest boundary faces are the three axis planes, 0.2 away.
        assert!((d - 0.2).abs() < 1e-5);
        assert!(start.is_some());
        let d = vef
            .convex_interior_dist(vec3(-0.5, 0.2, 0.2), &mut start)
            .expect("query failed");
        assert!(d < 0.0);
        // A mesh vertex is on the boundary exactly.
        let d = vef
            .convex_interior_dist(vec3(1., 0., 0.), &mut None)
            .expect("query failed");
        assert_eq!(d, 0.0);
    }

    #[test]
    fn t_ray_dist() {
        let mut vef = Vef::new(&tetra()).expect("cannot build vef");
        let mut start = None;
        let d = vef
            .convex_ray_dist(vec3(0.2, 0.2, 0.2), vec3(-1., 0., 0.), &mut start)
            .expect("query failed");
        assert!((d - 0.2).abs() < 1e-4);
        let d = vef
            .convex_ray_dist(vec3(0.1, 0.1, 0.1), vec3(0., 0., -1.), &mut start)
            .expect("query failed");
        assert!((d - 0.1).abs() < 1e-4);
    }
}
