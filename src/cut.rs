//! Split a triangle mesh by a plane and re-close both halves.
//!
//! Vertices classify against the plane with their signed distance snapped to
//! zero near it. Each triangle lands whole on one side, or is split along
//! its one or two crossing edges; the intersection points and the on-plane
//! vertices feed a 2D outline per side, in the cut plane's basis. The
//! outlines are triangulated and the resulting caps attached with the
//! winding that faces each half's open side. Finally each side is separated
//! into connected components over face adjacency.

use crate::{
    error::Error,
    math::basis_vectors,
    tri2d::triangulate_2d,
    vlist::{Primitive, VertexList},
};
use glam::{Vec2, Vec3};
use std::collections::{HashMap, HashSet, VecDeque};

struct Plane {
    norm: Vec3,
    x_axis: Vec3,
    y_axis: Vec3,
    dist: f32,
}

struct CutVert {
    point: Vec3,
    dist: f32,
    edges: Vec<u32>,
}

struct CutEdge {
    verts: [u32; 2],
    faces: [Option<u32>; 2],
    inter: Option<Vec3>,
}

struct CutFace {
    verts: [u32; 3],
    edges: [u32; 3],
    visited: bool,
}

fn point_key(p: Vec3) -> [u32; 3] {
    [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
}

fn point_key2(p: Vec2) -> [u32; 2] {
    [p.x.to_bits(), p.y.to_bits()]
}

/// One half of the cut (or, for the third instance, the classifier that
/// holds the original triangles with their vertex distances and edge
/// intersections).
struct Shape {
    verts: Vec<CutVert>,
    edges: Vec<CutEdge>,
    faces: Vec<CutFace>,
    vmap: HashMap<[u32; 3], u32>,
    pt2d: HashMap<[u32; 2], u32>,
    edge2d: HashSet<u32>,
    poly2d: VertexList,
}

impl Shape {
    fn new() -> Self {
        Shape {
            verts: Vec::new(),
            edges: Vec::new(),
            faces: Vec::new(),
            vmap: HashMap::new(),
            pt2d: HashMap::new(),
            edge2d: HashSet::new(),
            poly2d: VertexList::new(2, Primitive::Line),
        }
    }

    fn add_vert(&mut self, point: Vec3, plane: Option<&Plane>) -> u32 {
        if let Some(v) = self.vmap.get(&point_key(point)) {
            return *v;
        }
        let dist = match plane {
            Some(plane) => {
                let tol = 1e-5 * point.length().max(plane.dist.abs());
                let dist = point.dot(plane.norm) - plane.dist;
                if dist.abs() < tol {
                    0.0
                } else {
                    dist
                }
            }
            None => 0.0,
        };
        let v = self.verts.len() as u32;
        self.verts.push(CutVert { point, dist, edges: Vec::new() });
        self.vmap.insert(point_key(point), v);
        v
    }

    fn find_edge(&self, v1: u32, v2: u32) -> Option<u32> {
        self.verts[v1 as usize].edges.iter().copied().find(|e| {
            let verts = self.edges[*e as usize].verts;
            verts[0] == v2 || verts[1] == v2
        })
    }

    fn add_edge(&mut self, v1: u32, v2: u32, plane: Option<&Plane>) -> u32 {
        if let Some(e) = self.find_edge(v1, v2) {
            return e;
        }
        let (d1, d2) = (self.verts[v1 as usize].dist, self.verts[v2 as usize].dist);
        let inter = match plane {
            Some(_) if (d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0) => {
                let x = -d1 / (d2 - d1);
                let y = 1.0 - x;
                Some(self.verts[v1 as usize].point * y + self.verts[v2 as usize].point * x)
            }
            _ => None,
        };
        let e = self.edges.len() as u32;
        self.edges.push(CutEdge { verts: [v1, v2], faces: [None, None], inter });
        self.verts[v1 as usize].edges.push(e);
        self.verts[v2 as usize].edges.push(e);
        e
    }

    fn add_face(&mut self, p1: Vec3, p2: Vec3, p3: Vec3) -> u32 {
        let verts = [
            self.add_vert(p1, None),
            self.add_vert(p2, None),
            self.add_vert(p3, None),
        ];
        let f = self.faces.len() as u32;
        let mut edges = [0u32; 3];
        for i in 0..3 {
            let e = self.add_edge(verts[i], verts[(i + 1) % 3], None);
            edges[i] = e;
            let faces = &mut self.edges[e as usize].faces;
            let slot = if faces[0].is_none() { 0 } else { 1 };
            faces[slot] = Some(f);
        }
        self.faces.push(CutFace { verts, edges, visited: false });
        f
    }

    /// Split a quad into triangles along its shorter diagonal.
    fn add_quad(&mut self, p1: Vec3, p2: Vec3, p3: Vec3, p4: Vec3) {
        if p1.distance_squared(p3) > p2.distance_squared(p4) {
            self.add_face(p2, p3, p4);
            self.add_face(p1, p2, p4);
        } else {
            self.add_face(p1, p3, p4);
            self.add_face(p1, p2, p3);
        }
    }

    /// Record a cap point: the 3D vertex and its 2D projection in the cut
    /// plane's basis.
    fn add_2d_point(&mut self, pt: Vec3, plane: &Plane) -> Result<(), Error> {
        let v = self.add_vert(pt, None);
        let ff = Vec2::new(pt.dot(plane.x_axis), pt.dot(plane.y_axis));
        self.poly2d.add(&[ff.x, ff.y])?;
        self.pt2d.insert(point_key2(ff), v);
        Ok(())
    }

    /// Membership toggle: an on-plane edge appears in the cap outline only
    /// when an odd number of kept triangles contributed it.
    fn toggle_edge2d(&mut self, e: u32) {
        if !self.edge2d.remove(&e) {
            self.edge2d.insert(e);
        }
    }

    fn face_adj(&self, f: u32, i: usize) -> Option<u32> {
        let e = &self.edges[self.faces[f as usize].edges[i] as usize];
        if e.faces[0] == Some(f) {
            e.faces[1]
        } else {
            e.faces[0]
        }
    }
}

/// Sort one input triangle into the side shapes, splitting it when the
/// plane crosses it. `s2` holds the classification state.
fn make_faces(
    p: [Vec3; 3],
    plane: &Plane,
    s0: &mut Shape,
    s1: &mut Shape,
    s2: &mut Shape,
) -> Result<(), Error> {
    let mut v = [0u32; 3];
    for (i, pt) in p.iter().enumerate() {
        v[i] = s2.add_vert(*pt, Some(plane));
    }
    let mut e = [0u32; 3];
    for i in 0..3 {
        e[i] = s2.add_edge(v[i], v[(i + 1) % 3], Some(plane));
    }
    let d = [
        s2.verts[v[0] as usize].dist,
        s2.verts[v[1] as usize].dist,
        s2.verts[v[2] as usize].dist,
    ];
    let inter = [
        s2.edges[e[0] as usize].inter,
        s2.edges[e[1] as usize].inter,
        s2.edges[e[2] as usize].inter,
    ];
    let crossings = inter.iter().filter(|i| i.is_some()).count();
    match crossings {
        0 => {
            match d.iter().filter(|d| **d == 0.0).count() {
                0 | 1 => {
                    let non1 = if d[0] != 0.0 { 0 } else { 1 };
                    let ss = if d[non1] > 0.0 { s1 } else { s0 };
                    ss.add_face(p[0], p[1], p[2]);
                }
                2 => {
                    // Exactly one edge lies on the plane; it may become part
                    // of the cap outline.
                    let non1 = if d[0] != 0.0 {
                        0
                    } else if d[1] != 0.0 {
                        1
                    } else {
                        2
                    };
                    let i1 = (non1 + 1) % 3;
                    let ss = if d[non1] > 0.0 { s1 } else { s0 };
                    let face = ss.add_face(p[0], p[1], p[2]);
                    let edge = ss.faces[face as usize].edges[i1];
                    ss.toggle_edge2d(edge);
                }
                _ => {
                    // The whole triangle is on the plane; drop it.
                }
            }
        }
        1 => {
            // One crossing edge means the remaining vertex sits exactly on
            // the plane; the triangle splits into one piece per side.
            let i1 = inter.iter().position(|i| i.is_some()).unwrap();
            let non1 = (i1 + 1) % 3;
            let non2 = (i1 + 2) % 3;
            if d[non2] != 0.0 {
                return Err(Error::TopologyBroken("expected a vertex on the cut plane"));
            }
            let ip = inter[i1].unwrap();
            s0.add_2d_point(ip, plane)?;
            s1.add_2d_point(ip, plane)?;
            s0.add_2d_point(p[non2], plane)?;
            s1.add_2d_point(p[non2], plane)?;
            let ss = if d[non1] > 0.0 { &mut *s1 } else { &mut *s0 };
            ss.add_face(p[non1], p[non2], ip);
            let ss = if d[i1] > 0.0 { s1 } else { s0 };
            ss.add_face(p[non2], p[i1], ip);
        }
        2 => {
            // Two crossing edges: one vertex alone on its side, a quad on
            // the other.
            let non1 = inter.iter().position(|i| i.is_none()).unwrap();
            let i1 = (non1 + 1) % 3;
            let i2 = (non1 + 2) % 3;
            let ip1 = inter[i1].unwrap();
            let ip2 = inter[i2].unwrap();
            s0.add_2d_point(ip1, plane)?;
            s1.add_2d_point(ip1, plane)?;
            s0.add_2d_point(ip2, plane)?;
            s1.add_2d_point(ip2, plane)?;
            let ss = if d[i2] > 0.0 { &mut *s1 } else { &mut *s0 };
            ss.add_face(p[i2], ip2, ip1);
            let ss = if d[i1] > 0.0 { s1 } else { s0 };
            ss.add_quad(p[non1], p[i1], ip1, ip2);
        }
        _ => {
            return Err(Error::TopologyBroken(
                "invalid number of edges intersecting the cut plane",
            ));
        }
    }
    Ok(())
}

/// Emit the connected component containing `face` as a triangle list,
/// marking everything it reaches.
fn build_component(shape: &mut Shape, face: u32) -> Result<VertexList, Error> {
    let mut out = VertexList::new(3, Primitive::Triangle);
    let mut queue = VecDeque::new();
    shape.faces[face as usize].visited = true;
    queue.push_back(face);
    while let Some(face) = queue.pop_front() {
        for i in 0..3 {
            let v = shape.faces[face as usize].verts[i];
            let p = shape.verts[v as usize].point;
            out.add(&[p.x, p.y, p.z])?;
            match shape.face_adj(face, i) {
                None => {
                    tracing::warn!("could not find adjacent face");
                }
                Some(next) => {
                    if !shape.faces[next as usize].visited {
                        shape.faces[next as usize].visited = true;
                        queue.push_back(next);
                    }
                }
            }
        }
    }
    Ok(out)
}

/// Cut the triangles of `vl` by the plane `norm . x = dist` and return the
/// connected components of both sides, re-closed along the cut. The normal
/// is normalized; the offset is used as given.
pub fn plane_cut(vl: &VertexList, norm: Vec3, dist: f32) -> Result<Vec<VertexList>, Error> {
    if vl.floats_per_vert() < 3 {
        return Err(Error::TooFewCoords { needed: 3, got: vl.floats_per_vert() });
    }
    if vl.primitive() != Primitive::Triangle {
        return Err(Error::WrongPrimitive {
            expected: Primitive::Triangle,
            got: vl.primitive(),
        });
    }
    let norm = norm.normalize_or_zero();
    let (x_axis, y_axis) = basis_vectors(norm);
    let plane = Plane { norm, x_axis, y_axis, dist };

    // Side 0 collects dist < 0, side 1 dist > 0; the third shape classifies
    // the original triangles.
    let mut s0 = Shape::new();
    let mut s1 = Shape::new();
    let mut s2 = Shape::new();
    let num = vl.num_indices();
    tracing::debug!(num_faces = num / 3, "cutting");
    let mut i = 0;
    while i + 2 < num {
        make_faces(
            [vl.lookup_pos(i), vl.lookup_pos(i + 1), vl.lookup_pos(i + 2)],
            &plane,
            &mut s0,
            &mut s1,
            &mut s2,
        )?;
        i += 3;
    }

    let mut out = Vec::new();
    for (s_count, shape) in [&mut s0, &mut s1].into_iter().enumerate() {
        // Surviving on-plane edges join the cap outline.
        let pts: Vec<(Vec3, Vec3)> = shape
            .edge2d
            .iter()
            .map(|e| {
                let edge = &shape.edges[*e as usize];
                (
                    shape.verts[edge.verts[0] as usize].point,
                    shape.verts[edge.verts[1] as usize].point,
                )
            })
            .collect();
        for (a, b) in pts {
            shape.add_2d_point(a, &plane)?;
            shape.add_2d_point(b, &plane)?;
        }

        let tri = triangulate_2d(&shape.poly2d)?;
        let mut j = 0;
        while j + 2 < tri.num_indices() {
            let mut v = [0u32; 3];
            for k in 0..3 {
                let p2 = tri.lookup_pos2(j + k);
                v[k] = *shape
                    .pt2d
                    .get(&point_key2(p2))
                    .ok_or(Error::TopologyBroken("unexpected 2d point in the cap"))?;
            }
            let (p1, p2, p3) = (
                shape.verts[v[0] as usize].point,
                shape.verts[v[1] as usize].point,
                shape.verts[v[2] as usize].point,
            );
            if s_count == 1 {
                shape.add_face(p1, p2, p3);
            } else {
                shape.add_face(p1, p3, p2);
            }
            j += 3;
        }

        for f in 0..shape.faces.len() as u32 {
            if shape.faces[f as usize].visited {
                continue;
            }
            out.push(build_component(shape, f)?);
        }
    }
    tracing::debug!(num_pieces = out.len(), "plane cut done");
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{mass::mass_properties, testmesh::box_tris, vef::Vef};
    use glam::vec3;

    #[test]
    fn t_cube_halved() {
        let cube = box_tris(1.0, 1.0, 1.0);
        let pieces = plane_cut(&cube, vec3(0., 0., 1.), 0.0).expect("cut failed");
        assert_eq!(pieces.len(), 2);
        for piece in &pieces {
            let props = mass_properties(piece).expect("mass failed");
            assert!((props.volume - 4.0).abs() < 1e-4, "got {}", props.volume);
            // Each half is closed again.
            let vef = Vef::new(piece).expect("vef failed");
            for edge in &vef.edges {
                assert!(edge.faces[1].is_some());
            }
        }
    }

    #[test]
    fn t_asymmetric_cut() {
        let cube = box_tris(1.0, 1.0, 1.0);
        let pieces = plane_cut(&cube, vec3(0., 0., 1.), 0.5).expect("cut failed");
        assert_eq!(pieces.len(), 2);
        let mut volumes: Vec<f64> = pieces
            .iter()
            .map(|p| mass_properties(p).expect("mass failed").volume)
            .collect();
        volumes.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((volumes[0] - 2.0).abs() < 1e-4);
        assert!((volumes[1] - 6.0).abs() < 1e-4);
    }

    #[test]
    fn t_plane_misses_mesh() {
        let cube = box_tris(1.0, 1.0, 1.0);
        let pieces = plane_cut(&cube, vec3(0., 0., 1.), 10.0).expect("cut failed");
        assert_eq!(pieces.len(), 1);
        let props = mass_properties(&pieces[0]).expect("mass failed");
        assert!((props.volume - 8.0).abs() < 1e-4);
    }

    #[test]
    fn t_infinite_offset_returns_components() {
        let cube = box_tris(1.0, 1.0, 1.0);
        let pieces = plane_cut(&cube, vec3(1., 0., 0.), f32::INFINITY).expect("cut failed");
        assert_eq!(pieces.len(), 1);
        let props = mass_properties(&pieces[0]).expect("mass failed");
        assert!((props.volume - 8.0).abs() < 1e-4);
    }

    #[test]
    fn t_two_components_split_apart() {
        // Two disjoint cubes in one list come back as two pieces.
        let near = box_tris(1.0, 1.0, 1.0);
        let mut both = VertexList::new(3, Primitive::Triangle);
        for i in 0..near.num_indices() {
            let p = near.lookup_pos(i);
            both.add(&[p.x, p.y, p.z]).expect("add failed");
        }
        for i in 0..near.num_indices() {
            let p = near.lookup_pos(i) + vec3(10., 0., 0.);
            both.add(&[p.x, p.y, p.z]).expect("add failed");
        }
        let pieces = plane_cut(&both, vec3(0., 1., 0.), 100.0).expect("cut failed");
        assert_eq!(pieces.len(), 2);
    }

    #[test]
    fn t_cut_through_face() {
        // The plane grazes the +x face: its triangles lie on the plane and
        // are dropped, and the cap rebuilds that face.
        let cube = box_tris(1.0, 1.0, 1.0);
        let pieces = plane_cut(&cube, vec3(1., 0., 0.), 1.0).expect("cut failed");
        assert_eq!(pieces.len(), 1);
        let props = mass_properties(&pieces[0]).expect("mass failed");
        assert!((props.volume - 8.0).abs() < 1e-4);
        let vef = Vef::new(&pieces[0]).expect("vef failed");
        for edge in &vef.edges {
            assert!(edge.faces[1].is_some());
        }
    }

    #[test]
    fn t_diagonal_cut_volume_preserved() {
        let cube = box_tris(1.0, 1.0, 1.0);
        let n = vec3(1., 1., 1.);
        let pieces = plane_cut(&cube, n, 0.25).expect("cut failed");
        assert!(pieces.len() >= 2);
        let total: f64 = pieces
            .iter()
            .map(|p| mass_properties(p).expect("mass failed").volume)
            .sum();
        assert!((total - 8.0).abs() < 1e-3, "total volume {total}");
    }

    #[test]
    fn t_wrong_input() {
        let vl = VertexList::new(3, Primitive::Line);
        assert!(matches!(
            plane_cut(&vl, vec3(0., 0., 1.), 0.0),
            Err(Error::WrongPrimitive { .. })
        ));
    }
}
