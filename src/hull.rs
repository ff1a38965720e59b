//! Quickhull 3D convex hull.
//!
//! Reference: The Quickhull Algorithm for Convex Hulls,
//! C. Bradford Barber, David P. Dobkin, Hannu Huhdanpaa.
//!
//! Faces carry a ring of vertices with a neighbor face across each outgoing
//! edge, and an outside list of the input points beyond their plane, keyed by
//! distance with the furthest point at the head. Rings wind so that the face
//! plane normal points into the hull; a point is outside a face when it lies
//! on the anti-normal side. A tree over the outside lists' maxima picks the
//! globally furthest point each round; the visible region is flooded, its
//! horizon traced, and the ridge closed with new or extended faces.

use crate::{
    error::Error,
    ftree::{FNode, FTree},
    math::{basis_vectors, plane_norm},
    queue::UniqueQueue,
    vlist::{Primitive, VertexList},
};
use glam::Vec3;
use std::collections::{HashMap, VecDeque};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
struct Fid(u32);

impl Fid {
    const INVALID: Fid = Fid(u32::MAX);
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Cat {
    Present,
    Extend,
    Delete,
}

/// A ring entry: the vertex index and the face across the edge leaving it
/// toward the next ring entry.
#[derive(Copy, Clone, Debug)]
struct FaceVert {
    idx: u32,
    neighbor: Fid,
}

/// Outside-point list. The head is the furthest point; everything else is
/// appended at the tail unordered.
#[derive(Default)]
struct PointList {
    pts: VecDeque<u32>,
    max_dist: f32,
}

impl PointList {
    fn add(&mut self, idx: u32, dist: f32) {
        if self.pts.is_empty() {
            self.max_dist = dist;
            self.pts.push_back(idx);
        } else if dist > self.max_dist {
            self.max_dist = dist;
            self.pts.push_front(idx);
        } else {
            self.pts.push_back(idx);
        }
    }

    fn join(&mut self, mut src: PointList) {
        let Some(head) = src.pts.pop_front() else {
            return;
        };
        self.add(head, src.max_dist);
        self.pts.extend(src.pts.drain(..));
    }

    fn clear(&mut self) {
        self.pts.clear();
        self.max_dist = 0.0;
    }
}

struct HullFace {
    ring: Vec<FaceVert>,
    norm: Vec3,
    xx: Vec3,
    yy: Vec3,
    pts: PointList,
    node: Option<FNode>,
}

/// Horizon ridge entry: the far vertex of a ridge edge in walk order, the
/// face on the outside of the ridge there, and whether that face absorbs the
/// new point instead of being replaced.
struct Rle {
    idx: u32,
    extend: bool,
    neighbor: Fid,
}

/// Position in a ring that gets a neighbor patched in after the face strip
/// around a new point is complete.
#[derive(Copy, Clone)]
enum PatchPos {
    Head,
    Last,
}

struct Hull {
    points: Vec<Vec3>,
    faces: Vec<Option<HullFace>>,
    free: Vec<u32>,
    tree: FTree<Fid>,
}

impl Hull {
    fn face(&self, f: Fid) -> &HullFace {
        self.faces[f.0 as usize].as_ref().unwrap()
    }

    fn face_mut(&mut self, f: Fid) -> &mut HullFace {
        self.faces[f.0 as usize].as_mut().unwrap()
    }

    fn new_face(&mut self, idx0: u32, idx1: u32, idx2: u32) -> Fid {
        let norm = plane_norm(
            self.points[idx0 as usize],
            self.points[idx1 as usize],
            self.points[idx2 as usize],
        );
        let (xx, yy) = basis_vectors(norm);
        let face = HullFace {
            ring: vec![
                FaceVert { idx: idx0, neighbor: Fid::INVALID },
                FaceVert { idx: idx1, neighbor: Fid::INVALID },
                FaceVert { idx: idx2, neighbor: Fid::INVALID },
            ],
            norm,
            xx,
            yy,
            pts: PointList::default(),
            node: None,
        };
        match self.free.pop() {
            Some(id) => {
                self.faces[id as usize] = Some(face);
                Fid(id)
            }
            None => {
                self.faces.push(Some(face));
                Fid((self.faces.len() - 1) as u32)
            }
        }
    }

    fn remove_face(&mut self, f: Fid) {
        self.faces[f.0 as usize] = None;
        self.free.push(f.0);
    }

    /// Sync the face's node in the max-dist tree with its outside list.
    fn face_update(&mut self, f: Fid) {
        let (node, empty, max_dist) = {
            let face = self.face(f);
            (face.node, face.pts.pts.is_empty(), face.pts.max_dist)
        };
        match node {
            Some(node) if empty => {
                self.tree.remove(node);
                self.face_mut(f).node = None;
            }
            None if !empty => {
                let node = self.tree.insert(max_dist, f);
                self.face_mut(f).node = Some(node);
            }
            Some(node) if max_dist != self.tree.key(node) => {
                self.tree.rekey(node, max_dist);
            }
            _ => {}
        }
    }

    /// Classify point `idx` against `f`: the signed distance puts it beyond
    /// the face plane (`Delete`), near the plane or near the triangle's rim
    /// (`Extend`), or on the kept side (`Present`). The in-plane distances to
    /// the ring edges decide which tolerance regime applies.
    fn categorize(&self, f: Fid, idx: u32) -> (Cat, f32) {
        let face = self.face(f);
        let pt = self.points[idx as usize];
        let mut delta = self.points[face.ring.last().unwrap().idx as usize] - pt;
        let dist = delta.dot(face.norm);
        let mut x2 = delta.dot(face.xx);
        let mut y2 = delta.dot(face.yy);
        let mut area = 0.0f32;
        let mut max = f32::NEG_INFINITY;
        for fv in &face.ring {
            let (x1, y1) = (x2, y2);
            delta = self.points[fv.idx as usize] - pt;
            x2 = delta.dot(face.xx);
            y2 = delta.dot(face.yy);
            area += x1 * y2 - y1 * x2;
            let (dx, dy) = (x2 - x1, y2 - y1);
            let dd = (dy * x1 - dx * y1) / (dx * dx + dy * dy).sqrt();
            if dd > max {
                max = dd;
            }
        }
        let tol = 1e-5 * area.abs().sqrt();
        let cat = if max > 0.0 {
            if dist.abs() < tol || dist.abs() < 1e-5 * max {
                Cat::Extend
            } else if dist > 0.0 {
                Cat::Delete
            } else {
                Cat::Present
            }
        } else if dist > tol {
            Cat::Delete
        } else {
            let dpt = dist + tol;
            if dpt * dpt + max * max < 4.0 * tol * tol {
                Cat::Extend
            } else {
                Cat::Present
            }
        };
        (cat, dist)
    }

    /// Steal every pool point this face categorizes as outside. The pool
    /// head is the point currently being added and is never reassigned.
    fn assign_points(&mut self, f: Fid, pool: &mut PointList) {
        let rest: Vec<u32> = pool.pts.iter().skip(1).copied().collect();
        pool.pts.truncate(1);
        for idx in rest {
            let (cat, dist) = self.categorize(f, idx);
            if cat == Cat::Delete {
                self.face_mut(f).pts.add(idx, dist);
            } else {
                pool.pts.push_back(idx);
            }
        }
    }

    fn find_vert(ring: &[FaceVert], idx: u32) -> Option<usize> {
        ring.iter().position(|fv| fv.idx == idx)
    }

    fn find_edge(ring: &[FaceVert], idx1: u32, idx2: u32) -> Option<usize> {
        let pos = Self::find_vert(ring, idx1)?;
        if ring[(pos + 1) % ring.len()].idx != idx2 {
            return None;
        }
        Some(pos)
    }

    /// Rotate the ring of a kept horizon face so its head's outgoing edge
    /// borders the region being deleted.
    fn prep_for_retention(&mut self, f: Fid, visited: &HashMap<Fid, Cat>) {
        let ring = &mut self.face_mut(f).ring;
        let k = ring
            .iter()
            .position(|fv| visited.get(&fv.neighbor) == Some(&Cat::Delete))
            .unwrap_or(0);
        ring.rotate_left(k);
    }

    /// Rotate the ring of a face about to be extended so its head's outgoing
    /// edge is the first one facing the visible region, and splice out the
    /// ring vertices strictly inside that region.
    fn prep_for_extend(&mut self, f: Fid, visited: &HashMap<Fid, Cat>) {
        let visible = |fid: &Fid| {
            matches!(visited.get(fid), Some(Cat::Delete) | Some(Cat::Extend))
        };
        let ring = &mut self.face_mut(f).ring;
        let n = ring.len();
        let mut k = 0usize;
        while visible(&ring[k].neighbor) {
            k = (k + n - 1) % n;
        }
        while !visible(&ring[k].neighbor) {
            k = (k + 1) % n;
        }
        ring.rotate_left(k);
        while ring.len() > 1 && visible(&ring[1].neighbor) {
            ring.remove(1);
        }
    }

    /// Splice the new point in right after the ring head and make it the new
    /// head.
    fn extend_face(&mut self, f: Fid, idx: u32) {
        let ring = &mut self.face_mut(f).ring;
        let head = ring[0];
        ring[0] = FaceVert { idx, neighbor: Fid::INVALID };
        ring.push(head);
    }

    fn patch(&mut self, target: (Fid, PatchPos), neighbor: Fid) {
        let ring = &mut self.face_mut(target.0).ring;
        match target.1 {
            PatchPos::Head => ring[0].neighbor = neighbor,
            PatchPos::Last => ring.last_mut().unwrap().neighbor = neighbor,
        }
    }

    /// Close the ridge around the pool's head point with a strip of new and
    /// extended faces, stitching neighbor links around the strip and along
    /// the horizon, then deal the pool out to the fresh faces.
    fn build_new_faces(&mut self, rl: &[Rle], pool: &mut PointList) -> Result<(), Error> {
        let idx = pool.pts[0];
        let mut first_patch: Option<(Fid, PatchPos)> = None;
        let mut prev_patch: Option<(Fid, PatchPos)> = None;
        let mut first_face: Option<Fid> = None;
        let mut face_prev = Fid::INVALID;
        let mut prev_idx = rl.last().unwrap().idx;
        for rle in rl {
            let f;
            if rle.extend {
                f = rle.neighbor;
                self.extend_face(f, idx);
                self.patch((f, PatchPos::Last), face_prev);
                if first_patch.is_none() {
                    first_patch = Some((f, PatchPos::Last));
                }
            } else {
                f = self.new_face(idx, rle.idx, prev_idx);
                self.patch((f, PatchPos::Last), face_prev);
                self.face_mut(f).ring[1].neighbor = rle.neighbor;
                if first_patch.is_none() {
                    first_patch = Some((f, PatchPos::Last));
                }
                let ring = &mut self.face_mut(rle.neighbor).ring;
                let pos = Self::find_edge(ring, prev_idx, rle.idx)
                    .ok_or(Error::TopologyBroken("horizon face lost its ridge edge"))?;
                ring[pos].neighbor = f;
            }
            if let Some(target) = prev_patch {
                self.patch(target, f);
            }
            prev_patch = Some((f, PatchPos::Head));
            if first_face.is_none() {
                first_face = Some(f);
            }
            self.assign_points(f, pool);
            self.face_update(f);
            face_prev = f;
            prev_idx = rle.idx;
        }
        let first_patch = first_patch.ok_or(Error::TopologyBroken("empty ridge"))?;
        self.patch(first_patch, face_prev);
        self.patch(prev_patch.unwrap(), first_face.unwrap());
        Ok(())
    }

    fn ridge_entry(&mut self, f: Fid, visited: &HashMap<Fid, Cat>) -> Rle {
        let extend = visited.get(&f) == Some(&Cat::Extend);
        if extend {
            self.prep_for_extend(f, visited);
        } else {
            self.prep_for_retention(f, visited);
        }
        Rle {
            idx: self.face(f).ring[1].idx,
            extend,
            neighbor: f,
        }
    }

    /// Seed the hull: a triangular face between the x extremes and the point
    /// furthest from both, flipped so its outside holds the nearer points,
    /// then a tetrahedron closed around the furthest opposite point.
    fn init_simplex(&mut self) -> Result<(), Error> {
        let len = self.points.len();
        if len < 4 {
            return Err(Error::TooFewPoints(len as u32));
        }
        let (mut min_f, mut max_f) = (f32::INFINITY, f32::NEG_INFINITY);
        let (mut min_idx, mut max_idx) = (0usize, 0usize);
        for (idx, p) in self.points.iter().enumerate() {
            if p.x > max_f {
                max_f = p.x;
                max_idx = idx;
            }
            if p.x < min_f {
                min_f = p.x;
                min_idx = idx;
            }
        }
        let (min_p, max_p) = (self.points[min_idx], self.points[max_idx]);
        let mut dd_f = 0.0f32;
        let mut dd_idx = 0usize;
        for (idx, p) in self.points.iter().enumerate() {
            let dist = p.distance(min_p) + p.distance(max_p);
            if dist > dd_f {
                dd_f = dist;
                dd_idx = idx;
            }
        }
        let face = self.new_face(min_idx as u32, max_idx as u32, dd_idx as u32);
        if self.face(face).norm.length_squared() == 0.0 {
            return Err(Error::ColinearInput);
        }
        let mut pool = PointList::default();
        let mut below = PointList::default();
        for idx in 0..len {
            if idx == min_idx || idx == max_idx || idx == dd_idx {
                continue;
            }
            let (cat, dist) = self.categorize(face, idx as u32);
            match cat {
                Cat::Delete => self.face_mut(face).pts.add(idx as u32, dist),
                Cat::Extend => pool.add(idx as u32, dist.abs()),
                Cat::Present => below.add(idx as u32, -dist),
            }
        }
        if self.face(face).pts.max_dist > below.max_dist {
            let f = self.face_mut(face);
            std::mem::swap(&mut f.pts, &mut below);
            let ring = &mut f.ring;
            let temp = ring[0].idx;
            ring[0].idx = ring[1].idx;
            ring[1].idx = temp;
            f.norm = -f.norm;
        }
        if below.pts.is_empty() {
            return Err(Error::CoplanarInput);
        }
        self.face_update(face);
        pool.join(below);
        let rl: Vec<Rle> = self
            .face(face)
            .ring
            .iter()
            .map(|fv| Rle { idx: fv.idx, extend: false, neighbor: face })
            .collect();
        self.build_new_faces(&rl, &mut pool)
    }

    fn find_hull(&mut self) -> Result<(), Error> {
        let mut pool = PointList::default();
        let mut visited: HashMap<Fid, Cat> = HashMap::new();
        let mut queued: UniqueQueue<Fid> = UniqueQueue::new();
        let mut rl: Vec<Rle> = Vec::new();
        while let Some(node) = self.tree.highest() {
            let seed = *self.tree.data(node);
            if self.face(seed).pts.pts.is_empty() {
                self.face_update(seed);
                continue;
            }
            pool.join(std::mem::take(&mut self.face_mut(seed).pts));
            let idx = pool.pts[0];

            // The nominated face must see the point; a numerical tie can
            // leave the distance positive for the tree but not for the
            // categorizer, in which case a ring neighbor may see it instead.
            let mut del_face = seed;
            if self.categorize(seed, idx).0 != Cat::Delete {
                let neighbors: Vec<Fid> =
                    self.face(seed).ring.iter().map(|fv| fv.neighbor).collect();
                match neighbors
                    .iter()
                    .copied()
                    .find(|n| self.categorize(*n, idx).0 == Cat::Delete)
                {
                    Some(n) => del_face = n,
                    None => {
                        // Nobody sees it. Put the pool back and drop the
                        // point from consideration.
                        self.assign_points(seed, &mut pool);
                        self.face_update(seed);
                        for n in neighbors {
                            self.assign_points(n, &mut pool);
                            self.face_update(n);
                        }
                        pool.clear();
                        continue;
                    }
                }
            }

            // Flood the region that can see the point.
            let mut no_view: Option<Fid> = None;
            let mut cur = del_face;
            loop {
                let (cat, _) = self.categorize(cur, idx);
                visited.insert(cur, cat);
                if cat != Cat::Delete {
                    no_view = Some(cur);
                } else {
                    let face = self.face_mut(cur);
                    face.pts.max_dist = 0.0;
                    let pts = std::mem::take(&mut face.pts);
                    pool.join(pts);
                    let neighbors: Vec<Fid> =
                        self.face(cur).ring.iter().map(|fv| fv.neighbor).collect();
                    for n in neighbors {
                        if !visited.contains_key(&n) {
                            queued.push_back(n);
                        }
                    }
                }
                match queued.pop() {
                    Some(f) => cur = f,
                    None => break,
                }
            }
            let no_view =
                no_view.ok_or(Error::TopologyBroken("every face can see the new point"))?;

            // Trace the closed horizon ridge.
            let entry = self.ridge_entry(no_view, &visited);
            let first_idx = self.face(no_view).ring[0].idx;
            let mut walk = entry.neighbor;
            rl.push(entry);
            while rl.last().unwrap().idx != first_idx {
                let ring = &self.face(walk).ring;
                let pos = Self::find_vert(ring, rl.last().unwrap().idx)
                    .ok_or(Error::TopologyBroken("ridge walk lost its vertex"))?;
                let neighbor = ring[pos].neighbor;
                let next_idx = ring[(pos + 1) % ring.len()].idx;
                match visited.get(&neighbor) {
                    Some(Cat::Delete) => {
                        rl.push(Rle { idx: next_idx, extend: false, neighbor: walk });
                    }
                    Some(Cat::Extend) => {
                        let entry = self.ridge_entry(neighbor, &visited);
                        rl.push(entry);
                        walk = neighbor;
                    }
                    _ => walk = neighbor,
                }
            }

            // Retire the visible region.
            for (f, cat) in visited.iter() {
                if matches!(cat, Cat::Delete | Cat::Extend) {
                    self.face_update(*f);
                }
            }
            for (f, cat) in visited.iter() {
                if *cat == Cat::Delete {
                    self.remove_face(*f);
                }
            }

            self.build_new_faces(&rl, &mut pool)?;
            if pool.pts.front() != Some(&idx) {
                tracing::warn!("hull pool head changed while rebuilding faces");
            }

            visited.clear();
            queued.clear();
            pool.clear();
            rl.clear();
        }
        Ok(())
    }

    fn build_output(&self) -> Result<VertexList, Error> {
        let mut out = VertexList::new(3, Primitive::Triangle);
        for face in self.faces.iter().flatten() {
            let ring = &face.ring;
            for i in 2..ring.len() {
                for idx in [ring[0].idx, ring[i].idx, ring[i - 1].idx] {
                    let p = self.points[idx as usize];
                    out.add(&[p.x, p.y, p.z])?;
                }
            }
        }
        Ok(out)
    }
}

/// Convex hull of the vertices of `vl` as a closed triangle mesh with CCW
/// outward-facing faces. Records wider than three floats are collapsed to
/// their leading positions first.
pub fn convex_hull(vl: &VertexList) -> Result<VertexList, Error> {
    let fpv = vl.floats_per_vert();
    if fpv < 3 {
        return Err(Error::TooFewCoords { needed: 3, got: fpv });
    }
    let points: Vec<Vec3> = if fpv == 3 {
        vl.verts()
            .chunks_exact(3)
            .map(|c| Vec3::new(c[0], c[1], c[2]))
            .collect()
    } else {
        let mut seen = std::collections::HashSet::new();
        let mut points = Vec::new();
        for rec in vl.verts().chunks_exact(fpv) {
            let key = [rec[0].to_bits(), rec[1].to_bits(), rec[2].to_bits()];
            if seen.insert(key) {
                points.push(Vec3::new(rec[0], rec[1], rec[2]));
            }
        }
        points
    };
    tracing::debug!(num_points = points.len(), "building convex hull");
    let mut hull = Hull {
        points,
        faces: Vec::new(),
        free: Vec::new(),
        tree: FTree::new(),
    };
    hull.init_simplex()?;
    hull.find_hull()?;
    let out = hull.build_output()?;
    tracing::debug!(num_faces = out.num_indices() / 3, "convex hull done");
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{mass::mass_properties, vef::Vef};
    use glam::vec3;

    fn cloud(points: &[[f32; 3]]) -> VertexList {
        let mut vl = VertexList::new(3, Primitive::Point);
        for p in points {
            vl.add(p).expect("add failed");
        }
        vl
    }

    fn cube_cloud(h: f32) -> VertexList {
        let mut pts = Vec::new();
        for x in [-h, h] {
            for y in [-h, h] {
                for z in [-h, h] {
                    pts.push([x, y, z]);
                }
            }
        }
        cloud(&pts)
    }

    #[test]
    fn t_tetra() {
        let vl = cloud(&[
            [0., 0., 0.],
            [1., 0., 0.],
            [0., 1., 0.],
            [0., 0., 1.],
        ]);
        let hull = convex_hull(&vl).expect("hull failed");
        assert_eq!(hull.num_verts(), 4);
        assert_eq!(hull.num_indices(), 12);
        let props = mass_properties(&hull).expect("mass failed");
        assert!((props.volume - 1.0 / 6.0).abs() < 1e-5);
    }

    #[test]
    fn t_cube() {
        let hull = convex_hull(&cube_cloud(1.0)).expect("hull failed");
        assert_eq!(hull.num_verts(), 8);
        assert_eq!(hull.num_indices(), 36);
        let props = mass_properties(&hull).expect("mass failed");
        assert!((props.volume - 8.0).abs() < 1e-4);
        // Closed manifold: every edge has exactly two incident faces.
        let vef = Vef::new(&hull).expect("vef failed");
        assert_eq!(vef.edges.len(), 18);
        for edge in &vef.edges {
            assert!(edge.faces[1].is_some());
        }
    }

    #[test]
    fn t_ccw_outward() {
        let hull = convex_hull(&cube_cloud(1.0)).expect("hull failed");
        for i in (0..hull.num_indices()).step_by(3) {
            let (p1, p2, p3) = (
                hull.lookup_pos(i),
                hull.lookup_pos(i + 1),
                hull.lookup_pos(i + 2),
            );
            let n = (p2 - p1).cross(p3 - p2);
            let centroid = (p1 + p2 + p3) / 3.0;
            // For an origin-centered solid, outward normals point away from
            // the origin.
            assert!(n.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn t_interior_points_dropped() {
        let mut pts = vec![
            [0.1, 0.2, 0.3f32],
            [0.0, 0.0, 0.0],
            [-0.4, 0.3, 0.2],
            [0.2, -0.3, 0.1],
        ];
        for x in [-1.0f32, 1.0] {
            for y in [-1.0, 1.0] {
                for z in [-1.0, 1.0] {
                    pts.push([x, y, z]);
                }
            }
        }
        let hull = convex_hull(&cloud(&pts)).expect("hull failed");
        assert_eq!(hull.num_verts(), 8);
        assert_eq!(hull.num_indices(), 36);
    }

    #[test]
    fn t_idempotent() {
        let hull = convex_hull(&cube_cloud(0.5)).expect("hull failed");
        let again = convex_hull(&hull).expect("second hull failed");
        assert_eq!(again.num_verts(), hull.num_verts());
        assert_eq!(again.num_indices(), hull.num_indices());
        let a = mass_properties(&hull).expect("mass failed");
        let b = mass_properties(&again).expect("mass failed");
        assert!((a.volume - b.volume).abs() < 1e-6);
    }

    #[test]
    fn t_contains_all_points() {
        // An octahedron-ish cloud with some jitter.
        let pts = [
            [1.3, 0., 0.],
            [-1.1, 0., 0.],
            [0., 1.2, 0.],
            [0., -0.9, 0.],
            [0., 0., 1.4],
            [0., 0., -1.2],
            [0.3, 0.3, 0.3],
            [-0.2, 0.4, -0.1],
        ];
        let vl = cloud(&pts);
        let hull = convex_hull(&vl).expect("hull failed");
        let vef = Vef::new(&hull).expect("vef failed");
        let mut start = None;
        for p in &pts {
            let d = vef
                .convex_interior_dist(vec3(p[0], p[1], p[2]), &mut start)
                .expect("query failed");
            assert!(d > -1e-4, "point {p:?} ended up outside the hull: {d}");
        }
    }

    #[test]
    fn t_too_few_points() {
        let vl = cloud(&[[0., 0., 0.], [1., 0., 0.], [0., 1., 0.]]);
        assert!(matches!(convex_hull(&vl), Err(Error::TooFewPoints(3))));
    }

    #[test]
    fn t_colinear() {
        let vl = cloud(&[
            [0., 0., 0.],
            [1., 0., 0.],
            [2., 0., 0.],
            [3., 0., 0.],
            [4., 0., 0.],
        ]);
        assert!(matches!(convex_hull(&vl), Err(Error::ColinearInput)));
    }

    #[test]
    fn t_coplanar() {
        let vl = cloud(&[
            [0., 0., 0.],
            [1., 0., 0.],
            [0., 1., 0.],
            [1., 1., 0.],
            [0.5, 0.7, 0.],
        ]);
        assert!(matches!(convex_hull(&vl), Err(Error::CoplanarInput)));
    }

    #[test]
    fn t_wide_records_collapse() {
        // Positions with normals attached; hull should only see positions.
        let mut vl = VertexList::new(6, Primitive::Triangle);
        for x in [-1.0f32, 1.0] {
            for y in [-1.0, 1.0] {
                for z in [-1.0, 1.0] {
                    vl.add(&[x, y, z, 1., 0., 0.]).expect("add failed");
                    vl.add(&[x, y, z, 0., 1., 0.]).expect("add failed");
                }
            }
        }
        let hull = convex_hull(&vl).expect("hull failed");
        assert_eq!(hull.num_verts(), 8);
    }
}
