//! Mesh simplification by quadric-error edge contraction.
//!
//! Reference: Surface Simplification Using Quadric Error Metrics,
//! Michael Garland, Paul S. Heckbert.
//!
//! Every face contributes its plane quadric to its vertices; every edge (and
//! optionally every vertex pair within an aggregation distance) becomes a
//! contraction candidate with a target position minimizing the summed
//! quadric, kept in a tree keyed by cost. The cheapest legal pair is
//! contracted until the face budget is met. A contraction that would flip a
//! surviving face's normal is parked at infinite cost instead.

use crate::{
    bvh::Bvh,
    error::Error,
    ftree::{FNode, FTree},
    math::{plane_norm, solve3x3},
    vlist::{Primitive, VertexList},
};
use glam::{Mat3, Vec3};
use std::collections::HashMap;

struct SVert {
    v: Vec3,
    q: [f32; 10],
    pairs: HashMap<u32, u32>,
    faces: Vec<u32>,
}

struct SPair {
    verts: [u32; 2],
    vbar: Vec3,
    node: FNode,
}

struct SFace {
    verts: [u32; 3],
}

/// Plane quadric of the triangle `(p0, p1, p2)` as the ten unique entries of
/// `p p^T` for `p = (a, b, c, d)` with `d = -n . p0`.
fn calc_kp(p0: Vec3, p1: Vec3, p2: Vec3) -> [f32; 10] {
    let norm = plane_norm(p0, p1, p2);
    let (a, b, c) = (norm.x, norm.y, norm.z);
    let d = -norm.dot(p0);
    [
        a * a,
        a * b,
        a * c,
        a * d,
        b * b,
        b * c,
        b * d,
        c * c,
        c * d,
        d * d,
    ]
}

fn calc_cost(vbar: Vec3, q: &[f32; 10]) -> f32 {
    let prod = [
        q[0] * vbar.x + q[1] * vbar.y + q[2] * vbar.z + q[3],
        q[1] * vbar.x + q[4] * vbar.y + q[5] * vbar.z + q[6],
        q[2] * vbar.x + q[5] * vbar.y + q[7] * vbar.z + q[8],
        q[3] * vbar.x + q[6] * vbar.y + q[8] * vbar.z + q[9],
    ];
    vbar.dot(Vec3::new(prod[0], prod[1], prod[2])) + prod[3]
}

/// Rotate a vertex triple so the smallest index leads, preserving the cyclic
/// order (and so the face normal).
fn canonize(verts: &mut [u32; 3]) {
    if verts[0] < verts[1] && verts[0] < verts[2] {
        return;
    }
    let temp = verts[0];
    if verts[1] < verts[2] {
        verts[0] = verts[1];
        verts[1] = verts[2];
        verts[2] = temp;
    } else {
        verts[0] = verts[2];
        verts[2] = verts[1];
        verts[1] = temp;
    }
}

struct Simplify {
    verts: Vec<SVert>,
    faces: Vec<Option<SFace>>,
    faces_alive: usize,
    pairs: Vec<Option<SPair>>,
    pairs_free: Vec<u32>,
    tree: FTree<u32>,
}

impl Simplify {
    /// Best target position and cost for contracting `a` and `b`: the
    /// minimizer of the summed quadric, or the best of the endpoints and the
    /// midpoint when the system is singular.
    fn lowest_cost(&self, a: u32, b: u32) -> (Vec3, f32) {
        let mut qbar = [0.0f32; 10];
        for i in 0..10 {
            qbar[i] = self.verts[a as usize].q[i] + self.verts[b as usize].q[i];
        }
        let mat = Mat3::from_cols(
            Vec3::new(qbar[0], qbar[1], qbar[2]),
            Vec3::new(qbar[1], qbar[4], qbar[5]),
            Vec3::new(qbar[2], qbar[5], qbar[7]),
        );
        let bb = Vec3::new(-qbar[3], -qbar[6], -qbar[8]);
        if let Some(vbar) = solve3x3(mat, bb) {
            return (vbar, calc_cost(vbar, &qbar));
        }
        let va = self.verts[a as usize].v;
        let vb = self.verts[b as usize].v;
        let mid = 0.5 * (va + vb);
        let ca = calc_cost(va, &qbar);
        let cb = calc_cost(vb, &qbar);
        let cm = calc_cost(mid, &qbar);
        if ca <= cb {
            if cm <= ca {
                (mid, cm)
            } else {
                (va, ca)
            }
        } else if cm <= cb {
            (mid, cm)
        } else {
            (vb, cb)
        }
    }

    fn pair_new(&mut self, a: u32, b: u32) {
        let (vbar, cost) = self.lowest_cost(a, b);
        let id = match self.pairs_free.pop() {
            Some(id) => id,
            None => {
                self.pairs.push(None);
                (self.pairs.len() - 1) as u32
            }
        };
        let node = self.tree.insert(cost, id);
        self.pairs[id as usize] = Some(SPair { verts: [a, b], vbar, node });
        self.verts[a as usize].pairs.insert(b, id);
        self.verts[b as usize].pairs.insert(a, id);
    }

    fn face_new(&mut self, mut verts: [u32; 3]) {
        canonize(&mut verts);
        let kp = calc_kp(
            self.verts[verts[0] as usize].v,
            self.verts[verts[1] as usize].v,
            self.verts[verts[2] as usize].v,
        );
        let id = self.faces.len() as u32;
        for v in verts {
            let vert = &mut self.verts[v as usize];
            for i in 0..10 {
                vert.q[i] += kp[i];
            }
            vert.faces.push(id);
        }
        self.faces.push(Some(SFace { verts }));
        self.faces_alive += 1;
    }

    /// A contraction is disallowed if moving either endpoint to the target
    /// position flips the normal of any surviving incident face.
    fn allowed(&self, pair: u32) -> bool {
        let pair = self.pairs[pair as usize].as_ref().unwrap();
        for side in 0..2 {
            let a = pair.verts[side];
            let b = pair.verts[1 - side];
            for f in &self.verts[a as usize].faces {
                let face = self.faces[*f as usize].as_ref().unwrap();
                if face.verts.contains(&b) {
                    // The face goes away with the contraction.
                    continue;
                }
                let p = [
                    self.verts[face.verts[0] as usize].v,
                    self.verts[face.verts[1] as usize].v,
                    self.verts[face.verts[2] as usize].v,
                ];
                let orig = plane_norm(p[0], p[1], p[2]);
                let new = match face.verts.iter().position(|v| *v == a) {
                    Some(0) => plane_norm(pair.vbar, p[1], p[2]),
                    Some(1) => plane_norm(p[0], pair.vbar, p[2]),
                    Some(2) => plane_norm(p[0], p[1], pair.vbar),
                    _ => {
                        tracing::warn!("vertex not in its incident face");
                        continue;
                    }
                };
                if new.dot(orig) < 0.0 {
                    return false;
                }
            }
        }
        true
    }

    /// Contract the cheapest legal pair. `false` when no legal pair
    /// remains.
    fn contract_pair(&mut self) -> bool {
        let (node, pid) = loop {
            let Some(node) = self.tree.lowest() else {
                return false;
            };
            if self.tree.key(node).is_infinite() {
                tracing::warn!("all remaining pairs are disallowed");
                return false;
            }
            let pid = *self.tree.data(node);
            if self.allowed(pid) {
                break (node, pid);
            }
            self.tree.rekey(node, f32::INFINITY);
        };
        let (a, b, vbar) = {
            let pair = self.pairs[pid as usize].as_ref().unwrap();
            (pair.verts[0], pair.verts[1], pair.vbar)
        };
        for i in 0..10 {
            let qb = self.verts[b as usize].q[i];
            self.verts[a as usize].q[i] += qb;
        }
        self.verts[a as usize].v = vbar;
        self.verts[a as usize].pairs.remove(&b);
        self.verts[b as usize].pairs.remove(&a);

        // Re-cost every pair still touching the moved vertex.
        let a_pairs: Vec<u32> = self.verts[a as usize].pairs.values().copied().collect();
        for pp in a_pairs {
            let verts = self.pairs[pp as usize].as_ref().unwrap().verts;
            let (vbar, cost) = self.lowest_cost(verts[0], verts[1]);
            let pair = self.pairs[pp as usize].as_mut().unwrap();
            pair.vbar = vbar;
            self.tree.rekey(pair.node, cost);
        }

        // Rewire the dead vertex's pairs onto the survivor, dropping the
        // ones that would duplicate an existing pair.
        let b_pairs: Vec<(u32, u32)> = self.verts[b as usize]
            .pairs
            .iter()
            .map(|(v, p)| (*v, *p))
            .collect();
        for (vv, pp) in b_pairs {
            self.verts[vv as usize].pairs.remove(&b);
            if self.verts[a as usize].pairs.contains_key(&vv) {
                let node = self.pairs[pp as usize].as_ref().unwrap().node;
                self.tree.remove(node);
                self.pairs[pp as usize] = None;
                self.pairs_free.push(pp);
                continue;
            }
            {
                let pair = self.pairs[pp as usize].as_mut().unwrap();
                let slot = if pair.verts[0] == b { 0 } else { 1 };
                pair.verts[slot] = a;
            }
            self.verts[a as usize].pairs.insert(vv, pp);
            self.verts[vv as usize].pairs.insert(a, pp);
            let verts = self.pairs[pp as usize].as_ref().unwrap().verts;
            let (vbar, cost) = self.lowest_cost(verts[0], verts[1]);
            let pair = self.pairs[pp as usize].as_mut().unwrap();
            pair.vbar = vbar;
            self.tree.rekey(pair.node, cost);
        }

        // Faces on both endpoints collapse; faces only on the dead vertex
        // are redirected to the survivor.
        let contains_b = |face: &Option<SFace>| {
            face.as_ref().map(|f| f.verts.contains(&b)).unwrap_or(false)
        };
        let a_faces = std::mem::take(&mut self.verts[a as usize].faces);
        self.verts[a as usize].faces = a_faces
            .into_iter()
            .filter(|f| !contains_b(&self.faces[*f as usize]))
            .collect();
        let b_faces = std::mem::take(&mut self.verts[b as usize].faces);
        for f in b_faces {
            let verts = self.faces[f as usize].as_ref().unwrap().verts;
            if verts.contains(&a) {
                let c = if verts[0] != a && verts[0] != b {
                    verts[0]
                } else if verts[1] != a && verts[1] != b {
                    verts[1]
                } else {
                    verts[2]
                };
                let c_faces = &mut self.verts[c as usize].faces;
                if let Some(pos) = c_faces.iter().position(|x| *x == f) {
                    c_faces.remove(pos);
                }
                self.faces[f as usize] = None;
                self.faces_alive -= 1;
            } else {
                let face = self.faces[f as usize].as_mut().unwrap();
                for v in face.verts.iter_mut() {
                    if *v == b {
                        *v = a;
                    }
                }
                canonize(&mut face.verts);
                self.verts[a as usize].faces.push(f);
            }
        }

        self.tree.remove(node);
        self.pairs[pid as usize] = None;
        self.pairs_free.push(pid);
        true
    }
}

/// Simplify the triangle mesh down to at most `num_faces_out` faces. With
/// `aggregation_thresh > 0`, vertex pairs within that distance contract too,
/// which lets separate components fuse.
pub fn simplify(
    vl: &VertexList,
    num_faces_out: usize,
    aggregation_thresh: f32,
) -> Result<VertexList, Error> {
    if vl.floats_per_vert() < 3 {
        return Err(Error::TooFewCoords { needed: 3, got: vl.floats_per_vert() });
    }
    if vl.primitive() != Primitive::Triangle {
        return Err(Error::WrongPrimitive {
            expected: Primitive::Triangle,
            got: vl.primitive(),
        });
    }
    let mut sim = Simplify {
        verts: Vec::new(),
        faces: Vec::new(),
        faces_alive: 0,
        pairs: Vec::new(),
        pairs_free: Vec::new(),
        tree: FTree::new(),
    };
    // Canonical position list: its vertex indices name the graph vertices.
    let mut positions = VertexList::new(3, Primitive::Triangle);
    let num = vl.num_indices();
    let mut i = 0;
    while i + 2 < num {
        let mut verts = [0u32; 3];
        for c in 0..3 {
            let rec = vl.lookup(i + c);
            let idx = positions.add(&rec[..3])?;
            if idx as usize == sim.verts.len() {
                sim.verts.push(SVert {
                    v: Vec3::new(rec[0], rec[1], rec[2]),
                    q: [0.0; 10],
                    pairs: HashMap::new(),
                    faces: Vec::new(),
                });
            }
            verts[c] = idx;
        }
        sim.face_new(verts);
        i += 3;
    }

    for f in 0..sim.faces.len() {
        let verts = sim.faces[f].as_ref().unwrap().verts;
        for c in 0..3 {
            let (a, b) = (verts[c], verts[(c + 1) % 3]);
            if !sim.verts[a as usize].pairs.contains_key(&b) {
                sim.pair_new(a, b);
            }
        }
    }

    if aggregation_thresh > 0.0 {
        let bvh = Bvh::new(&positions, aggregation_thresh);
        let mut agg = Vec::new();
        bvh.pairs(aggregation_thresh, &mut |a, b| agg.push((a, b)));
        for (a, b) in agg {
            if !sim.verts[a as usize].pairs.contains_key(&b) {
                sim.pair_new(a, b);
            }
        }
    }

    tracing::debug!(num_faces = sim.faces_alive, target = num_faces_out, "simplifying");
    while sim.faces_alive > num_faces_out {
        if !sim.contract_pair() {
            tracing::warn!(
                remaining = sim.faces_alive,
                "no contractible pair left, stopping early"
            );
            break;
        }
    }

    let mut out = VertexList::new(3, Primitive::Triangle);
    for face in sim.faces.iter().flatten() {
        for v in face.verts {
            let p = sim.verts[v as usize].v;
            out.add(&[p.x, p.y, p.z])?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{mass::mass_properties, primitive::uv_sphere, testmesh::box_tris};

    #[test]
    fn t_target_met_is_noop() {
        let cube = box_tris(1.0, 1.0, 1.0);
        let out = simplify(&cube, 12, 0.0).expect("simplify failed");
        assert_eq!(out.num_indices(), 36);
        let props = mass_properties(&out).expect("mass failed");
        assert!((props.volume - 8.0).abs() < 1e-4);
    }

    #[test]
    fn t_sphere_to_twenty() {
        let sphere = uv_sphere(1.0, 16, 16).expect("sphere failed");
        let out = simplify(&sphere, 20, 0.0).expect("simplify failed");
        assert_eq!(out.num_indices() / 3, 20);
        let props = mass_properties(&out).expect("mass failed");
        let full = 4.0 * std::f64::consts::PI / 3.0;
        assert!(props.volume > 0.5 * full, "volume {}", props.volume);
        assert!(props.volume <= full);
        for c in props.center_of_mass {
            assert!(c.abs() < 1e-2, "center of mass {c}");
        }
    }

    #[test]
    fn t_face_count_monotone() {
        let sphere = uv_sphere(1.0, 12, 12).expect("sphere failed");
        let before = sphere.num_indices() / 3;
        let out = simplify(&sphere, before / 2, 0.0).expect("simplify failed");
        assert!(out.num_indices() / 3 <= before / 2);
    }

    #[test]
    fn t_aggregation_threshold_without_neighbors() {
        // No two vertices are within the threshold, so aggregation adds no
        // pairs and the result matches plain simplification.
        let cube = box_tris(1.0, 1.0, 1.0);
        let plain = simplify(&cube, 12, 0.0).expect("simplify failed");
        let agg = simplify(&cube, 12, 1e-3).expect("simplify failed");
        assert_eq!(plain.num_indices(), agg.num_indices());
    }

    #[test]
    fn t_wrong_input() {
        let vl = VertexList::new(3, Primitive::Point);
        assert!(matches!(
            simplify(&vl, 10, 0.0),
            Err(Error::WrongPrimitive { .. })
        ));
        let vl = VertexList::new(2, Primitive::Triangle);
        assert!(matches!(simplify(&vl, 10, 0.0), Err(Error::TooFewCoords { .. })));
    }
}
