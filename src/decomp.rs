//! Approximate convex decomposition.
//!
//! Based on: Thul, Daniel et al., Approximate Convex Decomposition and
//! Transfer for Animated Meshes, 2018.
//!
//! Each part carries its convex hull and the volume gap between the two.
//! The loop picks the worst-fitting part and tries candidate cut planes
//! swept between the two faces of its most concave edges; concavity is
//! ranked by shooting a ray from each edge midpoint along the dihedral
//! bisector and measuring how far it travels before leaving the part's
//! hull. The candidate with the lowest sum of squared part errors wins.

use crate::{
    cut::plane_cut,
    element::{Handle, EH, FH},
    error::Error,
    ftree::FTree,
    hull::convex_hull,
    mass::mass_properties,
    transform::{Transform, NO_OFFSET},
    vef::Vef,
    vlist::VertexList,
};
use glam::Vec3;
use std::collections::{HashSet, VecDeque};

const NUM_EDGES: usize = 16;
const NUM_ANGLES: usize = 9;

struct Part {
    vl: VertexList,
    hull: VertexList,
    err: f32,
    stuck: bool,
}

fn convex_error(vl: &VertexList, hull: &VertexList) -> Result<f32, Error> {
    let mp = mass_properties(vl)?;
    let mpc = mass_properties(hull)?;
    Ok((mpc.volume - mp.volume) as f32)
}

/// Hull every piece with more than 4 vertices into a [`Part`]; smaller
/// pieces are too degenerate to hull and are dropped with a warning.
fn convert(pieces: Vec<VertexList>) -> Result<(Vec<Part>, f32), Error> {
    let mut parts = Vec::new();
    let mut err = 0.0;
    for vl in pieces {
        if vl.num_verts() > 4 {
            let hull = convex_hull(&vl)?;
            let part_err = convex_error(&vl, &hull)?;
            err += part_err;
            parts.push(Part { vl, hull, err: part_err, stuck: false });
        } else {
            tracing::warn!(
                num_verts = vl.num_verts(),
                "skipping a piece with too few points to hull"
            );
        }
    }
    Ok((parts, err))
}

/// Rank every edge of `full` by how far the bisecting ray from its midpoint
/// travels to the boundary of `hull`: the furthest rays mark the deepest
/// concavities.
fn furthest_edges(full: &mut Vef, hull: &mut Vef) -> Result<FTree<EH>, Error> {
    if full.edges.is_empty() {
        return Err(Error::TopologyBroken("part with no edges"));
    }
    let mut tree = FTree::new();
    let mut visited: HashSet<EH> = HashSet::new();
    let mut queue: VecDeque<EH> = VecDeque::new();
    let first: EH = 0u32.into();
    visited.insert(first);
    queue.push_back(first);
    let mut start: Option<FH> = None;
    while let Some(e) = queue.pop_front() {
        let frame = full.calc_info(e)?;
        let verts = full.edges[e.index() as usize].verts;
        let mid = 0.5 * (full.point(verts[0]) + full.point(verts[1]));
        let mut trans = Transform::new();
        trans.rotate(frame.ang / 2.0, frame.z);
        let dir = trans.apply_point(frame.x, NO_OFFSET);
        let dist = hull.convex_ray_dist(mid, dir, &mut start)?;
        tree.insert(dist, e);
        for v in verts {
            for other in full.verts[v.index() as usize].edges.clone() {
                if visited.insert(other) {
                    queue.push_back(other);
                }
            }
        }
    }
    Ok(tree)
}

/// Search the candidate cut planes of `part` and return the best split, or
/// `None` when no candidate produces one.
fn cut_part(part: &Part) -> Result<Option<(Vec<Part>, f32)>, Error> {
    let mut full = Vef::new(&part.vl)?;
    let mut hull = Vef::new(&part.hull)?;
    let tree = furthest_edges(&mut full, &mut hull)?;
    tracing::debug!(
        num_verts = full.verts.len(),
        num_edges = full.edges.len(),
        num_faces = full.faces.len(),
        "searching cut planes"
    );
    let mut min: Option<(Vec<Part>, f32)> = None;
    let mut min_err = f32::INFINITY;
    let mut node = tree.highest();
    let mut count = 0;
    while count < NUM_EDGES {
        let Some(cur) = node else {
            break;
        };
        let e = *tree.data(cur);
        let frame = full.calc_info(e)?;
        let edge = &full.edges[e.index() as usize];
        let p0 = full.point(edge.verts[0]);
        let f0 = edge.faces[0].ok_or(Error::TopologyBroken("edge with no face"))?;
        let f1 = edge.faces[1].ok_or(Error::TopologyBroken("edge with a single face"))?;
        let mut norm = full.faces[f0.index() as usize].norm;
        let mut trans = Transform::new();
        trans.rotate(frame.ang / NUM_ANGLES as f32, frame.z);
        for ang_count in (1..NUM_ANGLES).rev() {
            let nn = if ang_count == 0 {
                full.faces[f1.index() as usize].norm
            } else {
                norm
            };
            let dist = nn.dot(p0);
            match plane_cut(&part.vl, nn, dist).and_then(convert) {
                Ok((parts, _)) => {
                    let mut err: f32 = parts.iter().map(|p| p.err * p.err).sum();
                    err *= 1.0 + 1e-3 * (count as f32 - ((NUM_EDGES - 1) / 2) as f32).abs();
                    if err < min_err {
                        min_err = err;
                        min = Some((parts, err));
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "candidate cut failed");
                }
            }
            norm = trans.apply_point(norm, NO_OFFSET).normalize_or_zero();
        }
        node = tree.prev(cur);
        count += 1;
    }
    Ok(min)
}

/// Decompose the mesh into approximately convex parts and return their
/// hulls. The loop cuts the worst part until the total volume error drops
/// below `threshold` times the input volume, skipping parts that cannot be
/// cut.
pub fn convex_decomp(vl: &VertexList, threshold: f32) -> Result<Vec<VertexList>, Error> {
    let props = mass_properties(vl)?;
    let thresh = threshold * props.volume as f32;
    let pieces = plane_cut(vl, Vec3::X, f32::INFINITY)?;
    let (mut parts, mut err) = convert(pieces)?;
    tracing::debug!(err, thresh, num_parts = parts.len(), "initial decomposition");
    while err > thresh {
        let worst = parts
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.stuck)
            .max_by(|a, b| a.1.err.partial_cmp(&b.1.err).unwrap())
            .map(|(i, _)| i);
        let Some(worst) = worst else {
            break;
        };
        match cut_part(&parts[worst]) {
            Ok(Some((new_parts, _))) => {
                parts.swap_remove(worst);
                parts.extend(new_parts);
            }
            Ok(None) => {
                // Keep the part as-is; it no longer counts toward the
                // worst-part selection.
                parts[worst].stuck = true;
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not cut a part, keeping it whole");
                parts[worst].stuck = true;
            }
        }
        err = parts.iter().map(|p| p.err).sum();
        tracing::debug!(err, thresh, num_parts = parts.len(), "decomposition step");
    }
    Ok(parts.into_iter().map(|p| p.hull).collect())
}
