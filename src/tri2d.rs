//! Triangulation of planar polygons with holes by a monotone sweep.
//!
//! The input is an unordered set of 2D line segments forming simple, possibly
//! nested, possibly touching polygons. The sweep walks the vertices from the
//! top down. Every region currently being filled is an active monotone
//! polygon with a left and a right edge and a stack of reflex vertices on one
//! side; a region created by merging two others carries a second stack (a
//! cusp) until the next vertex resolves it. Active polygons are ordered by
//! the x of their left edge at the sweep y, which is how a vertex starting a
//! new region discovers the region enclosing it (a hole top or a split).

use crate::{
    error::Error,
    ftree::{FNode, FTree},
    vlist::{Primitive, VertexList},
};
use glam::Vec2;

const LEFT: usize = 0;
const RIGHT: usize = 1;

struct SweepVert {
    point: Vec2,
    edges: Vec<u32>,
}

struct SweepEdge {
    verts: [u32; 2],
    mp: Option<u32>,
}

struct MonoPoly {
    /// Reflex vertices waiting to be connected, deepest first. `None` until
    /// the first vertex past the top arrives.
    stack0: Option<Vec<u32>>,
    /// Second stack after a merge; resolved by the next vertex.
    stack1: Option<Vec<u32>>,
    top: u32,
    top_side: usize,
    active_edge: [u32; 2],
    node: Option<FNode>,
}

struct Poly {
    verts: Vec<SweepVert>,
    edges: Vec<SweepEdge>,
    vtree: FTree<u32>,
    mps: Vec<Option<MonoPoly>>,
    mps_free: Vec<u32>,
    mtree: FTree<u32>,
    out: VertexList,
}

/// x of `e` at height `yy`, the midpoint x for horizontal edges.
fn edge_pos(edges: &[SweepEdge], verts: &[SweepVert], e: u32, yy: f32) -> f32 {
    let aa = verts[edges[e as usize].verts[0] as usize].point;
    let bb = verts[edges[e as usize].verts[1] as usize].point;
    if aa.y == bb.y {
        0.5 * (aa.x + bb.x)
    } else {
        (bb.x - aa.x) * (yy - aa.y) / (bb.y - aa.y) + aa.x
    }
}

fn dist2(a: Vec2, b: Vec2) -> f32 {
    (a - b).length_squared()
}

impl Poly {
    fn new(vl: &VertexList) -> Result<Self, Error> {
        let mut poly = Poly {
            verts: Vec::with_capacity(vl.num_verts() as usize),
            edges: Vec::new(),
            vtree: FTree::new(),
            mps: Vec::new(),
            mps_free: Vec::new(),
            mtree: FTree::new(),
            out: VertexList::new(2, Primitive::Triangle),
        };
        for i in 0..vl.num_verts() {
            let rec = vl.vert(i);
            let point = Vec2::new(rec[0], rec[1]);
            poly.vtree.insert(point.y, i);
            poly.verts.push(SweepVert { point, edges: Vec::new() });
        }
        let ind = vl.indices();
        let num = ind.len() & !1;
        for pair in ind[..num].chunks_exact(2) {
            poly.add_edge(pair[0], pair[1]);
        }
        Ok(poly)
    }

    /// Register a segment. Self-loops are dropped and a segment given twice
    /// cancels out entirely.
    fn add_edge(&mut self, v1: u32, v2: u32) {
        if v1 == v2 {
            return;
        }
        if let Some(e) = self.find_edge(v1, v2) {
            self.verts[v1 as usize].edges.retain(|x| *x != e);
            self.verts[v2 as usize].edges.retain(|x| *x != e);
            return;
        }
        let e = self.edges.len() as u32;
        self.edges.push(SweepEdge { verts: [v1, v2], mp: None });
        self.verts[v1 as usize].edges.push(e);
        self.verts[v2 as usize].edges.push(e);
    }

    fn find_edge(&self, v1: u32, v2: u32) -> Option<u32> {
        self.verts[v1 as usize].edges.iter().copied().find(|e| {
            let verts = self.edges[*e as usize].verts;
            verts[0] == v2 || verts[1] == v2
        })
    }

    /// Angle of `e` as seen from its endpoint `r`. An exactly-backward
    /// horizontal edge that is not yet part of a region sorts as the lowest
    /// angle instead of the highest.
    fn edge_ang(&self, e: u32, r: u32) -> f32 {
        let edge = &self.edges[e as usize];
        let p1 = self.verts[r as usize].point;
        let other = if edge.verts[0] == r {
            edge.verts[1]
        } else if edge.verts[1] == r {
            edge.verts[0]
        } else {
            tracing::error!("edge does not contain its reference vertex");
            return 0.0;
        };
        let p2 = self.verts[other as usize].point;
        let ang = (p2.y - p1.y).atan2(p2.x - p1.x);
        if (std::f32::consts::PI - ang).abs() < 1e-5 && edge.mp.is_none() {
            return -ang;
        }
        ang
    }

    fn orient_edge(&mut self, e: u32, top: u32) -> Result<(), Error> {
        let verts = &mut self.edges[e as usize].verts;
        if verts[0] != top {
            if verts[1] != top {
                return Err(Error::TopologyBroken("edge does not contain its top vertex"));
            }
            verts.swap(0, 1);
        }
        Ok(())
    }

    /// Emit `(p1, p2, p3)` unless a same-side emission is degenerate or
    /// wrongly oriented: the orientation determinant must clear a tolerance
    /// mixed from the two longest squared side lengths.
    fn add_triangle(&mut self, p1: u32, p2: u32, p3: u32, is_opp: bool) -> Result<bool, Error> {
        let a = self.verts[p1 as usize].point;
        let b = self.verts[p2 as usize].point;
        let c = self.verts[p3 as usize].point;
        if !is_opp {
            let v1 = b - a;
            let v2 = c - b;
            let det = v2.x * v1.y - v2.y * v1.x;
            let mut d1 = dist2(a, b);
            let mut d2 = dist2(a, c);
            let d3 = dist2(b, c);
            if d2 > d1 {
                std::mem::swap(&mut d1, &mut d2);
            }
            if d3 > d2 {
                d2 = d3;
            }
            let tol = 1e-6 * d1.sqrt() * d2.sqrt();
            if det <= tol {
                return Ok(false);
            }
        }
        self.out.add(&[a.x, a.y])?;
        self.out.add(&[b.x, b.y])?;
        self.out.add(&[c.x, c.y])?;
        Ok(true)
    }

    /// The stack discipline shared by every add path. `stack0`, `top` and
    /// `top_side` belong to the caller so cusp resolution can run it against
    /// a detached stack.
    fn add_vert_core(
        &mut self,
        stack0: &mut Option<Vec<u32>>,
        top: &mut u32,
        top_side: &mut usize,
        vert: u32,
        side: usize,
    ) -> Result<(), Error> {
        let stack = match stack0 {
            None => {
                *stack0 = Some(vec![*top]);
                *top = vert;
                *top_side = side;
                return Ok(());
            }
            Some(stack) => stack,
        };
        let mut prev = *top;
        if side == *top_side {
            while let Some(prev2) = stack.pop() {
                let ok = if side == LEFT {
                    self.add_triangle(vert, prev, prev2, false)?
                } else {
                    self.add_triangle(vert, prev2, prev, false)?
                };
                if !ok {
                    stack.push(prev2);
                    break;
                }
                prev = prev2;
            }
        } else {
            let mut hold = prev;
            while let Some(prev2) = stack.pop() {
                let ok = if side == LEFT {
                    self.add_triangle(vert, prev2, hold, true)?
                } else {
                    self.add_triangle(vert, hold, prev2, true)?
                };
                if !ok {
                    stack.push(prev2);
                    break;
                }
                hold = prev2;
            }
        }
        stack.push(prev);
        *top = vert;
        *top_side = side;
        Ok(())
    }

    fn mp_add_vert_simple(&mut self, mp: u32, vert: u32, side: usize) -> Result<(), Error> {
        let m = self.mps[mp as usize].as_mut().unwrap();
        let mut stack0 = m.stack0.take();
        let mut top = m.top;
        let mut top_side = m.top_side;
        let result = self.add_vert_core(&mut stack0, &mut top, &mut top_side, vert, side);
        let m = self.mps[mp as usize].as_mut().unwrap();
        m.stack0 = stack0;
        m.top = top;
        m.top_side = top_side;
        result
    }

    fn mp_add_vert(&mut self, mp: u32, vert: u32, side: usize) -> Result<(), Error> {
        if self.mps[mp as usize].as_ref().unwrap().stack1.is_some() {
            // Resolve the cusp: run the vertex against the stack on its own
            // side, then discard that stack and keep the other.
            let m = self.mps[mp as usize].as_mut().unwrap();
            let mut taken = if side == LEFT { m.stack0.take() } else { m.stack1.take() };
            let mut top = m.top;
            let mut top_side = 1 - side;
            self.add_vert_core(&mut taken, &mut top, &mut top_side, vert, side)?;
            let m = self.mps[mp as usize].as_mut().unwrap();
            if side == LEFT {
                m.stack0 = m.stack1.take();
            }
            m.stack1 = None;
            m.top_side = side;
        }
        self.mp_add_vert_simple(mp, vert, side)
    }

    /// Continue `mp` through `vert` onto a new bottom edge.
    fn mp_adv_edge(&mut self, mp: u32, edge: u32, vert: u32) -> Result<(), Error> {
        self.orient_edge(edge, vert)?;
        let m = self.mps[mp as usize].as_ref().unwrap();
        let side = if self.edges[m.active_edge[0] as usize].verts[1] == vert {
            0
        } else if self.edges[m.active_edge[1] as usize].verts[1] == vert {
            1
        } else {
            return Err(Error::TopologyBroken("vertex not found when advancing an edge"));
        };
        self.mps[mp as usize].as_mut().unwrap().active_edge[side] = edge;
        self.edges[edge as usize].mp = Some(mp);
        self.mp_add_vert(mp, vert, side)
    }

    /// Fuse two regions meeting at `vert`. The right region's stack becomes
    /// the left one's cusp.
    fn mp_merge(&mut self, left: u32, right: u32, vert: u32) -> Result<(), Error> {
        let left_edges = self.mps[left as usize].as_ref().unwrap().active_edge;
        let right_edges = self.mps[right as usize].as_ref().unwrap().active_edge;
        if self.edges[left_edges[RIGHT] as usize].verts[1] != vert
            || self.edges[right_edges[LEFT] as usize].verts[1] != vert
        {
            if self.edges[left_edges[LEFT] as usize].verts[1] == vert
                && self.edges[right_edges[RIGHT] as usize].verts[1] == vert
            {
                tracing::warn!("swapped left and right in merge");
                return self.mp_merge(right, left, vert);
            }
            if self.edges[left_edges[LEFT] as usize].verts[1] == vert {
                tracing::warn!("polygon crossing detected");
                self.mps[left as usize].as_mut().unwrap().active_edge.swap(0, 1);
            }
            if self.edges[right_edges[RIGHT] as usize].verts[1] == vert {
                tracing::warn!("polygon crossing detected");
                self.mps[right as usize].as_mut().unwrap().active_edge.swap(0, 1);
            }
            let left_edges = self.mps[left as usize].as_ref().unwrap().active_edge;
            let right_edges = self.mps[right as usize].as_ref().unwrap().active_edge;
            if self.edges[left_edges[RIGHT] as usize].verts[1] != vert
                || self.edges[right_edges[LEFT] as usize].verts[1] != vert
            {
                return Err(Error::TopologyBroken("incorrect vertex when merging"));
            }
        }
        self.mp_add_vert(left, vert, RIGHT)?;
        self.mp_add_vert(right, vert, LEFT)?;
        let right_stack = self.mps[right as usize].as_mut().unwrap().stack0.take();
        let right_active = self.mps[right as usize].as_ref().unwrap().active_edge[RIGHT];
        let m = self.mps[left as usize].as_mut().unwrap();
        m.stack1 = right_stack;
        m.active_edge[RIGHT] = right_active;
        self.edges[right_active as usize].mp = Some(left);
        let node = self.mps[right as usize].as_ref().unwrap().node.unwrap();
        self.mtree.remove(node);
        self.mps[right as usize] = None;
        self.mps_free.push(right);
        Ok(())
    }

    /// Split `mp` in two at the top vertex of `mp_new` (a hole top or a
    /// split vertex strictly inside `mp`).
    fn mp_split(&mut self, mp: u32, mp_new: u32) -> Result<(), Error> {
        let (left, right, vert) = {
            let m = self.mps[mp_new as usize].as_ref().unwrap();
            (m.active_edge[LEFT], m.active_edge[RIGHT], m.top)
        };
        let (old_top, old_side, old_right) = {
            let m = self.mps[mp as usize].as_ref().unwrap();
            (m.top, m.top_side, m.active_edge[RIGHT])
        };
        {
            let m = self.mps[mp_new as usize].as_mut().unwrap();
            m.top = old_top;
            m.top_side = old_side;
            m.active_edge[RIGHT] = old_right;
            m.active_edge[LEFT] = right;
        }
        self.edges[old_right as usize].mp = Some(mp_new);
        self.mps[mp as usize].as_mut().unwrap().active_edge[RIGHT] = left;
        self.edges[left as usize].mp = Some(mp);
        if self.mps[mp as usize].as_ref().unwrap().stack1.is_some() {
            let stack1 = self.mps[mp as usize].as_mut().unwrap().stack1.take();
            let m_new = self.mps[mp_new as usize].as_mut().unwrap();
            m_new.stack0 = stack1;
            m_new.top_side = LEFT;
            self.mps[mp as usize].as_mut().unwrap().top_side = RIGHT;
        } else if old_side == LEFT {
            let stack0 = self.mps[mp as usize].as_mut().unwrap().stack0.take();
            self.mps[mp_new as usize].as_mut().unwrap().stack0 = stack0;
        }
        self.mp_add_vert_simple(mp_new, vert, LEFT)?;
        self.mp_add_vert_simple(mp, vert, RIGHT)?;
        Ok(())
    }

    fn mp_new(&mut self, left: u32, right: u32, start: u32) -> Result<u32, Error> {
        self.orient_edge(left, start)?;
        self.orient_edge(right, start)?;
        let mp = MonoPoly {
            stack0: None,
            stack1: None,
            top: start,
            top_side: 0,
            active_edge: [left, right],
            node: None,
        };
        let id = match self.mps_free.pop() {
            Some(id) => {
                self.mps[id as usize] = Some(mp);
                id
            }
            None => {
                self.mps.push(Some(mp));
                (self.mps.len() - 1) as u32
            }
        };
        let yy = self.verts[start as usize].point.y;
        let Poly { mtree, mps, edges, verts, .. } = self;
        let node = mtree.insert_dyn(id, |mp| {
            edge_pos(edges, verts, mps[*mp as usize].as_ref().unwrap().active_edge[LEFT], yy)
        });
        self.mps[id as usize].as_mut().unwrap().node = Some(node);
        self.edges[left as usize].mp = Some(id);
        self.edges[right as usize].mp = Some(id);
        Ok(id)
    }

    /// Start a region at `start`, and if an existing region encloses it,
    /// split that one around the new pair of edges instead.
    fn mp_new_smart(&mut self, left: u32, right: u32, start: u32) -> Result<(), Error> {
        let id = self.mp_new(left, right, start)?;
        let node = self.mps[id as usize].as_ref().unwrap().node.unwrap();
        let Some(prev) = self.mtree.prev(node) else {
            return Ok(());
        };
        let enclosing = *self.mtree.data(prev);
        let start_pt = self.verts[start as usize].point;
        let enclosing_right = self.mps[enclosing as usize].as_ref().unwrap().active_edge[RIGHT];
        if edge_pos(&self.edges, &self.verts, enclosing_right, start_pt.y) > start_pt.x {
            return self.mp_split(enclosing, id);
        }
        Ok(())
    }

    /// Close `mp` at its bottom vertex.
    fn mp_finish(&mut self, mp: u32, vert: u32) -> Result<(), Error> {
        if self.mps[mp as usize].as_ref().unwrap().stack1.is_some() {
            self.mp_add_vert(mp, vert, RIGHT)?;
            let m = self.mps[mp as usize].as_mut().unwrap();
            let top = m
                .stack0
                .as_mut()
                .and_then(|s| s.pop())
                .ok_or(Error::TopologyBroken("cusp stack drained before finish"))?;
            m.top = top;
            m.top_side = 1;
        }
        let side = 1 - self.mps[mp as usize].as_ref().unwrap().top_side;
        self.mp_add_vert_simple(mp, vert, side)
    }

    fn triangulate(&mut self) -> Result<(), Error> {
        let mut events = Vec::new();
        let mut cursor = self.vtree.highest();
        while let Some(node) = cursor {
            events.push(*self.vtree.data(node));
            cursor = self.vtree.prev(node);
        }
        let mut tops: Vec<(f32, u32)> = Vec::new();
        let mut bots: Vec<(f32, u32)> = Vec::new();
        for vert in events {
            let incident = self.verts[vert as usize].edges.clone();
            if incident.is_empty() {
                continue;
            }
            if incident.len() & 1 == 1 {
                return Err(Error::OddEdgeCount { vertex: vert, edges: incident.len() });
            }
            tops.clear();
            bots.clear();
            for e in incident {
                let ang = self.edge_ang(e, vert);
                if self.edges[e as usize].mp.is_some() {
                    tops.push((ang, e));
                } else {
                    bots.push((ang, e));
                }
            }
            // Stable sorts keep insertion order among exact angle ties, the
            // same tie rule the trees would give.
            tops.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());
            bots.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
            let mut ti = 0;
            let mut bi = 0;
            while ti < tops.len() {
                let e = tops[ti].1;
                let mp = self.edges[e as usize].mp.unwrap();
                if ti + 1 < tops.len()
                    && self.edges[tops[ti + 1].1 as usize].mp == Some(mp)
                {
                    self.mp_finish(mp, vert)?;
                    let node = self.mps[mp as usize].as_ref().unwrap().node.unwrap();
                    self.mtree.remove(node);
                    self.mps[mp as usize] = None;
                    self.mps_free.push(mp);
                    ti += 2;
                    continue;
                }
                if bi < bots.len() {
                    self.mp_adv_edge(mp, bots[bi].1, vert)?;
                    bi += 1;
                    ti += 1;
                    continue;
                }
                if ti + 1 >= tops.len() {
                    return Err(Error::TopologyBroken("unpaired active edge at a vertex"));
                }
                let other = self.edges[tops[ti + 1].1 as usize].mp.unwrap();
                self.mp_merge(mp, other, vert)?;
                ti += 2;
            }
            while bi < bots.len() {
                if bi + 1 >= bots.len() {
                    return Err(Error::TopologyBroken("unpaired starting edge at a vertex"));
                }
                self.mp_new_smart(bots[bi].1, bots[bi + 1].1, vert)?;
                bi += 2;
            }
        }
        Ok(())
    }
}

/// Triangulate the interior of the polygons described by the line segments
/// of `vl` (2 floats per vertex, [`Primitive::Line`]). Returns 2D triangles
/// consistently wound clockwise in the input frame.
pub fn triangulate_2d(vl: &VertexList) -> Result<VertexList, Error> {
    if vl.floats_per_vert() != 2 {
        return Err(Error::TooFewCoords { needed: 2, got: vl.floats_per_vert() });
    }
    if vl.primitive() != Primitive::Line {
        return Err(Error::WrongPrimitive {
            expected: Primitive::Line,
            got: vl.primitive(),
        });
    }
    tracing::debug!(num_edges = vl.num_indices() / 2, "triangulating");
    let mut poly = Poly::new(vl)?;
    poly.triangulate()?;
    tracing::debug!(num_triangles = poly.out.num_indices() / 3, "triangulation done");
    Ok(poly.out)
}
