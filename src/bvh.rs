//! Median-split bounding-volume hierarchy over the vertices of a
//! [`VertexList`], used to enumerate all vertex pairs within a distance.
//! Nodes split along the widest axis of their box at the median coordinate
//! until the axis range drops below the query distance or fewer than four
//! points remain.

use crate::{ftree::FTree, vlist::VertexList};
use glam::Vec3;

struct BvhNode {
    min: Vec3,
    max: Vec3,
    a: Option<Box<BvhNode>>,
    b: Option<Box<BvhNode>>,
    points: Option<Vec<u32>>,
}

impl BvhNode {
    fn new() -> Self {
        BvhNode {
            min: Vec3::INFINITY,
            max: Vec3::NEG_INFINITY,
            a: None,
            b: None,
            points: Some(Vec::new()),
        }
    }

    fn insert(&mut self, p: Vec3, idx: u32) {
        for c in 0..3 {
            if p[c] < self.min[c] {
                self.min[c] = p[c];
            }
            if p[c] > self.max[c] {
                self.max[c] = p[c];
            }
        }
        self.points.as_mut().unwrap().push(idx);
    }

    fn split(&mut self, dist: f32, vl: &VertexList) {
        let points = self.points.as_ref().unwrap();
        if points.len() < 4 {
            return;
        }
        let range = self.max - self.min;
        let axis = if range.x >= range.y && range.x >= range.z {
            0
        } else if range.y >= range.z {
            1
        } else {
            2
        };
        if range[axis] < dist {
            return;
        }
        let mut tree = FTree::new();
        for idx in points {
            tree.insert(vl.pos(*idx)[axis], *idx);
        }
        let mut median = tree.key(tree.median().unwrap());
        if median == self.max[axis] || median == self.min[axis] {
            median = 0.5 * (self.max[axis] + self.min[axis]);
        }
        let mut a = Box::new(BvhNode::new());
        let mut b = Box::new(BvhNode::new());
        for idx in self.points.take().unwrap() {
            let p = vl.pos(idx);
            let child = if p[axis] <= median { &mut a } else { &mut b };
            child.insert(p, idx);
        }
        a.split(dist, vl);
        b.split(dist, vl);
        self.a = Some(a);
        self.b = Some(b);
    }
}

/// Squared gap between two boxes, zero where they overlap.
fn box_dist2(a: &BvhNode, b: &BvhNode) -> f32 {
    let mut range = Vec3::ZERO;
    for c in 0..3 {
        if a.min[c] < b.min[c] {
            if a.max[c] < b.min[c] {
                range[c] = b.min[c] - a.max[c];
            }
        } else if b.max[c] < a.min[c] {
            range[c] = a.min[c] - b.max[c];
        }
    }
    range.length_squared()
}

pub(crate) struct Bvh<'a> {
    vl: &'a VertexList,
    root: BvhNode,
}

impl<'a> Bvh<'a> {
    pub fn new(vl: &'a VertexList, dist: f32) -> Self {
        let mut root = BvhNode::new();
        for idx in 0..vl.num_verts() {
            root.insert(vl.pos(idx), idx);
        }
        root.split(dist, vl);
        Bvh { vl, root }
    }

    /// Call `func` for every pair of vertices closer than `dist`. Cross-leaf
    /// pairs are reported from both sides; the caller is expected to
    /// de-duplicate.
    pub fn pairs(&self, dist: f32, func: &mut impl FnMut(u32, u32)) {
        self.node_pairs(&self.root, dist * dist, func);
    }

    fn node_pairs(&self, node: &BvhNode, dist2: f32, func: &mut impl FnMut(u32, u32)) {
        if let Some(a) = &node.a {
            self.node_pairs(a, dist2, func);
        }
        if let Some(b) = &node.b {
            self.node_pairs(b, dist2, func);
        }
        if let Some(points) = &node.points {
            for (i, p1) in points.iter().enumerate() {
                for p2 in points.iter().skip(i + 1) {
                    if self.vl.pos(*p1).distance_squared(self.vl.pos(*p2)) < dist2 {
                        func(*p1, *p2);
                    }
                }
            }
            self.search(&self.root, node, dist2, func);
        }
    }

    fn search(
        &self,
        node: &BvhNode,
        base: &BvhNode,
        dist2: f32,
        func: &mut impl FnMut(u32, u32),
    ) {
        if std::ptr::eq(node, base) || box_dist2(node, base) > dist2 {
            return;
        }
        if let Some(a) = &node.a {
            self.search(a, base, dist2, func);
        }
        if let Some(b) = &node.b {
            self.search(b, base, dist2, func);
        }
        if let Some(points) = &node.points {
            for p1 in points {
                for p2 in base.points.as_ref().unwrap() {
                    if self.vl.pos(*p1).distance_squared(self.vl.pos(*p2)) < dist2 {
                        func(*p1, *p2);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vlist::Primitive;
    use std::collections::HashSet;

    fn grid(n: usize, step: f32) -> VertexList {
        let mut vl = VertexList::new(3, Primitive::Point);
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    vl.add(&[i as f32 * step, j as f32 * step, k as f32 * step])
                        .expect("add failed");
                }
            }
        }
        vl
    }

    fn brute_pairs(vl: &VertexList, dist: f32) -> HashSet<(u32, u32)> {
        let mut set = HashSet::new();
        for i in 0..vl.num_verts() {
            for j in (i + 1)..vl.num_verts() {
                if vl.pos(i).distance_squared(vl.pos(j)) < dist * dist {
                    set.insert((i, j));
                }
            }
        }
        set
    }

    #[test]
    fn t_pairs_match_brute_force() {
        let vl = grid(4, 1.0);
        let dist = 1.25;
        let bvh = Bvh::new(&vl, dist);
        let mut found = HashSet::new();
        bvh.pairs(dist, &mut |a, b| {
            let key = (a.min(b), a.max(b));
            found.insert(key);
        });
        assert_eq!(found, brute_pairs(&vl, dist));
    }

    #[test]
    fn t_small_cloud_stays_one_leaf() {
        let vl = grid(1, 1.0);
        let bvh = Bvh::new(&vl, 0.5);
        let mut count = 0;
        bvh.pairs(0.5, &mut |_, _| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn t_no_pairs_beyond_distance() {
        let vl = grid(3, 10.0);
        let bvh = Bvh::new(&vl, 1.0);
        let mut count = 0;
        bvh.pairs(1.0, &mut |_, _| count += 1);
        assert_eq!(count, 0);
    }
}
