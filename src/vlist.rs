use crate::error::Error;
use glam::{vec2, vec3, Vec2, Vec3};
use std::collections::HashMap;

/// What the index array of a [`VertexList`] describes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Primitive {
    Point,
    Line,
    Triangle,
    Unspecified,
}

/// Indexed vertex buffer with optional geometric de-duplication.
///
/// A vertex is a record of `floats_per_vert` floats. While the list is open,
/// [`add`](Self::add) looks the record up by its exact bit pattern and
/// returns the existing index when one matches, so geometrically identical
/// vertices are shared. [`finalize`](Self::finalize) drops the lookup map
/// once no more vertices will be added.
pub struct VertexList {
    floats_per_vert: usize,
    primitive: Primitive,
    verts: Vec<f32>,
    indices: Vec<u32>,
    dedup: Option<HashMap<Box<[u32]>, u32>>,
}

fn bit_key(vert: &[f32]) -> Box<[u32]> {
    vert.iter().map(|f| f.to_bits()).collect()
}

impl VertexList {
    pub fn new(floats_per_vert: usize, primitive: Primitive) -> Self {
        debug_assert!(floats_per_vert >= 1);
        VertexList {
            floats_per_vert,
            primitive,
            verts: Vec::new(),
            indices: Vec::new(),
            dedup: Some(HashMap::new()),
        }
    }

    pub fn floats_per_vert(&self) -> usize {
        self.floats_per_vert
    }

    pub fn primitive(&self) -> Primitive {
        self.primitive
    }

    pub fn num_verts(&self) -> u32 {
        (self.verts.len() / self.floats_per_vert) as u32
    }

    pub fn num_indices(&self) -> usize {
        self.indices.len()
    }

    pub fn verts(&self) -> &[f32] {
        &self.verts
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Add a vertex record and append its index to the index array. Returns
    /// the index, which is the index of an existing bit-identical record if
    /// there is one.
    pub fn add(&mut self, vert: &[f32]) -> Result<u32, Error> {
        let index = self.add_vert(vert)?;
        self.add_index(index)
    }

    /// Intern a vertex record without touching the index array.
    pub fn add_vert(&mut self, vert: &[f32]) -> Result<u32, Error> {
        debug_assert_eq!(vert.len(), self.floats_per_vert);
        let next = self.num_verts();
        let dedup = self
            .dedup
            .as_mut()
            .expect("cannot add vertices to a finalized vertex list");
        match dedup.entry(bit_key(vert)) {
            std::collections::hash_map::Entry::Occupied(e) => Ok(*e.get()),
            std::collections::hash_map::Entry::Vacant(e) => {
                if next == u32::MAX {
                    return Err(Error::VertexLimitReached);
                }
                e.insert(next);
                self.verts.extend_from_slice(vert);
                Ok(next)
            }
        }
    }

    /// Append an index to the index array. Indices up to and including the
    /// current vertex count are accepted; the count itself is a sentinel.
    pub fn add_index(&mut self, index: u32) -> Result<u32, Error> {
        if index > self.num_verts() {
            return Err(Error::IndexOutOfRange(index));
        }
        self.indices.push(index);
        Ok(index)
    }

    /// Drop the de-duplication map. Adding vertices afterwards is a
    /// programming error.
    pub fn finalize(&mut self) {
        self.dedup = None;
    }

    /// Copy the indexed records into a fresh list with `new_floats_per_vert`
    /// floats each, re-deduplicating the truncated records.
    pub fn copy(&self, new_floats_per_vert: usize) -> Result<VertexList, Error> {
        if self.floats_per_vert < new_floats_per_vert {
            return Err(Error::TooFewCoords {
                needed: new_floats_per_vert,
                got: self.floats_per_vert,
            });
        }
        let mut out = VertexList::new(new_floats_per_vert, self.primitive);
        for i in 0..self.num_indices() {
            out.add(&self.lookup(i)[..new_floats_per_vert])?;
        }
        Ok(out)
    }

    /// The record of the vertex with index `index`.
    pub fn vert(&self, index: u32) -> &[f32] {
        let start = index as usize * self.floats_per_vert;
        &self.verts[start..start + self.floats_per_vert]
    }

    /// The record referenced by position `i` of the index array.
    pub fn lookup(&self, i: usize) -> &[f32] {
        self.vert(self.indices[i])
    }

    /// First three floats of the record at index-array position `i`.
    pub fn lookup_pos(&self, i: usize) -> Vec3 {
        let v = self.lookup(i);
        vec3(v[0], v[1], v[2])
    }

    /// First two floats of the record at index-array position `i`.
    pub fn lookup_pos2(&self, i: usize) -> Vec2 {
        let v = self.lookup(i);
        vec2(v[0], v[1])
    }

    /// First three floats of the vertex with index `index`.
    pub fn pos(&self, index: u32) -> Vec3 {
        let v = self.vert(index);
        vec3(v[0], v[1], v[2])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn t_add_dedups_bitwise() {
        let mut vl = VertexList::new(3, Primitive::Point);
        let a = vl.add(&[1.0, 2.0, 3.0]).expect("add failed");
        let b = vl.add(&[1.0, 2.0, 3.5]).expect("add failed");
        let c = vl.add(&[1.0, 2.0, 3.0]).expect("add failed");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(vl.num_verts(), 2);
        assert_eq!(vl.num_indices(), 3);
        assert_eq!(vl.indices(), &[a, b, a]);
    }

    #[test]
    fn t_negative_zero_is_distinct() {
        let mut vl = VertexList::new(1, Primitive::Point);
        let a = vl.add(&[0.0]).expect("add failed");
        let b = vl.add(&[-0.0]).expect("add failed");
        assert_ne!(a, b);
    }

    #[test]
    fn t_add_index_range() {
        let mut vl = VertexList::new(2, Primitive::Line);
        vl.add(&[0.0, 0.0]).expect("add failed");
        assert!(vl.add_index(0).is_ok());
        // The vertex count itself is permitted as a sentinel.
        assert!(vl.add_index(1).is_ok());
        assert!(matches!(vl.add_index(2), Err(Error::IndexOutOfRange(2))));
    }

    #[test]
    fn t_copy_truncates_and_redups() {
        let mut vl = VertexList::new(6, Primitive::Triangle);
        vl.add(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]).expect("add failed");
        vl.add(&[0.0, 0.0, 0.0, 0.0, 1.0, 0.0]).expect("add failed");
        vl.add(&[1.0, 1.0, 1.0, 0.0, 0.0, 1.0]).expect("add failed");
        assert_eq!(vl.num_verts(), 3);
        let out = vl.copy(3).expect("copy failed");
        // The two records that differ only in their normals collapse.
        assert_eq!(out.num_verts(), 2);
        assert_eq!(out.num_indices(), 3);
        assert_eq!(out.indices(), &[0, 0, 1]);
    }

    #[test]
    fn t_lookup() {
        let mut vl = VertexList::new(3, Primitive::Triangle);
        vl.add(&[0.0, 1.0, 2.0]).expect("add failed");
        vl.add(&[3.0, 4.0, 5.0]).expect("add failed");
        vl.add(&[0.0, 1.0, 2.0]).expect("add failed");
        assert_eq!(vl.lookup(2), &[0.0, 1.0, 2.0]);
        assert_eq!(vl.lookup_pos(1), vec3(3.0, 4.0, 5.0));
    }
}
