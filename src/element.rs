use glam::Vec3;
use std::fmt::{Debug, Display};

/// All elements of a mesh implement this trait. They are identified by their
/// index into the arena that owns them.
pub trait Handle: From<u32> + Copy {
    /// The index of the element.
    fn index(&self) -> u32;
}

/// Vertex handle.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VH {
    idx: u32,
}

/// Edge handle.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EH {
    idx: u32,
}

/// Face handle.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FH {
    idx: u32,
}

impl Handle for VH {
    fn index(&self) -> u32 {
        self.idx
    }
}

impl From<u32> for VH {
    fn from(idx: u32) -> Self {
        VH { idx }
    }
}

impl Handle for EH {
    fn index(&self) -> u32 {
        self.idx
    }
}

impl From<u32> for EH {
    fn from(idx: u32) -> Self {
        EH { idx }
    }
}

impl Handle for FH {
    fn index(&self) -> u32 {
        self.idx
    }
}

impl From<u32> for FH {
    fn from(idx: u32) -> Self {
        FH { idx }
    }
}

impl Display for VH {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VH({})", self.index())
    }
}

impl Display for EH {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EH({})", self.index())
    }
}

impl Display for FH {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FH({})", self.index())
    }
}

impl Debug for VH {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VH({})", self.index())
    }
}

impl Debug for EH {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EH({})", self.index())
    }
}

impl Debug for FH {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FH({})", self.index())
    }
}

/// Vertex of a [`Vef`](crate::vef::Vef): a position and the edges incident on
/// it. Vertices are deduplicated by the bit pattern of their coordinates.
#[derive(Debug, Clone)]
pub(crate) struct Vertex {
    pub(crate) point: Vec3,
    pub(crate) edges: Vec<EH>,
}

/// Cached dihedral frame of an edge: unit direction `z` from the first vertex
/// to the second, `x` in the plane of the first face perpendicular to `z`,
/// and the dihedral angle in `[0, 2π)` measured from the first face to the
/// second about `z`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DihedralFrame {
    pub(crate) x: Vec3,
    pub(crate) z: Vec3,
    pub(crate) ang: f32,
}

/// Edge of a [`Vef`](crate::vef::Vef): an unordered vertex pair with up to
/// two incident faces.
#[derive(Debug, Clone)]
pub(crate) struct Edge {
    pub(crate) verts: [VH; 2],
    pub(crate) faces: [Option<FH>; 2],
    pub(crate) frame: Option<DihedralFrame>,
}

/// Face of a [`Vef`](crate::vef::Vef): an ordered CCW vertex triple, its
/// three edges, the unit normal, and the signed plane offset `dist = n·v0`.
/// The in-plane basis and the 2D coordinates of the second and third vertices
/// are filled on demand.
#[derive(Debug, Clone)]
pub(crate) struct Face {
    pub(crate) verts: [VH; 3],
    pub(crate) edges: [EH; 3],
    pub(crate) norm: Vec3,
    pub(crate) dist: f32,
    pub(crate) basis: Option<(Vec3, Vec3)>,
    pub(crate) coord2d: Option<Coord2d>,
}

/// 2D coordinates of a face's second and third vertices in its in-plane
/// basis: `v1` lies at `(v1_x, 0)` with `v1_x > 0`, `v2` at `v2_pos` with
/// `v2_pos.y > 0`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Coord2d {
    pub(crate) v1_x: f32,
    pub(crate) v2_pos: glam::Vec2,
}
