use crate::vlist::Primitive;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    // Input validation.
    WrongPrimitive { expected: Primitive, got: Primitive },
    TooFewCoords { needed: usize, got: usize },
    IndexOutOfRange(u32),
    VertexLimitReached,
    // Convex hull.
    TooFewPoints(u32),
    ColinearInput,
    CoplanarInput,
    // 2D triangulation.
    OddEdgeCount { vertex: u32, edges: usize },
    // Numerics and internal consistency.
    Degenerate(&'static str),
    TopologyBroken(&'static str),
    // File I/O.
    UnknownFormat(PathBuf),
    AsciiStlUnsupported,
    SvgReadUnsupported,
    StlNeedsSingleMesh(usize),
    ObjLoadFailed(String),
    Io(std::io::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::WrongPrimitive { expected, got } => {
                write!(f, "wrong primitive type: expected {expected:?}, got {got:?}")
            }
            Error::TooFewCoords { needed, got } => {
                write!(f, "too few floats per vertex: need {needed}, got {got}")
            }
            Error::IndexOutOfRange(i) => write!(f, "vertex index out of range: {i}"),
            Error::VertexLimitReached => write!(f, "too many vertices in a single vertex list"),
            Error::TooFewPoints(n) => {
                write!(f, "cannot build convex hull from {n} unique points, need at least 4")
            }
            Error::ColinearInput => write!(f, "cannot build convex hull: all points are colinear"),
            Error::CoplanarInput => write!(f, "cannot build convex hull: all points are coplanar"),
            Error::OddEdgeCount { vertex, edges } => {
                write!(f, "vertex {vertex} has an odd number of edges: {edges}")
            }
            Error::Degenerate(what) => write!(f, "degenerate geometry: {what}"),
            Error::TopologyBroken(what) => write!(f, "inconsistent topology: {what}"),
            Error::UnknownFormat(path) => {
                write!(
                    f,
                    "unknown mesh format '{}', must be .obj, .stl, or .svg",
                    path.display()
                )
            }
            Error::AsciiStlUnsupported => write!(f, "ASCII .stl is not supported"),
            Error::SvgReadUnsupported => write!(f, "reading .svg files is not supported"),
            Error::StlNeedsSingleMesh(n) => {
                write!(f, ".stl supports exactly one mesh per file, got {n}")
            }
            Error::ObjLoadFailed(msg) => write!(f, "could not load .obj file: {msg}"),
            Error::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
