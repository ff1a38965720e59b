/*!
A library for analyzing and manipulating closed triangulated polyhedra.

# Overview

+ Meshes move in and out of the library as [`VertexList`]s: indexed vertex
  buffers that share bit-identical vertex records, with an index array
  describing points, line segments or triangles.

+ The geometric operations take and return vertex lists:

  + [`convex_hull`] builds the hull of a point set with an incremental
    quickhull.

  + [`plane_cut`] splits a mesh along a plane, re-closes both halves by
    triangulating the cut cross-section, and separates the results into
    connected components.

  + [`triangulate_2d`] fills planar polygons with holes using a monotone
    sweep; the plane cut uses it to rebuild its caps.

  + [`simplify`] contracts edges in cost order under a quadric error metric,
    optionally aggregating nearby unconnected vertices so separate pieces
    can fuse.

  + [`convex_decomp`] splits a mesh into approximately convex parts by
    repeatedly cutting the worst part along its deepest concave edge.

+ [`mass_properties`] integrates exact volume, center of mass and inertia
  over the surface; [`Transform`] applies rigid rotations and translations;
  [`cube`], [`cylinder`], [`uv_sphere`] and [`ico_sphere`] generate faceted
  primitives.

+ [`io::read_path`] and [`io::write_path`] read and write OBJ and binary STL
  meshes and write SVG for 2D lists.

All operations are synchronous and leave their inputs untouched; failures
come back as [`Error`].

# Example

```no_run
use polyhedra::{cube, mass_properties, plane_cut};
use glam::Vec3;

fn main() -> Result<(), polyhedra::Error> {
    let solid = cube(1.0, 1.0, 1.0)?;
    let props = mass_properties(&solid)?;
    assert!((props.volume - 8.0).abs() < 1e-5);
    let halves = plane_cut(&solid, Vec3::Z, 0.0)?;
    assert_eq!(halves.len(), 2);
    Ok(())
}
```
*/

mod bvh;
mod cut;
mod decomp;
mod element;
mod error;
mod ftree;
mod hull;
pub mod io;
mod mass;
mod math;
mod obj;
mod primitive;
mod queue;
mod simplify;
mod stl;
mod svg;
#[cfg(test)]
mod testmesh;
mod transform;
mod tri2d;
mod vef;
mod vlist;

pub use glam;

pub use cut::plane_cut;
pub use decomp::convex_decomp;
pub use error::Error;
pub use hull::convex_hull;
pub use mass::{mass_properties, MassProperties};
pub use primitive::{cube, cylinder, ico_sphere, uv_sphere};
pub use simplify::simplify;
pub use transform::{Transform, INVERT, NO_OFFSET};
pub use tri2d::triangulate_2d;
pub use vlist::{Primitive, VertexList};
