//! Reading and writing mesh files, dispatched on the file extension.
//!
//! | Format | 3D read | 3D write | 2D write |
//! |--------|---------|----------|----------|
//! | .obj   | yes     | yes      |          |
//! | .stl   | binary  | binary   |          |
//! | .svg   |         |          | yes      |

use crate::{error::Error, obj, stl, svg, vlist::VertexList};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

enum FileFormat {
    Obj,
    Stl,
    Svg,
}

fn file_format(path: &Path) -> Result<FileFormat, Error> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if ext.eq_ignore_ascii_case("obj") {
        Ok(FileFormat::Obj)
    } else if ext.eq_ignore_ascii_case("stl") {
        Ok(FileFormat::Stl)
    } else if ext.eq_ignore_ascii_case("svg") {
        Ok(FileFormat::Svg)
    } else {
        Err(Error::UnknownFormat(path.to_path_buf()))
    }
}

/// Read every mesh in the file, scaling positions by `scale`. The returned
/// lists are finalized.
pub fn read_path(path: impl AsRef<Path>, scale: f32) -> Result<Vec<VertexList>, Error> {
    let path = path.as_ref();
    let format = file_format(path)?;
    tracing::info!(path = %path.display(), "reading meshes");
    let mut list = match format {
        FileFormat::Obj => obj::read(path, scale)?,
        FileFormat::Stl => {
            let mut input = BufReader::new(File::open(path)?);
            stl::read(&mut input, scale)?
        }
        FileFormat::Svg => return Err(Error::SvgReadUnsupported),
    };
    for vl in &mut list {
        vl.finalize();
    }
    Ok(list)
}

/// Write the meshes to the file named by `path`, scaling positions by
/// `scale`. STL accepts exactly one mesh.
pub fn write_path(path: impl AsRef<Path>, list: &[VertexList], scale: f32) -> Result<(), Error> {
    let path = path.as_ref();
    let format = file_format(path)?;
    tracing::info!(path = %path.display(), num_meshes = list.len(), "writing meshes");
    let mut out = BufWriter::new(File::create(path)?);
    match format {
        FileFormat::Obj => obj::write(&mut out, list, scale),
        FileFormat::Stl => stl::write(&mut out, list, scale),
        FileFormat::Svg => svg::write(&mut out, list, scale),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testmesh::box_tris;

    #[test]
    fn t_unknown_extension() {
        assert!(matches!(
            read_path("mesh.ply", 1.0),
            Err(Error::UnknownFormat(_))
        ));
        assert!(matches!(
            write_path("mesh.ply", &[], 1.0),
            Err(Error::UnknownFormat(_))
        ));
    }

    #[test]
    fn t_svg_read_unsupported() {
        assert!(matches!(
            read_path("drawing.svg", 1.0),
            Err(Error::SvgReadUnsupported)
        ));
    }

    #[test]
    fn t_obj_path_roundtrip() {
        let path = std::env::temp_dir().join("polyhedra_io_roundtrip.obj");
        write_path(&path, &[box_tris(1.0, 1.0, 1.0)], 1.0).expect("write failed");
        let meshes = read_path(&path, 1.0).expect("read failed");
        std::fs::remove_file(&path).ok();
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].num_verts(), 8);
        assert_eq!(meshes[0].num_indices(), 36);
    }

    #[test]
    fn t_stl_path_roundtrip() {
        let path = std::env::temp_dir().join("polyhedra_io_roundtrip.stl");
        write_path(&path, &[box_tris(1.0, 1.0, 1.0)], 1.0).expect("write failed");
        let meshes = read_path(&path, 1.0).expect("read failed");
        std::fs::remove_file(&path).ok();
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].floats_per_vert(), 6);
        assert_eq!(meshes[0].num_indices(), 36);
    }
}
