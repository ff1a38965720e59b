//! Wavefront OBJ reading and writing.
//!
//! Reading goes through tobj; each `o` object becomes its own vertex list.
//! Records are interleaved position, then normal when present, then uv, so
//! a list carries 3, 5, 6 or 8 floats per vertex. The v texture coordinate
//! is stored flipped (`1 - v`) and positions are scaled on both read and
//! write. Only triangular faces are supported.

use crate::{
    error::Error,
    vlist::{Primitive, VertexList},
};
use arrayvec::ArrayVec;
use std::io::Write;
use std::path::Path;

pub(crate) fn read(path: &Path, scale: f32) -> Result<Vec<VertexList>, Error> {
    let options = tobj::LoadOptions {
        single_index: true,
        ..Default::default()
    };
    let (models, _) =
        tobj::load_obj(path, &options).map_err(|e| Error::ObjLoadFailed(format!("{}", e)))?;
    if models.is_empty() {
        return Err(Error::ObjLoadFailed("no meshes found".to_string()));
    }
    let mut out = Vec::new();
    for model in models {
        let mesh = &model.mesh;
        if mesh.face_arities.iter().any(|a| *a != 3) {
            return Err(Error::ObjLoadFailed(
                "only triangular faces are supported".to_string(),
            ));
        }
        let has_n = !mesh.normals.is_empty();
        let has_t = !mesh.texcoords.is_empty();
        let fpv = 3 + if has_n { 3 } else { 0 } + if has_t { 2 } else { 0 };
        let mut vl = VertexList::new(fpv, Primitive::Triangle);
        for index in &mesh.indices {
            let i = *index as usize;
            let mut rec: ArrayVec<f32, 8> = ArrayVec::new();
            rec.push(mesh.positions[3 * i] * scale);
            rec.push(mesh.positions[3 * i + 1] * scale);
            rec.push(mesh.positions[3 * i + 2] * scale);
            if has_n {
                rec.push(mesh.normals[3 * i]);
                rec.push(mesh.normals[3 * i + 1]);
                rec.push(mesh.normals[3 * i + 2]);
            }
            if has_t {
                rec.push(mesh.texcoords[2 * i]);
                rec.push(1.0 - mesh.texcoords[2 * i + 1]);
            }
            vl.add(&rec)?;
        }
        out.push(vl);
    }
    Ok(out)
}

struct WriteFace {
    v: u32,
    vn: u32,
    vt: u32,
}

fn write_single(
    out: &mut impl Write,
    poly_count: usize,
    vl: &VertexList,
    scale: f32,
    v_off: &mut usize,
    vn_off: &mut usize,
    vt_off: &mut usize,
) -> Result<(), Error> {
    let fpv = vl.floats_per_vert();
    if fpv < 3 {
        return Err(Error::TooFewCoords { needed: 3, got: fpv });
    }
    if vl.primitive() != Primitive::Triangle {
        return Err(Error::WrongPrimitive {
            expected: Primitive::Triangle,
            got: vl.primitive(),
        });
    }
    let has_vn = fpv == 6 || fpv == 8;
    let has_vt = fpv == 5 || fpv == 8;
    let vt_at = if has_vn { 6 } else { 3 };

    // Re-deduplicate each attribute stream on its own, with per-corner
    // records pointing into them.
    let mut v = VertexList::new(3, Primitive::Point);
    let mut vn = VertexList::new(3, Primitive::Unspecified);
    let mut vt = VertexList::new(2, Primitive::Unspecified);
    let mut faces = Vec::with_capacity(vl.num_indices());
    for i in 0..vl.num_indices() {
        let rec = vl.lookup(i);
        let mut wf = WriteFace { v: 0, vn: 0, vt: 0 };
        wf.v = v.add(&rec[..3])?;
        if has_vn {
            wf.vn = vn.add(&rec[3..6])?;
        }
        if has_vt {
            wf.vt = vt.add(&rec[vt_at..vt_at + 2])?;
        }
        faces.push(wf);
    }

    writeln!(out, "o polyhedra.{:03}", poly_count)?;
    for i in 0..v.num_verts() {
        let p = v.vert(i);
        writeln!(out, "v {:.6} {:.6} {:.6}", p[0] * scale, p[1] * scale, p[2] * scale)?;
    }
    for i in 0..vt.num_verts() {
        let p = vt.vert(i);
        writeln!(out, "vt {:.6} {:.6}", p[0], p[1])?;
    }
    for i in 0..vn.num_verts() {
        let p = vn.vert(i);
        writeln!(out, "vn {:.6} {:.6} {:.6}", p[0], p[1], p[2])?;
    }
    for tri in faces.chunks_exact(3) {
        write!(out, "f")?;
        for wf in tri {
            write!(out, " {}", wf.v as usize + *v_off)?;
            if has_vt {
                write!(out, "/{}", wf.vt as usize + *vt_off)?;
            }
            if has_vn {
                write!(out, "{}/{}", if has_vt { "" } else { "/" }, wf.vn as usize + *vn_off)?;
            }
        }
        writeln!(out)?;
    }

    *v_off += v.num_verts() as usize;
    *vn_off += vn.num_verts() as usize;
    *vt_off += vt.num_verts() as usize;
    Ok(())
}

pub(crate) fn write(out: &mut impl Write, list: &[VertexList], scale: f32) -> Result<(), Error> {
    writeln!(out, "# libpolyhedra")?;
    writeln!(out)?;
    let (mut v_off, mut vn_off, mut vt_off) = (1usize, 1usize, 1usize);
    for (count, vl) in list.iter().enumerate() {
        write_single(out, count, vl, scale, &mut v_off, &mut vn_off, &mut vt_off)?;
    }
    Ok(())
}
