//! Binary STL reading and writing. ASCII STL is detected by its `solid `
//! header and refused. Records carry the position and the facet normal (6
//! floats); the winding of each read triangle is corrected to agree with
//! the stored normal.

use crate::{
    error::Error,
    math::plane_norm,
    vlist::{Primitive, VertexList},
};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::Vec3;
use std::io::{Read, Write};

pub(crate) fn read(input: &mut impl Read, scale: f32) -> Result<Vec<VertexList>, Error> {
    let mut head = [0u8; 6];
    input.read_exact(&mut head)?;
    if &head == b"solid " {
        return Err(Error::AsciiStlUnsupported);
    }
    let mut rest = [0u8; 74];
    input.read_exact(&mut rest)?;
    let num_faces = input.read_u32::<LittleEndian>()?;
    let mut vl = VertexList::new(6, Primitive::Triangle);
    for _ in 0..num_faces {
        let mut ff = [0.0f32; 12];
        for f in ff.iter_mut() {
            *f = input.read_f32::<LittleEndian>()?;
        }
        let norm = Vec3::new(ff[0], ff[1], ff[2]);
        let mut v = [
            Vec3::new(ff[3], ff[4], ff[5]),
            Vec3::new(ff[6], ff[7], ff[8]),
            Vec3::new(ff[9], ff[10], ff[11]),
        ];
        if plane_norm(v[0], v[1], v[2]).dot(norm) < 0.0 {
            v.swap(1, 2);
        }
        for p in v {
            vl.add(&[
                p.x * scale,
                p.y * scale,
                p.z * scale,
                norm.x,
                norm.y,
                norm.z,
            ])?;
        }
        let attr_bytes = input.read_u16::<LittleEndian>()?;
        if attr_bytes != 0 {
            // Nonstandard, but skip whatever attribute payload is claimed.
            let mut skip = vec![0u8; attr_bytes as usize];
            input.read_exact(&mut skip)?;
        }
    }
    Ok(vec![vl])
}

pub(crate) fn write(out: &mut impl Write, list: &[VertexList], scale: f32) -> Result<(), Error> {
    if list.len() != 1 {
        return Err(Error::StlNeedsSingleMesh(list.len()));
    }
    let vl = &list[0];
    if vl.floats_per_vert() < 3 {
        return Err(Error::TooFewCoords { needed: 3, got: vl.floats_per_vert() });
    }
    if vl.primitive() != Primitive::Triangle {
        return Err(Error::WrongPrimitive {
            expected: Primitive::Triangle,
            got: vl.primitive(),
        });
    }
    let mut head = [0u8; 80];
    let tag = b"binary stl libpolyhedra\n";
    head[..tag.len()].copy_from_slice(tag);
    out.write_all(&head)?;
    let num_tri = (vl.num_indices() / 3) as u32;
    out.write_u32::<LittleEndian>(num_tri)?;
    for i in (0..vl.num_indices()).step_by(3) {
        let v = [
            vl.lookup_pos(i) * scale,
            vl.lookup_pos(i + 1) * scale,
            vl.lookup_pos(i + 2) * scale,
        ];
        let norm = plane_norm(v[0], v[1], v[2]);
        for f in [norm.x, norm.y, norm.z] {
            out.write_f32::<LittleEndian>(f)?;
        }
        for p in v {
            for f in [p.x, p.y, p.z] {
                out.write_f32::<LittleEndian>(f)?;
            }
        }
        out.write_u16::<LittleEndian>(0)?;
    }
    Ok(())
}
