//! SVG writing for 2D line and triangle lists. Lines become `<line>`
//! elements, triangles filled `<polygon>` elements; the viewBox encloses
//! every point.

use crate::{
    error::Error,
    vlist::{Primitive, VertexList},
};
use std::io::Write;

fn write_single(out: &mut impl Write, vl: &VertexList, scale: f32) -> Result<(), Error> {
    let ind = vl.indices();
    match vl.primitive() {
        Primitive::Line => {
            for i in (0..vl.num_indices()).step_by(2) {
                if i + 1 >= vl.num_indices() {
                    break;
                }
                let p1 = vl.lookup_pos2(i);
                let p2 = vl.lookup_pos2(i + 1);
                writeln!(
                    out,
                    "    <!-- {:04},{:04} --><line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\"/>",
                    ind[i],
                    ind[i + 1],
                    p1.x * scale,
                    p1.y * scale,
                    p2.x * scale,
                    p2.y * scale
                )?;
            }
        }
        Primitive::Triangle => {
            for i in (0..vl.num_indices()).step_by(3) {
                if i + 2 >= vl.num_indices() {
                    break;
                }
                let p1 = vl.lookup_pos2(i);
                let p2 = vl.lookup_pos2(i + 1);
                let p3 = vl.lookup_pos2(i + 2);
                writeln!(
                    out,
                    "    <!-- {:04},{:04},{:04} --><polygon points=\"{},{} {},{} {},{}\"/>",
                    ind[i],
                    ind[i + 1],
                    ind[i + 2],
                    p1.x * scale,
                    p1.y * scale,
                    p2.x * scale,
                    p2.y * scale,
                    p3.x * scale,
                    p3.y * scale
                )?;
            }
        }
        got => {
            return Err(Error::WrongPrimitive { expected: Primitive::Line, got });
        }
    }
    Ok(())
}

pub(crate) fn write(out: &mut impl Write, list: &[VertexList], scale: f32) -> Result<(), Error> {
    let mut min = [f32::INFINITY; 2];
    let mut max = [f32::NEG_INFINITY; 2];
    for vl in list {
        if vl.floats_per_vert() < 2 {
            return Err(Error::TooFewCoords { needed: 2, got: vl.floats_per_vert() });
        }
        for i in 0..vl.num_verts() {
            let rec = vl.vert(i);
            for c in 0..2 {
                min[c] = min[c].min(rec[c]);
                max[c] = max[c].max(rec[c]);
            }
        }
    }
    writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>")?;
    writeln!(
        out,
        "<svg viewBox=\"{} {} {} {}\" xmlns=\"http://www.w3.org/2000/svg\">",
        min[0] * scale,
        min[1] * scale,
        (max[0] - min[0]) * scale,
        (max[1] - min[1]) * scale
    )?;
    writeln!(out)?;
    for (count, vl) in list.iter().enumerate() {
        match vl.primitive() {
            Primitive::Line => {
                writeln!(
                    out,
                    "  <g id=\"polyline_{:03}\" stroke=\"black\" stroke-width=\"1\" fill=\"none\">",
                    count
                )?;
            }
            Primitive::Triangle => {
                writeln!(out, "  <g id=\"polyline_{:03}\" fill=\"blue\" stroke=\"none\">", count)?;
            }
            got => {
                return Err(Error::WrongPrimitive { expected: Primitive::Line, got });
            }
        }
        write_single(out, vl, scale)?;
        writeln!(out, "  </g>")?;
        writeln!(out)?;
    }
    writeln!(out, "</svg>")?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn t_lines_and_polygons() {
        let mut lines = VertexList::new(2, Primitive::Line);
        lines.add(&[0., 0.]).expect("add failed");
        lines.add(&[1., 1.]).expect("add failed");
        let mut tris = VertexList::new(2, Primitive::Triangle);
        tris.add(&[0., 0.]).expect("add failed");
        tris.add(&[1., 0.]).expect("add failed");
        tris.add(&[0., 1.]).expect("add failed");
        let mut buf = Vec::new();
        write(&mut buf, &[lines, tris], 10.0).expect("write failed");
        let text = String::from_utf8(buf).expect("not utf-8");
        assert!(text.starts_with("<?xml"));
        assert!(text.contains("viewBox=\"0 0 10 10\""));
        assert!(text.contains("<line x1=\"0\" y1=\"0\" x2=\"10\" y2=\"10\"/>"));
        assert!(text.contains("<polygon points=\"0,0 10,0 0,10\"/>"));
        assert!(text.ends_with("</svg>\n"));
    }

    #[test]
    fn t_point_primitive_refused() {
        let vl = VertexList::new(2, Primitive::Point);
        let mut buf = Vec::new();
        assert!(matches!(
            write(&mut buf, &[vl], 1.0),
            Err(Error::WrongPrimitive { .. })
        ));
    }
}
