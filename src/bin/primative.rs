//! Command-line front-end generating a single primitive shape.

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use polyhedra::{cube, cylinder, ico_sphere, io, uv_sphere, Error, VertexList};
use std::path::PathBuf;

/// Generate a primitive polyhedron and write it to the output file.
#[derive(Parser)]
#[command(name = "primative")]
struct Args {
    /// Shape parameter: points per revolution for cylinders, segments and
    /// rings for uv spheres, subdivisions for icospheres.
    #[arg(short = 'n', value_name = "NUMBER")]
    number: Option<i32>,

    /// Type of shape to generate.
    #[arg(short = 't', value_enum, value_name = "TYPE")]
    shape: Shape,

    /// Size in the x direction. Cylinders and spheres use it as their
    /// diameter.
    #[arg(short = 'x', value_name = "XSIZE", default_value_t = 1.0)]
    xsize: f32,

    /// Size in the y direction.
    #[arg(short = 'y', value_name = "YSIZE", default_value_t = 1.0)]
    ysize: f32,

    /// Size in the z direction. Cylinders use it as their height.
    #[arg(short = 'z', value_name = "ZSIZE", default_value_t = 1.0)]
    zsize: f32,

    /// Output file.
    #[arg(value_name = "OUTFILE")]
    outfile: PathBuf,
}

#[derive(Copy, Clone, ValueEnum)]
enum Shape {
    Cube,
    Cylinder,
    Uvsphere,
    Icosphere,
}

fn generate(args: &Args) -> Result<VertexList, Error> {
    match args.shape {
        Shape::Cube => cube(args.xsize / 2.0, args.ysize / 2.0, args.zsize / 2.0),
        Shape::Cylinder => cylinder(args.xsize / 2.0, args.zsize, args.number.unwrap_or(3)),
        Shape::Uvsphere => {
            let n = args.number.unwrap_or(3);
            uv_sphere(args.xsize / 2.0, n, n)
        }
        Shape::Icosphere => ico_sphere(args.xsize / 2.0, args.number.unwrap_or(0)),
    }
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            std::process::exit(code);
        }
    };
    tracing_subscriber::fmt().with_target(false).init();
    let result = generate(&args).and_then(|vl| io::write_path(&args.outfile, &[vl], 1.0));
    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
