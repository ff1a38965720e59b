//! Command-line front-end: read polyhedra, run the selected operations in a
//! fixed order, write the result.

use clap::error::ErrorKind;
use clap::Parser;
use glam::Vec3;
use polyhedra::{convex_decomp, convex_hull, io, mass_properties, plane_cut, simplify, Error};
use std::path::PathBuf;

/// Convert and operate on polyhedra with triangular faces.
///
/// The selected operations always run in this order, regardless of the
/// order of the flags: scale (applied on read), simplify, convex hull,
/// plane cut, approximate convex decomposition, mass properties.
#[derive(Parser)]
#[command(name = "polyhedra")]
struct Args {
    /// Calculate the convex hull of each polyhedron.
    #[arg(short = 'c')]
    convex: bool,

    /// Decompose each polyhedron into approximately convex pieces, down to
    /// this fraction of the volume as total error.
    #[arg(short = 'd', value_name = "THRESHOLD")]
    decomp: Option<f32>,

    /// Calculate volume, center of mass and inertia tensor of each
    /// polyhedron.
    #[arg(short = 'm')]
    mass: bool,

    /// Output file. Pass an empty string to skip writing.
    #[arg(short = 'o', value_name = "OUTFILE", default_value = "out.obj")]
    outfile: String,

    /// Cut along the plane with normal (x, y, z), d units from the origin.
    #[arg(short = 'p', value_name = "X,Y,Z,D", value_parser = parse_plane)]
    plane: Option<Plane>,

    /// Suppress status output.
    #[arg(short = 'q')]
    quiet: bool,

    /// Simplify each polyhedron to no more than this many faces.
    #[arg(short = 's', value_name = "FACES")]
    simplify: Option<usize>,

    /// Scale each polyhedron by this factor.
    #[arg(short = 'x', value_name = "SCALE", default_value_t = 1.0)]
    scale: f32,

    /// Input files.
    #[arg(required = true, value_name = "INFILE")]
    infiles: Vec<PathBuf>,
}

#[derive(Clone, Copy)]
struct Plane {
    norm: Vec3,
    dist: f32,
}

fn parse_plane(s: &str) -> Result<Plane, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 4 {
        return Err("expecting a comma separated list of four floats".to_string());
    }
    let mut ff = [0.0f32; 4];
    for (f, part) in ff.iter_mut().zip(&parts) {
        *f = part
            .trim()
            .parse()
            .map_err(|e| format!("invalid float '{}': {}", part, e))?;
    }
    Ok(Plane {
        norm: Vec3::new(ff[0], ff[1], ff[2]),
        dist: ff[3],
    })
}

fn run(args: &Args) -> Result<(), Error> {
    let mut data = Vec::new();
    for path in &args.infiles {
        data.extend(io::read_path(path, args.scale)?);
    }

    if let Some(faces) = args.simplify {
        tracing::info!("simplifying");
        for vl in &mut data {
            *vl = simplify(vl, faces, 0.0)?;
        }
    }

    if args.convex {
        tracing::info!("calculating convex hulls");
        for vl in &mut data {
            *vl = convex_hull(vl)?;
        }
    }

    if let Some(plane) = args.plane {
        let mut out = Vec::new();
        for (count, vl) in data.iter().enumerate() {
            tracing::info!(polyhedron = count, "cutting along plane");
            let pieces = plane_cut(vl, plane.norm, plane.dist)?;
            tracing::info!(polyhedron = count, pieces = pieces.len(), "cut done");
            out.extend(pieces);
        }
        data = out;
    }

    if let Some(threshold) = args.decomp {
        let mut out = Vec::new();
        for (count, vl) in data.iter().enumerate() {
            tracing::info!(polyhedron = count, "decomposing");
            let pieces = convex_decomp(vl, threshold)?;
            tracing::info!(polyhedron = count, pieces = pieces.len(), "decomposition done");
            out.extend(pieces);
        }
        data = out;
    }

    if args.mass {
        for (count, vl) in data.iter().enumerate() {
            let props = mass_properties(vl)?;
            println!("Properties for polyhedron {}:", count);
            println!(
                "  Vertices: {}, Indices: {}",
                vl.num_verts(),
                vl.num_indices()
            );
            println!("  Volume:         {}", props.volume);
            println!(
                "  Center of mass: ({}, {}, {})",
                props.center_of_mass[0], props.center_of_mass[1], props.center_of_mass[2]
            );
            println!("  Inertia tensor:");
            let it = &props.inertia_tensor;
            println!("    [{:20}, {:20}, {:20}]", it[0], it[1], it[2]);
            println!("    [{:20}, {:20}, {:20}]", it[3], it[4], it[5]);
            println!("    [{:20}, {:20}, {:20}]", it[6], it[7], it[8]);
            println!();
        }
    }

    if !args.outfile.is_empty() {
        io::write_path(&args.outfile, &data, 1.0)?;
    }
    Ok(())
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
    tracing_subscriber::fmt()
        .with_max_level(if args.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        })
        .with_target(false)
        .init();
    if let Err(e) = run(&args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
