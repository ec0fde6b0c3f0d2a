//! meshforce CLI - evaluate mesh-constraint forces on generated surfaces.
//!
//! Usage: meshforce <COMMAND> [OPTIONS]
//!
//! Run `meshforce --help` for available commands.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};

use meshforce::config::{GlobalAreaSection, ParameterFile};
use meshforce::force::{
    run_decomposed, AreaConservation, AreaParams, BendingParams, EvaluateOptions, ForceBuffer,
    GatheredForces, HelfrichBending, MeshForce, TriangleAreaConservation,
};
use meshforce::geometry::BoxDim;
use meshforce::mesh::primitives::{self, MeshGeometry};
use meshforce::mesh::{MeshTopology, TypeId, DEFAULT_TYPE};
use meshforce::system::{Communicator, ParticleData, SingleRank};

#[derive(Parser)]
#[command(name = "meshforce")]
#[command(author, version, about = "Mesh-constraint force evaluation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe a generated mesh
    Info {
        #[command(flatten)]
        shape: ShapeArgs,
    },

    /// Evaluate forces, energy and virial
    Evaluate {
        #[command(flatten)]
        shape: ShapeArgs,

        #[command(flatten)]
        forces: ForceArgs,

        /// Number of simulated ranks
        #[arg(short, long, default_value = "1")]
        ranks: usize,

        /// Number of repeated evaluations (for timing)
        #[arg(long, default_value = "1")]
        steps: u64,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,

        /// Skip virial accumulation
        #[arg(long)]
        no_virial: bool,
    },

    /// Compare the sequential, parallel and decomposed paths
    Compare {
        #[command(flatten)]
        shape: ShapeArgs,

        #[command(flatten)]
        forces: ForceArgs,

        /// Number of simulated ranks for the decomposed run
        #[arg(short, long, default_value = "3")]
        ranks: usize,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Shape {
    /// Geodesic sphere (closed)
    Icosphere,
    /// Flat square grid (open)
    Grid,
    /// Flat hexagonal fan (open)
    Hex,
    /// Two triangles sharing one bond
    Tent,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
enum ForceKind {
    /// Per-triangle area conservation
    Local,
    /// Global area conservation
    Global,
    /// Helfrich bending
    Helfrich,
}

#[derive(Args)]
struct ShapeArgs {
    /// Mesh to generate
    #[arg(short, long, value_enum, default_value = "icosphere")]
    shape: Shape,

    /// Subdivision level (icosphere) or cells per side (grid)
    #[arg(short = 'n', long, default_value = "3")]
    resolution: usize,

    /// Radius (icosphere), spacing (grid, hex) or fold angle in radians (tent)
    #[arg(long, default_value = "1.0")]
    size: f64,

    /// Amplitude of the deterministic vertex perturbation
    #[arg(long, default_value = "0.0")]
    perturb: f64,

    /// Edge length of the cubic periodic box
    #[arg(long = "box", default_value = "50.0")]
    box_length: f64,
}

impl ShapeArgs {
    fn build(&self) -> MeshGeometry {
        let geometry = match self.shape {
            Shape::Icosphere => primitives::icosphere(self.resolution, self.size),
            Shape::Grid => primitives::flat_grid(self.resolution.max(1), self.size),
            Shape::Hex => primitives::hexagonal_patch(self.size),
            Shape::Tent => primitives::tent(self.size),
        };
        geometry.perturbed(self.perturb)
    }
}

#[derive(Args)]
struct ForceArgs {
    /// TOML parameter file (overrides the parameter flags)
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Forces to evaluate
    #[arg(short, long, value_enum, value_delimiter = ',', default_value = "local,global,helfrich")]
    forces: Vec<ForceKind>,

    /// Per-triangle area stiffness
    #[arg(long, default_value = "1.0")]
    k_local: f64,

    /// Target triangle area (default: current mean triangle area)
    #[arg(long)]
    a0_local: Option<f64>,

    /// Global area stiffness
    #[arg(long, default_value = "1.0")]
    k_global: f64,

    /// Target total area (default: current total area)
    #[arg(long)]
    a0_global: Option<f64>,

    /// Bending rigidity
    #[arg(long, default_value = "1.0")]
    kappa: f64,

    /// Treat all triangles as one type in the global area force
    #[arg(long)]
    ignore_type: bool,
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Info { shape } => {
            cmd_info(&shape)?;
        }

        Commands::Evaluate {
            shape,
            forces,
            ranks,
            steps,
            sequential,
            no_virial,
        } => {
            let options = EvaluateOptions::new()
                .with_parallel(!sequential)
                .with_virial(!no_virial);
            cmd_evaluate(&shape, &forces, ranks, steps, options)?;
        }

        Commands::Compare {
            shape,
            forces,
            ranks,
        } => {
            cmd_compare(&shape, &forces, ranks)?;
        }
    }

    Ok(())
}

/// Generated mesh together with its topology and particle store.
struct System {
    topology: Arc<MeshTopology>,
    particles: ParticleData,
}

impl System {
    fn new(shape: &ShapeArgs) -> CliResult<Self> {
        let geometry = shape.build();
        let topology = Arc::new(geometry.topology()?);
        let particles = geometry.particles(BoxDim::cube(shape.box_length));
        Ok(Self {
            topology,
            particles,
        })
    }

    /// Current total area of each type.
    fn areas(&self) -> CliResult<Vec<f64>> {
        let mut total = AreaConservation::new(Arc::clone(&self.topology), Arc::new(SingleRank), false);
        total.precompute(&self.particles)?;
        let areas = (0..self.topology.num_types())
            .map(|t| total.current_area(TypeId::new(t)))
            .collect::<meshforce::error::Result<Vec<f64>>>()?;
        Ok(areas)
    }
}

fn cmd_info(shape: &ShapeArgs) -> CliResult<()> {
    let system = System::new(shape)?;
    let topo = &system.topology;

    println!("Vertices: {}", system.particles.n_total());
    println!("Triangles: {}", topo.num_triangles());
    println!("Bonds: {}", topo.num_bonds());
    if topo.num_boundary_bonds() == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary bonds)", topo.num_boundary_bonds());
    }

    let areas = system.areas()?;
    for (t, area) in areas.iter().enumerate() {
        let type_id = TypeId::new(t);
        let count = topo.triangle_count(type_id);
        println!(
            "Type {}: {} triangles, area {:.6} (mean {:.6})",
            topo.type_name(type_id)?,
            count,
            area,
            area / count.max(1) as f64
        );
    }

    let box_dim = system.particles.box_dim();
    let lengths = box_dim.lengths();
    let (xy, xz, yz) = box_dim.tilt();
    println!(
        "Box: {:.3} x {:.3} x {:.3} (tilt {} {} {})",
        lengths[0], lengths[1], lengths[2], xy, xz, yz
    );
    Ok(())
}

/// Parameters from the file, or from the flags for the default type.
fn resolve_params(args: &ForceArgs, system: &System) -> CliResult<ParameterFile> {
    if let Some(path) = &args.params {
        return Ok(ParameterFile::load(path)?);
    }

    let total = system.areas()?.iter().sum::<f64>();
    let a0_local = args
        .a0_local
        .unwrap_or(total / system.topology.num_triangles() as f64);
    let a0_global = args.a0_global.unwrap_or(total);

    let name = system
        .topology
        .type_names()
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_TYPE.to_string());
    let mut params = ParameterFile::default();
    params.area_local.insert(
        name.clone(),
        AreaParams {
            k: args.k_local,
            a0: a0_local,
        },
    );
    params.area_global = Some(GlobalAreaSection {
        ignore_type: args.ignore_type,
        types: BTreeMap::from([(
            name.clone(),
            AreaParams {
                k: args.k_global,
                a0: a0_global,
            },
        )]),
    });
    params.helfrich.insert(name, BendingParams { k: args.kappa });
    Ok(params)
}

fn build_force(
    kind: ForceKind,
    topology: &Arc<MeshTopology>,
    comm: Arc<dyn Communicator>,
    params: &ParameterFile,
    ignore_type: bool,
    options: EvaluateOptions,
) -> meshforce::error::Result<Box<dyn MeshForce>> {
    Ok(match kind {
        ForceKind::Local => {
            let mut f = TriangleAreaConservation::new(Arc::clone(topology), comm).with_options(options);
            params.apply_area_local(&mut f)?;
            Box::new(f)
        }
        ForceKind::Global => {
            let mut f =
                AreaConservation::new(Arc::clone(topology), comm, ignore_type).with_options(options);
            params.apply_area_global(&mut f)?;
            Box::new(f)
        }
        ForceKind::Helfrich => {
            let mut f = HelfrichBending::new(Arc::clone(topology)).with_options(options);
            params.apply_helfrich(&mut f)?;
            Box::new(f)
        }
    })
}

/// Evaluate one force on `ranks` ranks and gather the result by tag.
fn evaluate_kind(
    kind: ForceKind,
    system: &System,
    params: &ParameterFile,
    ignore_type: bool,
    ranks: usize,
    timestep: u64,
    options: EvaluateOptions,
) -> meshforce::error::Result<GatheredForces> {
    if ranks > 1 {
        return run_decomposed(&system.particles, ranks, timestep, |comm| {
            Ok(vec![build_force(
                kind,
                &system.topology,
                comm,
                params,
                ignore_type,
                options,
            )?])
        });
    }

    let mut force = build_force(
        kind,
        &system.topology,
        Arc::new(SingleRank),
        params,
        ignore_type,
        options,
    )?;
    let mut buffer = ForceBuffer::new(&system.particles);
    force.evaluate(timestep, &system.particles, &mut buffer)?;
    Ok(GatheredForces::from_buffer(&system.particles, &buffer))
}

fn cmd_evaluate(
    shape: &ShapeArgs,
    args: &ForceArgs,
    ranks: usize,
    steps: u64,
    options: EvaluateOptions,
) -> CliResult<()> {
    let system = System::new(shape)?;
    let params = resolve_params(args, &system)?;
    let ignore_type = args.ignore_type || params.ignore_type();

    let mode = if options.parallel { "parallel" } else { "sequential" };
    println!(
        "Mesh: {} vertices, {} triangles, {} bonds ({} ranks, {})",
        system.particles.n_total(),
        system.topology.num_triangles(),
        system.topology.num_bonds(),
        ranks,
        mode
    );

    let volume = system.particles.box_dim().volume();
    let mut total_energy = 0.0;
    let mut total_trace = 0.0;

    for &kind in &args.forces {
        let start = Instant::now();
        let mut result = evaluate_kind(kind, &system, &params, ignore_type, ranks, 0, options)?;
        for step in 1..steps {
            result = evaluate_kind(kind, &system, &params, ignore_type, ranks, step, options)?;
        }
        let elapsed = start.elapsed();

        let virial = result.total_virial();
        let net = result.net_force();
        total_energy += result.total_energy();
        total_trace += virial.trace();

        println!("\n{:?}:", kind);
        println!("  Energy: {:.10}", result.total_energy());
        println!("  Net force: ({:.3e}, {:.3e}, {:.3e})", net.x, net.y, net.z);
        if options.compute_virial {
            let [xx, xy, xz, yy, yz, zz] = virial.0;
            println!(
                "  Virial: xx={:.6} xy={:.6} xz={:.6} yy={:.6} yz={:.6} zz={:.6}",
                xx, xy, xz, yy, yz, zz
            );
        }
        println!(
            "  Time: {:.2?} ({} steps, {:.2?}/step)",
            elapsed,
            steps.max(1),
            elapsed.div_f64(steps.max(1) as f64)
        );
    }

    println!("\nTotal energy: {:.10}", total_energy);
    if options.compute_virial {
        println!("Virial pressure: {:.6e}", total_trace / (3.0 * volume));
    }
    Ok(())
}

fn cmd_compare(shape: &ShapeArgs, args: &ForceArgs, ranks: usize) -> CliResult<()> {
    let system = System::new(shape)?;
    let params = resolve_params(args, &system)?;
    let ignore_type = args.ignore_type || params.ignore_type();

    println!(
        "Mesh: {} vertices, {} triangles",
        system.particles.n_total(),
        system.topology.num_triangles()
    );

    for &kind in &args.forces {
        let sequential = EvaluateOptions::new().sequential();
        let parallel = EvaluateOptions::new();

        let reference = evaluate_kind(kind, &system, &params, ignore_type, 1, 0, sequential)?;
        let threaded = evaluate_kind(kind, &system, &params, ignore_type, 1, 0, parallel)?;
        let split = evaluate_kind(kind, &system, &params, ignore_type, ranks.max(1), 0, parallel)?;

        let (df_par, de_par) = threaded.max_difference(&reference);
        let (df_split, de_split) = split.max_difference(&reference);
        println!("\n{:?}:", kind);
        println!("  Energy: {:.10}", reference.total_energy());
        println!("  Parallel vs sequential: |dF| <= {:.3e}, |dE| <= {:.3e}", df_par, de_par);
        println!(
            "  {} ranks vs sequential: |dF| <= {:.3e}, |dE| <= {:.3e}",
            ranks.max(1),
            df_split,
            de_split
        );
    }
    Ok(())
}
