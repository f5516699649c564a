//! cellgrid CLI - Try spacing changes on a synthetic labelled volume.

use anyhow::{anyhow, bail, Context};
use cellgrid::prelude::*;
use std::env;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Options shared by all commands.
#[derive(Debug, Default)]
struct Options {
    level: Option<&'static str>,
    parallel: bool,
    renumber: bool,
    save_as: Option<String>,
    grain: u64,
}

fn init_tracing(level: &str) {
    // RUST_LOG wins over -v/-q
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut opts = Options { grain: 4, ..Options::default() };
    let mut filtered_args: Vec<&str> = Vec::new();
    let mut iter = args[1..].iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-v" | "--verbose" => opts.level = Some("debug"),
            "-vv" | "--trace" => opts.level = Some("trace"),
            "-q" | "--quiet" => opts.level = Some("warn"),
            "-p" | "--parallel" => opts.parallel = true,
            "-r" | "--renumber" => opts.renumber = true,
            "--save-as" => opts.save_as = iter.next().cloned(),
            "--grain" => {
                opts.grain = iter.next().and_then(|s| s.parse().ok()).unwrap_or(opts.grain).max(1)
            }
            _ => filtered_args.push(arg),
        }
    }
    init_tracing(opts.level.unwrap_or("info"));

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let result = match filtered_args[0] {
        "run" | "r" | "preflight" | "p" => {
            if filtered_args.len() < 3 {
                eprintln!("Error: missing arguments");
                eprintln!("Usage: cellgrid {} <nx,ny,nz> <sx,sy,sz>", filtered_args[0]);
                std::process::exit(1);
            }
            let execute = matches!(filtered_args[0], "run" | "r");
            cmd_resample(filtered_args[1], filtered_args[2], &opts, execute)
        }
        "version" | "--version" | "-V" => {
            println!("cellgrid {} ({})", env!("CARGO_PKG_VERSION"), cellgrid::BUILD_DATE);
            Ok(())
        }
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!();
            print_help();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        match e.downcast_ref::<Error>() {
            Some(err) => eprintln!("Error ({}): {:#}", err.code(), e),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn print_help() {
    println!("cellgrid - Change the spacing of a cell grid");
    println!();
    println!("USAGE:");
    println!("    cellgrid [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    p, preflight <dims> <spacing>  Validate and show the would-be geometry");
    println!("    r, run       <dims> <spacing>  Resample a synthetic volume of <dims> cells");
    println!("    version                        Show version and build date");
    println!("    h, help                        Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose      Show debug output");
    println!("    -vv, --trace       Show trace output (very verbose)");
    println!("    -q, --quiet        Only show warnings and errors");
    println!("    -p, --parallel     Copy tuples on all cores");
    println!("    -r, --renumber     Compact the feature table afterwards");
    println!("    --save-as <name>   Write into a new container");
    println!("    --grain <n>        Edge length of the synthetic grains (default 4)");
    println!();
    println!("EXAMPLES:");
    println!("    cellgrid preflight 10,10,10 0.5,0.5,0.5");
    println!("    cellgrid -r run 64,64,32 4,4,4");
    println!("    cellgrid -v -p run 200,200,100 0.5,0.5,0.5 --save-as Fine");
}

fn parse_triple<T: std::str::FromStr>(text: &str, what: &str) -> anyhow::Result<(T, T, T)> {
    let parts: Vec<T> = text
        .split(',')
        .map(|s| s.trim().parse::<T>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| anyhow!("invalid {what} '{text}'"))?;
    match <[T; 3]>::try_from(parts) {
        Ok([x, y, z]) => Ok((x, y, z)),
        Err(_) => bail!("{what} needs three comma separated values, got '{text}'"),
    }
}

/// Cubic grains of `grain` cells, labelled 1.. in cell order; label 0 is unused.
fn synthetic_volume(dims: (u64, u64, u64), grain: u64) -> anyhow::Result<DataContainer> {
    let geom = GridGeometry::new(dims, (1.0, 1.0, 1.0), (0.0, 0.0, 0.0))?;
    let (nx, ny, nz) = dims;
    let (gx, gy, gz) = (nx.div_ceil(grain), ny.div_ceil(grain), nz.div_ceil(grain));

    let mut labels = Vec::with_capacity(geom.cell_count());
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let g = ((k / grain) * gy + j / grain) * gx + i / grain;
                labels.push(i32::try_from(g + 1).context("too many grains")?);
            }
        }
    }
    let data: Vec<u8> = (0..geom.cell_count()).map(|i| (i % 256) as u8).collect();

    let mut cells = AttributeTable::new("CellData", TableKind::Cell, geom.tuple_dims());
    cells.insert("Data", TypedBuffer::from_values(&data, 1)?)?;
    cells.insert("FeatureIds", TypedBuffer::from_values(&labels, 1)?)?;

    let features = usize::try_from(gx * gy * gz + 1)?;
    let mut grains = AttributeTable::new("CellFeatureData", TableKind::CellFeature, features);
    let sizes: Vec<f32> = (0..features).map(|f| if f == 0 { 0.0 } else { (grain * grain * grain) as f32 }).collect();
    grains.insert("Volumes", TypedBuffer::from_values(&sizes, 1)?)?;

    let mut dc = DataContainer::new(cellgrid::job::defaults::CONTAINER, geom);
    dc.insert_table(cells);
    dc.insert_table(grains);
    debug!(cells = geom.cell_count(), features, "synthetic volume built");
    Ok(dc)
}

fn cmd_resample(dims: &str, spacing: &str, opts: &Options, execute: bool) -> anyhow::Result<()> {
    let dims: (u64, u64, u64) = parse_triple(dims, "dimensions")?;
    let spacing: (f32, f32, f32) = parse_triple(spacing, "spacing")?;

    let store = DataStore::new();
    store.insert(synthetic_volume(dims, opts.grain)?);

    let mut request = ResampleRequest::new(spacing);
    if opts.parallel {
        request = request.with_execution(ExecutionMode::Parallel);
    }
    if opts.renumber {
        request = request.with_renumber_features(true);
    }
    if let Some(name) = &opts.save_as {
        request = request.save_as(name.clone());
    }

    let mut job = TransformJob::new(request);
    let report = job.preflight(&store)?;
    println!("Current geometry:");
    print!("{}", report.current_summary);
    println!("New geometry:");
    print!("{}", report.new_summary);
    if let Some(n) = report.feature_count {
        println!("Features after renumbering: {}", n);
    }
    if report.noop {
        println!("Spacing unchanged, nothing to do");
    }
    if !execute {
        return Ok(());
    }

    let started = std::time::Instant::now();
    let done = job.execute(&store)?;
    info!(elapsed_ms = started.elapsed().as_millis() as u64, "execute finished");

    let dc = store.container(&done.container)?;
    println!();
    println!("Container '{}': {}", dc.name(), dc.geometry());
    for table in dc.tables() {
        println!("  {} ({:?}, {} tuples)", table.name(), table.kind(), table.tuple_count());
        for (name, buf) in table.iter() {
            println!("    {:<12} {}", name, buf.data_type());
        }
    }
    if let Some(remap) = &done.remap {
        println!("Renumbered {} -> {} features", remap.len(), remap.new_count());
    }
    Ok(())
}
