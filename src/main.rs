use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use log::{debug, info, LevelFilter};
use std::path::PathBuf;

use lpmap::config_loader;
use lpmap::orchestrator::{build_placement_plan, write_placement_plan, MappingContext, PeTopology};

/// Entity placement and global addressing for parallel discrete-event simulations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the simulation configuration YAML file
    #[arg(short, long)]
    config: PathBuf,

    /// Number of processing elements in the run
    #[arg(long, default_value_t = 1)]
    pe_count: u64,

    /// Index of this processing element
    #[arg(long, default_value_t = 0)]
    pe_index: u64,

    /// Override general.kernel_processes_per_pe
    #[arg(long)]
    kernel_processes: Option<u64>,

    /// Override general.workers_per_pe
    #[arg(long)]
    workers: Option<u64>,

    /// Write this PE's placement plan as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the structured identity of a flat id (repeatable)
    #[arg(long)]
    lookup: Vec<u64>,

    /// Check that every flat id round-trips before placing
    #[arg(long)]
    verify: bool,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // RUST_LOG wins over general.log_level, which is only known after loading
    let env_filter = std::env::var_os("RUST_LOG").is_some();
    if env_filter {
        env_logger::Builder::from_env(Env::default()).init();
    } else {
        env_logger::Builder::new().filter_level(LevelFilter::Trace).init();
        log::set_max_level(LevelFilter::Info);
    }

    let mut config = config_loader::load_config(&args.config)?;
    if !env_filter {
        if let Some(level) = config.general.log_filter() {
            log::set_max_level(level);
        }
    }

    info!("Configuration file: {:?}", args.config);
    info!("PE {} of {}", args.pe_index, args.pe_count);

    if let Some(kernel_processes) = args.kernel_processes {
        config.general.kernel_processes_per_pe = kernel_processes;
    }
    if let Some(workers) = args.workers {
        config.general.workers_per_pe = workers;
    }
    config.validate()?;

    let context = MappingContext::from_config(
        &config,
        PeTopology {
            num_pes: args.pe_count,
            pe_index: args.pe_index,
        },
    )?;

    for flat_id in &args.lookup {
        let identity = context.to_structured_identity(*flat_id)?;
        println!(
            "{} -> group {} ({}), type {} ({}), repetition {}, offset {}, PE {}",
            flat_id,
            identity.group_name,
            identity.group_id,
            identity.type_name,
            identity.type_id,
            identity.repetition_id,
            identity.offset,
            context.owner_pe(*flat_id)?
        );
    }

    if args.verify {
        context.verify_address_space()?;
    }

    let plan = build_placement_plan(&context)?;
    for (kernel_process, count) in plan.summary.per_kernel_process.iter().enumerate() {
        debug!("Kernel process {}: {} entities", kernel_process, count);
    }

    if let Some(output) = &args.output {
        write_placement_plan(&plan, output)?;
    }

    info!("Placement completed successfully");
    Ok(())
}
