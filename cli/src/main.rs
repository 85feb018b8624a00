mod writer;

use clap::{Parser, Subcommand};
use gr_common::db::parser::benchmark;
use gr_common::util::config::{Config, CostModel};
use gr_common::util::{generator, logger, visualization};
use gr_router::Solver;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Route {
        input: String,
        output: String,
        #[arg(long)]
        no_decomposition: bool,
        #[arg(long)]
        no_ordering: bool,
        // standard | bounded | nc
        #[arg(long, value_name = "MODEL")]
        cost_model: Option<String>,
        #[arg(long, value_name = "SECS")]
        time_limit: Option<u64>,
        #[arg(long)]
        heatmap: bool,
    },
    Generate {
        #[arg(long, num_args = 2, value_names = ["X", "Y"], default_values_t = [64, 64])]
        grid: Vec<i32>,
        #[arg(long, default_value_t = 10)]
        capacity: i32,
        #[arg(long, default_value_t = 1000)]
        nets: usize,
        #[arg(long, default_value_t = 4)]
        max_pins: usize,
        #[arg(long, default_value_t = 8)]
        blockages: usize,
        #[arg(long, default_value = "inputs/random.gr")]
        output: String,
    },
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let args = Args::parse();

    let mut config = if args.config.exists() {
        log::info!("Loading configuration from {:?}", args.config);
        let config_str = std::fs::read_to_string(&args.config)
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;
        toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?
    } else {
        log::warn!(
            "Configuration file {:?} not found. Using internal defaults.",
            args.config
        );
        Config::default()
    };

    match args.command {
        Commands::Generate {
            grid,
            capacity,
            nets,
            max_pins,
            blockages,
            output,
        } => {
            prepare_output_dir(&output)?;
            generator::generate_random_benchmark(
                &output, grid[0], grid[1], capacity, nets, max_pins, blockages,
            )?;
            log::info!("Generated: {}", output);
        }
        Commands::Route {
            input,
            output,
            no_decomposition,
            no_ordering,
            cost_model,
            time_limit,
            heatmap,
        } => {
            if no_decomposition {
                config.router.use_net_decomposition = false;
            }
            if no_ordering {
                config.router.use_net_ordering = false;
            }
            if let Some(model) = cost_model {
                config.router.cost_model =
                    CostModel::parse(&model).map_err(|e| anyhow::anyhow!(e))?;
            }
            if let Some(secs) = time_limit {
                config.router.time_limit_secs = secs;
            }
            if heatmap {
                config.output.emit_heatmaps = true;
            }

            if !Path::new(&input).exists() {
                return Err(anyhow::anyhow!("Input benchmark missing: {}", input));
            }
            prepare_output_dir(&output)?;

            if let Err(e) = run_routing(&config, &input, &output) {
                log::error!("{e:#}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn prepare_output_dir(path_str: &str) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(path_str).parent() {
        if !parent.exists() && !parent.as_os_str().is_empty() {
            log::info!("Creating output directory: {:?}", parent);
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn run_routing(config: &Config, input: &str, output: &str) -> anyhow::Result<()> {
    log::info!("Parsing benchmark: {}", input);
    let mut inst = benchmark::parse_file(input)
        .map_err(|e| anyhow::anyhow!("Invalid benchmark '{}': {}", input, e))?;
    log::info!(
        "Loaded {}x{} grid, capacity {}, {} nets",
        inst.gx,
        inst.gy,
        inst.default_capacity,
        inst.num_nets()
    );

    let solver = Solver::new(config.clone());
    let stats = solver.run(&mut inst)?;
    log::info!(
        "Finished in {:.2?}: {} passes, wirelength {}, max utilization {}, {} over-capacity edges",
        stats.elapsed,
        stats.iterations,
        stats.wirelength,
        stats.max_util,
        stats.violations
    );
    if stats.violations > 0 {
        log::warn!("{} edges remain over capacity", stats.violations);
    }

    let codec = inst.codec();
    writer::write_routes_file(output, &codec, &inst.nets)?;
    log::info!("Wrote routes: {}", output);

    if config.output.emit_heatmaps {
        let path = format!("{}/routes.png", config.output.heatmap_dir);
        visualization::draw_routes(&codec, &inst.nets, &path);
    }

    Ok(())
}
