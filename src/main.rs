use clap::{Parser, Subcommand};
use filterchain::filter::{FilterManager, TransformRegistry};
use filterchain::imaging::{RustCodec, register_builtin_transforms};
use filterchain::{batch, config, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "filterchain")]
#[command(about = "Apply named image filter sets")]
#[command(long_about = "\
Apply named image filter sets

A filter set is an ordered chain of transform steps plus an encoding
quality, defined in a TOML file:

  [filter_sets.thumbnail]
  quality = 80

  [[filter_sets.thumbnail.filters]]
  type = \"thumbnail\"
  size = [180, 180]
  mode = \"outbound\"

Pass --config several times to layer files; later files override earlier
ones per filter set.

Run 'filterchain gen-config' to print a documented sample config.")]
#[command(version)]
struct Cli {
    /// Filter set config file (repeatable, later files win)
    #[arg(long = "config", short = 'c', default_value = "filters.toml", global = true)]
    configs: Vec<PathBuf>,

    /// Log every pipeline step (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a filter set to image files or directories
    Apply {
        /// Filter set name
        #[arg(long, short)]
        filter: String,
        /// Output directory
        #[arg(long, short, default_value = "filtered")]
        output: PathBuf,
        /// Image files or directories to process
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// List configured filter sets and registered step types
    List,
    /// Print a resolved filter set as JSON
    Show {
        /// Filter set name
        name: String,
    },
    /// Print a sample filters.toml with all step types documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Apply {
            filter,
            output: output_dir,
            inputs,
        } => {
            let manager = build_manager(&cli.configs)?;
            let files = batch::collect_inputs(&inputs)?;
            println!(
                "==> Applying \"{}\" to {} images → {}",
                filter,
                files.len(),
                output_dir.display()
            );

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    println!("{}", output::format_batch_event(&event));
                }
            });
            let result = batch::run_batch(&manager, &filter, &files, &output_dir, Some(tx));
            printer.join().ok();
            let summary = result?;

            println!("==> Done: {}", summary);
            if summary.failed > 0 {
                return Err(format!("{} of {} images failed", summary.failed, files.len()).into());
            }
        }
        Command::List => {
            let manager = build_manager(&cli.configs)?;
            output::print_filter_sets(manager.config(), &manager.registry().step_types());
        }
        Command::Show { name } => {
            let manager = build_manager(&cli.configs)?;
            let resolved = manager.resolve(&name)?;
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the layered config and register every built-in transform.
fn build_manager(
    configs: &[PathBuf],
) -> Result<FilterManager<RustCodec, config::FiltersConfig>, config::ConfigError> {
    let filters = config::load_config_layers(configs)?;
    let mut registry = TransformRegistry::new();
    register_builtin_transforms(&mut registry);
    Ok(FilterManager::with_registry(filters, RustCodec::new(), registry))
}

/// Install the global subscriber. RUST_LOG wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}
