use clap::Parser;
use std::path::PathBuf;
use tracing::error;

use water_polygons_update::catalog::Catalog;
use water_polygons_update::config::{Config, FileConfig};
use water_polygons_update::logging;
use water_polygons_update::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "update-water-polygons")]
#[command(about = "Update water polygons from OpenStreetMap to include estuaries and missing polygons")]
#[command(version = "0.1.0")]
struct Cli {
    /// Regions to process (comma-separated). Defaults to all cataloged regions
    #[arg(long, value_delimiter = ',')]
    regions: Vec<String>,

    /// Path to the uwp polygon correction executable
    #[arg(long)]
    uwp: Option<PathBuf>,

    /// Root directory for downloaded and derived data
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Optional TOML file overriding URLs and tool locations
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    logging::init_logging();

    let cli = Cli::parse();
    let catalog = Catalog::geofabrik();

    for region in &cli.regions {
        if !catalog.contains(region) {
            error!("Unknown region '{}'. Available: {}", region, catalog.ids().join(", "));
            std::process::exit(2);
        }
    }

    let file = match cli.config {
        Some(path) => match FileConfig::load(&path) {
            Ok(file) => file,
            Err(e) => {
                error!("Failed to load config file '{}': {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => FileConfig::default(),
    };
    let config = Config::resolve(file, cli.data_dir, cli.uwp);

    let pipeline = Pipeline::new(&config, &catalog);
    match pipeline.run(&cli.regions).await {
        Ok(summary) => {
            println!("\n📊 Run summary:");
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{json}"),
                Err(_) => println!("{summary:?}"),
            }
        }
        Err(e) => {
            error!("Water polygon update failed: {}", e);
            std::process::exit(1);
        }
    }
}
