use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use isogrid::{BoundingBox, Calculator, Config, GridManifest, GridSize, IsochroneWriter};

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct GraphLoadError(PathBuf, #[source] isogrid::osm::Error);

#[derive(Parser)]
#[command(version, about = "Precompute walking isochrones over a lat/lon grid")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    options: Options,

    /// Print debug messages
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Store the bounding box of the street network in <data-dir>/bbox.txt
    Bbox {
        /// The path to the OSM file
        osm_file: PathBuf,
    },

    /// Compute isochrones of every node matched against the grid, and the grid-to-node mapping
    Calculate {
        /// The path to the OSM file
        osm_file: PathBuf,
    },

    /// Compress <data-dir>/mapping.json into <data-dir>/refined.json
    Refine,

    /// Run all of the above steps
    Run {
        /// The path to the OSM file
        osm_file: PathBuf,
    },
}

#[derive(Args)]
struct Options {
    /// Isochrone thresholds, in minutes
    #[arg(long, global = true, value_delimiter = ',', default_value = "2,5,10")]
    trip_times: Vec<f64>,

    /// Walking speed, in km/h
    #[arg(long, global = true, default_value_t = 4.5)]
    speed: f64,

    /// Spacing of the lookup grid, in degrees
    #[arg(long, global = true, default_value = "0.0005", value_parser = parse_grid_size)]
    grid_size: GridSize,

    /// Buffer around reached nodes, in meters
    #[arg(long, global = true, default_value_t = 50.0)]
    node_buffer: f64,

    /// Buffer around reached edges, in meters
    #[arg(long, global = true, default_value_t = 50.0)]
    edge_buffer: f64,

    /// Directory with all inputs and outputs
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// Format of the OSM file, guessed from its extension by default
    #[arg(long, global = true, value_enum, default_value_t = Format::Auto)]
    format: Format,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Auto,
    Xml,
    XmlGz,
    XmlBz2,
}

impl From<Format> for isogrid::osm::FileFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Auto => Self::Unknown,
            Format::Xml => Self::Xml,
            Format::XmlGz => Self::XmlGz,
            Format::XmlBz2 => Self::XmlBz2,
        }
    }
}

fn parse_grid_size(s: &str) -> Result<GridSize, String> {
    s.parse().map_err(|e: isogrid::Error| e.to_string())
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else if cli.quiet {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    };
    colog::default_builder().filter_level(level).init();

    let config = Config {
        trip_times: cli.options.trip_times.clone(),
        travel_speed: cli.options.speed,
        grid_size: cli.options.grid_size,
        node_buffer: cli.options.node_buffer,
        edge_buffer: cli.options.edge_buffer,
        data_dir: cli.options.data_dir.clone(),
    };
    config.validate()?;
    let format = cli.options.format.into();

    match &cli.command {
        Command::Bbox { osm_file } => {
            let g = load_graph(osm_file, format)?;
            save_bbox(&g, &config)?;
        }

        Command::Calculate { osm_file } => {
            let g = load_graph(osm_file, format)?;
            calculate(&g, &config)?;
        }

        Command::Refine => refine(&config)?,

        Command::Run { osm_file } => {
            let g = load_graph(osm_file, format)?;
            save_bbox(&g, &config)?;
            calculate(&g, &config)?;
            refine(&config)?;
        }
    }

    Ok(())
}

fn load_graph<P: AsRef<Path>>(
    path: P,
    file_format: isogrid::osm::FileFormat,
) -> Result<isogrid::Graph, GraphLoadError> {
    let mut g = isogrid::Graph::default();
    let options = isogrid::osm::Options {
        profile: &isogrid::osm::WALK_PROFILE,
        file_format,
        bbox: [0.0; 4],
    };
    match isogrid::osm::add_features_from_file(&mut g, &options, path.as_ref()) {
        Ok(()) => {
            log::info!("loaded {} street nodes from {}", g.len(), path.as_ref().display());
            Ok(g)
        }
        Err(e) => Err(GraphLoadError(PathBuf::from(path.as_ref()), e)),
    }
}

fn save_bbox(g: &isogrid::Graph, config: &Config) -> Result<(), Box<dyn Error>> {
    let bbox = g.bbox().ok_or("the street network is empty")?;
    std::fs::create_dir_all(&config.data_dir)?;
    bbox.save(config.bbox_path())?;
    log::info!("bounding box saved to {}", config.bbox_path().display());
    Ok(())
}

fn calculate(g: &isogrid::Graph, config: &Config) -> Result<(), Box<dyn Error>> {
    let bbox = BoundingBox::load(config.bbox_path())?;
    bbox.validate()?;
    let grid = isogrid::Grid::new(&bbox, config.grid_size)?;
    log::info!(
        "grid of {} x {} points",
        grid.latitudes.len(),
        grid.longitudes.len()
    );

    let index = isogrid::KDTree::from_iter(g.iter().cloned()).ok_or("the street network is empty")?;
    let writer = IsochroneWriter::new(g, config);
    let mut calculator = Calculator::new(&index, writer);

    let table = calculator.build_table(&grid)?;
    table.save(config.mapping_path())?;
    GridManifest::new(config.grid_size, bbox).save(config.manifest_path())?;

    let summary = calculator.summary();
    log::info!(
        "mapped {} grid points to {} nodes",
        summary.points,
        summary.nodes
    );
    if !summary.failed.is_empty() {
        log::warn!(
            "{} nodes failed, {} grid points have no isochrones: {:?}",
            summary.failed.len(),
            summary.placeholders,
            summary.failed
        );
    }
    Ok(())
}

fn refine(config: &Config) -> Result<(), Box<dyn Error>> {
    isogrid::refine::refine_file(
        config.mapping_path(),
        config.manifest_path(),
        config.refined_path(),
    )?;
    Ok(())
}
