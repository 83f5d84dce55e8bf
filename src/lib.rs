// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Precomputed walking isochrones over [OpenStreetMap](https://www.openstreetmap.org/) data,
//! baked into a regular latitude/longitude lookup grid.
//!
//! The pipeline has three stages, each available as a library call and as a subcommand
//! of the `isogrid` binary:
//!
//! 1. Load a pedestrian street network from an OSM file ([osm::add_features_from_file])
//!    and store its [BoundingBox].
//! 2. Cover the bounding box with a [Grid], resolve the nearest street node of every
//!    grid point and compute isochrones of every distinct node exactly once
//!    ([Calculator]). This produces a [MappingTable] and one GeoJSON file per node.
//! 3. Compress the mapping into a dense matrix with grid metadata ([refine()]).
//!
//! # Example
//!
//! ```no_run
//! let config = isogrid::Config::default();
//! let mut g = isogrid::Graph::default();
//! let osm_options = isogrid::osm::Options {
//!     profile: &isogrid::osm::WALK_PROFILE,
//!     file_format: isogrid::osm::FileFormat::Unknown,
//!     bbox: [0.0; 4],
//! };
//! isogrid::osm::add_features_from_file(&mut g, &osm_options, "path/to/providence.osm")
//!     .expect("failed to load providence.osm");
//!
//! let bbox = g.bbox().expect("graph must not be empty");
//! let grid = isogrid::Grid::new(&bbox, config.grid_size).unwrap();
//! let index = isogrid::KDTree::from_iter(g.iter().cloned()).unwrap();
//! let writer = isogrid::IsochroneWriter::new(&g, &config);
//!
//! let mut calculator = isogrid::Calculator::new(&index, writer);
//! let table = calculator.build_table(&grid).expect("failed to build the mapping");
//! table.save(config.mapping_path()).unwrap();
//! ```

pub mod bbox;
pub mod config;
mod distance;
pub mod error;
mod graph;
pub mod grid;
pub mod isochrone;
mod kd;
pub mod mapping;
pub mod osm;
pub mod pipeline;
pub mod refine;
pub mod resolve;

pub use bbox::BoundingBox;
pub use config::Config;
pub use distance::{earth_distance, LocalProjection};
pub use error::Error;
pub use graph::Graph;
pub use grid::{build_axis, Grid, GridSize};
pub use isochrone::{IsochroneError, IsochroneWriter, NodeProcessor};
pub use kd::KDTree;
pub use mapping::{GridManifest, MappingTable};
pub use pipeline::{Calculator, RunSummary};
pub use refine::{refine, RefinedArtifact};
pub use resolve::NearestNode;

/// Identifier of a street [Node], equal to its OpenStreetMap node id.
///
/// Zero is never a valid id: it marks the absence of a node, and is used
/// as the placeholder in a [MappingTable] for grid points whose isochrones
/// could not be computed.
pub type NodeId = i64;

/// Placeholder [NodeId] for "no node".
pub const NO_NODE: NodeId = 0;

/// Represents an element of the street [Graph].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub lat: f64,
    pub lon: f64,
}

/// Represents an outgoing (one-way) connection from a specific [Node].
///
/// `length` is the length of the walked segment in kilometers.
/// Due to implementation details, `to` might not exist in the [Graph].
/// Users must silently ignore such edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: NodeId,
    pub length: f64,
}
