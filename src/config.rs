// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use crate::{Error, GridSize};

/// Parameters of a single pipeline configuration.
///
/// The [Default] configuration describes walking isochrones of 2, 5 and 10 minutes
/// on a 0.0005° grid, with all files stored under `data/`.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Isochrone thresholds, in minutes.
    pub trip_times: Vec<f64>,

    /// Walking speed, in km/h.
    pub travel_speed: f64,

    /// Spacing of the lookup grid.
    pub grid_size: GridSize,

    /// Radius of the area around every reached node counted as reachable, in meters.
    pub node_buffer: f64,

    /// Radius of the area around every reached edge counted as reachable, in meters.
    pub edge_buffer: f64,

    /// Directory holding all inputs and outputs of the pipeline.
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trip_times: vec![2.0, 5.0, 10.0],
            travel_speed: 4.5,
            grid_size: GridSize::DEFAULT,
            node_buffer: 50.0,
            edge_buffer: 50.0,
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Config {
    /// Checks that all parameters are usable.
    pub fn validate(&self) -> Result<(), Error> {
        if self.trip_times.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one trip time is required".to_string(),
            ));
        }
        if let Some(t) = self
            .trip_times
            .iter()
            .find(|&&t| !t.is_finite() || t <= 0.0)
        {
            return Err(Error::InvalidArgument(format!(
                "trip times must be positive, got {t}"
            )));
        }
        if !self.travel_speed.is_finite() || self.travel_speed <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "travel speed must be positive, got {}",
                self.travel_speed
            )));
        }
        for (name, value) in [("node", self.node_buffer), ("edge", self.edge_buffer)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidArgument(format!(
                    "{name} buffer must not be negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Trip times from the longest to the shortest.
    pub fn trip_times_descending(&self) -> Vec<f64> {
        let mut times = self.trip_times.clone();
        times.sort_by(|a, b| b.total_cmp(a));
        times.dedup();
        times
    }

    pub fn bbox_path(&self) -> PathBuf {
        self.data_dir.join("bbox.txt")
    }

    pub fn geojson_dir(&self) -> PathBuf {
        self.data_dir.join("geojson")
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.data_dir.join("mapping.json")
    }

    /// Path of the grid manifest, stored next to the mapping.
    pub fn manifest_path(&self) -> PathBuf {
        self.data_dir.join("mapping.meta.json")
    }

    pub fn refined_path(&self) -> PathBuf {
        self.data_dir.join("refined.json")
    }
}
