// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::io;
use std::path::PathBuf;

use crate::{IsochroneError, NodeId};

/// Error conditions which may occur when preparing the isochrone grid.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed bounding box file.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Non-positive grid size or otherwise unusable parameter.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The street graph has no node which could be matched against a grid point.
    #[error("no street node near ({lat}, {lon})")]
    NoNearestNode { lat: f64, lon: f64 },

    /// Isochrones of a node could not be computed.
    #[error("node {node}: {source}")]
    Computation {
        node: NodeId,
        #[source]
        source: IsochroneError,
    },

    /// A mapping entry is not a node id.
    #[error("mapping[{lat}][{lon}]: {message}")]
    InvalidMapping {
        lat: String,
        lon: String,
        message: String,
    },

    /// The mapping does not match the grid described by its manifest.
    #[error("mapping shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("osm: {0}")]
    Osm(#[from] crate::osm::Error),
}

impl Error {
    /// Returns a closure wrapping an [io::Error] with the path it relates to,
    /// for use with [Result::map_err].
    pub(crate) fn io<P: Into<PathBuf>>(path: P) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
