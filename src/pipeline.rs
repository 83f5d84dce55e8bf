// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashSet;

use crate::{Error, Grid, MappingTable, NearestNode, NodeId, NodeProcessor, NO_NODE};

/// Statistics of a single [Calculator] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of grid points matched against nodes.
    pub points: usize,

    /// Number of distinct nodes passed to the [NodeProcessor].
    pub nodes: usize,

    /// Nodes whose processing failed, sorted ascending.
    pub failed: Vec<NodeId>,

    /// Number of grid points mapped to [NO_NODE] due to failed nodes.
    pub placeholders: usize,
}

/// Matches grid points against street nodes, making sure that every distinct node
/// is passed to the [NodeProcessor] exactly once.
///
/// A node whose processing fails is never retried; grid points resolving to it
/// are mapped to [NO_NODE] by [Calculator::build_table].
#[derive(Debug)]
pub struct Calculator<N: NearestNode, P: NodeProcessor> {
    resolver: N,
    processor: P,
    processed: HashSet<NodeId>,
    failed: HashSet<NodeId>,
    points: usize,
    placeholders: usize,
}

impl<N: NearestNode, P: NodeProcessor> Calculator<N, P> {
    pub fn new(resolver: N, processor: P) -> Self {
        Self {
            resolver,
            processor,
            processed: HashSet::default(),
            failed: HashSet::default(),
            points: 0,
            placeholders: 0,
        }
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Returns true if the node was already passed to the [NodeProcessor].
    pub fn is_processed(&self, node: NodeId) -> bool {
        self.processed.contains(&node)
    }

    /// Resolves the node nearest to a position and processes it,
    /// unless that was already done in this run.
    ///
    /// Fails with [Error::NoNearestNode] if the resolver has no nodes,
    /// and with [Error::Computation] if the processor fails. Subsequent calls
    /// resolving to a failed node return that node without retrying.
    pub fn process(&mut self, lat: f64, lon: f64) -> Result<NodeId, Error> {
        let node = self
            .resolver
            .nearest_node(lat, lon)
            .ok_or(Error::NoNearestNode { lat, lon })?;

        if !self.processed.insert(node) {
            log::info!("({lat}, {lon}): node {node} already processed, skipping");
            return Ok(node);
        }

        log::debug!("({lat}, {lon}): processing node {node}");
        self.processor.process_node(node).map_err(|source| {
            self.failed.insert(node);
            Error::Computation { node, source }
        })?;
        Ok(node)
    }

    /// Matches every point of the grid against a node,
    /// latitudes in the outer and longitudes in the inner loop.
    ///
    /// Failed nodes don't abort the run: their grid points are mapped to [NO_NODE].
    /// Any other error is returned immediately.
    pub fn build_table(&mut self, grid: &Grid) -> Result<MappingTable, Error> {
        let mut table = MappingTable::default();

        for (row_idx, &lat) in grid.latitudes.iter().enumerate() {
            let mut cells = Vec::with_capacity(grid.longitudes.len());

            for &lon in &grid.longitudes {
                let node = match self.process(lat, lon) {
                    Ok(node) if self.failed.contains(&node) => NO_NODE,
                    Ok(node) => node,
                    Err(Error::Computation { node, source }) => {
                        log::warn!("({lat}, {lon}): isochrones of node {node} failed: {source}");
                        NO_NODE
                    }
                    Err(e) => return Err(e),
                };

                if node == NO_NODE {
                    self.placeholders += 1;
                }
                self.points += 1;
                cells.push((lon, node));
            }

            table.push_row(lat, cells);
            log::info!(
                "row {}/{} (lat {lat}) done, {} distinct nodes so far",
                row_idx + 1,
                grid.latitudes.len(),
                self.processed.len(),
            );
        }

        Ok(table)
    }

    /// Returns statistics of all calls made so far.
    pub fn summary(&self) -> RunSummary {
        let mut failed: Vec<NodeId> = self.failed.iter().cloned().collect();
        failed.sort_unstable();

        RunSummary {
            points: self.points,
            nodes: self.processed.len(),
            failed,
            placeholders: self.placeholders,
        }
    }
}
