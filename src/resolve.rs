// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{Graph, KDTree, NodeId};

/// Matches arbitrary positions against nodes of a street network.
///
/// Implementations must be deterministic: the same position always resolves
/// to the same node for the lifetime of the resolver.
pub trait NearestNode {
    /// Returns the id of the node closest to the given position,
    /// or `None` if there are no nodes at all.
    fn nearest_node(&self, lat: f64, lon: f64) -> Option<NodeId>;
}

impl NearestNode for Graph {
    fn nearest_node(&self, lat: f64, lon: f64) -> Option<NodeId> {
        self.find_nearest_node(lat, lon).map(|n| n.id)
    }
}

impl NearestNode for KDTree {
    fn nearest_node(&self, lat: f64, lon: f64) -> Option<NodeId> {
        Some(self.find_nearest_node(lat, lon).id)
    }
}

impl<N: NearestNode + ?Sized> NearestNode for &N {
    fn nearest_node(&self, lat: f64, lon: f64) -> Option<NodeId> {
        (**self).nearest_node(lat, lon)
    }
}
