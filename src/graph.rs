// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{earth_distance, BoundingBox, Edge, Node, NodeId};
use std::collections::btree_map::{BTreeMap, Entry};

/// Represents a pedestrian street network as a set of [Nodes](Node)
/// and [Edges](Edge) between them.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Graph(pub(crate) BTreeMap<NodeId, (Node, Vec<Edge>)>);

impl Graph {
    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over all [Nodes](Node) in the graph.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.0.iter().map(|(_, (node, _))| node)
    }

    /// Retrieves a [Node] with the provided id.
    pub fn get_node(&self, id: NodeId) -> Option<Node> {
        self.0.get(&id).map(|&(node, _)| node)
    }

    /// Creates or updates a [Node] with `node.id`.
    ///
    /// All outgoing and incoming edges are preserved.
    pub fn set_node(&mut self, node: Node) {
        assert_ne!(node.id, 0);

        match self.0.entry(node.id) {
            Entry::Vacant(e) => {
                e.insert((node, Vec::default()));
            }
            Entry::Occupied(mut e) => {
                debug_assert_eq!(e.get().0.id, node.id);
                e.get_mut().0 = node;
            }
        }
    }

    /// Deletes a [Node] with a given `id`.
    ///
    /// While all outgoing edges are removed, incoming edges are preserved
    /// (as this would require a walk over all nodes in the graph).
    pub fn delete_node(&mut self, id: NodeId) {
        self.0.remove(&id);
    }

    /// Finds the closest [Node] to the given position.
    ///
    /// This function requires computing the distance to every [Node] in the graph,
    /// and is not suitable for large graphs - use a [KDTree](crate::KDTree) instead.
    /// Ties are broken in favor of the node with the lowest id.
    pub fn find_nearest_node(&self, lat: f64, lon: f64) -> Option<Node> {
        self.0
            .iter()
            .map(|(_, &(nd, _))| (earth_distance(lat, lon, nd.lat, nd.lon), nd))
            .min_by(|(a_dist, _), (b_dist, _)| a_dist.total_cmp(b_dist))
            .map(|(_, nd)| nd)
    }

    /// Gets all outgoing [Edges](Edge) from a node with a given id.
    pub fn get_edges(&self, from_id: NodeId) -> &[Edge] {
        self.0
            .get(&from_id)
            .map(|(_, e)| e.as_slice())
            .unwrap_or_default()
    }

    /// Gets the length of an [Edge] from one node to another.
    /// If such an edge doesn't exist, returns [f64::INFINITY].
    pub fn get_edge(&self, from_id: NodeId, to_id: NodeId) -> f64 {
        self.get_edges(from_id)
            .iter()
            .find(|edge| edge.to == to_id)
            .map(|edge| edge.length)
            .unwrap_or(f64::INFINITY)
    }

    /// Creates or updates an [Edge] from a node with a given id.
    pub fn set_edge(&mut self, from_id: NodeId, edge: Edge) {
        assert_ne!(from_id, 0);
        assert_ne!(edge.to, 0);

        if let Some((_, edges)) = self.0.get_mut(&from_id) {
            if let Some(candidate) = edges.iter_mut().find(|e| e.to == edge.to) {
                *candidate = edge;
            } else {
                edges.push(edge);
            }
        }
    }

    /// Returns the smallest [BoundingBox] containing all nodes of the graph,
    /// or `None` if the graph is empty.
    pub fn bbox(&self) -> Option<BoundingBox> {
        let mut nodes = self.iter();
        let first = nodes.next()?;
        let init = BoundingBox {
            north: first.lat,
            south: first.lat,
            east: first.lon,
            west: first.lon,
        };

        Some(nodes.fold(init, |b, n| BoundingBox {
            north: b.north.max(n.lat),
            south: b.south.min(n.lat),
            east: b.east.max(n.lon),
            west: b.west.min(n.lon),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_graph() -> Graph {
        let mut g = Graph::default();
        g.set_node(Node {
            id: 1,
            lat: 41.80,
            lon: -71.40,
        });
        g.set_node(Node {
            id: 2,
            lat: 41.81,
            lon: -71.42,
        });
        g.set_node(Node {
            id: 3,
            lat: 41.79,
            lon: -71.41,
        });
        g.set_edge(1, Edge { to: 2, length: 2.0 });
        g.set_edge(2, Edge { to: 1, length: 2.0 });
        g
    }

    #[test]
    fn bbox_covers_all_nodes() {
        let b = simple_graph().bbox().unwrap();
        assert_eq!(b.north, 41.81);
        assert_eq!(b.south, 41.79);
        assert_eq!(b.east, -71.40);
        assert_eq!(b.west, -71.42);
    }

    #[test]
    fn bbox_of_empty_graph() {
        assert_eq!(Graph::default().bbox(), None);
    }

    #[test]
    fn edges() {
        let mut g = simple_graph();
        assert_eq!(g.get_edge(1, 2), 2.0);
        assert!(g.get_edge(1, 3).is_infinite());

        g.set_edge(1, Edge { to: 2, length: 3.0 });
        assert_eq!(g.get_edges(1).len(), 1);
        assert_eq!(g.get_edge(1, 2), 3.0);

        // Edges from unknown nodes are not stored
        g.set_edge(4, Edge { to: 1, length: 1.0 });
        assert!(g.get_edges(4).is_empty());
    }

    #[test]
    fn find_nearest_node() {
        let g = simple_graph();
        assert_eq!(g.find_nearest_node(41.809, -71.419).unwrap().id, 2);
        assert_eq!(g.find_nearest_node(41.0, -71.41).unwrap().id, 3);
        assert_eq!(Graph::default().find_nearest_node(0.0, 0.0), None);
    }
}
