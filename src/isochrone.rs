// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Walking isochrones of individual street nodes.
//!
//! An isochrone of a node is built from its ego graph: the sub-graph of all nodes
//! reachable within a given walking time. Every reached node and every edge between
//! reached nodes is buffered, the buffers are merged, and the outline of the result
//! (with holes filled in) becomes the isochrone polygon.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fs;
use std::io;
use std::path::PathBuf;

use geo::{
    Area, BooleanOps, Buffer, Coord, LineString, MapCoords, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon,
};
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::json;

use crate::{Config, Graph, LocalProjection, NodeId};

/// Error conditions which may occur when computing isochrones of a node.
#[derive(Debug, thiserror::Error)]
pub enum IsochroneError {
    #[error("node does not exist in the graph")]
    UnknownNode,

    #[error("no reachable area within {0} minutes")]
    EmptyArea(f64),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("geojson: {0}")]
    GeoJson(#[from] geojson::Error),
}

/// Computation invoked once for every distinct node matched against the grid.
pub trait NodeProcessor {
    fn process_node(&mut self, node: NodeId) -> Result<(), IsochroneError>;
}

#[derive(Debug, Clone, Copy)]
struct QueueItem {
    at: NodeId,
    minutes: f64,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // NOTE: Comparison is reversed, as shorter times are "higher"
        // and Rust's BinaryHeap is a max-heap.
        other.minutes.total_cmp(&self.minutes)
    }
}

/// Finds all nodes reachable from `center` within `max_minutes` of walking
/// at `speed` km/h, following outgoing edges. Returns the walking time (in minutes)
/// to every reached node, including the center itself.
pub fn ego_graph(
    g: &Graph,
    center: NodeId,
    max_minutes: f64,
    speed: f64,
) -> Result<HashMap<NodeId, f64>, IsochroneError> {
    if g.get_node(center).is_none() {
        return Err(IsochroneError::UnknownNode);
    }

    let minutes_per_km = 60.0 / speed;
    let mut queue: BinaryHeap<QueueItem> = BinaryHeap::default();
    let mut reached: HashMap<NodeId, f64> = HashMap::default();

    queue.push(QueueItem {
        at: center,
        minutes: 0.0,
    });
    reached.insert(center, 0.0);

    while let Some(item) = queue.pop() {
        // Multiple items may be kept in the queue for the same node
        if item.minutes > reached.get(&item.at).cloned().unwrap_or(f64::INFINITY) {
            continue;
        }

        for edge in g.get_edges(item.at) {
            if g.get_node(edge.to).is_none() {
                continue;
            }

            let minutes = item.minutes + edge.length * minutes_per_km;
            if minutes > max_minutes
                || minutes >= reached.get(&edge.to).cloned().unwrap_or(f64::INFINITY)
            {
                continue;
            }

            reached.insert(edge.to, minutes);
            queue.push(QueueItem {
                at: edge.to,
                minutes,
            });
        }
    }

    Ok(reached)
}

/// Builds the isochrone polygon (in lon-lat degrees) covering the given set of nodes.
///
/// Returns `None` if the buffered area is empty, e.g. when both buffers are zero.
pub fn isochrone_polygon(
    g: &Graph,
    nodes: &[NodeId],
    projection: &LocalProjection,
    node_buffer: f64,
    edge_buffer: f64,
) -> Option<Polygon<f64>> {
    let members: HashSet<NodeId> = nodes.iter().cloned().collect();
    let position = |id: NodeId| {
        g.get_node(id)
            .map(|n| projection.project(Coord { x: n.lon, y: n.lat }))
    };

    let points: MultiPoint<f64> = members
        .iter()
        .filter_map(|&id| position(id))
        .map(Point::from)
        .collect();

    // Induced sub-graph: all edges between member nodes
    let lines: MultiLineString<f64> = MultiLineString::new(
        members
            .iter()
            .flat_map(|&from| {
                g.get_edges(from)
                    .iter()
                    .filter(|e| members.contains(&e.to))
                    .map(move |e| (from, e.to))
            })
            .filter_map(|(from, to)| Some(LineString::from(vec![position(from)?, position(to)?])))
            .collect(),
    );

    let mut area = if node_buffer > 0.0 {
        points.buffer(node_buffer)
    } else {
        MultiPolygon::new(vec![])
    };
    if !lines.0.is_empty() && edge_buffer > 0.0 {
        area = area.union(&lines.buffer(edge_buffer));
    }

    let largest = area
        .into_iter()
        .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))?;

    // Fill in enclosed blocks, so that the isochrone is a solid shape
    let filled = Polygon::new(largest.exterior().clone(), vec![]);
    if filled.unsigned_area() <= 0.0 {
        return None;
    }

    Some(filled.map_coords(|c| projection.unproject(c)))
}

/// Computes isochrones of a node for all trip times of a [Config],
/// as a GeoJSON FeatureCollection with one Feature per trip time (longest first).
/// Every Feature has a single `time` property and a Polygon geometry
/// in lon-lat coordinates.
pub fn isochrones(
    g: &Graph,
    center: NodeId,
    config: &Config,
) -> Result<FeatureCollection, IsochroneError> {
    let center_node = g.get_node(center).ok_or(IsochroneError::UnknownNode)?;
    let projection = LocalProjection::new(center_node.lat, center_node.lon);
    let trip_times = config.trip_times_descending();

    let max_time = trip_times.first().cloned().unwrap_or(0.0);
    let reached = ego_graph(g, center, max_time, config.travel_speed)?;

    let mut features = Vec::with_capacity(trip_times.len());
    for trip_time in trip_times {
        let nodes: Vec<NodeId> = reached
            .iter()
            .filter(|(_, &minutes)| minutes <= trip_time)
            .map(|(&id, _)| id)
            .collect();

        let polygon = isochrone_polygon(
            g,
            &nodes,
            &projection,
            config.node_buffer,
            config.edge_buffer,
        )
        .ok_or(IsochroneError::EmptyArea(trip_time))?;

        log::debug!(
            "node {center}: {} nodes reachable within {trip_time} minutes",
            nodes.len()
        );

        let value = json!({
            "type": "Feature",
            "geometry": Geometry::new(GeoJsonValue::from(&polygon)),
            "properties": {
                "time": trip_time,
            }
        });
        features.push(serde_json::from_value::<Feature>(value).map_err(geojson::Error::from)?);
    }

    Ok(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    })
}

/// [NodeProcessor] saving [isochrones] of every node as
/// `<output_dir>/<node_id>.geojson`.
#[derive(Debug, Clone)]
pub struct IsochroneWriter<'g> {
    g: &'g Graph,
    config: Config,
    output_dir: PathBuf,
}

impl<'g> IsochroneWriter<'g> {
    /// Creates a writer saving files into [Config::geojson_dir].
    pub fn new(g: &'g Graph, config: &Config) -> Self {
        Self {
            g,
            config: config.clone(),
            output_dir: config.geojson_dir(),
        }
    }

    /// Returns the path of the file with isochrones of a given node.
    pub fn path_of(&self, node: NodeId) -> PathBuf {
        self.output_dir.join(format!("{node}.geojson"))
    }
}

impl<'g> NodeProcessor for IsochroneWriter<'g> {
    fn process_node(&mut self, node: NodeId) -> Result<(), IsochroneError> {
        let collection = isochrones(self.g, node, &self.config)?;

        fs::create_dir_all(&self.output_dir).map_err(|source| IsochroneError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self.path_of(node);
        let content = serde_json::to_string(&collection)?;
        fs::write(&path, content).map_err(|source| IsochroneError::Io { path, source })?;

        log::info!("node {node}: isochrones saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{earth_distance, Edge, Node};
    use geo::Contains;

    /// Straight street of 10 nodes, spaced 0.001° (~111 m) apart, starting at id 1,
    /// plus an isolated node 99.
    fn street() -> Graph {
        let mut g = Graph::default();
        for i in 1..=10 {
            g.set_node(Node {
                id: i,
                lat: 41.80 + 0.001 * (i - 1) as f64,
                lon: -71.40,
            });
        }
        for i in 1..10 {
            let (a, b) = (g.get_node(i).unwrap(), g.get_node(i + 1).unwrap());
            let length = earth_distance(a.lat, a.lon, b.lat, b.lon);
            g.set_edge(i, Edge { to: i + 1, length });
            g.set_edge(i + 1, Edge { to: i, length });
        }
        g.set_node(Node {
            id: 99,
            lat: 41.70,
            lon: -71.40,
        });
        g
    }

    fn sorted_keys(m: &HashMap<NodeId, f64>) -> Vec<NodeId> {
        let mut keys: Vec<_> = m.keys().cloned().collect();
        keys.sort();
        keys
    }

    #[test]
    fn ego_graph_is_bounded_by_time() {
        let g = street();

        // 4.5 km/h: 2 min = 150 m, 5 min = 375 m, 10 min = 750 m
        assert_eq!(sorted_keys(&ego_graph(&g, 1, 2.0, 4.5).unwrap()), vec![1, 2]);
        assert_eq!(sorted_keys(&ego_graph(&g, 1, 5.0, 4.5).unwrap()), vec![1, 2, 3, 4]);
        assert_eq!(
            sorted_keys(&ego_graph(&g, 5, 5.0, 4.5).unwrap()),
            vec![2, 3, 4, 5, 6, 7, 8]
        );
        assert_eq!(sorted_keys(&ego_graph(&g, 99, 10.0, 4.5).unwrap()), vec![99]);
    }

    #[test]
    fn ego_graph_times() {
        let g = street();
        let reached = ego_graph(&g, 1, 10.0, 4.5).unwrap();
        assert_eq!(reached[&1], 0.0);

        let expected = g.get_edge(1, 2) * 2.0 / 4.5 * 60.0;
        assert!((reached[&3] - expected).abs() < 1e-9);
    }

    #[test]
    fn ego_graph_unknown_node() {
        assert!(matches!(
            ego_graph(&street(), 42, 10.0, 4.5),
            Err(IsochroneError::UnknownNode)
        ));
    }

    #[test]
    fn polygon_covers_reached_nodes() {
        let g = street();
        let projection = LocalProjection::new(41.80, -71.40);
        let polygon = isochrone_polygon(&g, &[1, 2, 3], &projection, 50.0, 50.0).unwrap();

        assert!(polygon.interiors().is_empty());
        for id in [1, 2, 3] {
            let n = g.get_node(id).unwrap();
            assert!(polygon.contains(&Point::new(n.lon, n.lat)), "node {id} not covered");
        }
        let far = g.get_node(6).unwrap();
        assert!(!polygon.contains(&Point::new(far.lon, far.lat)));
    }

    #[test]
    fn polygon_of_isolated_node() {
        let g = street();
        let projection = LocalProjection::new(41.70, -71.40);
        let polygon = isochrone_polygon(&g, &[99], &projection, 50.0, 50.0).unwrap();
        assert!(polygon.contains(&Point::new(-71.40, 41.70)));

        assert!(isochrone_polygon(&g, &[99], &projection, 0.0, 0.0).is_none());
    }

    fn ring_area(feature: &Feature) -> f64 {
        let value = serde_json::to_value(feature).unwrap();
        assert_eq!(value["geometry"]["type"], "Polygon");
        let ring: Vec<Coord<f64>> = value["geometry"]["coordinates"][0]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| Coord {
                x: c[0].as_f64().unwrap(),
                y: c[1].as_f64().unwrap(),
            })
            .collect();
        Polygon::new(LineString::from(ring), vec![]).unsigned_area()
    }

    #[test]
    fn isochrones_per_trip_time() {
        let g = street();
        let collection = isochrones(&g, 1, &Config::default()).unwrap();

        let times: Vec<f64> = collection
            .features
            .iter()
            .map(|f| serde_json::to_value(f).unwrap()["properties"]["time"].as_f64().unwrap())
            .collect();
        assert_eq!(times, vec![10.0, 5.0, 2.0]);

        let areas: Vec<f64> = collection.features.iter().map(ring_area).collect();
        assert!(areas[0] > areas[1]);
        assert!(areas[1] > areas[2]);
    }

    #[test]
    fn writer_saves_geojson() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let g = street();
        let mut writer = IsochroneWriter::new(&g, &config);

        writer.process_node(5).unwrap();

        let path = dir.path().join("geojson").join("5.geojson");
        assert_eq!(writer.path_of(5), path);

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"].as_array().unwrap().len(), 3);
        assert_eq!(value["features"][0]["properties"]["time"], 10.0);
    }

    #[test]
    fn writer_unknown_node() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let g = street();
        let mut writer = IsochroneWriter::new(&g, &config);

        assert!(matches!(
            writer.process_node(42),
            Err(IsochroneError::UnknownNode)
        ));
        assert!(!writer.path_of(42).exists());
    }
}
