// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fs;
use std::path::Path;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::{BoundingBox, Error, Grid, GridSize, NodeId};

/// Street node matched against every point of a [Grid], in generation order.
///
/// Serialized as a JSON object of objects: outer keys are latitudes, inner keys
/// are longitudes (both in their shortest decimal form) and values are node ids
/// as strings. Rows and columns keep the order in which they were inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingTable {
    rows: Vec<(f64, Vec<(f64, NodeId)>)>,
}

impl MappingTable {
    /// Appends a complete row of `(lon, node)` cells for a given latitude.
    pub fn push_row(&mut self, lat: f64, cells: Vec<(f64, NodeId)>) {
        self.rows.push((lat, cells));
    }

    /// Returns all rows, in insertion order.
    pub fn rows(&self) -> &[(f64, Vec<(f64, NodeId)>)] {
        &self.rows
    }

    /// Returns the number of cells in the table.
    pub fn len(&self) -> usize {
        self.rows.iter().map(|(_, cells)| cells.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the node stored for an exact grid point.
    pub fn get(&self, lat: f64, lon: f64) -> Option<NodeId> {
        self.rows
            .iter()
            .find(|(row_lat, _)| *row_lat == lat)
            .and_then(|(_, cells)| cells.iter().find(|(cell_lon, _)| *cell_lon == lon))
            .map(|&(_, node)| node)
    }

    /// Writes the table as JSON into a file, creating parent directories as necessary.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        write_json(path.as_ref(), self)
    }
}

struct Row<'a>(&'a [(f64, NodeId)]);

impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (lon, node) in self.0 {
            map.serialize_entry(&lon.to_string(), &node.to_string())?;
        }
        map.end()
    }
}

impl Serialize for MappingTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rows.len()))?;
        for (lat, cells) in &self.rows {
            map.serialize_entry(&lat.to_string(), &Row(cells))?;
        }
        map.end()
    }
}

/// Configuration of the grid used to generate a [MappingTable],
/// stored next to the mapping and carried over into the refined artifact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridManifest {
    /// Grid spacing, in degrees.
    pub grid_size: f64,
    pub bbox: BoundingBox,
}

impl GridManifest {
    pub fn new(size: GridSize, bbox: BoundingBox) -> Self {
        Self {
            grid_size: size.degrees(),
            bbox,
        }
    }

    /// Rebuilds the [Grid] described by the manifest.
    pub fn grid(&self) -> Result<Grid, Error> {
        Grid::new(&self.bbox, GridSize::new(self.grid_size)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(Error::io(path))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        write_json(path.as_ref(), self)
    }
}

/// Serializes a value into a JSON file, creating its parent directory if necessary.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(Error::io(parent))?;
    }
    let content = serde_json::to_string(value)?;
    fs::write(path, content).map_err(Error::io(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_table() -> MappingTable {
        let mut table = MappingTable::default();
        table.push_row(41.8, vec![(-71.4005, 12345), (-71.4, 12345), (-71.3995, 7)]);
        table.push_row(41.7995, vec![(-71.4005, 3), (-71.4, 0), (-71.3995, 12345)]);
        table
    }

    #[test]
    fn serialize_preserves_order() {
        let json = serde_json::to_string(&small_table()).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"41.8":{"-71.4005":"12345","-71.4":"12345","-71.3995":"7"},"#,
                r#""41.7995":{"-71.4005":"3","-71.4":"0","-71.3995":"12345"}}"#,
            )
        );
    }

    #[test]
    fn get() {
        let table = small_table();
        assert_eq!(table.len(), 6);
        assert_eq!(table.get(41.8, -71.3995), Some(7));
        assert_eq!(table.get(41.7995, -71.4), Some(0));
        assert_eq!(table.get(41.7, -71.4), None);
    }

    #[test]
    fn save_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("mapping.json");
        small_table().save(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["41.8"]["-71.4005"], "12345");
    }

    #[test]
    fn manifest_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.meta.json");
        let bbox = BoundingBox {
            north: 41.861571,
            south: 41.772414,
            east: -71.3736135,
            west: -71.472667,
        };
        let manifest = GridManifest::new(GridSize::DEFAULT, bbox);
        manifest.save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(r#"{"grid_size":0.0005,"bbox":{"north":41.861571,"#));

        let loaded = GridManifest::load(&path).unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.grid().unwrap(), Grid::new(&bbox, GridSize::DEFAULT).unwrap());
    }

    #[test]
    fn manifest_with_invalid_grid_size() {
        let manifest = GridManifest {
            grid_size: -1.0,
            bbox: BoundingBox {
                north: 1.0,
                south: 0.0,
                east: 1.0,
                west: 0.0,
            },
        };
        assert!(matches!(manifest.grid(), Err(Error::InvalidArgument(_))));
    }
}
