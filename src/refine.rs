// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mapping::write_json;
use crate::{Error, GridManifest, NodeId};

/// Compact form of a [MappingTable](crate::MappingTable): a dense matrix of node ids,
/// with rows corresponding to grid latitudes and columns to grid longitudes,
/// accompanied by the grid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinedArtifact {
    pub meta: GridManifest,
    pub mappings: Vec<Vec<NodeId>>,
}

/// Converts a mapping (in its JSON form) into a [RefinedArtifact].
///
/// Rows and columns are taken in the order they are stored in `mapping`. Node ids
/// may be stored as integer numbers or as strings with an integer. The matrix
/// must have the shape of the grid described by `meta`, and every key must be
/// the coordinate of the grid at the same position.
pub fn refine(mapping: &Value, meta: GridManifest) -> Result<RefinedArtifact, Error> {
    let grid = meta.grid()?;

    let rows = mapping
        .as_object()
        .ok_or_else(|| Error::ShapeMismatch("mapping is not a JSON object".to_string()))?;
    if rows.len() != grid.latitudes.len() {
        return Err(Error::ShapeMismatch(format!(
            "expected {} latitudes, got {}",
            grid.latitudes.len(),
            rows.len()
        )));
    }

    let mut mappings = Vec::with_capacity(rows.len());
    for ((lat, row), &grid_lat) in rows.iter().zip(&grid.latitudes) {
        check_key(lat, grid_lat, "latitude")?;

        let cells = row.as_object().ok_or_else(|| {
            Error::ShapeMismatch(format!("mapping[{lat}] is not a JSON object"))
        })?;
        if cells.len() != grid.longitudes.len() {
            return Err(Error::ShapeMismatch(format!(
                "mapping[{lat}]: expected {} longitudes, got {}",
                grid.longitudes.len(),
                cells.len()
            )));
        }

        let mut refined_row = Vec::with_capacity(cells.len());
        for ((lon, value), &grid_lon) in cells.iter().zip(&grid.longitudes) {
            check_key(lon, grid_lon, "longitude")?;
            let node = node_id(value).ok_or_else(|| Error::InvalidMapping {
                lat: lat.clone(),
                lon: lon.clone(),
                message: format!("not a node id: {value}"),
            })?;
            refined_row.push(node);
        }
        mappings.push(refined_row);
    }

    Ok(RefinedArtifact { meta, mappings })
}

/// Ensures a mapping key denotes the coordinate at the same position of the grid.
fn check_key(key: &str, expected: f64, axis: &str) -> Result<(), Error> {
    match key.trim().parse::<f64>() {
        Ok(value) if value == expected => Ok(()),
        _ => Err(Error::ShapeMismatch(format!(
            "mapping key {key:?} does not match grid {axis} {expected}"
        ))),
    }
}

fn node_id(value: &Value) -> Option<NodeId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Refines the mapping stored at `mapping_path`, described by the manifest at
/// `manifest_path`, and writes the result as JSON to `output_path`.
pub fn refine_file<P1, P2, P3>(
    mapping_path: P1,
    manifest_path: P2,
    output_path: P3,
) -> Result<RefinedArtifact, Error>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
    P3: AsRef<Path>,
{
    let mapping_path = mapping_path.as_ref();
    let content = fs::read_to_string(mapping_path).map_err(Error::io(mapping_path))?;
    let mapping: Value = serde_json::from_str(&content)?;
    let meta = GridManifest::load(manifest_path)?;

    let refined = refine(&mapping, meta)?;
    write_json(output_path.as_ref(), &refined)?;

    log::info!(
        "refined {}x{} mapping into {}",
        refined.mappings.len(),
        refined.mappings.first().map_or(0, |r| r.len()),
        output_path.as_ref().display(),
    );
    Ok(refined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        BoundingBox, Calculator, Grid, GridSize, IsochroneError, NearestNode, NodeProcessor,
    };
    use serde_json::json;

    struct PositionResolver;

    impl NearestNode for PositionResolver {
        fn nearest_node(&self, lat: f64, lon: f64) -> Option<NodeId> {
            Some((lat * 1e4).round() as i64 * 10_000_000 - (lon * 1e4).round() as i64)
        }
    }

    struct Noop;

    impl NodeProcessor for Noop {
        fn process_node(&mut self, _: NodeId) -> Result<(), IsochroneError> {
            Ok(())
        }
    }

    fn tiny_manifest() -> GridManifest {
        // Axes: lat [0.1, 0.1005, 0.101], lon [-0.2005, -0.2]
        GridManifest::new(
            GridSize::DEFAULT,
            BoundingBox {
                north: 0.10055,
                south: 0.1002,
                east: -0.2003,
                west: -0.2005,
            },
        )
    }

    #[test]
    fn mapping_to_refined_preserves_order() {
        let meta = tiny_manifest();
        let grid = meta.grid().unwrap();
        assert_eq!(grid.latitudes, vec![0.1, 0.1005, 0.101]);
        assert_eq!(grid.longitudes, vec![-0.2005, -0.2]);

        let mut c = Calculator::new(PositionResolver, Noop);
        let table = c.build_table(&grid).unwrap();

        // Go through the serialized form, as it is stored on disk
        let stored: Value = serde_json::from_str(&serde_json::to_string(&table).unwrap()).unwrap();
        let refined = refine(&stored, meta).unwrap();

        assert_eq!(refined.meta, meta);
        assert_eq!(refined.mappings.len(), grid.latitudes.len());
        for (i, &lat) in grid.latitudes.iter().enumerate() {
            assert_eq!(refined.mappings[i].len(), grid.longitudes.len());
            for (j, &lon) in grid.longitudes.iter().enumerate() {
                assert_eq!(
                    Some(refined.mappings[i][j]),
                    PositionResolver.nearest_node(lat, lon)
                );
            }
        }
    }

    #[test]
    fn refine_coerces_values() {
        let mapping = json!({
            "0.1": {"-0.2005": "1", "-0.2": 2},
            "0.1005": {"-0.2005": " 3 ", "-0.2": "0"},
            "0.101": {"-0.2005": 5, "-0.2": "6"},
        });
        let refined = refine(&mapping, tiny_manifest()).unwrap();
        assert_eq!(refined.mappings, vec![vec![1, 2], vec![3, 0], vec![5, 6]]);
    }

    #[test]
    fn refine_invalid_value() {
        let mapping = json!({
            "0.1": {"-0.2005": "1", "-0.2": 2},
            "0.1005": {"-0.2005": "x", "-0.2": "0"},
            "0.101": {"-0.2005": 5, "-0.2": 6.5},
        });
        match refine(&mapping, tiny_manifest()) {
            Err(Error::InvalidMapping { lat, lon, .. }) => {
                assert_eq!(lat, "0.1005");
                assert_eq!(lon, "-0.2005");
            }
            other => panic!("expected InvalidMapping, got {other:?}"),
        }
    }

    #[test]
    fn refine_shape_mismatch() {
        let missing_row = json!({
            "0.1": {"-0.2005": 1, "-0.2": 2},
            "0.1005": {"-0.2005": 3, "-0.2": 4},
        });
        assert!(matches!(
            refine(&missing_row, tiny_manifest()),
            Err(Error::ShapeMismatch(_))
        ));

        let missing_column = json!({
            "0.1": {"-0.2005": 1, "-0.2": 2},
            "0.1005": {"-0.2005": 3},
            "0.101": {"-0.2005": 5, "-0.2": 6},
        });
        assert!(matches!(
            refine(&missing_column, tiny_manifest()),
            Err(Error::ShapeMismatch(_))
        ));

        assert!(matches!(
            refine(&json!([1, 2, 3]), tiny_manifest()),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn refine_keys_from_other_grid() {
        // Same shape as the tiny grid, shifted by one step to the north
        let shifted_rows = json!({
            "0.1005": {"-0.2005": 1, "-0.2": 2},
            "0.101": {"-0.2005": 3, "-0.2": 4},
            "0.1015": {"-0.2005": 5, "-0.2": 6},
        });
        assert!(matches!(
            refine(&shifted_rows, tiny_manifest()),
            Err(Error::ShapeMismatch(_))
        ));

        let swapped_columns = json!({
            "0.1": {"-0.2": 1, "-0.2005": 2},
            "0.1005": {"-0.2": 3, "-0.2005": 4},
            "0.101": {"-0.2": 5, "-0.2005": 6},
        });
        assert!(matches!(
            refine(&swapped_columns, tiny_manifest()),
            Err(Error::ShapeMismatch(_))
        ));

        let not_a_number = json!({
            "0.1": {"-0.2005": 1, "-0.2": 2},
            "north": {"-0.2005": 3, "-0.2": 4},
            "0.101": {"-0.2005": 5, "-0.2": 6},
        });
        assert!(matches!(
            refine(&not_a_number, tiny_manifest()),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn refine_providence() {
        let bbox = BoundingBox::parse("41.861571\n41.772414\n-71.3736135\n-71.472667\n").unwrap();
        let meta = GridManifest::new(GridSize::DEFAULT, bbox);
        let grid = Grid::new(&bbox, GridSize::DEFAULT).unwrap();

        let mut c = Calculator::new(PositionResolver, Noop);
        let table = c.build_table(&grid).unwrap();
        let refined = refine(&serde_json::to_value(&table).unwrap(), meta).unwrap();

        assert_eq!(refined.mappings.len(), 181);
        assert!(refined.mappings.iter().all(|row| row.len() == 200));
        assert_eq!(refined.meta.grid_size, 0.0005);
        assert_eq!(refined.meta.bbox.north, 41.861571);
        assert_eq!(refined.meta.bbox.south, 41.772414);
        assert_eq!(refined.meta.bbox.east, -71.3736135);
        assert_eq!(refined.meta.bbox.west, -71.472667);
    }

    #[test]
    fn refine_files() {
        let dir = tempfile::tempdir().unwrap();
        let mapping_path = dir.path().join("mapping.json");
        let manifest_path = dir.path().join("mapping.meta.json");
        let output_path = dir.path().join("refined.json");

        let meta = tiny_manifest();
        let mut c = Calculator::new(PositionResolver, Noop);
        c.build_table(&meta.grid().unwrap())
            .unwrap()
            .save(&mapping_path)
            .unwrap();
        meta.save(&manifest_path).unwrap();

        let refined = refine_file(&mapping_path, &manifest_path, &output_path).unwrap();

        let stored: RefinedArtifact =
            serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).unwrap();
        assert_eq!(stored, refined);

        let value: Value = serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).unwrap();
        assert_eq!(value["meta"]["grid_size"], 0.0005);
        assert!(value["mappings"][0][0].is_i64());
    }

    #[test]
    fn refine_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let mapping_path = dir.path().join("mapping.json");
        fs::write(&mapping_path, "{}").unwrap();

        assert!(matches!(
            refine_file(&mapping_path, dir.path().join("nope.json"), dir.path().join("out.json")),
            Err(Error::Io { .. })
        ));
    }
}
