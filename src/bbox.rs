// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Geographic extent of a street network, in degrees.
///
/// Stored on disk as four newline-separated decimal numbers,
/// in order: north, south, east, west.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Parses the four-line textual representation of a bounding box.
    /// Lines after the fourth one are ignored.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let mut lines = s.lines();
        let mut values = [0.0; 4];

        for (idx, value) in values.iter_mut().enumerate() {
            let line = lines.next().ok_or_else(|| Error::Parse {
                line: idx + 1,
                message: "expected 4 lines: north, south, east, west".to_string(),
            })?;

            *value = line
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| Error::Parse {
                    line: idx + 1,
                    message: format!("not a decimal number: {:?}", line.trim()),
                })?;
        }

        let [north, south, east, west] = values;
        Ok(Self {
            north,
            south,
            east,
            west,
        })
    }

    /// Reads a bounding box from a file, see [BoundingBox::parse].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(Error::io(path))?;
        Self::parse(&content)
    }

    /// Writes the bounding box into a file, in the format understood by [BoundingBox::load].
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        fs::write(path, self.to_string()).map_err(Error::io(path))
    }

    /// Checks the north > south and east > west invariant.
    pub fn validate(&self) -> Result<(), Error> {
        if self.north <= self.south {
            return Err(Error::InvalidArgument(format!(
                "bbox north ({}) must be greater than south ({})",
                self.north, self.south
            )));
        }
        if self.east <= self.west {
            return Err(Error::InvalidArgument(format!(
                "bbox east ({}) must be greater than west ({})",
                self.east, self.west
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.north)?;
        writeln!(f, "{}", self.south)?;
        writeln!(f, "{}", self.east)?;
        writeln!(f, "{}", self.west)
    }
}
