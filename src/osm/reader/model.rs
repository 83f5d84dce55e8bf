// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::Node;
use std::collections::HashMap;

/// Represents an [OSM way](https://wiki.openstreetmap.org/wiki/Way).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Way {
    pub id: i64,
    pub nodes: Vec<i64>,
    pub tags: HashMap<String, String>,
}

/// OSM features relevant for the pedestrian network.
/// Relations are skipped, as turn restrictions do not apply to pedestrians.
#[derive(Debug, Clone)]
pub enum Feature {
    Node(Node),
    Way(Way),
}
