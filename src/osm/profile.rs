// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

/// Describes which OSM ways form the pedestrian [Graph](crate::Graph).
///
/// Unlike routing, isochrones measure plain walking time, so ways are either
/// walkable or not. There is no preference between walkable ways.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profile<'a> {
    /// Human readable name of the profile.
    pub name: &'a str,

    /// Tags marking ways which can be walked on. A way matching any of them
    /// (exact key and value match) becomes a part of the graph, unless prohibited
    /// by the [access tags](Profile::access).
    pub walkable: &'a [WayTag<'a>],

    /// Array of OSM [access tags](https://wiki.openstreetmap.org/wiki/Key:access#Land-based_transportation)
    /// (in order from least to most specific) to consider when checking for prohibitions.
    /// The most specific one is also used for mode-specific one-way tags.
    pub access: &'a [&'a str],

    /// Force no walking over [motorroad=yes](https://wiki.openstreetmap.org/wiki/Key:motorroad) ways.
    pub disallow_motorroad: bool,
}

/// Key and value of a tag of an OSM way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WayTag<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

impl<'a> Profile<'a> {
    /// Checks if a way with given tags should be a part of the graph.
    pub fn is_walkable(&self, tags: &HashMap<String, String>) -> bool {
        let matches = self
            .walkable
            .iter()
            .any(|t| tags.get(t.key).map(|v| v.as_str()) == Some(t.value));
        matches && self.is_allowed(tags)
    }

    /// Checks the way against motor roads ([Profile::disallow_motorroad])
    /// and access tags ([Profile::access]).
    pub fn is_allowed(&self, tags: &HashMap<String, String>) -> bool {
        if self.disallow_motorroad && tags.get("motorroad").map(|v| v.as_str()) == Some("yes") {
            return false;
        }

        match self
            .access
            .iter()
            .rev()
            .find_map(|&mode| tags.get(mode).map(|v| v.as_str()))
        {
            Some("no") | Some("private") => false,
            _ => true,
        }
    }

    /// Checks if a way is walkable forward (first return value) and
    /// backwards (second return value).
    ///
    /// Pedestrians are not bound by one-way streets: only the mode-specific
    /// `oneway:MODE` tag is considered, plus the generic `oneway` tag on
    /// dedicated pedestrian infrastructure (footways, paths, steps and platforms).
    pub fn way_direction(&self, tags: &HashMap<String, String>) -> (bool, bool) {
        match self.get_active_oneway_value(tags) {
            "yes" | "true" | "1" => (true, false),
            "-1" | "reverse" => (false, true),
            _ => (true, true),
        }
    }

    fn get_active_oneway_value<'t>(&self, tags: &'t HashMap<String, String>) -> &'t str {
        let specific = self
            .access
            .iter()
            .rev()
            .filter(|&&mode| mode != "access")
            .find_map(|&mode| tags.get(&format!("oneway:{}", mode)));

        if let Some(value) = specific {
            return value.as_str();
        }

        if Self::is_pedestrian_infrastructure(tags) {
            tags.get("oneway").map(|v| v.as_str()).unwrap_or("")
        } else {
            ""
        }
    }

    fn is_pedestrian_infrastructure(tags: &HashMap<String, String>) -> bool {
        matches!(
            tags.get("highway").map(|v| v.as_str()),
            Some("footway") | Some("path") | Some("steps") | Some("platform")
        ) || tags.get("public_transport").map(|v| v.as_str()) == Some("platform")
            || tags.get("railway").map(|v| v.as_str()) == Some("platform")
    }
}

macro_rules! highways {
    [$( $value:literal ),+ $(,)?] => {
        &[ $( WayTag { key: "highway", value: $value } ),+ ]
    };
}

/// Profile of the pedestrian network, roughly equivalent to the "walk" network
/// type of OSMnx: every road and path except for motorways and cycleways.
pub const WALK_PROFILE: Profile = Profile {
    name: "foot",
    walkable: highways![
        "trunk",
        "trunk_link",
        "primary",
        "primary_link",
        "secondary",
        "secondary_link",
        "tertiary",
        "tertiary_link",
        "unclassified",
        "minor",
        "residential",
        "living_street",
        "road",
        "track",
        "service",
        "bridleway",
        "footway",
        "path",
        "steps",
        "pedestrian",
        "corridor",
        "platform",
    ],
    access: &["access", "foot"],
    disallow_motorroad: true,
};

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! tags {
        {$( $k:literal : $v:literal ),*} => {
            HashMap::from_iter([ $( ($k.to_string(), $v.to_string()) ),* ])
        };
    }

    #[test]
    fn is_walkable() {
        assert!(WALK_PROFILE.is_walkable(&tags! {"highway": "residential"}));
        assert!(WALK_PROFILE.is_walkable(&tags! {"highway": "footway", "footway": "sidewalk"}));
        assert!(!WALK_PROFILE.is_walkable(&tags! {"highway": "motorway"}));
        assert!(!WALK_PROFILE.is_walkable(&tags! {"highway": "cycleway"}));
        assert!(!WALK_PROFILE.is_walkable(&tags! {"building": "yes"}));
        assert!(!WALK_PROFILE.is_walkable(&tags! {}));
    }

    #[test]
    fn is_allowed() {
        assert!(WALK_PROFILE.is_allowed(&tags! {"highway": "service"}));
        assert!(!WALK_PROFILE.is_allowed(&tags! {"highway": "service", "access": "private"}));
        assert!(!WALK_PROFILE.is_allowed(&tags! {"highway": "primary", "foot": "no"}));
        assert!(WALK_PROFILE.is_allowed(&tags! {"highway": "track", "access": "no", "foot": "yes"}));
        assert!(!WALK_PROFILE.is_allowed(&tags! {"highway": "trunk", "motorroad": "yes"}));
    }

    #[test]
    fn way_direction() {
        assert_eq!(
            WALK_PROFILE.way_direction(&tags! {"highway": "residential", "oneway": "yes"}),
            (true, true)
        );
        assert_eq!(
            WALK_PROFILE.way_direction(&tags! {"highway": "footway", "oneway": "yes"}),
            (true, false)
        );
        assert_eq!(
            WALK_PROFILE.way_direction(&tags! {"highway": "residential", "oneway:foot": "-1"}),
            (false, true)
        );
        assert_eq!(
            WALK_PROFILE.way_direction(&tags! {"highway": "steps", "oneway": "yes", "oneway:foot": "no"}),
            (true, true)
        );
        assert_eq!(
            WALK_PROFILE.way_direction(&tags! {"railway": "platform", "oneway": "-1"}),
            (false, true)
        );
    }
}
