// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::io;
use std::str::from_utf8;

use quick_xml::events::{BytesStart, Event};

use super::model::{Feature, Way};
use super::FeatureReader;
use crate::Node;

/// Parser is a trait for objects which can parse XML.
///
/// This trait only exists to fix the mismatch of
/// [quick_xml::Reader::read_event] when working on buffered data
/// and [quick_xml::Reader::read_event_into] when working on IO.
pub(super) trait Parser {
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>>;
}

/// IoParser implements [Parser] over an [std::io::BufRead].
pub(super) struct IoParser<R: io::BufRead>(quick_xml::Reader<R>, Vec<u8>);

impl<R: io::BufRead> Parser for IoParser<R> {
    #[inline]
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>> {
        self.1.clear();
        self.0.read_event_into(&mut self.1)
    }
}

/// BufParser implements [Parser] over a slice of bytes (`&[u8]`).
pub(super) struct BufParser<'a>(quick_xml::Reader<&'a [u8]>);

impl<'a> Parser for BufParser<'a> {
    #[inline]
    fn read_event<'b>(&'b mut self) -> quick_xml::Result<Event<'b>> {
        self.0.read_event()
    }
}

/// Reader streams osm [Features](Feature) from an
/// [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML) document.
///
/// Nodes and ways with missing or malformed ids or coordinates are skipped,
/// and so are all relations.
pub(super) struct Reader<P: Parser> {
    parser: P,
    current: Option<Feature>,
    eof: bool,
}

impl<'a> Reader<BufParser<'a>> {
    pub(super) fn from_buffer(data: &'a [u8]) -> Self {
        Self::new(BufParser(quick_xml::Reader::from_reader(data)))
    }
}

impl<R: io::BufRead> Reader<IoParser<R>> {
    pub(super) fn from_io(reader: R) -> Self {
        Self::new(IoParser(quick_xml::Reader::from_reader(reader), Vec::default()))
    }
}

impl<P: Parser> Reader<P> {
    fn new(parser: P) -> Self {
        Self {
            parser,
            current: None,
            eof: false,
        }
    }

    fn next_feature(&mut self) -> quick_xml::Result<Option<Feature>> {
        while !self.eof {
            match self.parser.read_event()? {
                Event::Empty(start) => match start.local_name().as_ref() {
                    b"node" => {
                        if let Some(n) = parse_node(&start) {
                            return Ok(Some(Feature::Node(n)));
                        }
                    }
                    b"tag" => {
                        if let Some(Feature::Way(ref mut w)) = self.current {
                            if let Some((k, v)) = parse_tag(&start) {
                                w.tags.insert(k, v);
                            }
                        }
                    }
                    b"nd" => {
                        if let Some(Feature::Way(ref mut w)) = self.current {
                            if let Some(ref_) = parse_nd(&start) {
                                w.nodes.push(ref_);
                            }
                        }
                    }
                    _ => {}
                },

                Event::Start(start) => match start.local_name().as_ref() {
                    b"node" => self.current = parse_node(&start).map(Feature::Node),
                    b"way" => self.current = parse_way(&start).map(Feature::Way),
                    _ => {}
                },

                Event::End(end) => match end.local_name().as_ref() {
                    b"node" | b"way" => {
                        if let Some(f) = self.current.take() {
                            return Ok(Some(f));
                        }
                    }
                    _ => {}
                },

                Event::Eof => self.eof = true,

                _ => {}
            }
        }

        Ok(self.current.take())
    }
}

impl<P: Parser> FeatureReader for Reader<P> {
    type Error = quick_xml::Error;

    fn next(&mut self) -> Result<Option<Feature>, Self::Error> {
        self.next_feature()
    }
}

fn parse_attribute<T: std::str::FromStr>(start: &BytesStart<'_>, key: &[u8]) -> Option<T> {
    start
        .attributes()
        .filter_map(|attr| attr.ok())
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| from_utf8(&attr.value).ok()?.parse().ok())
}

fn parse_node(start: &BytesStart<'_>) -> Option<Node> {
    let id: i64 = parse_attribute(start, b"id")?;
    let lat: f64 = parse_attribute(start, b"lat")?;
    let lon: f64 = parse_attribute(start, b"lon")?;

    if id != 0 && lat.is_finite() && lon.is_finite() {
        Some(Node { id, lat, lon })
    } else {
        None
    }
}

fn parse_way(start: &BytesStart<'_>) -> Option<Way> {
    let id: i64 = parse_attribute(start, b"id")?;
    if id != 0 {
        Some(Way {
            id,
            nodes: Vec::default(),
            tags: HashMap::default(),
        })
    } else {
        None
    }
}

fn parse_tag(start: &BytesStart<'_>) -> Option<(String, String)> {
    let k: String = parse_attribute(start, b"k")?;
    let v: String = parse_attribute(start, b"v").unwrap_or_default();
    Some((k, v))
}

fn parse_nd(start: &BytesStart<'_>) -> Option<i64> {
    parse_attribute(start, b"ref").filter(|&r: &i64| r != 0)
}
