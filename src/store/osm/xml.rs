// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::io;
use std::str::from_utf8;

use quick_xml::events::{BytesStart, Event};

use super::model;

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

/// Reader streams osm [Features](model::Feature) from an XML document.
pub(super) struct Reader<P: Parser> {
    parser: P,
    eof: bool,
}

impl<'a> Reader<BufParser<'a>> {
    pub(super) fn from_buffer(data: &'a [u8]) -> Self {
        Self {
            parser: BufParser(quick_xml::Reader::from_reader(data)),
            eof: false,
        }
    }
}

impl<R: io::BufRead> Reader<IoParser<R>> {
    pub(super) fn from_io(reader: R) -> Self {
        Self {
            parser: IoParser(quick_xml::Reader::from_reader(reader), Vec::default()),
            eof: false,
        }
    }
}

impl<P: Parser> Iterator for Reader<P> {
    type Item = Result<model::Feature, quick_xml::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut f: Option<model::Feature> = None;

        while !self.eof {
            let event = match self.parser.read_event() {
                Ok(e) => e,
                Err(e) => return Some(Err(e)),
            };

            match event {
                Event::Empty(start) => match start.local_name().as_ref() {
                    b"node" => {
                        if let Some(n) = parse_node(&start) {
                            return Some(Ok(model::Feature::Node(n)));
                        }
                    }
                    b"tag" => {
                        if let (Some(tags), Some((k, v))) = (feature_tags(&mut f), parse_tag(&start))
                        {
                            tags.insert(k, v);
                        }
                    }
                    b"nd" => {
                        if let (Some(model::Feature::Way(w)), Some(ref_)) = (&mut f, parse_nd(&start))
                        {
                            w.nodes.push(ref_);
                        }
                    }
                    b"member" => {
                        if let (Some(model::Feature::Relation(r)), Some(m)) =
                            (&mut f, parse_member(&start))
                        {
                            r.members.push(m);
                        }
                    }
                    _ => {}
                },

                Event::Start(start) => match start.local_name().as_ref() {
                    b"node" => f = parse_node(&start).map(model::Feature::Node),
                    b"way" => {
                        f = parse_id(&start).map(|id| {
                            model::Feature::Way(model::Way {
                                id,
                                nodes: Vec::default(),
                                tags: HashMap::default(),
                            })
                        })
                    }
                    b"relation" => {
                        f = parse_id(&start).map(|id| {
                            model::Feature::Relation(model::Relation {
                                id,
                                members: Vec::default(),
                                tags: HashMap::default(),
                            })
                        })
                    }
                    _ => {}
                },

                Event::End(end) => match end.local_name().as_ref() {
                    b"node" | b"way" | b"relation" => {
                        if let Some(f) = f.take() {
                            return Some(Ok(f));
                        }
                    }
                    _ => {}
                },

                Event::Eof => {
                    self.eof = true;
                }

                _ => {}
            }
        }

        return f.map(Ok);
    }
}

fn parse_id(start: &BytesStart<'_>) -> Option<i64> {
    for attr in start.attributes() {
        let attr = attr.ok()?;
        if attr.key.as_ref() == b"id" {
            let id: i64 = from_utf8(&attr.value).ok()?.parse().ok()?;
            return if id != 0 { Some(id) } else { None };
        }
    }
    return None;
}

fn parse_node(start: &BytesStart<'_>) -> Option<model::Node> {
    let mut id: i64 = 0;
    let mut lat = f64::NAN;
    let mut lon = f64::NAN;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        match attr.key.as_ref() {
            b"id" => id = from_utf8(&attr.value).ok()?.parse().ok()?,
            b"lat" => lat = from_utf8(&attr.value).ok()?.parse().ok()?,
            b"lon" => lon = from_utf8(&attr.value).ok()?.parse().ok()?,
            _ => {}
        }
    }

    if id != 0 && lat.is_finite() && lon.is_finite() {
        Some(model::Node {
            id,
            lat,
            lon,
            tags: HashMap::default(),
        })
    } else {
        log::debug!("skipping invalid OSM node (id {id})");
        None
    }
}

fn parse_tag(start: &BytesStart<'_>) -> Option<(String, String)> {
    let mut k = None;
    let mut v = None;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        match attr.key.as_ref() {
            b"k" => k = from_utf8(&attr.value).ok().map(|s| s.to_string()),
            b"v" => v = from_utf8(&attr.value).ok().map(|s| s.to_string()),
            _ => {}
        }
    }

    k.map(|k| (k, v.unwrap_or_default()))
}

fn parse_nd(start: &BytesStart<'_>) -> Option<i64> {
    for attr in start.attributes() {
        let attr = attr.ok()?;
        if attr.key.as_ref() == b"ref" {
            let ref_: i64 = from_utf8(&attr.value).ok()?.parse().ok()?;
            return if ref_ != 0 { Some(ref_) } else { None };
        }
    }
    return None;
}

fn parse_member(start: &BytesStart<'_>) -> Option<model::RelationMember> {
    let mut ref_: i64 = 0;
    let mut type_ = None;
    let mut role = None;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        match attr.key.as_ref() {
            b"ref" => ref_ = from_utf8(&attr.value).ok()?.parse().ok()?,
            b"type" => {
                type_ = match attr.value.as_ref() {
                    b"node" => Some(model::FeatureType::Node),
                    b"way" => Some(model::FeatureType::Way),
                    b"relation" => Some(model::FeatureType::Relation),
                    _ => None,
                }
            }
            b"role" => role = Some(from_utf8(&attr.value).ok()?.to_string()),
            _ => {}
        }
    }

    match (ref_, type_, role) {
        (0, _, _) => None,
        (ref_, Some(type_), Some(role)) => Some(model::RelationMember { type_, ref_, role }),
        _ => None,
    }
}

fn feature_tags(f: &mut Option<model::Feature>) -> Option<&mut HashMap<String, String>> {
    match f {
        None => None,
        Some(model::Feature::Node(ref mut n)) => Some(&mut n.tags),
        Some(model::Feature::Way(ref mut w)) => Some(&mut w.tags),
        Some(model::Feature::Relation(ref mut r)) => Some(&mut r.tags),
    }
}

#[cfg(test)]
mod tests {
    use super::model::{Feature, FeatureType};
    use super::*;

    const DOCUMENT: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="-1" lat="0.0" lon="0.0"/>
  <node id="-2" lat="0.0" lon="0.001">
    <tag k="barrier" v="gate"/>
  </node>
  <node id="-3" lat="0.001" lon="0.001"/>
  <way id="-10">
    <nd ref="-1"/>
    <nd ref="-2"/>
    <tag k="highway" v="residential"/>
  </way>
  <relation id="-20">
    <member type="way" ref="-10" role="from"/>
    <member type="node" ref="-2" role="via"/>
    <member type="bogus" ref="-11" role="to"/>
    <tag k="type" v="restriction"/>
  </relation>
</osm>
"#;

    fn check(features: Vec<Feature>) {
        assert_eq!(features.len(), 5);

        match &features[1] {
            Feature::Node(n) => {
                assert_eq!(n.id, -2);
                assert_eq!(n.lon, 0.001);
                assert_eq!(n.tags.get("barrier").map(|v| v.as_str()), Some("gate"));
            }
            other => panic!("expected a node, got {other:?}"),
        }

        match &features[3] {
            Feature::Way(w) => {
                assert_eq!(w.id, -10);
                assert_eq!(w.nodes, vec![-1, -2]);
                assert_eq!(w.tags.len(), 1);
            }
            other => panic!("expected a way, got {other:?}"),
        }

        match &features[4] {
            Feature::Relation(r) => {
                assert_eq!(r.members.len(), 2);
                assert_eq!(r.members[1].type_, FeatureType::Node);
                assert_eq!(r.members[1].role, "via");
            }
            other => panic!("expected a relation, got {other:?}"),
        }
    }

    #[test]
    fn parse_from_buf() -> Result<(), quick_xml::Error> {
        check(Reader::from_buffer(DOCUMENT).collect::<Result<Vec<_>, _>>()?);
        Ok(())
    }

    #[test]
    fn parse_from_io() -> Result<(), quick_xml::Error> {
        check(Reader::from_io(io::Cursor::new(DOCUMENT)).collect::<Result<Vec<_>, _>>()?);
        Ok(())
    }
}
