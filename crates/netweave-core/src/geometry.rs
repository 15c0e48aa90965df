//! Parallel-link offset geometry.
//!
//! When several canonical links join the same node pair they would render on
//! top of each other. For each such pair this pass computes a VIA bend point
//! per link, offset perpendicular to the segment and centered about its
//! midpoint so the bundle fans out to both sides. Links that are alone on
//! their pair are left untouched.

use crate::document::{Document, node_key};
use crate::geom::{Point, Vector, point, vector};
use crate::reconcile::pair_key;
use std::collections::BTreeMap;

const MIN_SPACING: f64 = 8.0;
const WIDTH_TO_SPACING: f64 = 4.0;
const DEFAULT_WIDTH: f64 = 2.0;

fn parse_pair(value: &str) -> Option<(String, String)> {
    let mut it = value.split_whitespace();
    let a = it.next()?;
    let b = it.next()?;
    if it.next().is_some() {
        return None;
    }
    Some((a.to_string(), b.to_string()))
}

fn node_position(doc: &Document, host: &str) -> Option<Point> {
    let position = doc.nodes.get(&node_key(host))?.get_scalar("POSITION")?;
    let mut it = position.split_whitespace();
    let x: f64 = it.next()?.parse().ok()?;
    let y: f64 = it.next()?.parse().ok()?;
    Some(point(x, y))
}

fn link_width(doc: &Document, key: &str) -> f64 {
    doc.links
        .get(key)
        .and_then(|block| block.get_scalar("WIDTH"))
        .and_then(|w| w.parse::<f64>().ok())
        .unwrap_or(DEFAULT_WIDTH)
}

/// Computes VIA points for all bundles of parallel links. Degenerate pairs
/// (coincident endpoints, unresolved positions) are skipped without touching
/// the links.
pub fn apply_parallel_offsets(doc: &mut Document) {
    // Bundle detection: group links by their unordered endpoint pair. Links
    // whose NODES attribute does not name exactly two endpoints cannot be
    // bundled and are reported once here.
    let mut bundles: BTreeMap<(String, String), Vec<(String, String, String)>> = BTreeMap::new();
    for (key, block) in doc.links.iter() {
        let Some(nodes) = block.get_scalar("NODES") else {
            continue;
        };
        let Some((a, b)) = parse_pair(nodes) else {
            tracing::warn!(link = %key, nodes, "NODES does not name two endpoints, skipping");
            continue;
        };
        bundles
            .entry(pair_key(&a, &b))
            .or_default()
            .push((key.clone(), a, b));
    }

    for (pair, links) in bundles {
        if links.len() < 2 {
            continue;
        }
        let (_, first_a, first_b) = &links[0];
        let Some(p1) = node_position(doc, first_a) else {
            tracing::debug!(host = %first_a, "no resolved position, skipping bundle");
            continue;
        };
        let Some(p2) = node_position(doc, first_b) else {
            tracing::debug!(host = %first_b, "no resolved position, skipping bundle");
            continue;
        };

        let length = (p1 - p2).length();
        if length == 0.0 {
            tracing::debug!(pair = ?pair, "coincident endpoints, skipping bundle");
            continue;
        }
        let mid: Point = point((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0);
        // Unit tangent perpendicular to the segment.
        let tangent: Vector = vector((p1.y - p2.y) / length, (p1.x - p2.x) / -length);

        let spacing = (WIDTH_TO_SPACING * link_width(doc, &links[0].0)).max(MIN_SPACING);
        let count = links.len();

        for (index, (key, _, _)) in links.iter().enumerate() {
            // Fan factor centered about the midpoint: for two links the VIA
            // points are mirror images across the segment.
            let factor = index as f64 - (count as f64 - 1.0) / 2.0;
            let via = mid + tangent * (spacing * factor);
            let value = format!("{} {}", via.x.round() as i64, via.y.round() as i64);
            if let Some(block) = doc.links.get_mut(key) {
                block.set_scalar_if_absent("VIA", &value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_pair(positions: [(&str, &str); 2], link_count: usize) -> Document {
        let mut doc = Document::new();
        for (host, position) in positions {
            doc.nodes
                .entry(&node_key(host))
                .set_scalar("POSITION", position);
        }
        for seq in 0..link_count {
            let block = doc.links.entry(&format!("LINK a-b-{seq}"));
            block.set_scalar("NODES", "a b");
        }
        doc
    }

    #[test]
    fn two_links_fan_symmetrically_about_the_midpoint() {
        let mut doc = doc_with_pair([("a", "0 0"), ("b", "10 0")], 2);
        apply_parallel_offsets(&mut doc);

        let via = |seq: usize| {
            let value = doc
                .links
                .get(&format!("LINK a-b-{seq}"))
                .unwrap()
                .get_scalar("VIA")
                .unwrap();
            let mut it = value.split_whitespace();
            let x: f64 = it.next().unwrap().parse().unwrap();
            let y: f64 = it.next().unwrap().parse().unwrap();
            (x, y)
        };
        let (x0, y0) = via(0);
        let (x1, y1) = via(1);
        // Symmetric about the midpoint (5, 0), off the direct line.
        assert_eq!((x0 + x1) / 2.0, 5.0);
        assert_eq!((y0 + y1) / 2.0, 0.0);
        assert!(y0 != 0.0 && y1 != 0.0);
        assert_eq!(y0, -y1);
    }

    #[test]
    fn single_links_get_no_via() {
        let mut doc = doc_with_pair([("a", "0 0"), ("b", "10 0")], 1);
        apply_parallel_offsets(&mut doc);
        assert!(
            !doc.links
                .get("LINK a-b-0")
                .unwrap()
                .contains("VIA")
        );
    }

    #[test]
    fn spacing_scales_with_link_width() {
        let mut doc = doc_with_pair([("a", "0 0"), ("b", "10 0")], 2);
        doc.links
            .get_mut("LINK a-b-0")
            .unwrap()
            .set_scalar("WIDTH", "4");
        apply_parallel_offsets(&mut doc);
        let value = doc
            .links
            .get("LINK a-b-0")
            .unwrap()
            .get_scalar("VIA")
            .unwrap();
        // spacing = 4 * 4 = 16, half of it on each side of the line.
        assert_eq!(value, "5 -8");
    }

    #[test]
    fn coincident_endpoints_are_skipped() {
        let mut doc = doc_with_pair([("a", "5 5"), ("b", "5 5")], 2);
        apply_parallel_offsets(&mut doc);
        assert!(!doc.links.get("LINK a-b-0").unwrap().contains("VIA"));
        assert!(!doc.links.get("LINK a-b-1").unwrap().contains("VIA"));
    }

    #[test]
    fn missing_positions_are_skipped() {
        let mut doc = doc_with_pair([("a", "0 0"), ("b", "10 0")], 2);
        doc.nodes.entry(&node_key("c")).set_scalar("POSITION", "1 1");
        let block = doc.links.entry("LINK c-d-7");
        block.set_scalar("NODES", "c d");
        let sibling = doc.links.entry("LINK c-d-8");
        sibling.set_scalar("NODES", "c d");
        apply_parallel_offsets(&mut doc);
        // Pair with an unresolved endpoint keeps its links, without VIA.
        assert!(!doc.links.get("LINK c-d-7").unwrap().contains("VIA"));
        // The resolved pair is still processed.
        assert!(doc.links.get("LINK a-b-0").unwrap().contains("VIA"));
    }

    #[test]
    fn unsplittable_nodes_attribute_skips_only_that_link() {
        let mut doc = doc_with_pair([("a", "0 0"), ("b", "10 0")], 2);
        doc.links
            .entry("LINK broken-9")
            .set_scalar("NODES", "a b c");
        apply_parallel_offsets(&mut doc);
        assert!(!doc.links.get("LINK broken-9").unwrap().contains("VIA"));
        assert!(doc.links.get("LINK a-b-0").unwrap().contains("VIA"));
    }

    #[test]
    fn existing_via_is_preserved() {
        let mut doc = doc_with_pair([("a", "0 0"), ("b", "10 0")], 2);
        doc.links
            .get_mut("LINK a-b-0")
            .unwrap()
            .set_scalar("VIA", "5 40");
        apply_parallel_offsets(&mut doc);
        assert_eq!(
            doc.links.get("LINK a-b-0").unwrap().get_scalar("VIA"),
            Some("5 40")
        );
    }
}
