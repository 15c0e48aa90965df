//! One full generation pass: ingestion, reconciliation, auto-placement, link
//! attribute derivation, offset geometry, all merged into the template
//! document. Pure and synchronous; the CLI owns I/O on both sides.

use crate::config::{GIGA, MapConfig};
use crate::document::{Document, node_key};
use crate::geometry::apply_parallel_offsets;
use crate::merge::merge_object;
use crate::placement::autoplace;
use crate::reconcile::{CanonicalLink, reconcile};
use crate::topology::{DeviceRow, LinkRow, device_lookup, filter_observations};

fn link_attrs(link: &CanonicalLink, config: &MapConfig) -> Vec<(&'static str, String)> {
    let obs = &link.obs;
    let gigabits = obs.speed / GIGA;
    let width = (obs.speed / config.links.base_speed).max(1);
    vec![
        ("WIDTH", width.to_string()),
        ("BANDWIDTH", format!("{gigabits}G")),
        (
            "OVERLIBGRAPH",
            format!(
                "/graph.php?height=200&width=512&id={}&type=port_bits&legend=yes",
                obs.local_port_id
            ),
        ),
        (
            "OVERLIBCAPTION",
            format!(
                "{gigabits}Gbps link from [{}] ({}) to [{}] ({})",
                obs.local, obs.local_port, obs.remote, obs.remote_port
            ),
        ),
        (
            "INFOURL",
            format!(
                "/device/device={}/tab=port/port={}/",
                obs.device_id, obs.local_port_id
            ),
        ),
        (
            "TARGET",
            format!(
                "{}/{}/port-{}.rrd:INOCTETS:OUTOCTETS",
                config.weathermap.rrd_base, obs.local_raw, obs.if_index
            ),
        ),
        ("NODES", format!("{} {}", obs.local, obs.remote)),
    ]
}

/// Runs the whole derivation over `doc` and returns it. The template's own
/// attributes are never overwritten; everything derived here only fills
/// gaps.
pub fn build_map(
    mut doc: Document,
    devices: &[DeviceRow],
    links: &[LinkRow],
    config: &MapConfig,
) -> Document {
    let device_ids = device_lookup(devices, config);
    let observations = filter_observations(links, config);
    let canonical = reconcile(observations.clone());

    if config.autoplace.enabled {
        autoplace(&mut doc, &device_ids, &observations, config);
    }

    let mut dropped = 0usize;
    for link in &canonical {
        // A link is only worth drawing if at least one endpoint made it onto
        // the map.
        let known = doc.nodes.contains(&node_key(&link.obs.local))
            || doc.nodes.contains(&node_key(&link.obs.remote));
        if !known {
            dropped += 1;
            tracing::debug!(local = %link.obs.local, remote = %link.obs.remote, "no endpoint on the map");
            continue;
        }
        merge_object(&mut doc.links, &link.key(), &link_attrs(link, config), true);
    }
    if dropped > 0 {
        tracing::debug!(dropped, "links without known endpoints");
    }

    apply_parallel_offsets(&mut doc);
    doc
}
