//! Auto-placement: fills in LABEL, ICON, INFOURL and POSITION for nodes the
//! template does not already describe.
//!
//! Placement order is a numeric-aware sort of the candidate hosts so the grid
//! is stable across runs regardless of the order rows arrive in. Existing
//! POSITION attributes are never touched, which is what lets operators drag
//! nodes around and keep their layout across regenerations.

use crate::config::{AutoplaceConfig, IconRule, MapConfig};
use crate::document::{Document, node_key};
use crate::topology::{DeviceId, LinkObservation, short_name};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Compares strings with embedded integers numerically: `swt-2` < `swt-10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();
    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) => {
                if ca.is_ascii_digit() && cb.is_ascii_digit() {
                    let na = take_number(&mut ai);
                    let nb = take_number(&mut bi);
                    match na.cmp(&nb) {
                        Ordering::Equal => {}
                        other => return other,
                    }
                } else {
                    match ca.cmp(&cb) {
                        Ordering::Equal => {
                            ai.next();
                            bi.next();
                        }
                        other => return other,
                    }
                }
            }
        }
    }
}

fn take_number(it: &mut std::iter::Peekable<std::str::Chars<'_>>) -> u64 {
    let mut value: u64 = 0;
    while let Some(c) = it.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        value = value.saturating_mul(10).saturating_add((c as u8 - b'0') as u64);
        it.next();
    }
    value
}

/// First matching rule wins; rules are evaluated in table order.
pub fn icon_for<'a>(short: &str, rules: &'a [IconRule], default_icon: &'a str) -> &'a str {
    rules
        .iter()
        .find(|rule| short.contains(rule.contains.as_str()))
        .map(|rule| rule.icon.as_str())
        .unwrap_or(default_icon)
}

fn is_candidate(host: &str, config: &AutoplaceConfig) -> bool {
    let short = short_name(host);
    if config
        .exclude_prefixes
        .iter()
        .any(|p| short.starts_with(p.as_str()))
    {
        return false;
    }
    config.include_prefixes.is_empty()
        || config
            .include_prefixes
            .iter()
            .any(|p| short.starts_with(p.as_str()))
}

/// Candidate hosts: devices plus observed remote endpoints, prefix-filtered
/// and sorted numerically-aware.
pub fn candidate_hosts(
    devices: &BTreeMap<String, DeviceId>,
    observations: &[LinkObservation],
    config: &MapConfig,
) -> Vec<String> {
    let mut hosts: BTreeSet<String> = devices.keys().cloned().collect();
    for obs in observations {
        hosts.insert(obs.remote.clone());
    }
    let mut hosts: Vec<String> = hosts
        .into_iter()
        .filter(|h| is_candidate(h, &config.autoplace))
        .collect();
    hosts.sort_by(|a, b| natural_cmp(a, b));
    hosts
}

/// Raster walk: columns advance by one cell per placed node, wrapping to the
/// next row once the column position passes the limit. Only nodes that
/// actually receive a POSITION consume a slot.
struct Raster {
    col: i64,
    row: i64,
}

impl Raster {
    fn new() -> Self {
        Self { col: 0, row: 0 }
    }

    fn next(&mut self, config: &AutoplaceConfig) -> (i64, i64) {
        let slot = (config.start_x + self.col, config.start_y + self.row);
        self.col += config.spacing;
        if config.start_x + self.col > config.wrap_limit {
            self.col = 0;
            self.row += config.spacing;
        }
        slot
    }
}

fn format_position(config: &AutoplaceConfig, x: i64, y: i64) -> String {
    config
        .position_format
        .replace("{x}", &x.to_string())
        .replace("{y}", &y.to_string())
}

/// Creates missing node objects and fills their missing attributes. Never
/// overwrites anything the document already defines.
pub fn autoplace(
    doc: &mut Document,
    devices: &BTreeMap<String, DeviceId>,
    observations: &[LinkObservation],
    config: &MapConfig,
) {
    let auto = &config.autoplace;
    let mut raster = Raster::new();
    let mut placed = 0usize;

    for host in candidate_hosts(devices, observations, config) {
        let short = short_name(&host).to_string();
        let block = doc.nodes.entry(&node_key(&host));

        block.set_scalar_if_absent("LABEL", &auto.label_format.replace("{host}", &short));

        let icon = icon_for(&short, &auto.icon_rules, &auto.default_icon);
        block.set_scalar_if_absent("ICON", &auto.icon_format.replace("{icon}", icon));

        if let Some(device_id) = devices.get(&host) {
            block.set_scalar_if_absent("INFOURL", &format!("/device/device={device_id}/"));
        }

        if !block.contains("POSITION") {
            let (x, y) = raster.next(auto);
            block.set_scalar("POSITION", &format_position(auto, x, y));
            placed += 1;
        }
    }

    tracing::debug!(placed, "auto-placement done");
}
