//! Turns raw relational rows into normalized device facts and filtered link
//! observations.
//!
//! Hostname normalization is the join key for everything downstream: device
//! lookups, link endpoints, and node identity all meet on the normalized
//! form, so a host reported with and without its domain resolves to the same
//! node.

use crate::config::MapConfig;
use std::collections::BTreeMap;

pub type DeviceId = i64;

/// Raw device row as the data source yields it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRow {
    pub hostname: String,
    pub device_id: DeviceId,
}

/// Raw link row as the data source yields it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRow {
    pub remote_hostname: String,
    pub local_hostname: String,
    pub local_port_id: i64,
    pub local_port: String,
    pub remote_port: String,
    /// Interface speed in bits/sec.
    pub speed: u64,
    pub if_index: i64,
    pub device_id: DeviceId,
}

/// One directional link report, endpoints normalized, filters applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkObservation {
    pub local: String,
    pub remote: String,
    /// Hostname as reported, used for RRD paths.
    pub local_raw: String,
    pub local_port_id: i64,
    pub local_port: String,
    pub remote_port: String,
    pub speed: u64,
    pub if_index: i64,
    pub device_id: DeviceId,
}

/// Normalizes a hostname: lowercase, spaces to underscores, default domain
/// suffix appended when no dot is present. Returns `None` for empty names and
/// the data source's "unknown" / "not advertised" sentinels; the sentinel
/// comparison runs before suffixing, which would otherwise mask it.
pub fn normalize_host(raw: &str, default_suffix: &str) -> Option<String> {
    let name = raw.trim().to_ascii_lowercase().replace(' ', "_");
    if name.is_empty() || name == "unknown" || name == "not_advertised" {
        tracing::debug!(host = raw, "dropping unidentifiable host");
        return None;
    }
    if !name.contains('.') && !default_suffix.is_empty() {
        let suffix = default_suffix.trim_matches('.');
        return Some(format!("{name}.{suffix}"));
    }
    Some(name)
}

/// Short name: the portion before the first dot.
pub fn short_name(host: &str) -> &str {
    host.split('.').next().unwrap_or(host)
}

/// Builds the device-id lookup keyed by normalized host.
pub fn device_lookup(rows: &[DeviceRow], config: &MapConfig) -> BTreeMap<String, DeviceId> {
    let mut devices = BTreeMap::new();
    for row in rows {
        let Some(host) = normalize_host(&row.hostname, &config.domain.default_suffix) else {
            continue;
        };
        devices.insert(host, row.device_id);
    }
    devices
}

fn is_management_port(name: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| name.starts_with(p.as_str()))
}

fn in_excluded_domain(host: &str, domains: &[String]) -> bool {
    domains.iter().any(|d| {
        let domain = d.trim_start_matches('.');
        host.strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Applies the observation filters in row order. The data source may already
/// filter on speed; the check is repeated here so the policy is testable
/// without a database.
pub fn filter_observations(rows: &[LinkRow], config: &MapConfig) -> Vec<LinkObservation> {
    let suffix = &config.domain.default_suffix;
    let mut observations = Vec::new();

    for row in rows {
        if row.speed < config.links.min_speed {
            tracing::debug!(port = %row.local_port, speed = row.speed, "below minimum speed");
            continue;
        }
        if is_management_port(&row.local_port, &config.links.management_patterns) {
            tracing::debug!(port = %row.local_port, "management interface");
            continue;
        }
        let Some(local) = normalize_host(&row.local_hostname, suffix) else {
            continue;
        };
        let Some(remote) = normalize_host(&row.remote_hostname, suffix) else {
            continue;
        };
        if local == remote {
            tracing::debug!(host = %local, "self-loop observation");
            continue;
        }
        if in_excluded_domain(&remote, &config.links.excluded_domains) {
            tracing::debug!(host = %remote, "remote in excluded domain");
            continue;
        }
        observations.push(LinkObservation {
            local,
            remote,
            local_raw: row.local_hostname.clone(),
            local_port_id: row.local_port_id,
            local_port: row.local_port.clone(),
            remote_port: row.remote_port.clone(),
            speed: row.speed,
            if_index: row.if_index,
            device_id: row.device_id,
        });
    }

    observations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GIGA;

    fn link_row(local: &str, remote: &str) -> LinkRow {
        LinkRow {
            remote_hostname: remote.to_string(),
            local_hostname: local.to_string(),
            local_port_id: 7,
            local_port: "TenGigabitEthernet 0/1".to_string(),
            remote_port: "TenGigabitEthernet 0/2".to_string(),
            speed: 10 * GIGA,
            if_index: 11,
            device_id: 3,
        }
    }

    #[test]
    fn normalization_joins_bare_and_qualified_names() {
        assert_eq!(
            normalize_host("SWT-A1", "example.net"),
            Some("swt-a1.example.net".to_string())
        );
        assert_eq!(
            normalize_host("swt-a1.example.net", "example.net"),
            Some("swt-a1.example.net".to_string())
        );
        assert_eq!(
            normalize_host("stack room 2", ""),
            Some("stack_room_2".to_string())
        );
    }

    #[test]
    fn sentinels_and_empty_names_are_dropped() {
        assert_eq!(normalize_host("unknown", "example.net"), None);
        assert_eq!(normalize_host("Not Advertised", "example.net"), None);
        assert_eq!(normalize_host("  ", "example.net"), None);
    }

    #[test]
    fn slow_and_management_ports_are_filtered() {
        let config = MapConfig::default();
        let mut slow = link_row("swt-a1", "swt-b2");
        slow.speed = config.links.min_speed - 1;
        let mut mgmt = link_row("swt-a1", "swt-b2");
        mgmt.local_port = "ManagementEthernet 0/0".to_string();
        let keep = link_row("swt-a1", "swt-b2");
        let observations = filter_observations(&[slow, mgmt, keep], &config);
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].local, "swt-a1");
    }

    #[test]
    fn excluded_domains_and_self_loops_are_filtered() {
        let mut config = MapConfig::default();
        config.links.excluded_domains = vec![".stor.example.net".to_string()];
        let rows = vec![
            link_row("swt-a1", "disk-1.stor.example.net"),
            link_row("swt-a1", "SWT-A1"),
            link_row("swt-a1", "rtr-x1"),
        ];
        let observations = filter_observations(&rows, &config);
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].remote, "rtr-x1");
    }

    #[test]
    fn device_lookup_keys_by_normalized_host() {
        let mut config = MapConfig::default();
        config.domain.default_suffix = "example.net".to_string();
        let rows = vec![
            DeviceRow {
                hostname: "SWT-A1".to_string(),
                device_id: 12,
            },
            DeviceRow {
                hostname: "unknown".to_string(),
                device_id: 13,
            },
        ];
        let devices = device_lookup(&rows, &config);
        assert_eq!(devices.get("swt-a1.example.net"), Some(&12));
        assert_eq!(devices.len(), 1);
    }
}
