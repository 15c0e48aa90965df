#![forbid(unsafe_code)]

//! Read-only topology queries against an Observium-style MySQL schema.
//!
//! All SQL is centralized here; the core engine only ever sees typed rows.
//! The relevant relations are `devices`, `ports`, and the LLDP-discovered
//! `links` table joining local ports to remote hostnames.

use netweave_core::config::DatabaseConfig;
use netweave_core::topology::{DeviceRow, LinkRow};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct DeviceRecord {
    hostname: String,
    device_id: i64,
}

impl From<DeviceRecord> for DeviceRow {
    fn from(record: DeviceRecord) -> Self {
        DeviceRow {
            hostname: record.hostname,
            device_id: record.device_id,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct LinkRecord {
    remote_hostname: String,
    local_hostname: String,
    local_port_id: i64,
    if_name: String,
    remote_port: String,
    if_speed: i64,
    if_index: i64,
    device_id: i64,
}

impl From<LinkRecord> for LinkRow {
    fn from(record: LinkRecord) -> Self {
        LinkRow {
            remote_hostname: record.remote_hostname,
            local_hostname: record.local_hostname,
            local_port_id: record.local_port_id,
            local_port: record.if_name,
            remote_port: record.remote_port,
            speed: record.if_speed.max(0) as u64,
            if_index: record.if_index,
            device_id: record.device_id,
        }
    }
}

pub struct TopologyRepository {
    pool: MySqlPool,
}

impl TopologyRepository {
    /// Connects to the monitoring database. A failure here aborts the run
    /// before anything is derived or written.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = format!(
            "mysql://{}:{}@{}:{}/{}",
            config.username, config.password, config.hostname, config.port, config.schema
        );
        let pool = MySqlPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await?;
        Ok(Self { pool })
    }

    /// Distinct devices that own at least one discovered link.
    pub async fn devices(&self) -> Result<Vec<DeviceRow>> {
        let records = sqlx::query_as::<_, DeviceRecord>(
            r"SELECT devices.hostname AS hostname,
                     devices.device_id AS device_id
              FROM links
              JOIN ports ON ports.port_id = links.local_port_id
              JOIN devices ON devices.device_id = ports.device_id
              GROUP BY devices.hostname, devices.device_id",
        )
        .fetch_all(&self.pool)
        .await?;
        tracing::debug!(rows = records.len(), "fetched device rows");
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Raw link observations. The speed floor is pushed into the query to
    /// keep the transfer small; the core applies the same filter again along
    /// with the ones SQL is ill-suited for.
    pub async fn links(&self, min_speed: u64) -> Result<Vec<LinkRow>> {
        let records = sqlx::query_as::<_, LinkRecord>(
            r"SELECT links.remote_hostname AS remote_hostname,
                     devices.hostname AS local_hostname,
                     links.local_port_id AS local_port_id,
                     ports.ifName AS if_name,
                     links.remote_port AS remote_port,
                     ports.ifSpeed AS if_speed,
                     ports.ifIndex AS if_index,
                     devices.device_id AS device_id
              FROM links
              JOIN ports ON ports.port_id = links.local_port_id
              JOIN devices ON devices.device_id = ports.device_id
              WHERE ports.ifSpeed >= ?",
        )
        .bind(i64::try_from(min_speed).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        tracing::debug!(rows = records.len(), "fetched link rows");
        Ok(records.into_iter().map(Into::into).collect())
    }
}
