//! Translation of modem datasets into Prometheus metrics.

use chrono::NaiveDateTime;
use prometheus::{Counter, CounterVec, Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use serde::Deserialize;

use crate::client::Client;
use crate::dataset::Dataset;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamChannel {
    pub port_id: String,
    pub channel_id: String,
    pub frequency: String,
    pub signal_strength: String,
    pub bandwidth: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownstreamChannel {
    pub port_id: String,
    pub channel_id: String,
    pub frequency: String,
    pub signal_strength: String,
    pub snr: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SysInfo {
    #[serde(rename = "LRecPkt")]
    pub lan_received: String,
    #[serde(rename = "LSendPkt")]
    pub lan_sent: String,
    #[serde(rename = "WRecPkt")]
    pub wan_received: String,
    #[serde(rename = "WSendPkt")]
    pub wan_sent: String,
    pub hw_version: String,
    pub serial_number: String,
    pub sw_version: String,
    pub system_time: String,
    pub system_uptime: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemModel {
    pub model_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CmInit {
    pub bpi_status: String,
}

/// Snapshot of the datasets the exporter publishes.
#[derive(Debug, Clone)]
pub struct Collector {
    pub upstream: Vec<UpstreamChannel>,
    pub downstream: Vec<DownstreamChannel>,
    pub sysinfo: SysInfo,
    pub system_model: SystemModel,
    pub cminit: CmInit,
}

impl Collector {
    /// Fetch everything needed from a logged-in client.
    pub async fn fetch(client: &mut Client) -> Result<Self> {
        let upstream = client.get_data_as(Dataset::UsInfo).await?;
        let downstream = client.get_data_as(Dataset::DsInfo).await?;
        let sysinfo: Vec<SysInfo> = client.get_data_as(Dataset::SysInfo).await?;
        let system_model = client.get_data_as(Dataset::SystemModel).await?;
        let cminit: Vec<CmInit> = client.get_data_as(Dataset::CmInit).await?;

        Ok(Self {
            upstream,
            downstream,
            sysinfo: first(sysinfo, Dataset::SysInfo)?,
            system_model,
            cminit: first(cminit, Dataset::CmInit)?,
        })
    }

    /// Register all metrics into `registry`.
    pub fn register(&self, registry: &Registry) -> Result<()> {
        self.register_upstream(registry)?;
        self.register_downstream(registry)?;
        self.register_system(registry)?;
        self.register_network(registry)?;
        self.register_bpi(registry)?;
        Ok(())
    }

    /// Text exposition of this snapshot.
    pub fn encode(&self) -> Result<String> {
        let registry = Registry::new();
        self.register(&registry)?;
        encode_registry(&registry)
    }

    fn register_upstream(&self, registry: &Registry) -> Result<()> {
        let labels = ["port", "channel", "frequency"];
        let sigstr = GaugeVec::new(
            Opts::new(
                "hitron_channel_upstream_signal_strength_dbmv",
                "Upstream channel transmit level in dBmV",
            ),
            &labels,
        )?;
        let bandwidth = GaugeVec::new(
            Opts::new("hitron_channel_upstream_bandwidth", "Upstream channel width in Hz"),
            &labels,
        )?;

        for ch in &self.upstream {
            let key = [ch.port_id.as_str(), ch.channel_id.as_str(), ch.frequency.as_str()];
            if let Some(v) = parse_number(&ch.signal_strength, "signalStrength") {
                sigstr.with_label_values(&key).set(v);
            }
            if let Some(v) = parse_number(&ch.bandwidth, "bandwidth") {
                bandwidth.with_label_values(&key).set(v);
            }
        }

        registry.register(Box::new(sigstr))?;
        registry.register(Box::new(bandwidth))?;
        Ok(())
    }

    fn register_downstream(&self, registry: &Registry) -> Result<()> {
        let labels = ["port", "channel", "frequency"];
        let sigstr = GaugeVec::new(
            Opts::new(
                "hitron_channel_downstream_signal_strength_dbmv",
                "Downstream channel receive level in dBmV",
            ),
            &labels,
        )?;
        let snr = GaugeVec::new(
            Opts::new("hitron_channel_downstream_snr", "Downstream channel SNR in dB"),
            &labels,
        )?;

        for ch in &self.downstream {
            let key = [ch.port_id.as_str(), ch.channel_id.as_str(), ch.frequency.as_str()];
            if let Some(v) = parse_number(&ch.signal_strength, "signalStrength") {
                sigstr.with_label_values(&key).set(v);
            }
            if let Some(v) = parse_number(&ch.snr, "snr") {
                snr.with_label_values(&key).set(v);
            }
        }

        registry.register(Box::new(sigstr))?;
        registry.register(Box::new(snr))?;
        Ok(())
    }

    fn register_system(&self, registry: &Registry) -> Result<()> {
        if let Some(uptime) = parse_uptime(&self.sysinfo.system_uptime) {
            let counter = Counter::new("hitron_system_uptime_seconds_total", "Time since boot")?;
            counter.inc_by(uptime);
            registry.register(Box::new(counter))?;
        }

        if let Some(ts) = parse_clock(&self.sysinfo.system_time) {
            let gauge = Gauge::new(
                "hitron_system_clock_timestamp_seconds",
                "Device clock as a Unix timestamp",
            )?;
            gauge.set(ts);
            registry.register(Box::new(gauge))?;
        }

        let info = GaugeVec::new(
            Opts::new("hitron_system_info", "Device identity"),
            &["serial_number", "software_version", "hardware_version", "model_name"],
        )?;
        info.with_label_values(&[
            self.sysinfo.serial_number.as_str(),
            self.sysinfo.sw_version.as_str(),
            self.sysinfo.hw_version.as_str(),
            self.system_model.model_name.as_str(),
        ])
        .set(1.0);
        registry.register(Box::new(info))?;
        Ok(())
    }

    fn register_network(&self, registry: &Registry) -> Result<()> {
        let tx = CounterVec::new(
            Opts::new("hitron_network_transmit_bytes_total", "Bytes sent per interface"),
            &["device"],
        )?;
        let rx = CounterVec::new(
            Opts::new("hitron_network_receive_bytes_total", "Bytes received per interface"),
            &["device"],
        )?;

        for (counter, device, raw) in [
            (&tx, "lan", &self.sysinfo.lan_sent),
            (&tx, "wan", &self.sysinfo.wan_sent),
            (&rx, "lan", &self.sysinfo.lan_received),
            (&rx, "wan", &self.sysinfo.wan_received),
        ] {
            if let Some(bytes) = parse_pkt(raw) {
                counter.with_label_values(&[device]).inc_by(bytes);
            }
        }

        registry.register(Box::new(tx))?;
        registry.register(Box::new(rx))?;
        Ok(())
    }

    fn register_bpi(&self, registry: &Registry) -> Result<()> {
        let bpi = parse_bpi(&self.cminit.bpi_status);
        if bpi.is_empty() {
            return Ok(());
        }
        let names: Vec<&str> = bpi.iter().map(|(k, _)| k.as_str()).collect();
        let values: Vec<&str> = bpi.iter().map(|(_, v)| v.as_str()).collect();
        let info = GaugeVec::new(
            Opts::new("hitron_cm_bpi_info", "Cable Modem Baseline Privacy Interface"),
            &names,
        )?;
        info.with_label_values(&values).set(1.0);
        registry.register(Box::new(info))?;
        Ok(())
    }
}

/// Registry holding `hitron_exporter_info{version}`.
pub fn exporter_registry() -> Result<Registry> {
    let registry = Registry::new();
    let info = GaugeVec::new(
        Opts::new("hitron_exporter_info", "Information about hitron-exporter itself"),
        &["version"],
    )?;
    info.with_label_values(&[env!("CARGO_PKG_VERSION")]).set(1.0);
    registry.register(Box::new(info))?;
    Ok(registry)
}

pub fn encode_registry(registry: &Registry) -> Result<String> {
    let mut buf = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buf)?;
    String::from_utf8(buf).map_err(|e| Error::response_format(e.to_string()))
}

fn first<T>(items: Vec<T>, dataset: Dataset) -> Result<T> {
    items
        .into_iter()
        .next()
        .ok_or_else(|| Error::response_format(format!("{} returned an empty list", dataset)))
}

fn parse_number(raw: &str, field: &str) -> Option<f64> {
    match raw.trim().parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::error!("Unable to parse {}: {:?}", field, raw);
            None
        }
    }
}

/// `"00 Days,05 Hours,38 Minutes,47 Seconds"` -> seconds.
pub fn parse_uptime(uptime: &str) -> Option<f64> {
    const UNITS: [(&str, u64); 4] = [("Days", 86400), ("Hours", 3600), ("Minutes", 60), ("Seconds", 1)];

    let parts: Vec<&str> = uptime.split(',').map(str::trim).collect();
    if parts.len() != UNITS.len() {
        tracing::error!("Unable to parse systemUptime: {}", uptime);
        return None;
    }

    let mut total = 0u64;
    for (part, (unit, factor)) in parts.iter().zip(UNITS) {
        let parsed = part
            .split_once(' ')
            .filter(|(_, u)| *u == unit)
            .and_then(|(n, _)| n.parse::<u64>().ok());
        match parsed.and_then(|n| n.checked_mul(factor)).and_then(|v| total.checked_add(v)) {
            Some(sum) => total = sum,
            None => {
                tracing::error!("Unable to parse systemUptime: {}", uptime);
                return None;
            }
        }
    }
    Some(total as f64)
}

/// `"Fri Jun 17, 2022, 17:09:10"` -> Unix timestamp.
///
/// The device does not say which timezone it reports; UTC is assumed.
pub fn parse_clock(clock: &str) -> Option<f64> {
    match NaiveDateTime::parse_from_str(clock.trim(), "%a %b %d, %Y, %H:%M:%S") {
        Ok(dt) => Some(dt.and_utc().timestamp() as f64),
        Err(e) => {
            tracing::error!("Unable to parse systemTime {:?}: {}", clock, e);
            None
        }
    }
}

/// `"12.12M Bytes"` -> 12120000.
pub fn parse_pkt(pkt: &str) -> Option<f64> {
    let Some(amount) = pkt.trim().strip_suffix(" Bytes") else {
        tracing::error!("Couldn't parse {:?} as pkt", pkt);
        return None;
    };

    let (number, factor) = match amount.chars().last() {
        Some(c) if c.is_ascii_uppercase() => {
            let factor = match c {
                'K' => 1e3,
                'M' => 1e6,
                'G' => 1e9,
                other => {
                    tracing::error!("Unknown pkt factor {:?}", other);
                    return None;
                }
            };
            (&amount[..amount.len() - 1], factor)
        }
        _ => (amount, 1.0),
    };

    match number.parse::<f64>() {
        Ok(n) if n >= 0.0 => Some(n * factor),
        _ => {
            tracing::error!("Couldn't parse {:?} as pkt", pkt);
            None
        }
    }
}

/// `"AUTH:authorized, TEK:operational"` -> `[("auth","authorized"), ("tek","operational")]`.
pub fn parse_bpi(status: &str) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    for element in status.split(',') {
        let element = element.trim();
        if element.is_empty() {
            continue;
        }
        let (k, v) = element.split_once(':').unwrap_or((element, ""));
        let key = label_name(&k.trim().to_lowercase());
        if out.iter().any(|(existing, _)| *existing == key) {
            continue;
        }
        out.push((key, v.trim().to_lowercase()));
    }
    out
}

fn label_name(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}
