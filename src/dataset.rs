//! Host scan dataset: loading, lookup and text rendering.
//!
//! The dataset is a JSON document of the form `{"hosts": [...]}`. It is read
//! once at startup and shared read-only behind an `Arc` for the lifetime of the
//! process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read dataset {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid dataset JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Geographic location of a host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Threat intelligence attached to a host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreatIntelligence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub malware_families: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A known vulnerability on a service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cve_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Malware observed on a service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MalwareDetection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A network service exposed by a host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Service {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Port as scanned; numbers and strings are both accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<Value>,
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub malware_detected: Option<MalwareDetection>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Service {
    /// Port rendered as text, `None` when absent or null.
    pub fn port_label(&self) -> Option<String> {
        match self.port.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// `protocol:port` signature used when checking output coverage.
    pub fn signature(&self) -> String {
        format!(
            "{}:{}",
            self.protocol.as_deref().unwrap_or(""),
            self.port_label().unwrap_or_default()
        )
    }

    /// CVE identifiers of this service's vulnerabilities, skipping entries without one.
    pub fn cve_ids(&self) -> impl Iterator<Item = &str> {
        self.vulnerabilities
            .iter()
            .filter_map(|v| v.cve_id.as_deref())
    }
}

/// One scanned host. Attributes outside the typed set are kept in `extra`
/// so the full record can be served back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_intelligence: Option<ThreatIntelligence>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Host {
    pub fn risk_level(&self) -> Option<&str> {
        self.threat_intelligence
            .as_ref()
            .and_then(|t| t.risk_level.as_deref())
    }

    /// Whether the risk level is `critical` or `high` (case-insensitive).
    pub fn is_high_risk(&self) -> bool {
        self.risk_level()
            .map(|r| r.eq_ignore_ascii_case("critical") || r.eq_ignore_ascii_case("high"))
            .unwrap_or(false)
    }

    pub fn malware_families(&self) -> &[String] {
        self.threat_intelligence
            .as_ref()
            .map(|t| t.malware_families.as_slice())
            .unwrap_or(&[])
    }

    /// Render the host as an analyst-style Markdown block.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!("**Host IP:** {}", self.ip));

        let location = self.location.as_ref();
        lines.push(format!(
            "- Location: {}, {}",
            location
                .and_then(|l| l.city.as_deref())
                .unwrap_or("unknown"),
            location
                .and_then(|l| l.country.as_deref())
                .unwrap_or("unknown")
        ));
        lines.push(format!(
            "- Overall Risk Level: *{}*",
            self.risk_level().unwrap_or("unknown")
        ));

        let malware = self.malware_families();
        if !malware.is_empty() {
            lines.push(format!("- Detected Malware: {}", malware.join(", ")));
        }

        for svc in &self.services {
            let mut line = format!(
                "- Service: {} on port {}",
                svc.protocol.as_deref().unwrap_or(""),
                svc.port_label().unwrap_or_else(|| "unknown".to_string())
            );
            let cves: Vec<&str> = svc.cve_ids().collect();
            if !cves.is_empty() {
                line.push_str(&format!(" (Vulnerabilities: {})", cves.join(", ")));
            }
            if svc.authentication_required == Some(true) {
                line.push_str(" (Authentication Required)");
            }
            if let Some(detected) = &svc.malware_detected {
                line.push_str(&format!(
                    " (Malware: {})",
                    detected.name.as_deref().unwrap_or("unknown")
                ));
            }
            lines.push(line);
        }

        lines.push(
            "- Recommendation: Patch critical/high vulnerabilities and restrict remote access."
                .to_string(),
        );
        lines.join("\n")
    }
}

/// Row returned by the hosts overview listing.
#[derive(Debug, Clone, Serialize)]
pub struct HostOverview {
    pub ip: String,
    pub location: Location,
    pub risk: Option<String>,
}

#[derive(Deserialize)]
struct DatasetFile {
    hosts: Vec<Host>,
}

/// The loaded dataset plus an index by IP.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    hosts: Vec<Host>,
    by_ip: HashMap<String, usize>,
}

impl Dataset {
    /// Read and parse the dataset file.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let contents = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_json(&contents)?;
        tracing::info!(
            "Loaded {} hosts from {}",
            dataset.len(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn from_json(contents: &str) -> Result<Self, DatasetError> {
        let file: DatasetFile = serde_json::from_str(contents)?;
        Ok(Self::from_hosts(file.hosts))
    }

    /// Build the IP index. On duplicate IPs the last record wins the lookup.
    pub fn from_hosts(hosts: Vec<Host>) -> Self {
        let mut by_ip = HashMap::with_capacity(hosts.len());
        for (idx, host) in hosts.iter().enumerate() {
            if let Some(previous) = by_ip.insert(host.ip.clone(), idx) {
                tracing::warn!(
                    ip = %host.ip,
                    previous,
                    replacement = idx,
                    "Duplicate host IP in dataset, keeping the later record"
                );
            }
        }
        Self { hosts, by_ip }
    }

    pub fn lookup(&self, ip: &str) -> Option<&Host> {
        self.by_ip.get(ip).map(|&idx| &self.hosts[idx])
    }

    pub fn contains(&self, ip: &str) -> bool {
        self.by_ip.contains_key(ip)
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn overview(&self) -> Vec<HostOverview> {
        self.hosts
            .iter()
            .map(|h| HostOverview {
                ip: h.ip.clone(),
                location: h.location.clone().unwrap_or_default(),
                risk: h.risk_level().map(str::to_string),
            })
            .collect()
    }

    /// Every host rendered with [`Host::to_text`], separated by blank lines.
    pub fn to_context(&self) -> String {
        let mut context = String::new();
        for host in &self.hosts {
            context.push_str(&host.to_text());
            context.push_str("\n\n");
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "hosts": [
            {
                "ip": "1.2.3.4",
                "location": {"city": "Berlin", "country": "Germany"},
                "threat_intelligence": {"risk_level": "Critical", "malware_families": ["Mirai"]},
                "services": [
                    {
                        "protocol": "tcp",
                        "port": 22,
                        "vulnerabilities": [{"cve_id": "CVE-2024-0001", "cvss_score": 9.8}],
                        "authentication_required": true,
                        "malware_detected": {"name": "Mirai", "confidence": 0.9}
                    }
                ],
                "autonomous_system": {"asn": 64500}
            },
            {"ip": "5.6.7.8"}
        ]
    }"#;

    #[test]
    fn lookup_finds_hosts_by_ip() {
        let dataset = Dataset::from_json(SAMPLE).unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(dataset.lookup("1.2.3.4").is_some());
        assert!(dataset.lookup("9.9.9.9").is_none());
    }

    #[test]
    fn duplicate_ip_keeps_last_record() {
        let json = r#"{"hosts": [
            {"ip": "1.1.1.1", "threat_intelligence": {"risk_level": "low"}},
            {"ip": "1.1.1.1", "threat_intelligence": {"risk_level": "high"}}
        ]}"#;
        let dataset = Dataset::from_json(json).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.lookup("1.1.1.1").unwrap().risk_level(), Some("high"));
    }

    #[test]
    fn high_risk_is_case_insensitive() {
        let dataset = Dataset::from_json(SAMPLE).unwrap();
        assert!(dataset.lookup("1.2.3.4").unwrap().is_high_risk());
        assert!(!dataset.lookup("5.6.7.8").unwrap().is_high_risk());
    }

    #[test]
    fn to_text_renders_services_and_flags() {
        let dataset = Dataset::from_json(SAMPLE).unwrap();
        let text = dataset.lookup("1.2.3.4").unwrap().to_text();
        let expected = "**Host IP:** 1.2.3.4\n\
            - Location: Berlin, Germany\n\
            - Overall Risk Level: *Critical*\n\
            - Detected Malware: Mirai\n\
            - Service: tcp on port 22 (Vulnerabilities: CVE-2024-0001) (Authentication Required) (Malware: Mirai)\n\
            - Recommendation: Patch critical/high vulnerabilities and restrict remote access.";
        assert_eq!(text, expected);
    }

    #[test]
    fn to_text_falls_back_to_unknown() {
        let dataset = Dataset::from_json(SAMPLE).unwrap();
        let text = dataset.lookup("5.6.7.8").unwrap().to_text();
        assert!(text.contains("- Location: unknown, unknown"));
        assert!(text.contains("- Overall Risk Level: *unknown*"));
        assert!(!text.contains("Detected Malware"));
    }

    #[test]
    fn string_and_numeric_ports_both_load() {
        let json = r#"{"hosts": [{"ip": "1.1.1.1", "services": [
            {"protocol": "tcp", "port": "443"},
            {"protocol": "udp", "port": 53},
            {"protocol": "tcp", "port": null}
        ]}]}"#;
        let dataset = Dataset::from_json(json).unwrap();
        let host = dataset.lookup("1.1.1.1").unwrap();
        let signatures: Vec<String> = host.services.iter().map(Service::signature).collect();
        assert_eq!(signatures, vec!["tcp:443", "udp:53", "tcp:"]);

        let text = host.to_text();
        assert!(text.contains("- Service: tcp on port 443\n"));
        assert!(text.contains("- Service: tcp on port unknown\n"));
    }

    #[test]
    fn unknown_attributes_survive_serialization() {
        let dataset = Dataset::from_json(SAMPLE).unwrap();
        let value = serde_json::to_value(dataset.lookup("1.2.3.4").unwrap()).unwrap();
        assert_eq!(value["autonomous_system"]["asn"], 64500);
        assert_eq!(value["services"][0]["vulnerabilities"][0]["cvss_score"], 9.8);
        assert_eq!(value["services"][0]["malware_detected"]["confidence"], 0.9);
    }

    #[test]
    fn overview_defaults_missing_location() {
        let dataset = Dataset::from_json(SAMPLE).unwrap();
        let rows = dataset.overview();
        assert_eq!(rows[0].risk.as_deref(), Some("Critical"));
        assert_eq!(serde_json::to_value(&rows[1].location).unwrap(), serde_json::json!({}));
        assert_eq!(rows[1].risk, None);
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let dataset = Dataset::load(file.path()).unwrap();
        assert!(dataset.contains("5.6.7.8"));
    }

    #[test]
    fn load_reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Dataset::load(&dir.path().join("absent.json"));
        assert!(matches!(missing, Err(DatasetError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"hosts\": [").unwrap();
        assert!(matches!(
            Dataset::load(file.path()),
            Err(DatasetError::Parse(_))
        ));
    }
}
