//! Deterministic completeness check of model output against the dataset.
//!
//! Nothing here calls the model. The feedback is advisory: a candidate that
//! misses entities yields discrepancy lines, never an error.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{string_arg, Tool, ToolError, ToolName};
use crate::dataset::Dataset;

/// One line of evaluation feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    MissingCve { cve: String, hosts: usize },
    MissingService(String),
    MissingMalware(String),
    HighRiskHosts(Vec<String>),
    Complete,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::MissingCve { cve, hosts } => {
                write!(f, "- Missing CVE {} affecting {} hosts", cve, hosts)
            }
            Finding::MissingService(sig) => write!(f, "- Service {} missing from output", sig),
            Finding::MissingMalware(name) => write!(f, "- Malware {} missing from output", name),
            Finding::HighRiskHosts(ips) => write!(
                f,
                "- High-risk hosts ({}): {} should be highlighted",
                ips.len(),
                ips.join(", ")
            ),
            Finding::Complete => write!(f, "- Output appears complete and consistent with dataset."),
        }
    }
}

/// Distinct values in first-seen order.
#[derive(Default)]
struct OrderedSet {
    seen: HashSet<String>,
    items: Vec<String>,
}

impl OrderedSet {
    fn insert(&mut self, value: &str) {
        if self.seen.insert(value.to_string()) {
            self.items.push(value.to_string());
        }
    }
}

/// Compare `candidate` with the dataset and list what it leaves out.
///
/// Order: CVEs, services, malware families, then the high-risk hosts line.
/// The high-risk line appears while any high-risk host IP is absent from the
/// candidate. With nothing missing the result is `[Finding::Complete]`.
pub fn evaluate(dataset: &Dataset, candidate: &str) -> Vec<Finding> {
    let mut cve_counts: Vec<(String, usize)> = Vec::new();
    let mut services = OrderedSet::default();
    let mut malware = OrderedSet::default();
    let mut high_risk = Vec::new();

    for host in dataset.hosts() {
        if host.is_high_risk() {
            high_risk.push(host.ip.clone());
        }
        // A CVE counts once per host, however many services carry it.
        let mut counted: HashSet<&str> = HashSet::new();
        for svc in &host.services {
            services.insert(&svc.signature());
            for cve in svc.cve_ids() {
                if !counted.insert(cve) {
                    continue;
                }
                match cve_counts.iter_mut().find(|(id, _)| id == cve) {
                    Some((_, count)) => *count += 1,
                    None => cve_counts.push((cve.to_string(), 1)),
                }
            }
        }
        for family in host.malware_families() {
            malware.insert(family);
        }
    }

    let mut findings = Vec::new();
    for (cve, hosts) in cve_counts {
        if !candidate.contains(&cve) {
            findings.push(Finding::MissingCve { cve, hosts });
        }
    }
    for sig in services.items {
        if !candidate.contains(&sig) {
            findings.push(Finding::MissingService(sig));
        }
    }
    for name in malware.items {
        if !candidate.contains(&name) {
            findings.push(Finding::MissingMalware(name));
        }
    }
    if high_risk.iter().any(|ip| !candidate.contains(ip.as_str())) {
        findings.push(Finding::HighRiskHosts(high_risk));
    }

    if findings.is_empty() {
        findings.push(Finding::Complete);
    }
    findings
}

/// Feedback lines for `candidate`, newline-joined.
pub fn evaluate_output(dataset: &Dataset, candidate: &str) -> String {
    evaluate(dataset, candidate)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tool wrapper so the model can self-check a draft.
pub struct EvaluateOutput {
    dataset: Arc<Dataset>,
}

impl EvaluateOutput {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self { dataset }
    }
}

#[async_trait]
impl Tool for EvaluateOutput {
    fn name(&self) -> ToolName {
        ToolName::EvaluateOutput
    }

    fn description(&self) -> &str {
        "Evaluate a draft summary against the dataset and return feedback on missing CVEs, services, malware and high-risk hosts."
    }

    fn parameters(&self) -> &'static [&'static str] {
        &["output"]
    }

    async fn execute(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let output = string_arg(args, "output")?;
        Ok(evaluate_output(&self.dataset, output))
    }
}
