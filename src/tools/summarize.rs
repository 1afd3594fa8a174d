//! Per-host analyst summary.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};

use super::{string_arg, Tool, ToolContext, ToolError, ToolName};
use crate::llm::ChatMessage;

/// Summarize a single host by IP.
pub struct SummarizeHost {
    ctx: ToolContext,
}

impl SummarizeHost {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for SummarizeHost {
    fn name(&self) -> ToolName {
        ToolName::SummarizeHost
    }

    fn description(&self) -> &str {
        "Summarize a host by IP: location, risk, services, vulnerabilities and malware."
    }

    fn parameters(&self) -> &'static [&'static str] {
        &["ip"]
    }

    async fn execute(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let ip = string_arg(args, "ip")?;
        summarize_host(&self.ctx, ip).await
    }
}

/// Produce the analyst report for `ip`, or the not-found sentinel without
/// touching the model when the host is absent.
pub async fn summarize_host(ctx: &ToolContext, ip: &str) -> Result<String, ToolError> {
    let Some(host) = ctx.dataset.lookup(ip) else {
        return Ok(format!("Host {} not found.", ip));
    };

    let prompt = build_host_prompt(&host.to_text());
    let response = ctx
        .llm
        .chat_completion(&ctx.model, &[ChatMessage::user(prompt)])
        .await?;

    Ok(highlight_entities(response.text()))
}

fn build_host_prompt(host_text: &str) -> String {
    format!(
        r#"You are a cybersecurity analyst. You are given host scan results.

Your tasks are:
1. **Dataset Summary**: Provide a clear, structured and detailed summary. Break down by:
- Number of hosts scanned
- Geographic distribution (cities, countries)
- Risk level distribution (critical, high, medium, low, unknown)
- Services exposed (protocols, ports)
- Vulnerabilities (group by CVE, count how many hosts are affected)
- Malware detections (families, frequency)

2. **Statistical Analysis**: Perform quantitative analysis, including:
- Counts and percentages (e.g. "% of hosts with SSH exposed", "% of hosts with high risk")
- Top N vulnerabilities (by occurrence across hosts)
- Top N services exposed
- Any concentration of risks in specific IPs, ports or locations

3. **Key Findings & Insights**: Highlight the most important and actionable points:
- Which services or vulnerabilities represent the biggest threat
- Which hosts need immediate attention
- Patterns (e.g. repeated CVEs across many hosts)
- Any anomalies or unusual activity

4. **Output Format**:
- Use **bullet points** and **Markdown headings** for clarity
- Organize into sections: *Summary, Statistics, Key Findings, Recommendations*
- Be precise, concise and professional

Data:
{host_text}

Answer:
"#
    )
}

fn ipv4_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,3}(?:\.\d{1,3}){3})\b").expect("valid IPv4 regex"))
}

fn cve_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(CVE-\d{4}-\d{4,7})").expect("valid CVE regex"))
}

/// Bold every IPv4 address and CVE identifier in `text`.
pub fn highlight_entities(text: &str) -> String {
    let with_ips = ipv4_pattern().replace_all(text, "**${1}**");
    cve_pattern().replace_all(&with_ips, "**${1}**").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::dataset::Dataset;
    use crate::llm::testing::{FailingClient, ScriptedClient};
    use crate::llm::LlmClient;

    fn ctx(llm: Arc<dyn LlmClient>) -> ToolContext {
        let dataset = Dataset::from_json(
            r#"{"hosts": [{"ip": "1.2.3.4", "threat_intelligence": {"risk_level": "high"}}]}"#,
        )
        .unwrap();
        ToolContext {
            dataset: Arc::new(dataset),
            llm,
            model: "test-model".to_string(),
        }
    }

    #[test]
    fn highlight_bolds_ips_and_cves() {
        let out = highlight_entities("Host 10.0.0.1 is exposed to CVE-2021-44228 and CVE-2024-0001.");
        assert_eq!(
            out,
            "Host **10.0.0.1** is exposed to **CVE-2021-44228** and **CVE-2024-0001**."
        );
    }

    #[test]
    fn highlight_leaves_plain_text_alone() {
        assert_eq!(highlight_entities("version 1.2.3 only"), "version 1.2.3 only");
    }

    #[tokio::test]
    async fn unknown_host_returns_sentinel_without_model_call() {
        let client = Arc::new(ScriptedClient::new(["should not be used"]));
        let ctx = ctx(client.clone());
        let out = summarize_host(&ctx, "9.9.9.9").await.unwrap();
        assert_eq!(out, "Host 9.9.9.9 not found.");
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn known_host_is_summarized_and_highlighted() {
        let client = Arc::new(ScriptedClient::new(["1.2.3.4 runs an old OpenSSH (CVE-2024-0001)."]));
        let ctx = ctx(client.clone());
        let out = summarize_host(&ctx, "1.2.3.4").await.unwrap();
        assert_eq!(out, "**1.2.3.4** runs an old OpenSSH (**CVE-2024-0001**).");

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let prompt = requests[0][0].text_content().unwrap();
        assert!(prompt.contains("**Host IP:** 1.2.3.4"));
        assert!(prompt.contains("- Overall Risk Level: *high*"));
        for section in [
            "**Dataset Summary**",
            "**Statistical Analysis**",
            "**Key Findings & Insights**",
            "*Summary, Statistics, Key Findings, Recommendations*",
        ] {
            assert!(prompt.contains(section), "prompt lacks {section}");
        }
    }

    #[tokio::test]
    async fn tool_requires_ip_parameter() {
        let tool = SummarizeHost::new(ctx(Arc::new(ScriptedClient::new(["x"]))));
        let err = tool.execute(&Map::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::MissingArgument("ip")));
    }

    #[tokio::test]
    async fn gateway_failure_is_upstream_error() {
        let ctx = ctx(Arc::new(FailingClient));
        let err = summarize_host(&ctx, "1.2.3.4").await.unwrap_err();
        assert!(!err.is_recoverable());
    }
}
