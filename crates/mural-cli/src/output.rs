//! Report formatting: human-readable summary or JSON for scripting.

use crate::run::RunReport;

/// Formats the run report as pretty-printed JSON.
pub fn format_json(report: &RunReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}

/// Formats the run report for terminal output.
pub fn format_human(report: &RunReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "=".repeat(60)));
    out.push_str("RETRIEVAL EVALUATION SUMMARY\n");
    out.push_str(&format!("{}\n", "=".repeat(60)));
    out.push_str(&format!(
        "Split: {} ({} queries, {} passages, index: {})\n\n",
        report.split, report.num_queries, report.num_passages, report.index_name
    ));

    for (k, recall) in &report.mean_recall {
        out.push_str(&format!("Recall@{:<4} {:.4}\n", k, recall));
    }

    out.push_str(&format!("{}", "=".repeat(60)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn report() -> RunReport {
        RunReport {
            split: "test".to_string(),
            index_name: "OKVQA_GS".to_string(),
            num_queries: 100,
            num_passages: 5000,
            mean_recall: BTreeMap::from([(5, 0.8123), (10, 0.8567)]),
        }
    }

    #[test]
    fn test_format_human() {
        let out = format_human(&report());
        assert!(out.contains("100 queries"));
        assert!(out.contains("Recall@5    0.8123"));
        assert!(out.contains("Recall@10   0.8567"));
    }

    #[test]
    fn test_format_json() {
        let out = format_json(&report());
        assert!(out.contains("\"split\": \"test\""));
        assert!(out.contains("\"num_queries\": 100"));
        assert!(out.contains("\"5\": 0.8123"));
    }
}
