//! Check output: live text with spinners, or a single JSON document.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

use crate::types::{Check, CheckResult};

pub struct Reporter {
    verbose: bool,
    json: bool,
    spinner: Option<ProgressBar>,
}

fn stage_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner} {msg}")
            .expect("invalid spinner template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

impl Reporter {
    pub fn new(verbose: bool, json: bool) -> Self {
        Self {
            verbose,
            json,
            spinner: None,
        }
    }

    pub fn start(&self) {
        if !self.json {
            println!("\n🔍 Drip SDK Health Check\n");
            println!("{}", "=".repeat(50));
        }
    }

    pub fn on_check_start(&mut self, check: &Check) {
        if self.json {
            return;
        }
        println!("\n▶ {}: {}", check.name, check.description);
        self.spinner = Some(stage_spinner("running..."));
    }

    pub fn on_check_complete(&mut self, result: &CheckResult) {
        if self.json {
            return;
        }
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }

        let status = if result.success {
            Style::new().green().apply_to("✓").to_string()
        } else {
            Style::new().red().apply_to("✗").to_string()
        };
        println!("  {status} {} ({:.0}ms)", result.message, result.duration_ms);

        if self.verbose
            && let Some(details) = &result.details
        {
            println!("    Details: {details}");
        }
        if !result.success
            && let Some(suggestion) = &result.suggestion
        {
            println!("    💡 {suggestion}");
        }
    }

    pub fn finish(&self, results: &[CheckResult]) {
        let total = results.len();
        let passed = results.iter().filter(|r| r.success).count();
        let failed = total - passed;

        if self.json {
            let entries: Vec<serde_json::Value> = results
                .iter()
                .map(|r| {
                    json!({
                        "name": r.name,
                        "success": r.success,
                        "duration": (r.duration_ms * 100.0).round() / 100.0,
                        "message": r.message,
                        "details": r.details,
                        "suggestion": r.suggestion,
                    })
                })
                .collect();
            let doc = json!({
                "results": entries,
                "summary": {
                    "total": total,
                    "passed": passed,
                    "failed": failed,
                },
            });
            println!("{}", serde_json::to_string_pretty(&doc).expect("serializable report"));
            return;
        }

        println!("\n{}", "=".repeat(50));
        let summary = if failed > 0 {
            Style::new()
                .yellow()
                .apply_to(format!("📊 Results: {passed}/{total} passed ({failed} failed)"))
        } else {
            Style::new()
                .green()
                .apply_to(format!("📊 Results: {passed}/{total} passed ✓"))
        };
        println!("\n{summary}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_results() -> Vec<CheckResult> {
        vec![
            CheckResult {
                duration_ms: 12.345,
                ..CheckResult::pass("connectivity", "API is reachable")
            },
            CheckResult::fail("authentication", "Invalid API key")
                .with_suggestion("Check DRIP_API_KEY environment variable"),
        ]
    }

    #[test]
    fn json_document_shape() {
        let results = sample_results();
        let entries: Vec<serde_json::Value> = results
            .iter()
            .map(|r| {
                json!({
                    "name": r.name,
                    "success": r.success,
                    "duration": (r.duration_ms * 100.0).round() / 100.0,
                    "message": r.message,
                    "details": r.details,
                    "suggestion": r.suggestion,
                })
            })
            .collect();
        assert_eq!(entries[0]["duration"], 12.35);
        assert_eq!(entries[0]["details"], serde_json::Value::Null);
        assert_eq!(
            entries[1]["suggestion"],
            "Check DRIP_API_KEY environment variable"
        );
    }
}
