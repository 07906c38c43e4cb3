//! Terminal output for cost results and price lists.
//!
//! Uses the `console` crate for colored text. JSON output goes through
//! `serde_json` so scripts can consume it.

use console::Style;
use serde_json::json;

use crate::cost::CostResult;
use crate::pricing::PriceTable;

pub struct Report {
    json: bool,
    green: Style,
    red: Style,
    dim: Style,
}

impl Report {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            dim: Style::new().dim(),
        }
    }

    pub fn render_cost(&self, result: &CostResult) -> String {
        if self.json {
            return serde_json::to_string_pretty(result).unwrap_or_default();
        }
        format!(
            "  {} job {} on cluster {}\n  {} {:.2} min\n  {} ${}\n  {} ${}\n  {} {}",
            self.green.apply_to("✓"),
            result.job_id,
            result.cluster_name,
            self.dim.apply_to("billable duration:"),
            result.minutes,
            self.dim.apply_to("master cost:      "),
            result.master_cost,
            self.dim.apply_to("worker cost:      "),
            result.worker_cost,
            self.dim.apply_to("total operation cost:"),
            self.green.apply_to(format!("${}", result.total_cost)),
        )
    }

    pub fn render_prices(&self, prices: &PriceTable) -> String {
        if self.json {
            return serde_json::to_string_pretty(prices.entries()).unwrap_or_default();
        }
        prices
            .entries()
            .iter()
            .map(|e| format!("{:<24} ${}/h", e.machine_type, e.hourly_cost))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Shown when no Dataproc handle could be obtained. Distinct from a zero cost.
    pub fn render_unavailable(&self) -> String {
        self.render_failure("could not compute cost", "Dataproc client unavailable")
    }

    pub fn render_error(&self, err: &dyn std::fmt::Display) -> String {
        if self.json {
            return json_error("error", &err.to_string());
        }
        format!("  {} {err}", self.red.apply_to("✗"))
    }

    fn render_failure(&self, error: &str, reason: &str) -> String {
        if self.json {
            return json_error(error, reason);
        }
        format!("  {} {error}: {reason}", self.red.apply_to("✗"))
    }
}

fn json_error(error: &str, reason: &str) -> String {
    serde_json::to_string_pretty(&json!({ "error": error, "reason": reason })).unwrap_or_default()
}
