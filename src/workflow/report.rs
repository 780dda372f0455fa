//! Run reports.
//!
//! The report is the user-visible contract: per job, which step (if any)
//! failed and its exit code, plus the aggregate verdict that drives the
//! process exit status.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::time::Duration;

use crate::job::outcome::{JobOutcome, JobStatus};
use crate::ui::theme::CairnTheme;
use crate::workflow::scheduler::WorkflowResult;

/// A finished workflow run, ready to render or serialize.
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// Pipeline name, if the config declares one.
    pub pipeline: Option<String>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    pub success: bool,

    #[serde(rename = "duration_ms", serialize_with = "duration_as_millis")]
    pub duration: Duration,

    pub jobs: Vec<JobOutcome>,
}

fn duration_as_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl RunReport {
    /// Build a report from a workflow result.
    pub fn new(
        pipeline: Option<String>,
        started_at: DateTime<Utc>,
        result: WorkflowResult,
    ) -> Self {
        Self {
            pipeline,
            started_at,
            finished_at: Utc::now(),
            success: result.success,
            duration: result.duration,
            jobs: result.outcomes,
        }
    }

    /// Pretty JSON for `--json`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable multi-line report.
    pub fn render(&self, theme: &CairnTheme) -> String {
        let mut lines = Vec::new();

        for outcome in &self.jobs {
            lines.push(render_outcome(outcome, theme));
            if outcome.status != JobStatus::Passed {
                if let Some(ref detail) = outcome.detail {
                    for line in detail.lines() {
                        lines.push(format!("    {}", theme.dim.apply_to(line)));
                    }
                }
            }
        }

        let failed = self.jobs.iter().filter(|o| !o.status.is_passed()).count();
        let verdict = if self.success {
            theme.format_success(&format!(
                "{} jobs passed ({})",
                self.jobs.len(),
                format_duration(self.duration)
            ))
        } else {
            theme.format_error(&format!(
                "{} of {} jobs did not pass ({})",
                failed,
                self.jobs.len(),
                format_duration(self.duration)
            ))
        };

        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(verdict);
        lines.join("\n")
    }
}

fn render_outcome(outcome: &JobOutcome, theme: &CairnTheme) -> String {
    let duration = format_duration(outcome.duration);
    match outcome.status {
        JobStatus::Passed => theme.format_success(&format!("{} ({})", outcome.job, duration)),
        JobStatus::Failed => {
            let step = outcome.failing_step.as_deref().unwrap_or("unknown step");
            let code = outcome
                .exit_code
                .map(|c| format!("exit code {}", c))
                .unwrap_or_else(|| "killed".to_string());
            theme.format_error(&format!(
                "{} — step '{}' failed ({}) ({})",
                outcome.job, step, code, duration
            ))
        }
        JobStatus::TimedOut => theme.format_warning(&format!(
            "{} — {} ({})",
            outcome.job,
            outcome
                .detail
                .as_deref()
                .unwrap_or("readiness wait expired"),
            duration
        )),
        JobStatus::Errored => theme.format_error(&format!(
            "{} — {} ({})",
            outcome.job,
            outcome.detail.as_deref().unwrap_or("infrastructure fault"),
            duration
        )),
    }
}

/// Compact duration formatting: `500ms`, `5.2s`, `1m 5s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}.{}s", secs, millis / 100)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(outcomes: Vec<JobOutcome>) -> WorkflowResult {
        let success = outcomes.iter().all(|o| o.status.is_passed());
        WorkflowResult {
            outcomes,
            success,
            duration: Duration::from_secs(2),
        }
    }

    #[test]
    fn render_names_failing_step_and_exit_code() {
        let report = RunReport::new(
            Some("mqclient".to_string()),
            Utc::now(),
            result_with(vec![
                JobOutcome::passed("unit", Duration::from_secs(1)),
                JobOutcome::failed(
                    "integrate",
                    "integration tests",
                    Some(1),
                    Duration::from_secs(3),
                    None,
                ),
            ]),
        );

        let text = report.render(&CairnTheme::plain());
        assert!(text.contains("unit"));
        assert!(text.contains("integration tests"));
        assert!(text.contains("exit code 1"));
        assert!(text.contains("1 of 2 jobs did not pass"));
    }

    #[test]
    fn render_includes_timeout_detail() {
        let report = RunReport::new(
            None,
            Utc::now(),
            result_with(vec![JobOutcome::timed_out(
                "integrate",
                "timed out waiting for localhost:6650 after 60.0s".to_string(),
                Duration::from_secs(60),
            )]),
        );

        let text = report.render(&CairnTheme::plain());
        assert!(text.contains("localhost:6650"));
    }

    #[test]
    fn render_success_verdict() {
        let report = RunReport::new(
            None,
            Utc::now(),
            result_with(vec![JobOutcome::passed("unit", Duration::from_secs(1))]),
        );

        let text = report.render(&CairnTheme::plain());
        assert!(text.contains("1 jobs passed"));
    }

    #[test]
    fn json_report_contains_outcomes() {
        let report = RunReport::new(
            Some("mqclient".to_string()),
            Utc::now(),
            result_with(vec![JobOutcome::passed("unit", Duration::from_millis(1200))]),
        );

        let json: serde_json::Value =
            serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["pipeline"], "mqclient");
        assert_eq!(json["success"], true);
        assert_eq!(json["jobs"][0]["job"], "unit");
        assert_eq!(json["jobs"][0]["status"], "passed");
        assert_eq!(json["jobs"][0]["duration_ms"], 1200);
    }

    #[test]
    fn format_duration_formats_correctly() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(5)), "5.0s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
    }
}
