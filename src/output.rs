// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Renders pipeline reports in normal, quiet (CI), and JSON modes.

use serde::Serialize;
use std::time::Instant;

use crate::pipeline::{NotificationOutcome, PipelineReport, StageStatus};

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                // Print only the essential result
                println!("{message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "success",
                    message,
                    duration_secs: if self.start_time.is_some() {
                        Some(self.elapsed_secs())
                    } else {
                        None
                    },
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    println!("{json}");
                }
            }
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message,
                    duration_secs: if self.start_time.is_some() {
                        Some(self.elapsed_secs())
                    } else {
                        None
                    },
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }

    /// Print a non-fatal warning.
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => eprintln!("Warning: {message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "warning",
                    message,
                    duration_secs: None,
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }

    /// Print the final report of a pipeline run.
    pub fn report(&self, report: &PipelineReport) {
        match self.mode {
            OutputMode::Json => {
                let event = JsonReport {
                    event: "report",
                    duration_secs: self.start_time.map(|_| self.elapsed_secs()),
                    exit_code: report.exit_code(),
                    report,
                };
                match serde_json::to_string(&event) {
                    Ok(json) => println!("{json}"),
                    Err(e) => eprintln!("Error: failed to encode report: {e}"),
                }
            }
            OutputMode::Quiet => {
                let outcome = if report.is_success() { "success" } else { "failure" };
                println!("{} {} {outcome}", report.service, report.environment);
                if let Some(target) = report.rollback_target.as_ref().filter(|_| !report.is_success()) {
                    println!("rollback target: {} ({})", target.version, target.commit_sha);
                }
            }
            OutputMode::Normal => self.print_report(report),
        }
    }

    fn print_report(&self, report: &PipelineReport) {
        println!(
            "{} -> {} at {}{}",
            report.service,
            report.environment,
            report.revision.short(),
            if report.dry_run { " (dry run)" } else { "" }
        );
        for stage in &report.stages {
            let marker = match stage.result.status {
                StageStatus::Success => "ok",
                StageStatus::Failure => "FAILED",
                StageStatus::Skipped => "skipped",
                StageStatus::Pending | StageStatus::Running => "incomplete",
            };
            match &stage.result.failure {
                Some(failure) => println!("  {:<12} {marker}: {failure}", stage.stage.as_str()),
                None => println!("  {:<12} {marker}", stage.stage.as_str()),
            }
        }

        if let Some(deployment) = &report.deployment {
            println!("Deployment {} {}", deployment.id(), deployment.status());
            if let Some(url) = deployment.url() {
                println!("  url: {url}");
            }
        }
        if let Some(snapshot) = &report.snapshot {
            println!("Rollback snapshot recorded for {}", snapshot.version);
        }
        if !report.is_success() {
            match &report.rollback_target {
                Some(target) => println!(
                    "Rollback target: {} ({}, deployed {})",
                    target.version,
                    target.commit_sha,
                    target.timestamp.to_rfc3339()
                ),
                None => println!("No rollback target recorded for {}", report.environment),
            }
        }
        if let NotificationOutcome::Failed { reason } = &report.notification {
            println!("Notification not delivered: {reason}");
        }
        for warning in &report.warnings {
            self.warning(&warning.message);
        }

        if report.is_success() {
            self.success("Pipeline succeeded");
        } else {
            self.error("Pipeline failed");
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    event: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
    exit_code: i32,
    report: &'a PipelineReport,
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

