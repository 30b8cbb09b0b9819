//! @ai:module:intent Format documents and run reports for the terminal (JSON, text)
//! @ai:module:layer infrastructure
//! @ai:module:public_api OutputFormat, format_document, format_report, RunSummary
//! @ai:module:depends_on document, run
//! @ai:module:stateless true

use crate::document::{Document, DocumentNode};
use crate::run::RunReport;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// @ai:intent Output format options
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

/// @ai:intent Format a document as a string
/// @ai:effects pure
pub fn format_document(document: &Document, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(document).unwrap_or_default(),
        OutputFormat::JsonPretty => serde_json::to_string_pretty(document).unwrap_or_default(),
        OutputFormat::Text => format_document_text(document),
    }
}

/// @ai:intent Format a document as an indented outline
/// @ai:effects pure
fn format_document_text(document: &Document) -> String {
    let mut output = String::new();
    let file = &document.file;

    output.push_str(&format!(
        "{} ({})\n",
        format!("{}/{}.{}", file.path, file.name, file.extension).bold(),
        file.timestamp.dimmed()
    ));

    if !document.configuration.is_empty() {
        output.push_str("  Configuration:\n");
        for node in &document.configuration {
            output.push_str(&format!("    {} {}\n", node.keyword.cyan(), node.value));
        }
    }

    output.push_str(&format!("\n  Data ({}):\n", document.data.len()));
    for node in &document.data {
        format_node_text(node, 2, &mut output);
    }

    output
}

fn format_node_text(node: &DocumentNode, depth: usize, output: &mut String) {
    let pad = "  ".repeat(depth);
    let label = if node.separator {
        "--".dimmed().to_string()
    } else if node.keyword.is_empty() {
        "·".dimmed().to_string()
    } else {
        node.keyword.cyan().to_string()
    };

    output.push_str(&format!(
        "{}{} {}",
        pad,
        label,
        format!("(line {})", node.line).dimmed()
    ));
    if !node.flags.is_empty() {
        output.push_str(&format!(" [{}]", node.flags.join(", ").yellow()));
    }
    output.push('\n');

    for line in node.value.lines() {
        output.push_str(&format!("{}  {}\n", pad, line));
    }

    for child in &node.data {
        format_node_text(child, depth + 1, output);
    }
}

/// @ai:intent Serializable view of a run report
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub task: String,
    pub output: PathBuf,
    pub written: Vec<PathBuf>,
    pub failed: Vec<FailedFile>,
    pub index: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: String,
}

impl From<&RunReport> for RunSummary {
    fn from(report: &RunReport) -> Self {
        Self {
            task: report.task.clone(),
            output: report.output.clone(),
            written: report.written().cloned().collect(),
            failed: report
                .failures()
                .map(|(path, error)| FailedFile {
                    path: path.to_path_buf(),
                    error: error.to_string(),
                })
                .collect(),
            index: report.index.clone(),
        }
    }
}

/// @ai:intent Format a run report as a string
/// @ai:effects pure
pub fn format_report(report: &RunReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(&RunSummary::from(report)).unwrap_or_default(),
        OutputFormat::JsonPretty => {
            serde_json::to_string_pretty(&RunSummary::from(report)).unwrap_or_default()
        }
        OutputFormat::Text => format_report_text(report),
    }
}

fn format_report_text(report: &RunReport) -> String {
    let mut output = String::new();

    for (path, error) in report.failures() {
        output.push_str(&format!(
            "{} {} - {}\n",
            "SKIP".yellow().bold(),
            path.display().to_string().dimmed(),
            error
        ));
    }

    let written = report.written().count();
    let total = report.outcomes.len();
    output.push_str(&format!(
        "Task {}: {} of {} file{} processed into {}\n",
        report.task.cyan(),
        written,
        total,
        if total == 1 { "" } else { "s" },
        report.output.display()
    ));

    if report.passed() {
        output.push_str(&format!("{} complete\n", "OK".green().bold()));
    } else {
        output.push_str(&format!(
            "{} {} skipped\n",
            "WARN".yellow().bold(),
            (total - written).to_string().yellow()
        ));
    }

    output
}
