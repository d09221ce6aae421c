//! Console and Markdown renderings of stored verdicts

use crate::types::{AuditSummary, DependencyVerdict};
use chrono::{DateTime, SecondsFormat, Utc};
use colored::*;

/// Counts of total, outdated, vulnerable and non-compliant verdicts
pub fn render_summary(verdicts: &[DependencyVerdict]) -> String {
    let summary = AuditSummary::from_verdicts(verdicts);
    let mut out = String::new();

    out.push_str(&format!("{}\n", "=== Audit Summary ===".bold()));
    out.push_str(&format!("Total dependencies: {}\n", summary.total));
    out.push_str(&format!(
        "  {} {}\n",
        "●".yellow(),
        format!("Outdated: {}", summary.outdated).yellow()
    ));
    out.push_str(&format!(
        "  {} {}\n",
        "●".red(),
        format!("Vulnerable: {}", summary.vulnerable).red()
    ));
    out.push_str(&format!(
        "  {} {}\n",
        "●".magenta(),
        format!("Non-compliant licenses: {}", summary.non_compliant).magenta()
    ));

    out
}

/// One line per verdict, with sub-lines only for the conditions that apply
pub fn render_detail(verdicts: &[DependencyVerdict]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "=== Detailed Results ===".bold()));

    for verdict in verdicts {
        out.push_str(&format!("{}@{}\n", verdict.name.bold(), verdict.declared_version));

        if verdict.is_outdated {
            out.push_str(&format!(
                "  {} latest {}\n",
                "outdated:".yellow(),
                verdict.latest_version
            ));
        }
        if let Some(severity) = &verdict.vulnerability_severity {
            out.push_str(&format!("  {} {}\n", "vulnerability:".red(), severity));
        }
        if !verdict.is_license_allowed {
            out.push_str(&format!(
                "  {} {}\n",
                "license not allowed:".magenta(),
                verdict.license
            ));
        }
    }

    out
}

/// Outdated verdicts only, as `name: declared -> latest`
pub fn render_outdated(verdicts: &[DependencyVerdict]) -> String {
    let outdated: Vec<_> = verdicts.iter().filter(|v| v.is_outdated).collect();
    if outdated.is_empty() {
        return format!("{}\n", "No outdated dependencies.".green());
    }

    let mut out = String::new();
    out.push_str(&format!("{}\n", "=== Outdated Dependencies ===".bold()));
    for verdict in outdated {
        out.push_str(&format!(
            "{}: {} -> {}\n",
            verdict.name.bold(),
            verdict.declared_version,
            verdict.latest_version.yellow()
        ));
    }
    out
}

/// Every verdict's license with its compliance marker
pub fn render_licenses(verdicts: &[DependencyVerdict]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "=== Licenses ===".bold()));

    for verdict in verdicts {
        let marker = if verdict.is_license_allowed {
            "allowed".green()
        } else {
            "not allowed".red()
        };
        out.push_str(&format!("{}: {} ({})\n", verdict.name.bold(), verdict.license, marker));
    }

    let non_compliant = AuditSummary::from_verdicts(verdicts).non_compliant;
    out.push_str(&format!("Non-compliant licenses: {}\n", non_compliant));
    out
}

/// Full Markdown document, rebuilt from the given verdicts
pub fn render_markdown(project_name: &str, verdicts: &[DependencyVerdict], generated_at: DateTime<Utc>) -> String {
    let summary = AuditSummary::from_verdicts(verdicts);
    let mut md = String::new();

    md.push_str(&format!("# Dependency Audit Report: {}\n\n", project_name));
    md.push_str(&format!(
        "**Generated:** {}\n\n",
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- Total dependencies: {}\n", summary.total));
    md.push_str(&format!("- Outdated: {}\n", summary.outdated));
    md.push_str(&format!("- Vulnerable: {}\n", summary.vulnerable));
    md.push_str(&format!("- Non-compliant licenses: {}\n\n", summary.non_compliant));

    md.push_str("## Dependencies\n");
    for verdict in verdicts {
        md.push_str(&format!("\n### {}\n\n", verdict.name));
        md.push_str(&format!("- Declared version: {}\n", verdict.declared_version));
        md.push_str(&format!("- Latest version: {}\n", verdict.latest_version));
        md.push_str(&format!(
            "- Vulnerability: {}\n",
            verdict.vulnerability_severity.as_deref().unwrap_or("None")
        ));
        md.push_str(&format!(
            "- License: {} ({})\n",
            verdict.license,
            if verdict.is_license_allowed { "Allowed" } else { "Not allowed" }
        ));
    }

    md
}
