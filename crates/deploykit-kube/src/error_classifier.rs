//! Error classification from apply stderr (spec §4.6.2, §6): the stable,
//! test-visible regexes that turn a raw `kubectl apply` failure into
//! per-file structured errors in the summary.

use std::collections::{HashMap, HashSet};

use deploykit_core::{Resource, SummarySink};
use once_cell::sync::Lazy;
use regex::Regex;

/// `"(/\S+\.ya?ml\S*)"` — extracts every bad-file token from a stderr line
/// (spec §6, stable contract).
static BAD_FILE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(/\S+\.ya?ml\S*)").unwrap());

/// `^(.*) pruned$` — matches one pruned-object line in apply stdout (spec
/// §6, stable contract).
pub static PRUNED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*) pruned$").unwrap());

/// `kind:\s*Secret` — detects that a template's content looks like a
/// `Secret`, regardless of the sensitive-filename set (spec §6, stable
/// contract).
static SECRET_KIND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"kind:\s*Secret").unwrap());

const SUPPRESSED_FOR_SECURITY: &str = "SUPPRESSED FOR SECURITY";
const SECRET_SUPPRESSED_CONTENT: &str =
    "> Template content: Suppressed because it may contain a Secret";

const ROLLBACK_WARNING: &str = "WARNING: Any resources not mentioned in the error(s) below were likely created/updated. You may wish to roll back this deploy.";

/// Parses `stdout` for `^(.*) pruned$` lines and returns the captured
/// names, in the order they appeared (spec §4.6.1, §8 round-trip
/// property).
pub fn parse_pruned_names(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| {
            PRUNED_RE
                .captures(line)
                .map(|caps| caps[1].trim().to_string())
        })
        .collect()
}

/// Classifies an apply failure's stderr against the submitted resources and
/// writes the resulting paragraphs to `summary`, per the algorithm in spec
/// §4.6.2. Always emits the rollback warning first.
pub fn classify_and_report(
    stderr: &str,
    submitted: &[&Resource],
    sensitive_filenames: &HashSet<String>,
    summary: &dyn SummarySink,
) {
    summary.add_paragraph(ROLLBACK_WARNING);

    let by_basename: HashMap<String, &Resource> = submitted
        .iter()
        .filter_map(|r| {
            std::path::Path::new(&r.file_path)
                .file_name()
                .and_then(|n| n.to_str())
                .map(|basename| (basename.to_string(), *r))
        })
        .collect();

    let any_submitted_sensitive_uncleared = submitted
        .iter()
        .any(|r| r.sensitive && !r.server_dry_run_validated);

    let mut unidentified_errors = Vec::new();
    let mut reported_files: HashSet<String> = HashSet::new();

    for line in stderr.lines() {
        let bad_files: Vec<&str> = BAD_FILE_RE
            .find_iter(line)
            .map(|m| m.as_str())
            .collect();

        if bad_files.is_empty() {
            unidentified_errors.push(line.to_string());
            continue;
        }

        for bad_file in bad_files {
            let basename = std::path::Path::new(bad_file)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(bad_file)
                .to_string();

            if !reported_files.insert(basename.clone()) {
                continue;
            }

            let resource = by_basename.get(&basename).copied();
            let is_sensitive_name = sensitive_filenames.contains(&basename)
                || resource.is_some_and(|r| r.sensitive);
            let cleared = resource.is_some_and(|r| r.server_dry_run_validated);

            if is_sensitive_name && !cleared {
                summary.add_paragraph(&format!("Invalid template: {basename}"));
                summary.add_paragraph(SUPPRESSED_FOR_SECURITY);
                continue;
            }

            summary.add_paragraph(&format!("Invalid template: {basename}"));
            summary.add_paragraph(line);

            if let Some(resource) = resource {
                let content = String::from_utf8_lossy(&resource.raw_manifest);
                if SECRET_KIND_RE.is_match(&content) {
                    summary.add_paragraph(SECRET_SUPPRESSED_CONTENT);
                } else {
                    summary.add_paragraph(&format!("> Template content:\n{content}"));
                }
            }
        }
    }

    if !unidentified_errors.is_empty() {
        if any_submitted_sensitive_uncleared {
            summary.add_paragraph(
                "Unidentified error(s) occurred during apply. Content withheld because one or more submitted resources is sensitive.",
            );
        } else {
            let indented = unidentified_errors
                .iter()
                .map(|l| format!("  {l}"))
                .collect::<Vec<_>>()
                .join("\n");
            summary.add_paragraph(&format!("Unidentified error(s):\n{indented}"));
        }
    }
}
