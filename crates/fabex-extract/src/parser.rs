//! Parser for FCM-style `extract.cfg` files.
//!
//! The format is line oriented:
//!
//! ```text
//! # comment
//! extract.path-excl[um] = src                     # drop the whole library
//! extract.path-incl[um] = src/atmosphere/boundary_layer \
//!                         src/control/misc
//! ```
//!
//! Only the `path-excl` / `path-incl` assignments produce rules. `include`
//! directives and `extract.location` declarations are recognised and skipped;
//! anything else is reported and skipped. None of these stop the parse.

use crate::spec::{ExtractionSpec, Rule};
use fabex_core::{Error, FilterKind, Result};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static PATH_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^extract\.path-(excl|incl)\[([^\]]+)\]\s*=\s*(.*)$")
        .expect("path assignment pattern")
});

static INCLUDE_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^include(\s|=|$)").expect("include pattern"));

static LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^extract\.location(\{[^}]*\})?\[[^\]]*\]\s*=").expect("location pattern")
});

/// Why a line was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// An `include` directive; nested files are not followed.
    IncludeNotSupported,
    /// A line matching no known directive.
    UnexpectedLine,
    /// A path assignment with nothing on the right-hand side.
    EmptyPathList,
    /// The file ended while a `\` continuation was still open.
    UnterminatedContinuation,
}

/// A skipped or suspicious line, reported but never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// 1-based line number where the logical line starts.
    pub line: usize,
    pub kind: DiagnosticKind,
    /// The logical line after comment stripping and joining.
    pub content: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            DiagnosticKind::IncludeNotSupported => "ignoring include (not supported)",
            DiagnosticKind::UnexpectedLine => "unexpected line ignored",
            DiagnosticKind::EmptyPathList => "assignment without paths ignored",
            DiagnosticKind::UnterminatedContinuation => "continuation open at end of file",
        };
        write!(f, "line {}: {}: '{}'", self.line, what, self.content)
    }
}

/// Parse result with the diagnostics collected on the way.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseReport {
    pub spec: ExtractionSpec,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse an extract specification file.
///
/// A file that cannot be read is an error; malformed lines are logged and
/// skipped.
pub fn parse(path: &Path) -> Result<ExtractionSpec> {
    parse_with_report(path).map(|report| report.spec)
}

/// Parse an extract specification file and keep the line diagnostics.
pub fn parse_with_report(path: &Path) -> Result<ParseReport> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::missing_input(path, e))?;

    let report = parse_str(&text);
    info!(
        "Parsed {}: {} sections, {} rules, {} diagnostics",
        path.display(),
        report.spec.len(),
        report.spec.rule_count(),
        report.diagnostics.len()
    );
    Ok(report)
}

/// Parse extract specification text.
pub fn parse_str(text: &str) -> ParseReport {
    let mut report = ParseReport::default();
    let mut pending: Vec<&str> = Vec::new();
    let mut start = 0;

    for (idx, raw) in text.lines().enumerate() {
        let line = strip_comment(raw).trim();
        if pending.is_empty() {
            start = idx + 1;
        }

        if let Some(body) = line.strip_suffix('\\') {
            pending.push(body.trim());
            continue;
        }

        pending.push(line);
        let logical = join_segments(&pending);
        pending.clear();
        interpret(&mut report, start, &logical);
    }

    if !pending.is_empty() {
        let logical = join_segments(&pending);
        record(
            &mut report,
            start,
            DiagnosticKind::UnterminatedContinuation,
            &logical,
        );
        interpret(&mut report, start, &logical);
    }

    report
}

/// Drop everything from the first `#`.
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn join_segments(segments: &[&str]) -> String {
    segments
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn interpret(report: &mut ParseReport, line_no: usize, line: &str) {
    if line.is_empty() {
        return;
    }

    if INCLUDE_DIRECTIVE.is_match(line) {
        record(report, line_no, DiagnosticKind::IncludeNotSupported, line);
        return;
    }

    if LOCATION.is_match(line) {
        debug!("line {line_no}: skipping location declaration");
        return;
    }

    let Some(caps) = PATH_ASSIGNMENT.captures(line) else {
        record(report, line_no, DiagnosticKind::UnexpectedLine, line);
        return;
    };

    let kind = match &caps[1] {
        "excl" => FilterKind::Exclude,
        _ => FilterKind::Include,
    };
    let section = caps[2].trim();
    let paths: Vec<PathBuf> = caps[3].split_whitespace().map(PathBuf::from).collect();

    if paths.is_empty() {
        record(report, line_no, DiagnosticKind::EmptyPathList, line);
        return;
    }

    debug!(
        "line {line_no}: {kind} {} path(s) in section '{}'",
        paths.len(),
        section.to_lowercase()
    );
    report.spec.push(section, Rule { kind, paths });
}

fn record(report: &mut ParseReport, line: usize, kind: DiagnosticKind, content: &str) {
    let diagnostic = Diagnostic {
        line,
        kind,
        content: content.to_string(),
    };
    warn!("{diagnostic}");
    report.diagnostics.push(diagnostic);
}
