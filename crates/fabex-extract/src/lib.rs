//! fabex-extract: Extract specification parser and rule translation.

pub mod mapping;
pub mod parser;
pub mod spec;

pub use mapping::{strip_leading_component, PathMapping};
pub use parser::{parse, parse_str, parse_with_report, Diagnostic, DiagnosticKind, ParseReport};
pub use spec::{ExtractionSpec, Rule};
