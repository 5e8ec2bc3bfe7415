//! fabex-cli: Command-line interface for fabex.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fabex_core::{Config, FilterKind};
use fabex_extract::{parse_with_report, ExtractionSpec};
use fabex_scanner::{Pipeline, SelectionSnapshot};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "fabex")]
#[command(about = "Select the source files a build compiles from FCM extract specs", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level for fabex crates (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
    Plain,
}

/// Where the source tree and specs come from.
#[derive(clap::Args)]
struct SourceArgs {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source root, overriding the configuration
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Extract spec files, appended after the configured ones
    #[arg(short, long = "spec")]
    specs: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse extract specs and show their sections
    Sections {
        /// Spec files, merged in the given order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: Format,
    },

    /// Resolve the final list of source files
    Select {
        #[command(flatten)]
        source: SourceArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: Format,

        /// Write the selection snapshot to this file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Treat an empty selection as an error
        #[arg(long)]
        fail_on_empty: bool,
    },

    /// Show which filter decides a file
    Explain {
        /// File to explain
        file: PathBuf,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show a saved selection snapshot
    Show {
        /// Snapshot file
        snapshot: PathBuf,
    },

    /// Write a default configuration file
    Init {
        /// Destination path
        #[arg(default_value = "fabex.toml")]
        path: PathBuf,
    },

    /// Print build information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    fabex_core::logging::init(cli.log_level.as_deref());

    match cli.command {
        Some(Commands::Sections { files, format }) => sections(&files, format)?,
        Some(Commands::Select {
            source,
            format,
            save,
            fail_on_empty,
        }) => select(&source, format, save.as_deref(), fail_on_empty)?,
        Some(Commands::Explain { file, source }) => explain(&file, &source)?,
        Some(Commands::Show { snapshot }) => show(&snapshot)?,
        Some(Commands::Init { path }) => init(&path)?,
        Some(Commands::Version) => {
            println!("{}", fabex_core::build_info::version_string("fabex"));
        }
        None => {
            println!("fabex v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn sections(files: &[PathBuf], format: Format) -> Result<()> {
    let mut spec = ExtractionSpec::new();
    let mut diagnostics = Vec::new();
    for file in files {
        let report =
            parse_with_report(file).with_context(|| format!("parsing {}", file.display()))?;
        spec.merge(report.spec);
        diagnostics.extend(report.diagnostics);
    }

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "sections": spec,
                "diagnostics": diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Plain => {
            for (section, rules) in spec.iter() {
                for rule in rules {
                    for path in &rule.paths {
                        println!("{section}\t{}\t{}", rule.kind, path.display());
                    }
                }
            }
        }
        Format::Table => {
            println!("{:<20} {:<8} PATHS", "SECTION".bold(), "KIND".bold());
            for (section, rules) in spec.iter() {
                for rule in rules {
                    let paths: Vec<String> =
                        rule.paths.iter().map(|p| p.display().to_string()).collect();
                    println!(
                        "{:<20} {:<8} {}",
                        section,
                        kind_label(rule.kind),
                        paths.join(" ")
                    );
                }
            }
            for diagnostic in &diagnostics {
                eprintln!("{} {}", "warning:".yellow(), diagnostic);
            }
        }
    }

    Ok(())
}

fn select(
    source: &SourceArgs,
    format: Format,
    save: Option<&Path>,
    fail_on_empty: bool,
) -> Result<()> {
    let config = load_config(source)?;
    let root = config.source_root.clone();
    let result = Pipeline::new(config).run()?;
    let selection = &result.selection;

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "root": root,
                "selected": selection.files,
                "excluded": selection.excluded,
                "diagnostics": result.diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Plain => {
            for file in &selection.files {
                println!("{}", file.display());
            }
        }
        Format::Table => {
            println!("{:<9} PATH", "VERDICT".bold());
            for file in &selection.files {
                println!("{:<9} {}", kind_label(FilterKind::Include), file.display());
            }
            for file in &selection.excluded {
                println!("{:<9} {}", kind_label(FilterKind::Exclude), file.display());
            }
        }
    }

    if let Some(path) = save {
        SelectionSnapshot::new(&root, selection).save(path)?;
    }

    info!(
        "{} selected, {} excluded",
        selection.len(),
        selection.excluded.len()
    );

    if fail_on_empty && selection.is_empty() {
        bail!("no source files selected under {}", root.display());
    }

    Ok(())
}

fn explain(file: &Path, source: &SourceArgs) -> Result<()> {
    let config = load_config(source)?;
    let file = if file.is_relative() {
        config.source_root.join(file)
    } else {
        file.to_path_buf()
    };

    match Pipeline::new(config).explain(&file)? {
        Some((idx, filter)) => {
            println!(
                "{}: {} by filter #{} ({})",
                file.display(),
                verdict_label(filter.kind),
                idx,
                filter
            );
        }
        None => {
            println!(
                "{}: {} (no filter matches)",
                file.display(),
                verdict_label(FilterKind::Include)
            );
        }
    }

    Ok(())
}

fn show(snapshot: &Path) -> Result<()> {
    let snapshot = SelectionSnapshot::load(snapshot)?;

    println!("Selection snapshot:");
    println!("  Root: {}", snapshot.root.display());
    println!("  Files: {}", snapshot.files.len());
    println!(
        "  Created: {}",
        snapshot.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    for file in &snapshot.files {
        println!("    {}", file.display());
    }

    Ok(())
}

fn init(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    Config::default().save(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn load_config(source: &SourceArgs) -> Result<Config> {
    let mut config = match &source.config {
        Some(path) => {
            Config::load(path).with_context(|| format!("loading config {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(root) = &source.root {
        config.source_root = root.clone();
    }
    config.extract_specs.extend(source.specs.iter().cloned());

    Ok(config)
}

fn kind_label(kind: FilterKind) -> String {
    match kind {
        FilterKind::Include => kind.as_str().green().to_string(),
        FilterKind::Exclude => kind.as_str().red().to_string(),
    }
}

fn verdict_label(kind: FilterKind) -> String {
    match kind {
        FilterKind::Include => "selected".green().to_string(),
        FilterKind::Exclude => "excluded".red().to_string(),
    }
}
