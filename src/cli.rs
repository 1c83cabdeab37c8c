//! Minimal CLI: parse + validate → (schema | rust)
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// turn typestate declarations into statically-checked state-parameterized Rust types
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// parse + validate and print the JSON view of each schema
    Schema(SchemaOut),
    /// run the full pipeline and emit generated Rust declarations
    Rust(RustOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct RustOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .rs file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// Per-file outcome; declarations inside a file fail independently.
struct FileReport {
    path: PathBuf,
    /// one JSON view per successfully processed declaration
    ok: Vec<serde_json::Value>,
    rendered: Vec<String>,
    errors: Vec<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                let reports = process_inputs(&target.input_settings, false)?;
                let failed = report_errors(&reports);

                let schemas: Vec<&serde_json::Value> =
                    reports.iter().flat_map(|r| r.ok.iter()).collect();
                let json_src = serde_json::to_string_pretty(&schemas)
                    .context("failed to serialize schema view")?;
                write_output(target.out.as_ref(), &json_src)?;

                bail_on_failures(failed)
            }
            Command::Rust(target) => {
                let reports = process_inputs(&target.input_settings, true)?;
                let failed = report_errors(&reports);

                let units: Vec<&str> = reports
                    .iter()
                    .flat_map(|r| r.rendered.iter())
                    .map(|s| s.as_str())
                    .collect();
                let rust_src = units.join("\n");
                write_output(target.out.as_ref(), &rust_src)?;

                bail_on_failures(failed)
            }
        }
    }
}

/// Read, parse, validate (and optionally render) every input file.
///
/// Files never share state, so they run in parallel; the report list keeps
/// the resolved input order so output stays deterministic.
fn process_inputs(settings: &InputSettings, render: bool) -> Result<Vec<FileReport>> {
    let source_paths = resolve_file_path_patterns(&settings.input)
        .context("failed to resolve input file paths")?;

    let reports: Vec<Result<FileReport>> = source_paths
        .par_iter()
        .map(|path| {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read source file {}", path.display()))?;
            Ok(process_source(path.clone(), &source, render))
        })
        .collect();

    reports.into_iter().collect()
}

fn process_source(path: PathBuf, source: &str, render: bool) -> FileReport {
    let mut report = FileReport {
        path,
        ok: Vec::new(),
        rendered: Vec::new(),
        errors: Vec::new(),
    };

    for parsed in crate::parse::parse_all(source) {
        let schema = match parsed {
            Ok(s) => s,
            Err(e) => {
                report.errors.push(e.to_string());
                continue;
            }
        };
        if let Err(e) = crate::validate::validate(&schema) {
            report.errors.push(format!("`{}`: {e}", schema.carrier_name));
            continue;
        }
        if render {
            let decls = crate::plan::plan(&schema);
            let mut cg = crate::codegen::Codegen::new();
            cg.emit(&decls);
            report.rendered.push(cg.into_string());
        }
        // JSON view is serde over the schema itself
        match serde_json::to_value(&schema) {
            Ok(v) => report.ok.push(v),
            Err(e) => report.errors.push(e.to_string()),
        }
    }

    report
}

fn report_errors(reports: &[FileReport]) -> usize {
    let mut failed = 0;
    for report in reports {
        for err in &report.errors {
            eprintln!(
                "{} {}: {err}",
                "error:".red().bold(),
                report.path.display().to_string().bold()
            );
            failed += 1;
        }
    }
    failed
}

fn bail_on_failures(failed: usize) -> Result<()> {
    if failed > 0 {
        anyhow::bail!("{failed} declaration(s) failed");
    }
    Ok(())
}

fn write_output(out: Option<&PathBuf>, content: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, content)
                .with_context(|| format!("failed to write {}", out.display()))?;
        }
        None => {
            println!("{content}");
        }
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            // Treat as a glob pattern
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                matched_any = true;
                out.push(entry?);
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            // Treat as a literal path
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
