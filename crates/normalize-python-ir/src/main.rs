//! normalize-python-ir - print the declaration IR of a Python file.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use normalize_python_ir::config::ConfigFile;
use normalize_python_ir::{Declaration, NormalizeConfig, Normalizer, Reader, input};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Normalize a Python module into declaration records.
#[derive(Parser)]
#[command(name = "normalize-python-ir", version, about)]
struct Cli {
    /// Input Python file, use - for stdin
    #[arg(required_unless_present = "schema")]
    input: Option<PathBuf>,

    /// Source language (default: from the file extension, else python)
    #[arg(short, long)]
    language: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Extra config file, merged over the global and project configs
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep docstrings exactly as written
    #[arg(long)]
    raw_docstrings: bool,

    /// Tag bare names as strings instead of references
    #[arg(long)]
    conflate_references: bool,

    /// Resolve non-subscripted annotations into declared types
    #[arg(long, value_name = "BOOL")]
    bare_annotations: Option<bool>,

    /// Print the parser's syntax tree instead of the IR
    #[arg(long, conflicts_with = "schema")]
    tree: bool,

    /// Print the JSON Schema of the output and exit
    #[arg(long)]
    schema: bool,

    /// More logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Pretty-printed JSON array
    Json,
    /// One JSON record per line
    Jsonl,
    /// YAML sequence
    Yaml,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.schema {
        let schema = schemars::schema_for!(Vec<Declaration>);
        let text = serde_json::to_string_pretty(&schema)?;
        return emit(cli.output.as_deref(), &format!("{text}\n"));
    }

    let input_path = cli
        .input
        .as_deref()
        .context("an input file is required")?;
    let source = read_input(input_path)?;

    if cli.tree {
        let tree = input::python_syntax_tree(&source)?;
        return emit(cli.output.as_deref(), &format!("{tree}\n"));
    }

    let config = resolve_config(&cli)?;
    tracing::debug!(?config, "resolved configuration");

    let reader = select_reader(cli.language.as_deref(), input_path)?;
    let module = reader
        .read(&source)
        .with_context(|| format!("failed to parse {}", input_path.display()))?;
    let decls = Normalizer::new(config).normalize(&module);
    tracing::info!(declarations = decls.len(), "normalized module");

    emit(cli.output.as_deref(), &render(&decls, cli.format)?)
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    }
}

/// Explicit language, then file extension, then the Python reader.
fn select_reader(language: Option<&str>, path: &Path) -> Result<&'static dyn Reader> {
    if let Some(lang) = language {
        return input::reader_for_language(lang)
            .with_context(|| format!("no reader for language: {lang}"));
    }
    let by_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(input::reader_for_extension);
    if let Some(reader) = by_extension {
        return Ok(reader);
    }
    if path != Path::new("-") {
        tracing::warn!(path = %path.display(), "unrecognized extension, reading as python");
    }
    Ok(&input::PYTHON_READER)
}

/// Global and project config, then `--config`, then flags.
fn resolve_config(cli: &Cli) -> Result<NormalizeConfig> {
    let root = std::env::current_dir().context("failed to get current directory")?;
    let mut config = NormalizeConfig::load(&root)?;

    if let Some(path) = &cli.config {
        config = config.merge(ConfigFile::load(path)?);
    }
    if cli.raw_docstrings {
        config.clean_docstrings = false;
    }
    if cli.conflate_references {
        config.distinguish_references = false;
    }
    if let Some(bare) = cli.bare_annotations {
        config.resolve_bare_annotations = bare;
    }

    Ok(config)
}

fn render(decls: &[Declaration], format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(decls)?),
        OutputFormat::Jsonl => {
            let mut out = String::new();
            for decl in decls {
                out.push_str(&serde_json::to_string(decl)?);
                out.push('\n');
            }
            out
        }
        OutputFormat::Yaml => serde_yaml::to_string(decls)?,
    })
}

fn emit(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}
