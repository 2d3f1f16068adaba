//! Command-line interface for the composer.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use composer_markup::{collect_includes, extract, ContentRange};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::compose::Composer;
use crate::config::{parse_session_value, validate_url, ComposerConfig};
use crate::error::Result;
use crate::session::SessionRoot;

/// Fragment Composer - stitch HTML fragments into a template.
#[derive(Parser)]
#[command(name = "composer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a template and resolve its fragment includes.
    Compose {
        /// Absolute URL of the template
        template_url: String,

        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Session entry sent to every backend (repeatable)
        #[arg(short, long = "session", value_name = "KEY=VALUE")]
        session: Vec<String>,

        /// Write the composed page to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the content range, asset links and includes of a local document.
    Extract {
        /// HTML document to inspect
        file: PathBuf,

        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compose {
            template_url,
            config,
            session,
            output,
        } => compose_command(&template_url, config.as_deref(), &session, output.as_deref()),
        Commands::Extract { file, config, json } => {
            extract_command(&file, config.as_deref(), json)
        }
    }
}

/// Load the configuration file, if any, and apply environment overrides.
fn load_config(path: Option<&Path>) -> Result<ComposerConfig> {
    let config = match path {
        Some(path) => ComposerConfig::from_file(path)?,
        None => ComposerConfig::default(),
    };
    config.with_env_overrides()
}

/// Execute the compose command.
fn compose_command(
    template_url: &str,
    config_path: Option<&Path>,
    session_values: &[String],
    output: Option<&Path>,
) -> Result<()> {
    // Validate inputs before making HTTP requests
    validate_url(template_url)?;
    let values = session_values
        .iter()
        .map(|raw| parse_session_value(raw))
        .collect::<Result<Vec<_>>>()?;
    let config = load_config(config_path)?;

    eprintln!(
        "{} {}",
        style("Composing").bold(),
        style(template_url).cyan()
    );

    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Fetching template and fragments...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let composed = Composer::over_http(config)
        .and_then(|composer| composer.compose(template_url, SessionRoot::of(values)));
    pb.finish_and_clear();
    let page = composed?;

    eprintln!("  Assets: {}", page.assets.len());
    eprintln!("  Session entries: {}", page.session.raw_data().len());
    if page.session.is_dirty() {
        eprintln!("  Session: {}", style("changed").yellow());
    }
    if !page.warnings.is_empty() {
        eprintln!("  Warnings: {}", style(page.warnings.len()).yellow().bold());
        for warning in &page.warnings {
            eprintln!("    {warning}");
        }
    }

    match output {
        Some(path) => {
            std::fs::write(path, &page.html)?;
            eprintln!();
            eprintln!("{} {}", style("Saved to:").green().bold(), path.display());
        }
        None => println!("{}", page.html),
    }

    Ok(())
}

/// Where an include element sits in a document.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct IncludeReport {
    pub path: String,
    pub start: usize,
    pub end: usize,
}

/// What the extractor finds in one document.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ExtractReport {
    pub content_start: usize,
    pub content_end: usize,
    pub content: String,
    pub assets: Vec<String>,
    pub includes: Vec<IncludeReport>,
}

/// Run the extractor and the include collector over `source`.
///
/// The whole document is the content when it has no content element.
pub fn extract_report(source: &str, config: &ComposerConfig) -> Result<ExtractReport> {
    let extraction = extract(source, ContentRange::whole(source), &config.extractor_config())?;
    let includes = collect_includes(source, &config.include_tag)?
        .into_iter()
        .map(|include| IncludeReport {
            path: include.path,
            start: include.range.start(),
            end: include.range.end(),
        })
        .collect();

    Ok(ExtractReport {
        content_start: extraction.content_range.start(),
        content_end: extraction.content_range.end(),
        content: extraction.content(source).unwrap_or_default().to_string(),
        assets: extraction.links,
        includes,
    })
}

/// Execute the extract command.
fn extract_command(file: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let source = std::fs::read_to_string(file)?;
    let report = extract_report(&source, &config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} {}..{}",
        style("Content:").bold(),
        report.content_start,
        report.content_end
    );
    println!("{}", report.content);
    println!();
    println!("{} {}", style("Assets:").bold(), report.assets.len());
    for asset in &report.assets {
        println!("  {asset}");
    }
    println!("{} {}", style("Includes:").bold(), report.includes.len());
    for include in &report.includes {
        println!(
            "  {} ({}..{})",
            style(&include.path).cyan(),
            include.start,
            include.end
        );
    }

    Ok(())
}
