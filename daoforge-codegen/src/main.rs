//! daoforge Codegen - data-access code generation tool
//!
//! Reads table definitions, runs the generator over them and writes record
//! types, SQL builders and mapper traits as plain Rust source files.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use daoforge::{Generator, GeneratorConfig};
use daoforge_codegen::{load_tables, TableWriter};

#[derive(Parser)]
#[command(name = "daoforge-codegen")]
#[command(about = "Generate data-access code from table definitions", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate code from table definitions
    Generate {
        /// Input file or directory containing table definitions
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for generated code
        #[arg(short, long, default_value = "src/dao")]
        output: PathBuf,

        /// Generator configuration file (default: config/daoforge.toml and DAOFORGE__* env vars)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print sample SQL for every operation
        #[arg(long)]
        preview: bool,

        /// Write generated files without running rustfmt
        #[arg(long)]
        no_format: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.quiet {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();
    } else if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let result = match cli.command {
        Commands::Generate {
            input,
            output,
            config,
            preview,
            no_format,
        } => generate(&input, &output, config.as_deref(), preview, no_format),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("❌ {:#}", e);
            process::exit(2);
        }
    }
}

/// Returns `Ok(false)` when at least one table failed
fn generate(input: &Path, output: &Path, config: Option<&Path>, preview: bool, no_format: bool) -> anyhow::Result<bool> {
    let config = match config {
        Some(path) => GeneratorConfig::load_from(path)?,
        None => GeneratorConfig::load()?,
    };

    println!("🔧 daoforge Codegen");
    println!("📥 Input: {}", input.display());
    println!("📤 Output: {}", output.display());

    let tables = load_tables(input)?;
    if tables.is_empty() {
        anyhow::bail!("No table definitions found in {}", input.display());
    }

    let report = Generator::new(config).generate_all(tables);

    if preview {
        for artifacts in &report.artifacts {
            println!("\n-- {}", artifacts.table.id());
            for (name, sql) in artifacts.preview() {
                match sql {
                    Ok(sql) => println!("{}: {}", name, sql),
                    Err(e) => println!("{}: <{}>", name, e),
                }
            }
        }
    }

    let mut writer = TableWriter::new();
    if no_format {
        writer = writer.without_formatting();
    }
    let written = writer.write_all(&report.artifacts, output)?;
    for path in &written {
        println!("✅ Generated: {}", path.display());
    }

    for failure in &report.failures {
        eprintln!("❌ {}: {}", failure.table, failure.error);
    }

    let count = report.artifacts.len();
    println!("✨ Generated {} table{}", count, if count == 1 { "" } else { "s" });
    Ok(report.is_success())
}
