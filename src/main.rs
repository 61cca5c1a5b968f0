use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use hifriend::config::ServiceConfig;
use hifriend::diagnostics::{self, Diagnostic, DiagnosticLevel};
use hifriend::service::Service;
use hifriend::stdlib::SignatureCache;

/// HiFriend - Incremental type inference for Ruby
#[derive(Parser)]
#[command(name = "hifriend")]
#[command(about = "Incremental static type inference for Ruby", long_about = None)]
struct Cli {
    /// Log filter used when HIFRIEND_LOG and RUST_LOG are unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Ignore the stdlib signature cache
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze Ruby files or directories and report failures
    Check {
        /// Files or directories to analyze
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Show detailed output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the inferred type at a position
    Hover {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// 1-based line
        line: usize,

        /// 1-based column
        column: usize,
    },

    /// Watch a directory and re-analyze files as they change
    Watch {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Show version information
    Version,

    /// Clear the stdlib signature cache
    ClearCache,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = ServiceConfig {
        use_signature_cache: !cli.no_cache,
        ..ServiceConfig::default()
    };

    match cli.command {
        Commands::Check { paths, verbose } => {
            let success = check_paths(config, &paths, verbose)?;
            if !success {
                std::process::exit(1);
            }
        }
        Commands::Hover { file, line, column } => {
            hover(config, &file, line, column)?;
        }
        Commands::Watch { dir } => {
            watch_dir(config, &dir)?;
        }
        Commands::Version => {
            println!("HiFriend {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::ClearCache => {
            clear_cache()?;
        }
    }

    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env("HIFRIEND_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Expand directories into their source files
fn expand_paths(service: &Service, paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(service.collect_workspace_files(path));
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn check_paths(config: ServiceConfig, paths: &[PathBuf], verbose: bool) -> Result<bool> {
    let mut service = Service::new(config).context("Failed to start analysis service")?;
    let files = expand_paths(&service, paths);

    let analyzed = service
        .update_files(&files)
        .context("Failed to analyze files")?;

    Ok(report(&service, &files, analyzed, verbose))
}

/// Print diagnostics of `files`; true when none is an error
fn report(service: &Service, files: &[PathBuf], analyzed: usize, verbose: bool) -> bool {
    let mut has_errors = false;

    for file in files {
        let found: &[Diagnostic] = service.diagnostics(file);
        if found.is_empty() {
            if verbose {
                println!("{}: ok", file.display());
            }
            continue;
        }

        let output = if verbose {
            diagnostics::format_diagnostics_detailed(found)
        } else {
            diagnostics::format_diagnostics_with_file(found, file)
        };
        println!("{}", output);

        has_errors |= found.iter().any(|d| d.level == DiagnosticLevel::Error);
    }

    if verbose {
        println!("{} of {} files analyzed", analyzed, files.len());
    }
    !has_errors
}

fn hover(config: ServiceConfig, file: &Path, line: usize, column: usize) -> Result<()> {
    let mut service = Service::new(config).context("Failed to start analysis service")?;
    service
        .update_file(file, None)
        .with_context(|| format!("Failed to analyze {}", file.display()))?;

    match service.hover(file, line, column.saturating_sub(1)) {
        Some(shown) => println!("{}", shown),
        None => println!("No type information at {}:{}:{}", file.display(), line, column),
    }
    Ok(())
}

fn watch_dir(config: ServiceConfig, dir: &Path) -> Result<()> {
    use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
    use std::sync::mpsc::channel;
    use std::time::Duration;

    if !dir.is_dir() {
        anyhow::bail!("Directory not found: {}", dir.display());
    }

    let mut service = Service::new(config).context("Failed to start analysis service")?;

    println!("Watching {} for changes (Press Ctrl+C to stop)", dir.display());
    println!();

    let files = service.collect_workspace_files(dir);
    let analyzed = service
        .update_files(&files)
        .context("Failed to analyze workspace")?;
    report(&service, &files, analyzed, false);
    println!("Initial analysis: {} of {} files", analyzed, files.len());
    println!();

    let (tx, rx) = channel();

    let mut watcher = RecommendedWatcher::new(
        move |res| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        },
        Config::default().with_poll_interval(Duration::from_millis(500)),
    )?;

    watcher.watch(dir, RecursiveMode::Recursive)?;

    loop {
        let event: notify::Event = match rx.recv() {
            Ok(event) => event,
            Err(e) => {
                eprintln!("Watch error: {}", e);
                break;
            }
        };

        let sources: Vec<PathBuf> = event
            .paths
            .into_iter()
            .filter(|path| service.config().is_source_file(path))
            .collect();
        if sources.is_empty() {
            continue;
        }

        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) => {
                // Small delay to ensure file is fully written
                std::thread::sleep(Duration::from_millis(100));

                println!("--- {} file(s) changed, re-analyzing ---", sources.len());
                match service.update_files(&sources) {
                    Ok(analyzed) => {
                        if report(&service, &sources, analyzed, false) {
                            println!("✓ No errors");
                        }
                    }
                    Err(e) => eprintln!("Error during analysis: {}", e),
                }
                println!();
            }
            EventKind::Remove(_) => {
                for path in &sources {
                    if let Err(e) = service.remove_file(path) {
                        eprintln!("Failed to forget {}: {}", path.display(), e);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn clear_cache() -> Result<()> {
    let path = SignatureCache::cache_path()?;
    if SignatureCache::clear()? {
        println!("Cache cleared: {}", path.display());
    } else {
        println!("No cache file found");
    }
    Ok(())
}
