// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_and_validate};
use crate::engine::{ShutdownPolicy, Supervisor, SupervisorEvent};
use crate::exec::TokioSpawner;
use crate::fs::RealFileSystem;
use crate::watch::{Debouncer, NotifySource, PathFilter, TreeEnumerator};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + CLI flags)
/// - tree registration with the notification source
/// - the watcher loop and debouncer
/// - the process supervisor
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = match load_and_validate(&args) {
        Ok(cfg) => cfg,
        Err(err) if err.is_usage_error() => {
            eprintln!("autocmd: {err}");
            cli::print_usage();
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let filter = Arc::new(PathFilter::from_config(&cfg)?);

    // Restart signals and shutdown requests. A single slot: while a restart
    // is already queued further ones are coalesced into it.
    let (events_tx, events_rx) = mpsc::channel::<SupervisorEvent>(1);

    let (source, source_rx) = NotifySource::new()?;
    let enumerator = Arc::new(TreeEnumerator::new(
        cfg.root(),
        Arc::clone(&filter),
        Arc::new(source),
        Arc::new(RealFileSystem),
    ));
    let registered = enumerator.enumerate_root()?;
    info!(root = ?cfg.root(), directories = registered, "watch tree registered");

    let debouncer = Debouncer::new(cfg.wait(), events_tx.clone());
    let _watcher_handle =
        watch::spawn_watcher(Arc::clone(&enumerator), Arc::clone(&filter), debouncer, source_rx);

    debug!(
        root = ?cfg.root(),
        include = ?filter.include_patterns().collect::<Vec<_>>(),
        exclude = ?filter.exclude_patterns().collect::<Vec<_>>(),
        cmd = ?cfg.command(),
        "watching for changes"
    );

    // Ctrl-C → graceful shutdown.
    {
        let tx = events_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(SupervisorEvent::ShutdownRequested).await;
        });
    }
    drop(events_tx);

    let supervisor = Supervisor::new(
        cfg.command().to_vec(),
        TokioSpawner,
        ShutdownPolicy::from_config(&cfg),
        cfg.process().on_exit,
        events_rx,
    );
    supervisor.run().await?;
    Ok(())
}

/// Simple dry-run output: print the resolved settings.
fn print_dry_run(cfg: &ConfigFile) {
    let watch = cfg.watch();
    let process = cfg.process();

    println!("autocmd dry-run");
    println!("  root: {}", cfg.root().display());
    println!("  command: {:?}", cfg.command());
    println!("  syntax: {}", watch.syntax);
    println!("  include_mode: {:?}", watch.include_mode);
    println!("  include: {:?}", watch.include);
    println!("  exclude: {:?}", watch.effective_exclude());
    println!("  wait_ms: {}", watch.wait_ms);
    println!("  sigint_ms: {}", process.sigint_ms);
    println!("  between_ms: {}", process.between_ms);
    println!("  on_exit: {:?}", process.on_exit);

    debug!("dry-run complete (nothing watched or run)");
}
