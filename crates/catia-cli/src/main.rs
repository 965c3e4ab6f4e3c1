//! `catia-cli` – Catia Command Line Interface
//!
//! This binary is the chat front-end for Catia's encrypted memory.  It:
//!
//! 1. Loads `~/.catia/config.toml`, writing the defaults on first run.
//! 2. Opens the encrypted memory store (generating the key on first run).
//! 3. Drops the user into an **interactive REPL** where plain lines are chat
//!    and slash-commands (`/teach`, `/recall`, `/mood`, `/help`, …) manage
//!    memory.
//! 4. Intercepts **Ctrl-C**, logs a final memory summary and exits once no
//!    write is in flight.

mod config;
mod repl;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

use catia_memory::{MemoryStats, MemoryStore, MoodDetector, SharedMemoryStore, StorageError};

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG selects the filter (default "info").  CATIA_LOG_FORMAT=json
    // switches to newline-delimited JSON.  User-facing output stays on
    // println!.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("CATIA_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    print_banner();

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            with_env(cfg)
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            with_env(config::Config::default())
        }
    };

    // ── Memory ────────────────────────────────────────────────────────────
    let store = match MemoryStore::open(&cfg.memory) {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Failed to open memory");
            println!("{}: {}", "Cannot open memory".red().bold(), e);
            if matches!(e, StorageError::KeyMissing { .. }) {
                println!(
                    "  Restore {} or move the memory file aside to start fresh.",
                    cfg.memory.key_path.display().to_string().bold()
                );
            }
            std::process::exit(1);
        }
    };
    let stats = store.stats();
    println!(
        "  Memory: {} learned response(s), mood {}",
        stats.total_entries.to_string().bold(),
        stats.mood.to_string().yellow()
    );
    let store = SharedMemoryStore::new(store);
    let detector = MoodDetector::new(cfg.memory.mood_keywords.clone());

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    // Holding the store lock while exiting guarantees no save is half done.
    let store_for_ctrlc = store.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – shutting down …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);

        let outcome = store_for_ctrlc.with(|s| -> Result<(), StorageError> {
            log_final_stats(&s.stats());
            println!("{}", "  ✓ Memory is saved. Bye bye~".green());
            std::process::exit(0)
        });
        if let Err(e) = outcome {
            warn!(error = %e, "Could not summarise memory on shutdown");
        }
        std::process::exit(0);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    println!();
    println!(
        "  Say something, or type {} for a list of commands.\n",
        "/help".bold().cyan()
    );

    // ── Interactive REPL ──────────────────────────────────────────────────
    repl::run(store.clone(), detector, &cfg, shutdown);

    if let Err(e) = store.with(|s| {
        log_final_stats(&s.stats());
        Ok(())
    }) {
        warn!(error = %e, "Could not summarise memory on exit");
    }
}

fn with_env(mut cfg: config::Config) -> config::Config {
    config::apply_env_overrides(&mut cfg);
    cfg
}

fn log_final_stats(stats: &MemoryStats) {
    info!(
        entries = stats.total_entries,
        corrections = stats.corrections,
        history = stats.history_len,
        mood = %stats.mood,
        "Session ended"
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   ______      __  _      "#.bold().magenta());
    println!("{}", r#"  / ____/___ _/ /_(_)___ _"#.bold().magenta());
    println!("{}", r#" / /   / __ `/ __/ / __ `/"#.bold().magenta());
    println!("{}", r#"/ /___/ /_/ / /_/ / /_/ / "#.bold().magenta());
    println!("{}", r#"\____/\__,_/\__/_/\__,_/  "#.bold().magenta());
    println!();
    println!(
        "  {} {}",
        "Catia".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  A chat companion with an encrypted memory");
    println!();
}
