//! `robovac-cli` – RoboVac Command Line Interface
//!
//! This binary is the entry point for driving local vacuums.  It:
//!
//! 1. Initialises tracing (console, optional JSON and OTLP export).
//! 2. Checks for `~/.robovac/config.toml`; runs a **First-Run Wizard** that
//!    registers one vacuum when the file is absent.
//! 3. Starts one poller per reachable vacuum and drops the user into an
//!    **interactive REPL** (`/vacuums`, `/status`, `/cmd`, `/help`).
//! 4. Intercepts **Ctrl-C** and stops the pollers before exiting.

mod config;
mod repl;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

use robovac_kernel::resolve;
use robovac_types::DeviceModelId;

fn main() {
    // User-facing output uses println!; tracing carries the poller and
    // encoder logs.
    let _telemetry = robovac_runtime::init_tracing("robovac");

    print_banner();

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping pollers …".yellow().bold());
        println!("{}", "  Press Enter to leave the prompt.".dimmed());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    // ── First-Run Wizard ──────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(None) => run_first_run_wizard(),
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    println!(
        "  {} vacuum(s) configured, polling every {}s.",
        cfg.vacuums.len(),
        cfg.poller_config().poll_interval.as_secs()
    );
    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    // ── Interactive REPL ──────────────────────────────────────────────────
    repl::run(shutdown, &cfg);
}

// ─────────────────────────────────────────────────────────────────────────────
// First-Run Wizard
// ─────────────────────────────────────────────────────────────────────────────

fn run_first_run_wizard() -> config::Config {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║       RoboVac First-Run Wizard       ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();
    println!("  No configuration found.  Let's register a vacuum.\n");

    let mut cfg = config::Config::default();

    let id = prompt_line("  Device id (leave empty to skip): ", "");
    if !id.is_empty() {
        let name = prompt_line("  Name [RoboVac]: ", "RoboVac");
        let model = prompt_line("  Model code, e.g. T2250 [T2250]: ", "T2250");
        match resolve(&DeviceModelId::new(model.as_str())).family {
            Some(family) => println!("    → {} model", family.to_string().green()),
            None => println!(
                "    → {}",
                "unknown model: the vacuum will accept no commands".yellow()
            ),
        }
        let ip_address = prompt_line("  Local IP address (empty = set later): ", "");
        let access_token = prompt_line("  Local key: ", "");
        cfg.vacuums.push(config::VacuumConfig {
            id,
            name,
            model,
            description: String::new(),
            mac: String::new(),
            ip_address,
            access_token,
        });
    }

    match config::save(&cfg) {
        Ok(()) => println!(
            "\n  {} Config saved to {}\n",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"    ____        __          _   __"#.bold().cyan());
    println!("{}", r#"   / __ \____  / /_  ____  | | / /___ ______"#.bold().cyan());
    println!("{}", r#"  / /_/ / __ \/ __ \/ __ \ | |/ / __ `/ ___/"#.bold().cyan());
    println!("{}", r#" / _, _/ /_/ / /_/ / /_/ / |___/ /_/ / /__"#.bold().cyan());
    println!("{}", r#"/_/ |_|\____/_.___/\____/  |___/\__,_/\___/"#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "RoboVac".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Local vacuum control");
    println!();
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn prompt_line(msg: &str, default: &str) -> String {
    use std::io::{BufRead, Write};
    print!("{}", msg);
    std::io::stdout().flush().ok();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let t = line.trim().to_string();
            if t.is_empty() { default.to_string() } else { t }
        }
        Err(_) => default.to_string(),
    }
}
