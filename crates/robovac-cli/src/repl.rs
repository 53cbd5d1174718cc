//! REPL – Read-Eval-Print Loop for the RoboVac interactive shell.
//!
//! Supported slash-commands:
//!   /help                          – show this list
//!   /vacuums                       – list configured vacuums
//!   /profile <model>               – show the capability profile of a model
//!   /interpret <model> <json>      – interpret a raw data-point snapshot
//!   /status <vacuum>               – poll a vacuum and show its state
//!   /cmd <vacuum> <command> [args] – send a command to a vacuum
//!   /quit | /exit                  – gracefully exit the CLI

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use robovac_hal::{SimVacuum, VacuumDevice, VacuumRegistry};
use robovac_kernel::{describe, exposed_attributes, interpret, resolve};
use robovac_runtime::{PollerHandle, spawn_poller};
use robovac_types::{
    CapabilityProfile, Command, DeviceModelId, DeviceSnapshot, ErrorCode, RawSnapshot,
    RawWriteSet, RoboVacError,
};
use serde_json::Value;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use crate::config::{Config, VacuumConfig};

/// Configuration-level error code for a vacuum without an IP address.
const IP_ADDRESS_NOT_SET: &str = "IP_ADDRESS";

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// Running pollers plus the vacuums that cannot be polled yet.
pub struct Session {
    runtime: Runtime,
    pollers: Vec<PollerHandle>,
    unavailable: Vec<VacuumConfig>,
}

impl Session {
    /// Start one poller per reachable vacuum in `cfg`.
    ///
    /// The encrypted local transport is not part of this build, so every
    /// vacuum is backed by a [`SimVacuum`].
    pub fn start(cfg: &Config) -> io::Result<Self> {
        let runtime = Runtime::new()?;
        let (reachable, unavailable): (Vec<_>, Vec<_>) =
            cfg.vacuums.iter().cloned().partition(VacuumConfig::is_reachable);

        let mut registry = VacuumRegistry::new();
        for vac in &reachable {
            let transport = SimVacuum::docked(vac.id.clone());
            registry.register(VacuumDevice::new(
                vac.name.clone(),
                vac.model.as_str(),
                Box::new(transport),
            ));
        }

        info!(vacuums = registry.len(), unavailable = unavailable.len(), "starting pollers");
        let poller_config = cfg.poller_config();
        let pollers = {
            let _guard = runtime.enter();
            registry
                .into_devices()
                .map(|device| spawn_poller(device, poller_config))
                .collect()
        };

        Ok(Self {
            runtime,
            pollers,
            unavailable,
        })
    }

    /// Find a running poller by id or display name (case-insensitive).
    fn poller(&self, key: &str) -> Result<&PollerHandle, RoboVacError> {
        self.pollers
            .iter()
            .find(|p| p.id() == key || p.name().eq_ignore_ascii_case(key))
            .ok_or_else(|| RoboVacError::UnknownDevice(key.to_string()))
    }

    fn unavailable(&self, key: &str) -> Option<&VacuumConfig> {
        self.unavailable
            .iter()
            .find(|v| v.id == key || v.name.eq_ignore_ascii_case(key))
    }

    /// Stop every poller.
    pub fn shutdown(self) {
        let Self { runtime, pollers, .. } = self;
        runtime.block_on(async {
            for poller in pollers {
                poller.shutdown().await;
            }
        });
    }
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
pub fn run(shutdown: Arc<AtomicBool>, cfg: &Config) {
    let session = match Session::start(cfg) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: {}", "Failed to start the async runtime".red(), e);
            return;
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "robovac>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let (cmd, args) = split_word(input);

        match cmd {
            "/help" => cmd_help(),
            "/vacuums" => cmd_vacuums(&session),
            "/profile" => cmd_profile(args),
            "/interpret" => cmd_interpret(args),
            "/status" => cmd_status(&session, args),
            "/cmd" => cmd_command(&session, args),
            "/quit" | "/exit" => {
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            other => {
                println!(
                    "{} '{}'. Type {} for available commands.",
                    "Unknown command:".red(),
                    other.yellow(),
                    "/help".bold()
                );
            }
        }
    }

    session.shutdown();
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "RoboVac Commands".bold().underline());
    println!("  {}                          – list configured vacuums", "/vacuums".bold().cyan());
    println!("  {}                 – capability profile of a model", "/profile <model>".bold().cyan());
    println!("  {}      – interpret a raw data-point snapshot", "/interpret <model> <json>".bold().cyan());
    println!("  {}                 – poll a vacuum now", "/status <vacuum>".bold().cyan());
    println!("  {} – send a command", "/cmd <vacuum> <command> [args]".bold().cyan());
    println!("  {}                     – exit the CLI", "/quit  /exit".bold().cyan());
    println!();
    println!("  Commands: {}", "start pause stop locate home spot".yellow());
    println!("            {}", "fan <label>".yellow());
    println!("            {}", "send <name> [json]".yellow());
    println!();
}

fn cmd_vacuums(session: &Session) {
    println!("{}", "Vacuums".bold().underline());
    if session.pollers.is_empty() && session.unavailable.is_empty() {
        println!("  {}", "No vacuums configured.".dimmed());
        return;
    }
    for poller in &session.pollers {
        let family = poller
            .profile()
            .family
            .map_or_else(|| "unknown family".to_string(), |f| f.to_string());
        let state = poller
            .latest()
            .map_or_else(|| "not polled yet".dimmed().to_string(), |s| s.lifecycle.to_string().green().to_string());
        println!(
            "  {} {} ({}) – {}",
            "●".green(),
            poller.name().bold(),
            family,
            state
        );
    }
    for vac in &session.unavailable {
        println!(
            "  {} {} – {}",
            "●".red(),
            vac.name.bold(),
            ip_address_missing().red()
        );
    }
}

fn cmd_profile(args: &str) {
    let model = args.trim();
    if model.is_empty() {
        println!("{} /profile <model>", "Usage:".yellow());
        return;
    }
    let model = DeviceModelId::new(model);
    print_profile(&model, &resolve(&model));
}

fn cmd_interpret(args: &str) {
    let (model, json) = split_word(args);
    if model.is_empty() || json.is_empty() {
        println!("{} /interpret <model> <json>", "Usage:".yellow());
        return;
    }
    let raw: RawSnapshot = match serde_json::from_str(json) {
        Ok(r) => r,
        Err(e) => {
            println!("{}: {}", "Invalid data-point JSON".red(), e);
            return;
        }
    };
    let profile = resolve(&model.into());
    print_snapshot(&interpret(&raw, &profile), &profile);
}

fn cmd_status(session: &Session, args: &str) {
    let key = args.trim();
    if let Some(vac) = session.unavailable(key) {
        println!("  {} – {}", vac.name.bold(), ip_address_missing().red());
        return;
    }
    let poller = match session.poller(key) {
        Ok(p) => p,
        Err(e) => {
            println!("{}", e.to_string().red());
            return;
        }
    };
    match session.runtime.block_on(poller.refresh()) {
        Ok(snapshot) => print_snapshot(&snapshot, poller.profile()),
        Err(e) => {
            println!("{}: {}", "Poll failed".red(), e);
            if let Some(last) = poller.latest() {
                println!("  {}", "Last known state:".dimmed());
                print_snapshot(&last, poller.profile());
            }
        }
    }
}

fn cmd_command(session: &Session, args: &str) {
    let (key, rest) = split_word(args);
    if key.is_empty() || rest.is_empty() {
        println!("{} /cmd <vacuum> <command> [args]", "Usage:".yellow());
        return;
    }
    if let Some(vac) = session.unavailable(key) {
        println!("  {} – {}", vac.name.bold(), ip_address_missing().red());
        return;
    }
    let poller = match session.poller(key) {
        Ok(p) => p,
        Err(e) => {
            println!("{}", e.to_string().red());
            return;
        }
    };
    let command = match parse_command(rest) {
        Ok(c) => c,
        Err(e) => {
            println!("{}: {}", "Invalid command".red(), e);
            return;
        }
    };
    match session.runtime.block_on(poller.send(command)) {
        Ok(writes) => {
            println!("{} {}", "✓ Sent".green(), format_writes(&writes));
            if let Some(snapshot) = poller.latest() {
                println!("  Now {}", snapshot.lifecycle.to_string().bold());
            }
        }
        Err(e) => {
            warn!(vacuum = %poller.id(), error = %e, "command rejected");
            println!("{}: {}", "Command failed".red(), e);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Split off the first whitespace-delimited word.
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

/// Parse a REPL command line (`fan Boost IQ`, `send roomClean {"roomIds":[2]}`)
/// into a [`Command`].
pub(crate) fn parse_command(input: &str) -> Result<Command, String> {
    let (verb, rest) = split_word(input);
    let no_args = |cmd: Command| {
        if rest.is_empty() {
            Ok(cmd)
        } else {
            Err(format!("'{verb}' takes no arguments"))
        }
    };
    match verb.to_ascii_lowercase().as_str() {
        "start" => no_args(Command::Start),
        "pause" => no_args(Command::Pause),
        "stop" => no_args(Command::Stop),
        "locate" => no_args(Command::Locate),
        "home" => no_args(Command::ReturnToBase),
        "spot" => no_args(Command::CleanSpot),
        "fan" if rest.is_empty() => Err("usage: fan <label>".to_string()),
        "fan" => Ok(Command::SetFanSpeed(rest.to_string())),
        "send" => {
            let (name, params) = split_word(rest);
            if name.is_empty() {
                return Err("usage: send <name> [json]".to_string());
            }
            let params = if params.is_empty() {
                Value::Null
            } else {
                serde_json::from_str(params).map_err(|e| format!("invalid params JSON: {e}"))?
            };
            Ok(Command::send(name, params))
        }
        "" => Err("missing command".to_string()),
        other => Err(format!("unknown command '{other}'")),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn ip_address_missing() -> String {
    describe(&ErrorCode::Named(IP_ADDRESS_NOT_SET.to_string()))
}

fn format_writes(writes: &RawWriteSet) -> String {
    writes
        .iter()
        .map(|w| format!("{}={}", w.code, w.value))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_profile(model: &DeviceModelId, profile: &CapabilityProfile) {
    println!("{} {}", "Model".bold().underline(), model.as_str().bold());
    match profile.family {
        Some(family) => println!("  Family        : {}", family.to_string().yellow()),
        None => println!("  Family        : {}", "unknown (no capabilities)".red()),
    }
    println!("  Fan speeds    : {}", profile.fan_speeds.join(", "));
    let features: Vec<String> = profile.features.iter().map(|f| format!("{f:?}")).collect();
    println!("  Features      : {}", features.join(", "));
    let surface: Vec<String> = profile.control_surface.iter().map(|f| format!("{f:?}")).collect();
    println!("  Control       : {}", surface.join(", "));
}

fn print_snapshot(snapshot: &DeviceSnapshot, profile: &CapabilityProfile) {
    println!("  State         : {}", snapshot.lifecycle.to_string().bold());
    if let Some(error) = &snapshot.error {
        println!("  Error         : {}", error.red());
    }
    let attrs = exposed_attributes(snapshot, profile);
    match serde_json::to_string_pretty(&attrs) {
        Ok(json) => {
            for line in json.lines() {
                println!("  {}", line.dimmed());
            }
        }
        Err(e) => println!("{}: {}", "Failed to render attributes".red(), e),
    }
}
