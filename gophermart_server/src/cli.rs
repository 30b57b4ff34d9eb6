use std::{env, env::VarError};

use accrual_tools::normalize_base_url;
use clap::Parser;
use log::*;

use crate::config::{ServerConfig, StorageBackend};

#[derive(Parser, Debug, Default)]
#[command(name = "gophermart", version, about = "Gophermart loyalty points server")]
pub struct Arguments {
    /// Address to listen on, as HOST:PORT. Overrides RUN_ADDRESS.
    #[arg(short = 'a', long = "address")]
    pub run_address: Option<String>,
    /// Database URI. Overrides DATABASE_URI.
    #[arg(short = 'd', long = "database")]
    pub database_uri: Option<String>,
    /// Base address of the accrual service. Overrides ACCRUAL_SYSTEM_ADDRESS.
    #[arg(short = 'r', long = "accrual")]
    pub accrual_address: Option<String>,
    /// Print the supported environment variables and their current values, then exit.
    #[arg(long = "help-env")]
    pub help_env: bool,
}

impl Arguments {
    /// Command-line flags win over the environment.
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(address) = &self.run_address {
            match ServerConfig::parse_run_address(address) {
                Some((host, port)) => {
                    config.host = host;
                    config.port = port;
                },
                None => warn!("🪛️ Ignoring invalid -a value '{address}'. Expected HOST:PORT"),
            }
        }
        if let Some(uri) = &self.database_uri {
            match StorageBackend::from_uri(uri) {
                Some(storage) => config.storage = storage,
                None => error!("🪛️ Ignoring unusable -d value. Keeping {:?}", config.storage),
            }
        }
        if let Some(address) = &self.accrual_address {
            config.accrual.base_url = normalize_base_url(address);
        }
    }
}

/// Parses the command line. Returns `None` if the process should exit straight away.
pub fn handle_command_line_args() -> Option<Arguments> {
    let args = Arguments::parse();
    if args.help_env {
        display_readme();
        display_envs();
        return None;
    }
    Some(args)
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // SIGNING_KEY is deliberately absent
    const DISPLAY_ENVS: [&str; 12] = [
        "RUST_LOG",
        "RUN_ADDRESS",
        "DATABASE_URI",
        "ACCRUAL_SYSTEM_ADDRESS",
        "TOKEN_TTL",
        "GM_ACCRUAL_WORKERS",
        "GM_SWEEP_INTERVAL",
        "GM_ACCRUAL_MAX_ATTEMPTS",
        "GM_ACCRUAL_POLL_INTERVAL_MS",
        "GM_ACCRUAL_TIMEOUT",
        "GM_DEFAULT_RETRY_AFTER",
        "GM_USE_X_FORWARDED_FOR",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
