// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::telemetry::setup_simple_tracing;
use crate::{health, status, verify};
use anyhow::Result;
use clap::{command, ArgAction, Parser, Subcommand};
use sigil_config::load_config::resolve_config_path;
use sigil_config::validation::ValidUrl;
use sigil_config::AppConfig;
use std::env;
use std::path::PathBuf;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "sigil")]
#[command(about = "Prove a private attribute on chain and track the decryption request to completion", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `sigil -vvv` will give you
    /// trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,

    /// Override the configured gateway URL
    #[arg(long, global = true)]
    pub gateway: Option<ValidUrl>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit an encrypted age attestation and drive it to a verdict
    Verify {
        /// The age to attest to (encrypted client-side, never sent raw)
        #[arg(long)]
        age: u8,
    },
    /// Show the subject's verification flag and current request status
    Status {
        /// Subject address, e.g. 0x92b6...a316
        #[arg(long)]
        subject: String,
    },
    /// Probe the decryption gateway's health endpoint
    Health,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    pub async fn execute(self) -> Result<()> {
        setup_simple_tracing(self.log_level());

        let cwd = env::current_dir()?;
        let config_path = resolve_config_path(&cwd, self.config.clone().map(PathBuf::from));
        let mut config = AppConfig::load(config_path.as_deref())?;
        info!("Config loaded from: {:?}", config_path);

        if let Some(gateway) = self.gateway {
            config.gateway_url = gateway.into();
        }

        match self.command {
            Commands::Verify { age } => verify::execute(&config, age).await,
            Commands::Status { subject } => status::execute(&config, &subject).await,
            Commands::Health => health::execute(&config).await,
        }
    }
}
