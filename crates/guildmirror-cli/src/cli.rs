//! Command-line surface: argument parsing, request gathering and exit codes.

use crate::config::ClonerConfig;
use crate::prompt::{validate_guild_id, Prompter};
use anyhow::{Context, Result};
use clap::Parser;
use guildmirror_engine::{
    CloneEngine, CloneError, CloneReport, CloneRequest, Directory, GuildId, PacingConfig,
};
use guildmirror_rest::RestDirectory;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Exit status for an interrupted run.
pub const EXIT_INTERRUPTED: u8 = 130;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "guildmirror")]
#[command(about = "Clone the roles, channels, emoji and branding of one Discord server onto another", long_about = None)]
pub struct Cli {
    /// Configuration file (.json or .toml).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Access token; overrides the configuration file.
    #[arg(short, long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Server to clone.
    #[arg(short, long, value_parser = parse_guild_id)]
    pub source: Option<GuildId>,

    /// Server to wipe and rebuild.
    #[arg(short = 'd', long, value_parser = parse_guild_id)]
    pub target: Option<GuildId>,

    /// Copy the server icon.
    #[arg(long, conflicts_with = "no_clone_icon")]
    pub clone_icon: bool,

    /// Do not copy the server icon.
    #[arg(long)]
    pub no_clone_icon: bool,

    /// Skip the confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,

    /// Emit logs as JSON.
    #[arg(long)]
    pub json: bool,
}

fn parse_guild_id(s: &str) -> std::result::Result<GuildId, String> {
    validate_guild_id(s).map_err(|e| e.to_string())
}

impl Cli {
    /// The icon flag given on the command line, if any.
    pub fn icon_flag(&self) -> Option<bool> {
        match (self.clone_icon, self.no_clone_icon) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// Load the configuration file, apply the token override and validate.
    /// A missing file falls back to defaults.
    pub fn load_config(&self) -> Result<ClonerConfig> {
        let mut config = if self.config.exists() {
            ClonerConfig::from_file(&self.config)?
        } else {
            tracing::warn!("config file not found, using defaults: {}", self.config.display());
            ClonerConfig::default()
        };
        if let Some(token) = &self.token {
            config.discord_token = token.clone();
        }
        config
            .validate()
            .with_context(|| format!("invalid configuration in {}", self.config.display()))?;
        Ok(config)
    }

    /// Fill in whatever the flags left out from the prompter. `None` when the
    /// user declines.
    pub fn gather_request<R: BufRead, W: Write>(
        &self,
        prompter: &mut Prompter<R, W>,
    ) -> Result<Option<CloneRequest>> {
        let source = match self.source {
            Some(id) => id,
            None => prompter.source_id()?,
        };
        let target = match self.target {
            Some(id) if id == source => {
                anyhow::bail!("the source and target servers cannot be the same")
            }
            Some(id) => id,
            None => prompter.target_id(source)?,
        };
        let clone_icon = match self.icon_flag() {
            Some(flag) => flag,
            None => prompter.clone_icon()?,
        };
        if !self.yes && !prompter.confirm(source, target, clone_icon)? {
            return Ok(None);
        }
        Ok(Some(CloneRequest::new(source, target).with_clone_icon(clone_icon)))
    }

    /// Load the configuration and gather the request. `None` when the user
    /// declines. Runs before any interrupt handler is installed, so Ctrl-C at
    /// a prompt ends the process directly.
    pub fn prepare(&self) -> Result<Option<PreparedRun>> {
        let config = self.load_config()?;
        let pacing = config.to_pacing()?;
        let mut prompter = Prompter::stdio();
        let Some(request) = self.gather_request(&mut prompter)? else {
            tracing::warn!("operation canceled by the user");
            return Ok(None);
        };
        Ok(Some(PreparedRun {
            config,
            pacing,
            request,
        }))
    }
}

/// A validated configuration and a confirmed request.
pub struct PreparedRun {
    config: ClonerConfig,
    pacing: PacingConfig,
    request: CloneRequest,
}

impl PreparedRun {
    /// Run the clone against the live service.
    pub async fn execute(self, cancel: CancellationToken) -> Result<CloneReport> {
        let directory = RestDirectory::new(self.config.to_rest())?;
        tracing::info!("connecting to Discord");
        let report = clone_with(directory, self.pacing, &self.request, cancel).await?;
        print_report(&report);
        Ok(report)
    }
}

/// Run one clone through any directory.
pub async fn clone_with<D: Directory>(
    directory: D,
    pacing: PacingConfig,
    request: &CloneRequest,
    cancel: CancellationToken,
) -> std::result::Result<CloneReport, CloneError> {
    CloneEngine::new(directory, pacing, cancel).run(request).await
}

fn print_report(report: &CloneReport) {
    println!("Clone of {} onto {}", report.source, report.target);
    for phase in &report.phases {
        println!("  {}", phase.summary());
        for skip in &phase.skipped {
            println!("    skipped {} ({}): {}", skip.entity, skip.step, skip.reason);
        }
        for note in &phase.notes {
            println!("    {note}");
        }
    }
    if report.admin_warning {
        println!("Warning: the session may lack administrator rights on the target.");
    }
    if report.is_degraded() {
        println!("Cloning finished with {} skipped entities.", report.total_skipped());
    } else {
        println!("Cloning finished successfully! Check your Discord server to see the results.");
    }
}

/// Process exit status for a run result.
pub fn exit_code<T>(result: &Result<T>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(err) if matches!(err.downcast_ref::<CloneError>(), Some(CloneError::Cancelled)) => {
            EXIT_INTERRUPTED
        }
        Err(_) => 1,
    }
}
