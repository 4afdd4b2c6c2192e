use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `kmt` binary.
#[derive(Debug, Parser)]
#[command(name = "kmt", version, about = "KMT - material and PPE request tracker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Max results to return
    #[arg(short, long, global = true)]
    pub limit: Option<u32>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Database file (defaults to database.path from config)
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Acting user id, as issued by the identity provider
    #[arg(long, global = true)]
    pub actor: Option<String>,

    /// Acting user's role: staff, supervisor, admin
    #[arg(long, global = true)]
    pub role: Option<String>,

    /// Acting user's work area
    #[arg(long, global = true)]
    pub actor_area: Option<String>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            limit: self.limit,
            quiet: self.quiet,
            verbose: self.verbose,
            db: self.db.clone(),
            actor: self.actor.clone(),
            role: self.role.clone(),
            actor_area: self.actor_area.clone(),
        }
    }
}
