use clap::{Args, Subcommand};

use crate::cli::subcommands::{MaterialCommands, PpeCommands, RecoveryCommands, RequestCommands};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Material and PPE requests.
    Request {
        #[command(subcommand)]
        action: RequestCommands,
    },
    /// Admin recovery bin: soft delete, recover, purge.
    Recovery {
        #[command(subcommand)]
        action: RecoveryCommands,
    },
    /// Export active requests as rows for the XLSX / PDF renderer.
    Export(ExportArgs),
    /// Query the audit log.
    Audit(AuditArgs),
    /// PPE issuance register.
    Ppe {
        #[command(subcommand)]
        action: PpeCommands,
    },
    /// Material catalog.
    Material {
        #[command(subcommand)]
        action: MaterialCommands,
    },
}

#[derive(Clone, Debug, Args)]
pub struct ExportArgs {
    #[arg(long)]
    pub area: Option<String>,
    /// pending, in_progress, completed, declined
    #[arg(long)]
    pub status: Option<String>,
    /// Inclusive lower bound on created_at (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,
    /// Exclusive upper bound on created_at (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,
    /// One row per item instead of one per request
    #[arg(long)]
    pub explode: bool,
    /// xlsx or pdf; only affects the suggested file name
    #[arg(long, default_value = "xlsx")]
    pub file_format: String,
}

#[derive(Clone, Debug, Args)]
pub struct AuditArgs {
    /// Target request id
    #[arg(long)]
    pub request: Option<String>,
    /// submitted, accepted, declined, assigned, completed, deleted, recovered, purged, ppe_returned
    #[arg(long)]
    pub action: Option<String>,
    /// Acting user id that performed the action
    #[arg(long)]
    pub by: Option<String>,
}
