use clap::Subcommand;

/// Recovery commands. Admin only.
#[derive(Clone, Debug, Subcommand)]
pub enum RecoveryCommands {
    /// List soft-deleted requests.
    List,
    /// Soft-delete a request.
    Delete { id: String },
    /// Recover a soft-deleted request.
    Recover { id: String },
    /// Permanently remove a soft-deleted request.
    Purge { id: String },
}
