use clap::Subcommand;

/// Request commands.
#[derive(Clone, Debug, Subcommand)]
pub enum RequestCommands {
    /// Submit a request as the acting user.
    Create {
        #[arg(long)]
        area: String,
        /// Mark the request as PPE (issues register entries on completion)
        #[arg(long)]
        ppe: bool,
        /// JSON array, e.g. '[{"material_name":"Ring spanner 10","size":"","qty":1}]'
        #[arg(long)]
        items: String,
    },
    /// Get a request by ID.
    Get { id: String },
    /// List active requests visible to the acting user.
    List {
        #[arg(long)]
        area: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Accept a pending request.
    Accept { id: String },
    /// Decline a pending request.
    Decline {
        id: String,
        #[arg(long)]
        reason: String,
    },
    /// Complete an in-progress request.
    Complete {
        id: String,
        #[arg(long)]
        received_by: String,
        /// RFC 3339; defaults to now
        #[arg(long)]
        completed_at: Option<String>,
    },
    /// Send an in-progress request back to pending.
    Reassign { id: String },
    /// Hand an in-progress request to another supervisor.
    Assign {
        id: String,
        #[arg(long)]
        to: String,
    },
}
