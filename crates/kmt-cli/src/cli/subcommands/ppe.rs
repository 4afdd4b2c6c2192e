use clap::Subcommand;

/// PPE register commands.
#[derive(Clone, Debug, Subcommand)]
pub enum PpeCommands {
    /// List register entries.
    List {
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        returned: Option<bool>,
    },
    /// Mark an entry returned.
    Return {
        id: String,
        /// Blob-store reference of a return photo (repeatable)
        #[arg(long)]
        photo: Vec<String>,
        #[arg(long)]
        remark: Option<String>,
    },
}
