use clap::Subcommand;

/// Material catalog commands.
#[derive(Clone, Debug, Subcommand)]
pub enum MaterialCommands {
    /// Add a catalog material.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        sku: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        unit: Option<String>,
    },
    /// List catalog materials.
    List,
}
