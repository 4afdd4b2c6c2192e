use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Request { action } => commands::request::handle(&action, ctx, flags).await,
        Commands::Recovery { action } => commands::recovery::handle(&action, ctx, flags).await,
        Commands::Export(args) => commands::export::handle(&args, ctx, flags).await,
        Commands::Audit(args) => commands::audit::handle(&args, ctx, flags).await,
        Commands::Ppe { action } => commands::ppe::handle(&action, ctx, flags).await,
        Commands::Material { action } => commands::material::handle(&action, ctx, flags).await,
    }
}
