use crate::cli::GlobalFlags;
use crate::cli::subcommands::MaterialCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `kmt material`.
pub async fn handle(
    action: &MaterialCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        MaterialCommands::Add {
            name,
            sku,
            category,
            unit,
        } => {
            let actor = ctx.actor()?;
            let material = ctx
                .service
                .add_material(
                    &actor,
                    name,
                    sku.as_deref(),
                    category.as_deref(),
                    unit.as_deref(),
                )
                .await?;
            output(&material, flags.format)
        }
        MaterialCommands::List => {
            let materials = ctx.service.list_materials(ctx.limit(flags)).await?;
            output(&materials, flags.format)
        }
    }
}
