use chrono::Utc;
use kmt_core::enums::{ExportFormat, RequestStatus};
use kmt_core::export::{DateRange, ExportRow, export_file_name};
use kmt_db::repos::export::ExportFilter;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ExportArgs;
use crate::commands::shared::parse::{parse_datetime, parse_enum};
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ExportResponse {
    file_name: String,
    explode_items: bool,
    rows: Vec<ExportRow>,
}

/// Handle `kmt export`.
pub async fn handle(args: &ExportArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let actor = ctx.actor()?;
    let format = parse_enum::<ExportFormat>(&args.file_format, "file format")?;
    let date_range = DateRange {
        from: args
            .from
            .as_deref()
            .map(|value| parse_datetime(value, "from"))
            .transpose()?,
        to: args
            .to
            .as_deref()
            .map(|value| parse_datetime(value, "to"))
            .transpose()?,
    };
    let filter = ExportFilter {
        area: args.area.clone(),
        status: args
            .status
            .as_deref()
            .map(|value| parse_enum::<RequestStatus>(value, "status"))
            .transpose()?,
        date_range,
    };
    let explode_items = args.explode || ctx.config.export.explode_items;

    let rows = ctx
        .service
        .export_requests(&actor, &filter, explode_items)
        .await?;
    let file_name = export_file_name(
        &ctx.config.export.file_prefix,
        args.area.as_deref(),
        Utc::now().date_naive(),
        format,
    );

    output(
        &ExportResponse {
            file_name,
            explode_items,
            rows,
        },
        flags.format,
    )
}
