//! Flattened export rows for the external XLSX / PDF renderer.
//!
//! `project` is a pure function of the requests it is given: same input, same
//! rows, same order. It never sees soft-deleted requests because callers feed
//! it active-list results, and it drops any that slip through.

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::MaterialRequest;
use crate::enums::{ExportFormat, RequestCategory, RequestStatus};

/// Half-open `[from, to)` window on `created_at`. Either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| at >= from) && self.to.is_none_or(|to| at < to)
    }
}

/// One exported row.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExportRow {
    pub request_id: String,
    pub area: String,
    pub requester_id: String,
    pub category: RequestCategory,
    pub status: RequestStatus,
    pub assigned_supervisor_id: Option<String>,
    pub received_by: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub detail: ExportDetail,
}

/// Item columns: a per-request summary, or one item when exploded.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "row_kind", rename_all = "snake_case")]
pub enum ExportDetail {
    Summary {
        item_count: usize,
        total_qty: u64,
        items: String,
    },
    Item {
        line_no: usize,
        material_name: String,
        size: String,
        qty: u32,
        new_photo_ref: Option<String>,
        return_photo_ref: Option<String>,
    },
}

/// Project requests into export rows.
///
/// Rows keep the input order; with `explode_items` each request yields one
/// row per item (line numbers start at 1).
#[must_use]
pub fn project(
    requests: &[MaterialRequest],
    range: &DateRange,
    explode_items: bool,
) -> Vec<ExportRow> {
    let mut rows = Vec::new();
    for request in requests
        .iter()
        .filter(|r| !r.is_deleted() && range.contains(r.created_at))
    {
        if explode_items {
            for (idx, item) in request.items.iter().enumerate() {
                rows.push(base_row(
                    request,
                    ExportDetail::Item {
                        line_no: idx + 1,
                        material_name: item.material_name.clone(),
                        size: item.size.clone(),
                        qty: item.qty,
                        new_photo_ref: item.new_photo_ref.clone(),
                        return_photo_ref: item.return_photo_ref.clone(),
                    },
                ));
            }
        } else {
            let items = request
                .items
                .iter()
                .map(crate::entities::RequestItem::summary)
                .collect::<Vec<_>>()
                .join("; ");
            rows.push(base_row(
                request,
                ExportDetail::Summary {
                    item_count: request.items.len(),
                    total_qty: request.total_qty(),
                    items,
                },
            ));
        }
    }
    rows
}

fn base_row(request: &MaterialRequest, detail: ExportDetail) -> ExportRow {
    ExportRow {
        request_id: request.id.clone(),
        area: request.area.clone(),
        requester_id: request.requester_id.clone(),
        category: request.category,
        status: request.status,
        assigned_supervisor_id: request.assigned_supervisor_id.clone(),
        received_by: request.received_by.clone(),
        completed_at: request.completed_at,
        created_at: request.created_at,
        detail,
    }
}

/// Download name for a rendered export, e.g. `KMT_requests_Rustaq_2025-11-15.xlsx`.
///
/// Without an area the name uses `all`. Whitespace in the area becomes `-`.
#[must_use]
pub fn export_file_name(
    prefix: &str,
    area: Option<&str>,
    date: NaiveDate,
    format: ExportFormat,
) -> String {
    let area = area
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map_or_else(|| "all".to_string(), |a| a.split_whitespace().collect::<Vec<_>>().join("-"));
    format!(
        "{prefix}_{area}_{}.{}",
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::entities::RequestItem;

    fn request(id: &str, created_at: DateTime<Utc>, items: Vec<RequestItem>) -> MaterialRequest {
        MaterialRequest {
            id: id.into(),
            requester_id: "usr-staff".into(),
            area: "Rustaq".into(),
            category: RequestCategory::Material,
            items,
            status: RequestStatus::Pending,
            assigned_supervisor_id: None,
            decline_reason: None,
            received_by: None,
            completed_at: None,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 15, 8, 0, 0).unwrap()
    }

    #[test]
    fn summary_row_per_request() {
        let mut gloves = RequestItem::named("Gloves", 2);
        gloves.size = "L".into();
        let reqs = vec![request(
            "req-1",
            t0(),
            vec![RequestItem::named("Ring spanner 10", 1), gloves],
        )];
        let rows = project(&reqs, &DateRange::default(), false);
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].detail,
            ExportDetail::Summary {
                item_count: 2,
                total_qty: 3,
                items: "Ring spanner 10 x1; Gloves (L) x2".into(),
            }
        );
    }

    #[test]
    fn explode_yields_row_per_item() {
        let reqs = vec![
            request(
                "req-2",
                t0(),
                vec![RequestItem::named("A", 1), RequestItem::named("B", 4)],
            ),
            request("req-1", t0(), vec![RequestItem::named("C", 1)]),
        ];
        let rows = project(&reqs, &DateRange::default(), true);
        let keys: Vec<(String, usize)> = rows
            .iter()
            .map(|r| match &r.detail {
                ExportDetail::Item { line_no, .. } => (r.request_id.clone(), *line_no),
                ExportDetail::Summary { .. } => panic!("expected item rows"),
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                ("req-2".to_string(), 1),
                ("req-2".to_string(), 2),
                ("req-1".to_string(), 1)
            ]
        );
    }

    #[test]
    fn date_range_is_half_open() {
        let reqs = vec![
            request("req-early", t0(), vec![RequestItem::named("A", 1)]),
            request("req-late", t0() + Duration::days(1), vec![RequestItem::named("B", 1)]),
        ];
        let range = DateRange {
            from: Some(t0()),
            to: Some(t0() + Duration::days(1)),
        };
        let rows = project(&reqs, &range, false);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].request_id, "req-early");
    }

    #[test]
    fn deleted_requests_never_exported() {
        let mut deleted = request("req-del", t0(), vec![RequestItem::named("A", 1)]);
        deleted.deleted_at = Some(t0());
        assert!(project(&[deleted], &DateRange::default(), true).is_empty());
    }

    #[test]
    fn projection_is_deterministic() {
        let reqs = vec![request("req-1", t0(), vec![RequestItem::named("A", 1)])];
        assert_eq!(
            project(&reqs, &DateRange::default(), false),
            project(&reqs, &DateRange::default(), false)
        );
    }

    #[test]
    fn file_name_matches_renderer_convention() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 15).unwrap();
        assert_eq!(
            export_file_name("KMT_requests", Some("Rustaq"), date, ExportFormat::Xlsx),
            "KMT_requests_Rustaq_2025-11-15.xlsx"
        );
        assert_eq!(
            export_file_name("KMT_requests", None, date, ExportFormat::Pdf),
            "KMT_requests_all_2025-11-15.pdf"
        );
        assert_eq!(
            export_file_name("KMT_requests", Some("Wadi Bani"), date, ExportFormat::Pdf),
            "KMT_requests_Wadi-Bani_2025-11-15.pdf"
        );
    }

    #[test]
    fn row_serializes_flat() {
        let reqs = vec![request("req-1", t0(), vec![RequestItem::named("A", 1)])];
        let value = serde_json::to_value(&project(&reqs, &DateRange::default(), false)[0]).unwrap();
        assert_eq!(value["row_kind"], "summary");
        assert_eq!(value["total_qty"], 1);
        assert_eq!(value["request_id"], "req-1");
    }
}
