use crate::db::DB;
use crate::error::{is_unique_violation, ApiError, ApiResult};
use crate::models::{NewReport, Report, ReportTarget};
use crate::pagination::PageParams;

use super::{new_key, take_count, CountRow, REPORT};

pub async fn find(reporter_id: &str, target: &ReportTarget) -> ApiResult<Option<Report>> {
    let mut resp = DB
        .query(
            "SELECT * FROM report WHERE reporter_id = $reporter \
             AND target_kind = $kind AND target_id = $target LIMIT 1",
        )
        .bind(("reporter", reporter_id.to_string()))
        .bind(("kind", target.kind().to_string()))
        .bind(("target", target.target_id().to_string()))
        .await?;
    Ok(resp.take(0)?)
}

/// One report per (reporter, target); a second attempt is a 409.
pub async fn create(new: NewReport) -> ApiResult<Report> {
    if find(&new.reporter_id, &new.target).await?.is_some() {
        return Err(ApiError::Conflict(
            "you have already reported this item".into(),
        ));
    }

    let created: Option<Report> = DB
        .create((REPORT, new_key()))
        .content(new)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("you have already reported this item".into())
            } else {
                ApiError::Database(e)
            }
        })?;

    created.ok_or_else(|| ApiError::Internal("report insert returned nothing".into()))
}

pub async fn list_by_reporter(
    reporter_id: &str,
    page: PageParams,
) -> ApiResult<(Vec<Report>, u64)> {
    let mut resp = DB
        .query(format!(
            "SELECT * FROM report WHERE reporter_id = $reporter \
             ORDER BY created_at DESC LIMIT {} START {}",
            page.limit,
            page.skip()
        ))
        .query("SELECT count() FROM report WHERE reporter_id = $reporter GROUP ALL")
        .bind(("reporter", reporter_id.to_string()))
        .await?;
    let reports: Vec<Report> = resp.take(0)?;
    let counts: Vec<CountRow> = resp.take(1)?;
    Ok((reports, take_count(counts)))
}
