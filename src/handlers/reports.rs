use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{CreateReportRequest, NewReport, Report, ReportStatus, ReportTarget};
use crate::pagination::{PageMeta, PageQuery};
use crate::response::ApiResponse;
use crate::store;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_report).service(my_reports);
}

/// The reported thing must exist; reporting a ghost is a 404, not a record.
async fn verify_target(target: &ReportTarget) -> ApiResult<()> {
    let exists = match target {
        ReportTarget::Video(id) => store::videos::get(id).await?.is_some(),
        ReportTarget::Comment(id) => store::comments::get(id).await?.is_some(),
        ReportTarget::User(id) => store::users::get(id).await?.is_some(),
    };
    if exists {
        Ok(())
    } else {
        Err(ApiError::NotFound(format!(
            "{} not found",
            target.kind()
        )))
    }
}

#[post("/reports")]
async fn create_report(
    auth: AuthUser,
    body: web::Json<CreateReportRequest>,
) -> ApiResult<HttpResponse> {
    let request = body.into_inner();
    request.validate()?;

    let target = ReportTarget::parse(&request.target_kind, request.target_id)?;
    if let ReportTarget::User(id) = &target {
        if *id == auth.0.key() {
            return Err(ApiError::invalid("target_id", "you cannot report yourself"));
        }
    }
    verify_target(&target).await?;

    let report = store::reports::create(NewReport {
        reporter_id: auth.0.key(),
        target,
        reason: request.reason.trim().to_string(),
        status: ReportStatus::Open,
        created_at: Utc::now(),
    })
    .await?;

    Ok(ApiResponse::created("report filed", report.view()))
}

#[get("/reports/me")]
async fn my_reports(auth: AuthUser, query: web::Query<PageQuery>) -> ApiResult<HttpResponse> {
    let params = query.resolve();
    let (reports, total) = store::reports::list_by_reporter(&auth.0.key(), params).await?;
    let views: Vec<_> = reports.iter().map(Report::view).collect();
    Ok(ApiResponse::paginated(
        "your reports",
        views,
        PageMeta::from_params(params, total),
    ))
}
