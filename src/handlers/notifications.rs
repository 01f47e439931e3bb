use actix_web::{get, patch, web, HttpResponse};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::models::Notification;
use crate::pagination::{PageMeta, PageQuery};
use crate::response::ApiResponse;
use crate::store;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_notifications)
        .service(mark_all_read)
        .service(mark_read);
}

#[get("/notifications")]
async fn list_notifications(
    auth: AuthUser,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let params = query.resolve();
    let (notifications, total) =
        store::notifications::list_for_recipient(&auth.0.key(), params).await?;
    let views: Vec<_> = notifications.iter().map(Notification::view).collect();
    Ok(ApiResponse::paginated(
        "notifications",
        views,
        PageMeta::from_params(params, total),
    ))
}

#[patch("/notifications/{id}/read")]
async fn mark_read(auth: AuthUser, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let key = path.into_inner();
    let notification = store::notifications::get(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound("notification not found".into()))?;
    if notification.recipient_id != auth.0.key() {
        return Err(ApiError::Forbidden("this notification is not yours".into()));
    }

    let updated = store::notifications::mark_read(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound("notification not found".into()))?;
    Ok(ApiResponse::ok("notification read", updated.view()))
}

#[patch("/notifications/read-all")]
async fn mark_all_read(auth: AuthUser) -> ApiResult<HttpResponse> {
    store::notifications::mark_all_read(&auth.0.key()).await?;
    Ok(ApiResponse::ok("all notifications read", serde_json::json!(null)))
}
