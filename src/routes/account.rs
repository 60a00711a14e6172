// SPDX-License-Identifier: MIT

//! Account routes: activity feed, activity chart, and account deletion.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::{delete, get},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::auth::{AuthUser, SESSION_COOKIE};
use crate::models::Activity;
use crate::services::activity::ChartPoint;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/activity", get(recent_activity))
        .route("/api/activity/chart", get(activity_chart))
        .route("/api/account", delete(delete_account))
}

#[derive(Deserialize)]
pub struct ActivityParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    20
}

async fn recent_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ActivityParams>,
) -> Result<Json<Vec<Activity>>> {
    let limit = params.limit.min(100);
    Ok(Json(state.activity.recent_for_user(&user.uid, limit).await?))
}

async fn activity_chart(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ChartPoint>>> {
    Ok(Json(state.activity.chart_data(&user.uid).await?))
}

/// Delete the caller's account: their data is exported and emailed to them,
/// the login is revoked, and all their boards, memberships, assignments and
/// activity records are removed. The session cookie is cleared.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse> {
    state.lifecycle.delete_account(&user).await?;

    let jar = jar.remove(Cookie::from(SESSION_COOKIE));
    Ok((jar, Json(serde_json::json!({ "status": "account_deleted" }))))
}
