//! Current session endpoint

use axum::Json;
use serde_json::{json, Value};

use crate::CurrentUser;

/// GET /api/me
///
/// Echoes the user id of a valid session. Clients use it to probe whether
/// their token is still accepted.
pub async fn whoami(user: CurrentUser) -> Json<Value> {
    Json(json!({ "userId": user.user_id }))
}
