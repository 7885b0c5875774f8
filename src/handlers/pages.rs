//! Page shell behind the route guard.
//!
//! Rendering belongs to the frontend; this handler only confirms the guard's
//! decision and echoes the identity annotation so navigation shells can
//! hydrate without a second round trip.

use axum::{extract::Request, Json};

use crate::middleware::auth::CurrentUser;

pub async fn shell(req: Request) -> Json<serde_json::Value> {
    let user = req.extensions().get::<CurrentUser>().map(|u| {
        serde_json::json!({
            "user_id": u.user_id,
            "role": u.role,
            "display_name": u.display_name,
        })
    });

    Json(serde_json::json!({
        "app": "Little Logbook",
        "path": req.uri().path(),
        "user": user,
    }))
}
