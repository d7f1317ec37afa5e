use actix_web::HttpResponse;

use crate::{github::PushEvent, http::Webhook};

/// Forward stage of the bundled server: the delivery is already authentic
/// and interesting by the time this runs, so it is only logged.
pub async fn push_hook(hook: Webhook<PushEvent>) -> HttpResponse {
    let Webhook { delivery, payload } = hook;
    let head = payload.relevant_commit();

    tracing::info!(
        event = delivery.event.as_str(),
        delivery = delivery.id.as_deref().unwrap_or("-"),
        "Accepted {} for {} (head {}, pushed by {})",
        delivery.event,
        payload.reference.as_deref().unwrap_or("<no ref>"),
        head.map_or("<none>", |c| c.id.as_str()),
        payload
            .pusher
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .unwrap_or("<unknown>"),
    );

    HttpResponse::Ok().body("OK")
}
