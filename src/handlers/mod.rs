pub mod chat;
pub mod health;
pub mod webhook;

use std::sync::Arc;

use crate::db::queries;
use crate::services::conversation;
use crate::state::AppState;

/// Shared path for both entry points: serialize per phone, load the
/// session, run the engine, persist the new snapshot, log both directions
/// and push the reply out. A failed send never fails the request, since the
/// session update already happened.
pub(crate) async fn handle_customer_message(
    state: &Arc<AppState>,
    phone: &str,
    sender_name: Option<&str>,
    message: &str,
) -> anyhow::Result<String> {
    let lock = state.phone_lock(phone);
    let _guard = lock.lock().await;

    let session = {
        let db = state.db.lock().unwrap();
        queries::get_session(&db, phone)?
    };

    {
        let db = state.db.lock().unwrap();
        if let Err(e) = queries::log_message(&db, phone, message, "in") {
            tracing::error!(error = %e, "failed to log inbound message");
        }
    }

    let incoming = conversation::IncomingMessage {
        phone,
        message,
        sender_name,
        current_step: session.as_ref().map(|s| s.current_step.as_str()),
        session_data: session.as_ref().map(|s| &s.conversation_data),
    };

    let (reply, record) =
        conversation::respond(state.gateway.as_ref(), &state.catalog, incoming).await;

    {
        let db = state.db.lock().unwrap();
        queries::save_session(&db, phone, &record)?;
        if let Err(e) = queries::log_message(&db, phone, &reply, "out") {
            tracing::error!(error = %e, "failed to log outbound message");
        }
    }

    if let Err(e) = state.messaging.send_message(phone, &reply).await {
        tracing::error!(error = %e, phone = %phone, "failed to send reply");
    }

    Ok(reply)
}
