//! The dialogue engine: a deterministic state machine over the persisted
//! session record. Stateless per call; everything it knows arrives as
//! arguments and everything it decides leaves in the returned record.

pub mod catalog;
pub mod codec;
pub mod datetime;
pub mod normalize;
pub mod replies;
pub mod schedule;

use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};

use crate::models::{
    Catalog, ConversationState, EngagementTopic, LastBooking, Service, SessionRecord,
    SessionStatus, Status,
};
use crate::services::gateway::{BookingGateway, BookingOutcome};

use self::normalize::normalize;

// Priority-intent vocabularies, all matched against normalized text.
// Substring lists are pruned of entries covered by a shorter entry.

/// Exact-match greetings that restart an empty conversation.
const INITIAL_GREETINGS: &[&str] = &["oi", "ola", "bom dia", "boa tarde", "boa noite"];

/// Exact-match greetings rejected where a name or a yes/no is expected.
const GREETINGS: &[&str] = &[
    "oi", "ola", "oi!", "ola!", "bom dia", "boa tarde", "boa noite", "hey", "ei", "opa", "e ai",
    "alo", "hello", "hi",
];

const HUMAN_KEYWORDS: &[&str] = &[
    "#solicitar_humano#",
    "responsavel",
    "dono",
    "dona",
    "atendente",
    "humano",
    "pessoa",
    "alguem",
    "proprietario",
    "proprietaria",
    "gerente",
];

const FAREWELL_AFTER_BOOKING: &[&str] = &[
    "nao", "obrigado", "obrigada", "valeu", "vlw", "ta bom", "beleza", "so isso", "ok",
];

const SERVICE_TOPIC_KEYWORDS: &[&str] = &["servico", "lista", "tem quais", "oferece"];

const ADDRESS_KEYWORDS: &[&str] = &["endereco", "local", "onde"];
const PHONE_KEYWORDS: &[&str] = &["telefone", "contato", "whatsapp", "ligar"];
const INSTAGRAM_KEYWORDS: &[&str] = &["insta", "social", "facebook", "fotos", "portfolio"];

const WELCOME_YES: &[&str] = &[
    "sim", "claro", "quero", "pode", "gostaria", "lista", "com certeza", "aceito",
];
const WELCOME_NO: &[&str] = &["nao", "depois"];

const ENGAGEMENT_YES: &[&str] = &["sim", "claro", "quero", "pode", "gostaria", "ok"];
const ENGAGEMENT_NO: &[&str] = &["nao", "depois"];

const CONFIRM_YES: &[&str] = &["sim", "confirmar", "ok", "pode"];
const CONFIRM_NO: &[&str] = &["nao", "cancelar"];

/// Lead-ins people put before their own name; longest first so "eu sou"
/// wins over "sou".
const NAME_LEAD_INS: &[&str] = &["meu nome e", "meu nome é", "me chamo", "eu sou", "sou"];

/// States where the customer's next message answers a question about
/// identity or consent; topic shortcuts must not hijack them.
const IDENTITY_CRITICAL: &[Status] = &[
    Status::AwaitingWelcomeResponse,
    Status::AwaitingName,
    Status::AwaitingConfirmation,
];

const UNIDENTIFIED_CLIENT: &str = "Cliente não identificado";
const HANDOFF_REASON: &str = "Solicitou falar com a dona";

/// One inbound customer message plus the previously persisted snapshot.
#[derive(Debug, Clone, Copy)]
pub struct IncomingMessage<'a> {
    pub phone: &'a str,
    pub message: &'a str,
    pub sender_name: Option<&'a str>,
    pub current_step: Option<&'a str>,
    pub session_data: Option<&'a Map<String, Value>>,
}

/// Produce the reply and the next session record for one inbound message,
/// using the studio's wall clock.
pub async fn respond(
    gateway: &dyn BookingGateway,
    catalog: &Catalog,
    incoming: IncomingMessage<'_>,
) -> (String, SessionRecord) {
    respond_at(gateway, catalog, incoming, schedule::brazil_now()).await
}

/// Same as [`respond`] with an explicit reference clock.
pub async fn respond_at(
    gateway: &dyn BookingGateway,
    catalog: &Catalog,
    incoming: IncomingMessage<'_>,
    now: DateTime<FixedOffset>,
) -> (String, SessionRecord) {
    let text = normalize(incoming.message);

    let mut session_data = incoming.session_data.cloned().unwrap_or_default();
    let mut current_step = incoming.current_step;

    tracing::info!(
        phone = %incoming.phone,
        step = current_step.unwrap_or("-"),
        "processing message"
    );

    // Expired sessions are discarded before anything else looks at them.
    if schedule::is_session_expired(&session_data, now.naive_local()) {
        session_data = Map::new();
        current_step = None;
    }

    // A bare greeting on a session with no progress restarts the
    // conversation. Greetings inside longer messages never reset.
    let no_progress = session_data.is_empty()
        || current_step.map_or(true, |s| s.is_empty() || s == Status::Start.as_str());
    if INITIAL_GREETINGS.contains(&text.as_str()) && no_progress {
        let state = ConversationState {
            status: Status::AwaitingWelcomeResponse,
            ..ConversationState::new()
        };
        return (replies::welcome(), codec::encode(&state, now));
    }

    let mut state = codec::decode(current_step, &session_data);

    // Human handoff dominates everything, including an in-progress booking.
    if HUMAN_KEYWORDS.iter().any(|k| text.contains(k)) {
        let display_name = resolve_handoff_name(&state, incoming.sender_name);
        if let Err(e) = gateway
            .request_human(incoming.phone, &display_name, HANDOFF_REASON)
            .await
        {
            tracing::error!(error = %e, phone = %incoming.phone, "failed to record handoff");
        }
        tracing::info!(phone = %incoming.phone, name = %display_name, "handoff to human");
        // The snapshot is passed through untouched so the conversation can
        // resume where it was once the robot is unmuted.
        return (
            replies::handoff_ack(),
            SessionRecord {
                current_step: state.status.as_str().to_string(),
                conversation_data: session_data,
                status: SessionStatus::WaitingHuman,
            },
        );
    }

    // Polite closing after a confirmed booking.
    if state.status == Status::Completed
        && FAREWELL_AFTER_BOOKING.iter().any(|k| text.contains(k))
    {
        state.status = Status::FarewellSent;
        let reply = match &state.last_booking {
            Some(booking) => replies::farewell_after_booking(booking),
            None => replies::farewell_plain(),
        };
        return (reply, codec::encode(&state, now));
    }

    // Speaking again after a farewell re-opens the conversation; processing
    // continues under the restored status.
    if state.status == Status::FarewellSent {
        state.status = if state.last_booking.is_some() {
            Status::Completed
        } else {
            Status::Start
        };
    }

    if SERVICE_TOPIC_KEYWORDS.iter().any(|k| text.contains(k))
        && !IDENTITY_CRITICAL.contains(&state.status)
    {
        state.status = Status::AwaitingServiceSelection;
        return (replies::services_menu(catalog), codec::encode(&state, now));
    }

    if text.contains("cancelar") || text.contains("desmarcar") {
        return cancel_flow(gateway, incoming.phone, state, now).await;
    }

    if text.contains("tchau") || text.contains("ate logo") {
        let name = state.last_booking.as_ref().map(|b| b.name.as_str());
        return (replies::goodbye(name), codec::encode(&state, now));
    }

    if ADDRESS_KEYWORDS.iter().any(|k| text.contains(k)) {
        let reply = replies::address(state.last_booking.as_ref());
        engage_after_topic(&mut state, EngagementTopic::Address);
        return (reply, codec::encode(&state, now));
    }

    if PHONE_KEYWORDS.iter().any(|k| text.contains(k)) {
        let mid_welcome = state.status == Status::AwaitingWelcomeResponse;
        let reply = replies::phone(state.last_booking.as_ref(), mid_welcome);
        engage_after_topic(&mut state, EngagementTopic::Phone);
        return (reply, codec::encode(&state, now));
    }

    if INSTAGRAM_KEYWORDS.iter().any(|k| text.contains(k)) {
        let mid_welcome = state.status == Status::AwaitingWelcomeResponse;
        let reply = replies::instagram(state.last_booking.as_ref(), mid_welcome);
        engage_after_topic(&mut state, EngagementTopic::Instagram);
        return (reply, codec::encode(&state, now));
    }

    if state.status == Status::AwaitingEngagementResponse {
        if ENGAGEMENT_YES.iter().any(|k| text.contains(k)) {
            state.status = Status::AwaitingServiceSelection;
            return (
                replies::engagement_services_menu(catalog),
                codec::encode(&state, now),
            );
        }
        if ENGAGEMENT_NO.iter().any(|k| text.contains(k)) {
            state.reset();
            return (replies::engagement_declined(), codec::encode(&state, now));
        }
        // Maybe the answer already names a service.
        return match catalog::find_service(catalog, &text) {
            Some(service) => select_service(state, service.clone(), now),
            None => (replies::engagement_reprompt(), codec::encode(&state, now)),
        };
    }

    // Naming a service out of the blue skips the menu entirely.
    if !IDENTITY_CRITICAL.contains(&state.status) {
        if let Some(service) = catalog::find_service(catalog, &text) {
            return select_service(state, service.clone(), now);
        }
    }

    match state.status {
        Status::Start => {
            state.status = Status::AwaitingWelcomeResponse;
            (replies::welcome(), codec::encode(&state, now))
        }

        Status::AwaitingWelcomeResponse => {
            if WELCOME_YES.iter().any(|k| text.contains(k)) {
                state.status = Status::AwaitingServiceSelection;
                (replies::services_menu(catalog), codec::encode(&state, now))
            } else if WELCOME_NO.iter().any(|k| text.contains(k)) {
                state.reset();
                (replies::welcome_declined(), codec::encode(&state, now))
            } else {
                (replies::welcome_reprompt(), codec::encode(&state, now))
            }
        }

        Status::AwaitingServiceSelection => match catalog::find_service(catalog, &text) {
            Some(service) => select_service(state, service.clone(), now),
            None => (replies::service_not_understood(), codec::encode(&state, now)),
        },

        Status::AwaitingDate => date_flow(gateway, state, &text, now).await,

        Status::AwaitingTime => time_flow(gateway, state, &text, now).await,

        Status::AwaitingName => name_flow(state, incoming.message, now),

        Status::AwaitingConfirmation => {
            confirmation_flow(gateway, incoming.phone, state, incoming.message, &text, now).await
        }

        // completed / waiting_human with nothing recognized above
        _ => {
            if state.last_booking.is_some() {
                (replies::fallback_with_history(), codec::encode(&state, now))
            } else {
                state.reset();
                (replies::fallback_reset(), codec::encode(&state, now))
            }
        }
    }
}

/// Exact-match check used where a greeting is a non-answer.
fn is_greeting(message: &str) -> bool {
    GREETINGS.contains(&normalize(message).as_str())
}

/// Mid-booking customers who haven't identified themselves yet must show up
/// as unidentified; a half-typed context is worse than none.
fn resolve_handoff_name(state: &ConversationState, sender_name: Option<&str>) -> String {
    if state.service.is_some() && state.name.is_none() {
        return UNIDENTIFIED_CLIENT.to_string();
    }
    sender_name
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| state.name.clone())
        .or_else(|| state.last_booking.as_ref().map(|b| b.name.clone()))
        .unwrap_or_else(|| UNIDENTIFIED_CLIENT.to_string())
}

/// After an informational answer the bot offers the menu, unless a booking
/// already exists or the welcome yes/no is still pending.
fn engage_after_topic(state: &mut ConversationState, topic: EngagementTopic) {
    if state.last_booking.is_none() && state.status != Status::AwaitingWelcomeResponse {
        state.status = Status::AwaitingEngagementResponse;
        state.engagement_context = Some(topic);
    }
}

fn select_service(
    mut state: ConversationState,
    service: Service,
    now: DateTime<FixedOffset>,
) -> (String, SessionRecord) {
    let today = now.date_naive();
    let reply = replies::date_prompt(&service.name, today, schedule::is_working_day(today));
    state.service = Some(service);
    state.status = Status::AwaitingDate;
    (reply, codec::encode(&state, now))
}

async fn cancel_flow(
    gateway: &dyn BookingGateway,
    phone: &str,
    mut state: ConversationState,
    now: DateTime<FixedOffset>,
) -> (String, SessionRecord) {
    // Confirmed booking: try to free the slots.
    if let Some(booking) = state.last_booking.clone() {
        let cancelled = match gateway.cancel(phone).await {
            Ok(ok) => ok,
            Err(e) => {
                tracing::error!(error = %e, phone = %phone, "cancellation failed");
                false
            }
        };
        state.reset();
        let reply = if cancelled {
            replies::cancellation_done(&booking)
        } else {
            replies::cancellation_needs_contact(&booking)
        };
        return (reply, codec::encode(&state, now));
    }

    // Booking still being assembled: just drop it, echoing what was there.
    if state.service.is_some() {
        let service = state.service.as_ref().map(|s| s.name.clone());
        let date = state.date;
        let time = state.time.clone();
        state.reset();
        return (
            replies::cancellation_of_draft(service.as_deref(), date, time.as_deref()),
            codec::encode(&state, now),
        );
    }

    state.reset();
    (replies::cancellation_nothing_pending(), codec::encode(&state, now))
}

async fn date_flow(
    gateway: &dyn BookingGateway,
    mut state: ConversationState,
    text: &str,
    now: DateTime<FixedOffset>,
) -> (String, SessionRecord) {
    let extracted = datetime::extract(text, now.naive_local());

    let Some(date) = extracted.date else {
        return (replies::date_not_understood(), codec::encode(&state, now));
    };

    if !schedule::is_working_day(date) {
        return (replies::closed_on(date), codec::encode(&state, now));
    }

    let open_dates = match gateway.list_open_dates().await {
        Ok(dates) => datetime::standardize_ledger_dates(&dates),
        Err(e) => {
            tracing::error!(error = %e, "open-dates lookup failed");
            return (replies::dates_lookup_failed(), codec::encode(&state, now));
        }
    };

    let date_str = date.format("%d/%m/%Y").to_string();
    if !open_dates.contains(&date_str) {
        return (replies::date_unavailable(date), codec::encode(&state, now));
    }

    state.date = Some(date);

    // Date and time in one utterance: validate the time too and skip the
    // awaiting_time step when it checks out.
    if let Some(time) = extracted.time {
        let slots = match gateway.list_open_slots(&date_str).await {
            Ok(slots) => slots,
            Err(e) => {
                tracing::error!(error = %e, date = %date_str, "slot lookup failed");
                return (replies::slots_lookup_failed(date), codec::encode(&state, now));
            }
        };

        if !slots.contains(&time) {
            return (
                replies::time_taken_on_date(date, &time, &slots),
                codec::encode(&state, now),
            );
        }

        state.time = Some(time.clone());
        state.status = Status::AwaitingName;
        return (replies::ask_name(date, &time), codec::encode(&state, now));
    }

    state.status = Status::AwaitingTime;
    (replies::ask_time(date), codec::encode(&state, now))
}

async fn time_flow(
    gateway: &dyn BookingGateway,
    mut state: ConversationState,
    text: &str,
    now: DateTime<FixedOffset>,
) -> (String, SessionRecord) {
    let Some(date) = state.date else {
        // The stored date didn't survive decoding; ask for it again.
        state.status = Status::AwaitingDate;
        return (replies::date_not_understood(), codec::encode(&state, now));
    };

    let Some(time) = datetime::extract(text, now.naive_local()).time else {
        return (replies::time_not_understood(), codec::encode(&state, now));
    };

    let date_str = date.format("%d/%m/%Y").to_string();
    let slots = match gateway.list_open_slots(&date_str).await {
        Ok(slots) => slots,
        Err(e) => {
            tracing::error!(error = %e, date = %date_str, "slot lookup failed");
            return (
                replies::slots_lookup_failed_generic(),
                codec::encode(&state, now),
            );
        }
    };

    if !slots.contains(&time) {
        return (
            replies::time_unavailable(&time, &slots),
            codec::encode(&state, now),
        );
    }

    state.time = Some(time.clone());
    state.status = Status::AwaitingName;
    (replies::ask_name(date, &time), codec::encode(&state, now))
}

fn name_flow(
    mut state: ConversationState,
    message: &str,
    now: DateTime<FixedOffset>,
) -> (String, SessionRecord) {
    if is_greeting(message) {
        return (replies::greeting_instead_of_name(), codec::encode(&state, now));
    }

    let name = strip_name_lead_in(message.trim());

    if name.split_whitespace().count() < 2 {
        return (replies::incomplete_name(), codec::encode(&state, now));
    }

    state.name = Some(title_case(name));
    state.status = Status::AwaitingConfirmation;
    (replies::booking_summary(&state), codec::encode(&state, now))
}

async fn confirmation_flow(
    gateway: &dyn BookingGateway,
    phone: &str,
    mut state: ConversationState,
    message: &str,
    text: &str,
    now: DateTime<FixedOffset>,
) -> (String, SessionRecord) {
    if is_greeting(message) {
        return (
            replies::greeting_instead_of_confirmation(&state),
            codec::encode(&state, now),
        );
    }

    if CONFIRM_YES.iter().any(|k| text.contains(k)) {
        let (Some(service), Some(date), Some(time), Some(name)) = (
            state.service.clone(),
            state.date,
            state.time.clone(),
            state.name.clone(),
        ) else {
            // The snapshot lost a piece somewhere; restart cleanly.
            state.reset();
            return (replies::fallback_reset(), codec::encode(&state, now));
        };

        let date_str = date.format("%d/%m/%Y").to_string();
        let outcome = gateway
            .book(phone, &name, &service.name, &date_str, &time)
            .await;

        return match outcome {
            Ok(BookingOutcome::Booked) => {
                state.last_booking = Some(LastBooking {
                    name: name.clone(),
                    service: service.name.clone(),
                    date: date.format("%d/%m").to_string(),
                    time: time.clone(),
                });
                state.status = Status::Completed;
                (replies::booking_confirmed(&state), codec::encode(&state, now))
            }
            Ok(BookingOutcome::Conflict) => {
                tracing::warn!(phone = %phone, date = %date_str, time = %time, "booking conflict");
                (replies::booking_slot_taken(), codec::encode(&state, now))
            }
            Ok(BookingOutcome::NotFound) => {
                tracing::warn!(phone = %phone, date = %date_str, time = %time, "no agenda rows");
                (replies::booking_failed(), codec::encode(&state, now))
            }
            Err(e) => {
                tracing::error!(error = %e, phone = %phone, "booking call failed");
                (replies::booking_failed(), codec::encode(&state, now))
            }
        };
    }

    if CONFIRM_NO.iter().any(|k| text.contains(k)) {
        state.reset();
        return (replies::confirmation_declined(), codec::encode(&state, now));
    }

    (replies::confirmation_reprompt(), codec::encode(&state, now))
}

fn strip_name_lead_in(name: &str) -> &str {
    let lowered = name.to_lowercase();
    for lead_in in NAME_LEAD_INS {
        // Only strip a whole leading phrase: "Sousa Lima" must not lose
        // its "sou". The boundary check keeps the byte offset honest for
        // inputs where lowercasing changed a character's width.
        if lowered.starts_with(lead_in)
            && lowered[lead_in.len()..].starts_with(char::is_whitespace)
            && name.is_char_boundary(lead_in.len())
        {
            return name[lead_in.len()..].trim_start();
        }
    }
    name
}

fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
