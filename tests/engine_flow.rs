use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone};
use serde_json::{json, Map, Value};

use agendabot::models::{Catalog, SessionRecord, SessionStatus};
use agendabot::services::conversation::{respond_at, IncomingMessage};
use agendabot::services::gateway::{BookingGateway, BookingOutcome};

const PHONE: &str = "5511999660000";

// ── Mock gateway ──

#[derive(Default)]
struct MockGateway {
    open_dates: Vec<String>,
    open_slots: HashMap<String, Vec<String>>,
    book_outcome: Option<BookingOutcome>,
    cancel_result: bool,
    fail_dates: bool,
    bookings: Mutex<Vec<(String, String, String, String, String)>>,
    cancellations: Mutex<Vec<String>>,
    handoffs: Mutex<Vec<(String, String, String)>>,
}

impl MockGateway {
    fn with_availability(dates: &[&str], slots: &[(&str, &[&str])]) -> Self {
        Self {
            open_dates: dates.iter().map(|s| s.to_string()).collect(),
            open_slots: slots
                .iter()
                .map(|(date, times)| {
                    (
                        date.to_string(),
                        times.iter().map(|t| t.to_string()).collect(),
                    )
                })
                .collect(),
            book_outcome: Some(BookingOutcome::Booked),
            ..Self::default()
        }
    }
}

#[async_trait]
impl BookingGateway for MockGateway {
    async fn list_open_dates(&self) -> anyhow::Result<Vec<String>> {
        if self.fail_dates {
            anyhow::bail!("ledger unreachable");
        }
        Ok(self.open_dates.clone())
    }

    async fn list_open_slots(&self, date: &str) -> anyhow::Result<Vec<String>> {
        Ok(self.open_slots.get(date).cloned().unwrap_or_default())
    }

    async fn book(
        &self,
        phone: &str,
        name: &str,
        service: &str,
        date: &str,
        time: &str,
    ) -> anyhow::Result<BookingOutcome> {
        self.bookings.lock().unwrap().push((
            phone.to_string(),
            name.to_string(),
            service.to_string(),
            date.to_string(),
            time.to_string(),
        ));
        Ok(self.book_outcome.unwrap_or(BookingOutcome::Booked))
    }

    async fn cancel(&self, phone: &str) -> anyhow::Result<bool> {
        self.cancellations.lock().unwrap().push(phone.to_string());
        Ok(self.cancel_result)
    }

    async fn request_human(&self, phone: &str, name: &str, reason: &str) -> anyhow::Result<()> {
        self.handoffs.lock().unwrap().push((
            phone.to_string(),
            name.to_string(),
            reason.to_string(),
        ));
        Ok(())
    }

    async fn is_muted(&self, _phone: &str) -> anyhow::Result<bool> {
        Ok(false)
    }
}

// ── Helpers ──

fn catalog() -> Catalog {
    Catalog::from_json(include_str!("../data/price_list.json")).unwrap()
}

/// Tuesday, 2025-06-17 10:00 in Brazil.
fn tuesday_morning() -> DateTime<FixedOffset> {
    FixedOffset::west_opt(3 * 3600)
        .unwrap()
        .with_ymd_and_hms(2025, 6, 17, 10, 0, 0)
        .unwrap()
}

async fn send(
    gateway: &MockGateway,
    session: Option<&SessionRecord>,
    message: &str,
) -> (String, SessionRecord) {
    send_named(gateway, session, message, None).await
}

async fn send_named(
    gateway: &MockGateway,
    session: Option<&SessionRecord>,
    message: &str,
    sender_name: Option<&str>,
) -> (String, SessionRecord) {
    let catalog = catalog();
    let incoming = IncomingMessage {
        phone: PHONE,
        message,
        sender_name,
        current_step: session.map(|s| s.current_step.as_str()),
        session_data: session.map(|s| &s.conversation_data),
    };
    respond_at(gateway, &catalog, incoming, tuesday_morning()).await
}

fn session(step: &str, data: Value) -> SessionRecord {
    let mut map: Map<String, Value> = serde_json::from_value(data).unwrap();
    map.entry("last_activity")
        .or_insert_with(|| json!("2025-06-17T09:55:00-03:00"));
    SessionRecord {
        current_step: step.to_string(),
        conversation_data: map,
        status: SessionStatus::Active,
    }
}

fn confirmation_session() -> SessionRecord {
    session(
        "awaiting_confirmation",
        json!({
            "service": {"name": "Sobrancelha", "category": "Cílios & Sobrancelhas", "price": 35.0, "duration_minutes": 30},
            "date": "2025-06-20",
            "time": "15:00",
            "name": "Maria Silva",
        }),
    )
}

// ── Scenarios ──

#[tokio::test]
async fn greeting_without_session_starts_welcome() {
    let gateway = MockGateway::default();
    let (reply, record) = send(&gateway, None, "oi").await;

    assert!(reply.contains("Studio Olhar Sob Medida"));
    assert!(reply.contains("conhecer nossos serviços"));
    assert_eq!(record.current_step, "awaiting_welcome_response");
    assert_eq!(record.status, SessionStatus::Active);
}

#[tokio::test]
async fn greeting_mid_flow_does_not_reset() {
    let gateway = MockGateway::default();
    let prior = session(
        "awaiting_name",
        json!({
            "service": {"name": "Buço", "category": "Depilação", "price": 15.0, "duration_minutes": 30},
            "date": "2025-06-20",
            "time": "15:00",
        }),
    );
    let (reply, record) = send(&gateway, Some(&prior), "oi").await;

    // rejected as a non-answer, progress intact
    assert!(reply.contains("saudação"));
    assert_eq!(record.current_step, "awaiting_name");
    assert_eq!(record.conversation_data["date"], "2025-06-20");
}

#[tokio::test]
async fn welcome_yes_shows_menu() {
    let gateway = MockGateway::default();
    let prior = session("awaiting_welcome_response", json!({}));
    let (reply, record) = send(&gateway, Some(&prior), "sim").await;

    assert!(reply.contains("Confira nossos serviços"));
    assert!(reply.contains("1. Buço"));
    assert_eq!(record.current_step, "awaiting_service_selection");
}

#[tokio::test]
async fn ordinal_selects_first_service() {
    let gateway = MockGateway::default();
    let prior = session("awaiting_service_selection", json!({}));
    let (reply, record) = send(&gateway, Some(&prior), "1").await;

    assert!(reply.contains("*Buço*"));
    assert_eq!(record.current_step, "awaiting_date");
    assert_eq!(record.conversation_data["service"]["name"], "Buço");
}

#[tokio::test]
async fn unknown_service_reprompts() {
    let gateway = MockGateway::default();
    let prior = session("awaiting_service_selection", json!({}));
    let (reply, record) = send(&gateway, Some(&prior), "corte de cabelo").await;

    assert!(reply.contains("Não entendi qual serviço"));
    assert_eq!(record.current_step, "awaiting_service_selection");
}

#[tokio::test]
async fn naming_service_unprompted_skips_menu() {
    let gateway = MockGateway::default();
    let (reply, record) = send(&gateway, None, "quero agendar sobrancelha").await;

    assert!(reply.contains("*Sobrancelha*"));
    assert_eq!(record.current_step, "awaiting_date");
}

#[tokio::test]
async fn date_and_time_together_skip_awaiting_time() {
    let gateway = MockGateway::with_availability(
        &["20/06/2025"],
        &[("20/06/2025", &["14:00", "15:00"])],
    );
    let prior = session(
        "awaiting_date",
        json!({
            "service": {"name": "Sobrancelha", "category": "Cílios & Sobrancelhas", "price": 35.0, "duration_minutes": 30},
        }),
    );
    let (reply, record) = send(&gateway, Some(&prior), "dia 20 as 15h").await;

    assert!(reply.contains("nome completo"));
    assert_eq!(record.current_step, "awaiting_name");
    assert_eq!(record.conversation_data["date"], "2025-06-20");
    assert_eq!(record.conversation_data["time"], "15:00");
}

#[tokio::test]
async fn taken_time_keeps_date_and_lists_alternatives() {
    let gateway =
        MockGateway::with_availability(&["20/06/2025"], &[("20/06/2025", &["09:00", "09:30"])]);
    let prior = session(
        "awaiting_date",
        json!({
            "service": {"name": "Buço", "category": "Depilação", "price": 15.0, "duration_minutes": 30},
        }),
    );
    let (reply, record) = send(&gateway, Some(&prior), "dia 20 as 15h").await;

    assert!(reply.contains("já está ocupado"));
    assert!(reply.contains("09:00, 09:30"));
    assert_eq!(record.current_step, "awaiting_date");
    assert_eq!(record.conversation_data["date"], "2025-06-20");
}

#[tokio::test]
async fn non_working_day_suggests_next_working_day() {
    let gateway = MockGateway::with_availability(&["22/06/2025"], &[]);
    let prior = session(
        "awaiting_date",
        json!({
            "service": {"name": "Buço", "category": "Depilação", "price": 15.0, "duration_minutes": 30},
        }),
    );
    // 22/06/2025 is a Sunday; next working day is Tuesday 24/06
    let (reply, record) = send(&gateway, Some(&prior), "dia 22").await;

    assert!(reply.contains("Domingo"));
    assert!(reply.contains("fechado"));
    assert!(reply.contains("24/06"));
    assert_eq!(record.current_step, "awaiting_date");
}

#[tokio::test]
async fn date_not_in_open_set_is_rejected() {
    let gateway = MockGateway::with_availability(&["27/06/2025"], &[]);
    let prior = session(
        "awaiting_date",
        json!({
            "service": {"name": "Buço", "category": "Depilação", "price": 15.0, "duration_minutes": 30},
        }),
    );
    let (reply, record) = send(&gateway, Some(&prior), "dia 20").await;

    assert!(reply.contains("não está disponível"));
    assert_eq!(record.current_step, "awaiting_date");
}

#[tokio::test]
async fn open_dates_in_iso_format_still_match() {
    let gateway = MockGateway::with_availability(
        &["2025-06-20"],
        &[("20/06/2025", &["15:00"])],
    );
    let prior = session(
        "awaiting_date",
        json!({
            "service": {"name": "Buço", "category": "Depilação", "price": 15.0, "duration_minutes": 30},
        }),
    );
    let (_, record) = send(&gateway, Some(&prior), "dia 20").await;
    assert_eq!(record.current_step, "awaiting_time");
}

#[tokio::test]
async fn ledger_failure_becomes_apology() {
    let gateway = MockGateway {
        fail_dates: true,
        ..MockGateway::default()
    };
    let prior = session(
        "awaiting_date",
        json!({
            "service": {"name": "Buço", "category": "Depilação", "price": 15.0, "duration_minutes": 30},
        }),
    );
    let (reply, record) = send(&gateway, Some(&prior), "dia 20").await;

    assert!(reply.contains("problema ao consultar a agenda"));
    assert_eq!(record.current_step, "awaiting_date");
}

#[tokio::test]
async fn time_flow_validates_against_open_slots() {
    let gateway =
        MockGateway::with_availability(&["20/06/2025"], &[("20/06/2025", &["14:00", "15:00"])]);
    let prior = session(
        "awaiting_time",
        json!({
            "service": {"name": "Buço", "category": "Depilação", "price": 15.0, "duration_minutes": 30},
            "date": "2025-06-20",
        }),
    );

    let (reply, record) = send(&gateway, Some(&prior), "16h").await;
    assert!(reply.contains("não está disponível"));
    assert_eq!(record.current_step, "awaiting_time");

    let (reply, record) = send(&gateway, Some(&prior), "15h").await;
    assert!(reply.contains("nome completo"));
    assert_eq!(record.current_step, "awaiting_name");
    assert_eq!(record.conversation_data["time"], "15:00");
}

#[tokio::test]
async fn name_requires_two_tokens_and_is_title_cased() {
    let gateway = MockGateway::default();
    let prior = session(
        "awaiting_name",
        json!({
            "service": {"name": "Buço", "category": "Depilação", "price": 15.0, "duration_minutes": 30},
            "date": "2025-06-20",
            "time": "15:00",
        }),
    );

    let (reply, record) = send(&gateway, Some(&prior), "Maria").await;
    assert!(reply.contains("nome completo"));
    assert_eq!(record.current_step, "awaiting_name");

    let (reply, record) = send(&gateway, Some(&prior), "meu nome é maria silva").await;
    assert!(reply.contains("*Maria Silva*"));
    assert!(reply.contains("Resumo do agendamento"));
    assert_eq!(record.current_step, "awaiting_confirmation");
    assert_eq!(record.conversation_data["name"], "Maria Silva");
}

#[tokio::test]
async fn confirmation_books_once_and_completes() {
    let gateway = MockGateway {
        book_outcome: Some(BookingOutcome::Booked),
        ..MockGateway::default()
    };
    let prior = confirmation_session();
    let (reply, record) = send(&gateway, Some(&prior), "sim").await;

    let bookings = gateway.bookings.lock().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(
        bookings[0],
        (
            PHONE.to_string(),
            "Maria Silva".to_string(),
            "Sobrancelha".to_string(),
            "20/06/2025".to_string(),
            "15:00".to_string(),
        )
    );

    assert!(reply.contains("confirmado com sucesso"));
    assert_eq!(record.current_step, "completed");
    assert_eq!(record.status, SessionStatus::Completed);
    assert_eq!(record.conversation_data["last_booking"]["date"], "20/06");
    assert_eq!(record.conversation_data["last_booking"]["name"], "Maria Silva");
}

#[tokio::test]
async fn booking_conflict_surfaces_failure_and_keeps_state() {
    let gateway = MockGateway {
        book_outcome: Some(BookingOutcome::Conflict),
        ..MockGateway::default()
    };
    let prior = confirmation_session();
    let (reply, record) = send(&gateway, Some(&prior), "sim").await;

    assert!(reply.contains("ocupado"));
    assert_eq!(record.current_step, "awaiting_confirmation");
    assert_eq!(record.status, SessionStatus::Active);
    assert!(!record.conversation_data.contains_key("last_booking"));
}

#[tokio::test]
async fn confirmation_no_resets() {
    let gateway = MockGateway::default();
    let prior = confirmation_session();
    let (reply, record) = send(&gateway, Some(&prior), "não").await;

    assert!(reply.contains("Quando quiser agendar"));
    assert_eq!(record.current_step, "start");
    assert!(gateway.bookings.lock().unwrap().is_empty());
}

#[tokio::test]
async fn handoff_mid_booking_uses_fallback_label() {
    let gateway = MockGateway::default();
    let prior = session(
        "awaiting_date",
        json!({
            "service": {"name": "Buço", "category": "Depilação", "price": 15.0, "duration_minutes": 30},
        }),
    );
    let (reply, record) = send_named(&gateway, Some(&prior), "quero falar com a dona", Some("Maria")).await;

    assert!(reply.contains("atendimento humano"));
    assert_eq!(record.status, SessionStatus::WaitingHuman);
    assert_eq!(record.current_step, "awaiting_date");

    let handoffs = gateway.handoffs.lock().unwrap();
    assert_eq!(handoffs.len(), 1);
    assert_eq!(handoffs[0].1, "Cliente não identificado");
}

#[tokio::test]
async fn handoff_uses_sender_name_outside_booking() {
    let gateway = MockGateway::default();
    let (_, record) = send_named(&gateway, None, "tem alguem ai?", Some("Maria")).await;

    assert_eq!(record.status, SessionStatus::WaitingHuman);
    assert_eq!(gateway.handoffs.lock().unwrap()[0].1, "Maria");
}

#[tokio::test]
async fn expired_session_is_discarded() {
    let gateway = MockGateway::default();
    let mut prior = confirmation_session();
    prior.conversation_data.insert(
        "last_activity".to_string(),
        json!("2025-06-17T09:29:00-03:00"), // 31 minutes before the clock
    );
    let (reply, record) = send(&gateway, Some(&prior), "sim").await;

    // the stale confirmation never happens; the bot starts over
    assert!(gateway.bookings.lock().unwrap().is_empty());
    assert!(reply.contains("Studio Olhar Sob Medida"));
    assert_eq!(record.current_step, "awaiting_welcome_response");
}

#[tokio::test]
async fn session_29_minutes_old_is_kept() {
    let gateway = MockGateway::default();
    let mut prior = confirmation_session();
    prior.conversation_data.insert(
        "last_activity".to_string(),
        json!("2025-06-17T09:31:00-03:00"), // 29 minutes before the clock
    );
    let (_, record) = send(&gateway, Some(&prior), "sim").await;

    assert_eq!(gateway.bookings.lock().unwrap().len(), 1);
    assert_eq!(record.current_step, "completed");
}

#[tokio::test]
async fn cancellation_of_confirmed_booking_calls_gateway() {
    let gateway = MockGateway {
        cancel_result: true,
        ..MockGateway::default()
    };
    let prior = session(
        "completed",
        json!({
            "last_booking": {"name": "Maria Silva", "service": "Sobrancelha", "date": "20/06", "time": "15:00"},
        }),
    );
    let (reply, record) = send(&gateway, Some(&prior), "quero cancelar").await;

    assert_eq!(gateway.cancellations.lock().unwrap().as_slice(), [PHONE]);
    assert!(reply.contains("cancelado com sucesso"));
    assert_eq!(record.current_step, "start");
    assert!(!record.conversation_data.contains_key("last_booking"));
}

#[tokio::test]
async fn cancellation_failure_asks_for_contact() {
    let gateway = MockGateway {
        cancel_result: false,
        ..MockGateway::default()
    };
    let prior = session(
        "completed",
        json!({
            "last_booking": {"name": "Maria Silva", "service": "Sobrancelha", "date": "20/06", "time": "15:00"},
        }),
    );
    let (reply, _) = send(&gateway, Some(&prior), "cancelar").await;
    assert!(reply.contains("Entre em contato"));
}

#[tokio::test]
async fn cancellation_of_draft_reports_what_was_dropped() {
    let gateway = MockGateway::default();
    let prior = session(
        "awaiting_time",
        json!({
            "service": {"name": "Buço", "category": "Depilação", "price": 15.0, "duration_minutes": 30},
            "date": "2025-06-20",
        }),
    );
    let (reply, record) = send(&gateway, Some(&prior), "cancelar").await;

    assert!(reply.contains("Você estava agendando"));
    assert!(reply.contains("Buço"));
    assert!(reply.contains("20/06"));
    assert_eq!(record.current_step, "start");
    assert!(gateway.cancellations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn topic_question_triggers_engagement_offer() {
    let gateway = MockGateway::default();
    let (reply, record) = send(&gateway, None, "onde fica o studio?").await;

    assert!(reply.contains("Endereço do Studio"));
    assert_eq!(record.current_step, "awaiting_engagement_response");
    assert_eq!(record.conversation_data["engagement_context"], "address");
}

#[tokio::test]
async fn engagement_yes_shows_menu() {
    let gateway = MockGateway::default();
    let prior = session(
        "awaiting_engagement_response",
        json!({"engagement_context": "address"}),
    );
    let (reply, record) = send(&gateway, Some(&prior), "sim").await;

    assert!(reply.contains("Confira nossos serviços"));
    assert_eq!(record.current_step, "awaiting_service_selection");
}

#[tokio::test]
async fn engagement_reply_naming_a_service_jumps_to_date() {
    let gateway = MockGateway::default();
    let prior = session(
        "awaiting_engagement_response",
        json!({"engagement_context": "instagram"}),
    );
    let (reply, record) = send(&gateway, Some(&prior), "manicure").await;

    assert!(reply.contains("*Manicure*"));
    assert_eq!(record.current_step, "awaiting_date");
}

#[tokio::test]
async fn topic_question_with_booking_is_personalized_and_stateless() {
    let gateway = MockGateway::default();
    let prior = session(
        "completed",
        json!({
            "last_booking": {"name": "Maria Silva", "service": "Sobrancelha", "date": "20/06", "time": "15:00"},
        }),
    );
    let (reply, record) = send(&gateway, Some(&prior), "qual o telefone?").await;

    assert!(reply.contains("Nossos contatos"));
    assert!(reply.contains("*20/06*"));
    assert_eq!(record.current_step, "completed");
}

#[tokio::test]
async fn farewell_after_booking_and_reentry() {
    let gateway = MockGateway::default();
    let prior = session(
        "completed",
        json!({
            "last_booking": {"name": "Maria Silva", "service": "Sobrancelha", "date": "20/06", "time": "15:00"},
        }),
    );
    let (reply, record) = send(&gateway, Some(&prior), "obrigada, só isso").await;

    assert!(reply.contains("*Maria Silva*"));
    assert!(reply.contains("*20/06*"));
    assert_eq!(record.current_step, "farewell_sent");

    // speaking again re-opens the conversation under completed
    let (reply, record) = send(&gateway, Some(&record), "qual o endereço?").await;
    assert!(reply.contains("Endereço do Studio"));
    assert_eq!(record.current_step, "completed");
}

#[tokio::test]
async fn services_topic_shortcut_mid_flow() {
    let gateway = MockGateway::default();
    let prior = session(
        "awaiting_date",
        json!({
            "service": {"name": "Buço", "category": "Depilação", "price": 15.0, "duration_minutes": 30},
        }),
    );
    let (reply, record) = send(&gateway, Some(&prior), "quais serviços vocês oferecem?").await;

    assert!(reply.contains("Confira nossos serviços"));
    assert_eq!(record.current_step, "awaiting_service_selection");
}

#[tokio::test]
async fn fallback_without_history_resets() {
    let gateway = MockGateway::default();
    let prior = session("completed", json!({"name": "Maria Silva"}));
    let (reply, record) = send(&gateway, Some(&prior), "xyzzy").await;

    assert!(reply.contains("não entendi"));
    assert_eq!(record.current_step, "start");
}

#[tokio::test]
async fn fallback_with_history_keeps_state() {
    let gateway = MockGateway::default();
    let prior = session(
        "completed",
        json!({
            "last_booking": {"name": "Maria Silva", "service": "Sobrancelha", "date": "20/06", "time": "15:00"},
        }),
    );
    let (reply, record) = send(&gateway, Some(&prior), "xyzzy").await;

    assert!(reply.contains("Posso te ajudar com"));
    assert_eq!(record.current_step, "completed");
    assert!(record.conversation_data.contains_key("last_booking"));
}

#[tokio::test]
async fn full_booking_conversation() {
    let gateway = MockGateway::with_availability(
        &["18/06/2025"],
        &[("18/06/2025", &["14:00", "15:00"])],
    );

    let (reply, record) = send(&gateway, None, "oi").await;
    assert!(reply.contains("gostaria de conhecer nossos serviços"));

    let (reply, record) = send(&gateway, Some(&record), "sim, por favor").await;
    assert!(reply.contains("Confira nossos serviços"));

    let (reply, record) = send(&gateway, Some(&record), "sobrancelha").await;
    assert!(reply.contains("Para qual data"));

    let (reply, record) = send(&gateway, Some(&record), "amanhã").await;
    assert!(reply.contains("Qual horário"));
    assert_eq!(record.current_step, "awaiting_time");

    let (reply, record) = send(&gateway, Some(&record), "às 15h").await;
    assert!(reply.contains("nome completo"));

    let (reply, record) = send(&gateway, Some(&record), "me chamo maria silva").await;
    assert!(reply.contains("Posso confirmar o agendamento?"));

    let (reply, record) = send(&gateway, Some(&record), "pode confirmar").await;
    assert!(reply.contains("confirmado com sucesso"));
    assert_eq!(record.current_step, "completed");
    assert_eq!(record.status, SessionStatus::Completed);

    let bookings = gateway.bookings.lock().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].2, "Sobrancelha");
    assert_eq!(bookings[0].3, "18/06/2025");
    assert_eq!(bookings[0].4, "15:00");
}
