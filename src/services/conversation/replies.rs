//! Reply templates. Everything the customer reads is built here so the
//! state machine stays pure control flow.

use chrono::NaiveDate;

use crate::models::{Catalog, ConversationState, LastBooking};

use super::catalog::render_menu;
use super::schedule::{next_working_day, weekday_name_pt};

pub fn welcome() -> String {
    "✨ Olá! É um prazer receber você no Studio Olhar Sob Medida ✨\n\n\
     Sou a assistente virtual do estúdio 😊\n\
     Posso te ajudar com informações ou agendamentos.\n\n\
     👉 Você gostaria de conhecer nossos serviços?"
        .to_string()
}

pub fn services_menu(catalog: &Catalog) -> String {
    format!(
        "Confira nossos serviços:\n\n{}\n\n\
         👉 Digite o número ou nome do serviço que deseja agendar!\n\n\
         💡 Exemplo: *1* ou *sobrancelha*",
        render_menu(catalog)
    )
}

pub fn engagement_services_menu(catalog: &Catalog) -> String {
    format!(
        "Perfeito! ✨ Vou te ajudar com o agendamento 💖\n\n{}",
        services_menu(catalog)
    )
}

pub fn welcome_reprompt() -> String {
    "Desculpe, não entendi 😊\n\n\
     Você gostaria de conhecer nossos serviços?\n\
     👉 Responda *sim* ou *não*, por favor!"
        .to_string()
}

pub fn welcome_declined() -> String {
    "Entendi! Se quiser agendar algo depois, é só me chamar! 😊".to_string()
}

pub fn service_not_understood() -> String {
    "Não entendi qual serviço você quer 😕 Tente digitar o *número* ou o *nome*, \
     como *1* ou *Sobrancelha*."
        .to_string()
}

/// Prompt for a date right after a service was chosen. When the studio is
/// closed today the prompt says so and points at the next working day.
pub fn date_prompt(service_name: &str, today: NaiveDate, open_today: bool) -> String {
    if open_today {
        format!(
            "Perfeito! ✨ *{service_name}* é uma ótima escolha 💖\n\n\
             👉 Para qual data você gostaria de agendar?\n\n\
             Pode responder: *hoje*, *amanhã* ou uma data da sua preferência.\n\n\
             💡 Lembrando que o studio funciona de *Terça a Sábado* das *9h às 19h*"
        )
    } else {
        let next = next_working_day(today)
            .map(|d| d.format("%d/%m").to_string())
            .unwrap_or_else(|| "próximo dia útil".to_string());
        format!(
            "Perfeito! ✨ *{service_name}* é uma ótima escolha 💖\n\n\
             ⚠️ Hoje é *{}* e o studio está fechado.\n\n\
             👉 Para qual data você gostaria de agendar?\n\n\
             Pode responder: *amanhã ({next})* ou uma data da sua preferência.\n\n\
             💡 Funcionamos de *Terça a Sábado* das *9h às 19h*",
            weekday_name_pt(today)
        )
    }
}

pub fn date_not_understood() -> String {
    "Não consegui entender a data 😕\n\n\
     Por favor, me diga a data que você prefere.\n\
     💡 Exemplos: *hoje*, *amanhã*, *20/01*, *dia 20*"
        .to_string()
}

pub fn closed_on(date: NaiveDate) -> String {
    let next = next_working_day(date)
        .map(|d| d.format("%d/%m").to_string())
        .unwrap_or_else(|| "próximo dia útil".to_string());
    format!(
        "⚠️ {} ({}) o studio está fechado.\n\n\
         🕒 Funcionamos de *Terça a Sábado* das *9h às 19h*\n\n\
         👉 Que tal agendar para *{next}* ou outra data da sua preferência?",
        weekday_name_pt(date),
        date.format("%d/%m")
    )
}

pub fn date_unavailable(date: NaiveDate) -> String {
    format!(
        "Essa data (*{}*) não está disponível ou não temos agenda aberta 😕\n\n\
         👉 Pode escolher outra data, por favor?",
        date.format("%d/%m")
    )
}

pub fn slots_lookup_failed(date: NaiveDate) -> String {
    format!(
        "Desculpe, tive um problema ao verificar os horários disponíveis para *{}* 😕\n\n\
         Por favor, tente novamente ou escolha apenas a data primeiro.",
        date.format("%d/%m")
    )
}

pub fn slots_lookup_failed_generic() -> String {
    "Desculpe, tive um problema ao verificar os horários disponíveis 😕\n\n\
     Por favor, tente novamente."
        .to_string()
}

pub fn dates_lookup_failed() -> String {
    "Desculpe, tive um problema ao consultar a agenda agora 😕\n\n\
     Pode tentar de novo em instantes, por favor?"
        .to_string()
}

pub fn time_taken_on_date(date: NaiveDate, time: &str, available: &[String]) -> String {
    format!(
        "Consegui a data *{}*, mas o horário *{time}* já está ocupado 😕\n\n\
         📋 Horários disponíveis: {}\n\n\
         👉 Qual horário você prefere?",
        date.format("%d/%m"),
        available.join(", ")
    )
}

pub fn time_unavailable(time: &str, available: &[String]) -> String {
    format!(
        "Esse horário (*{time}*) não está disponível 😕\n\n\
         📋 Horários disponíveis: {}\n\n\
         👉 Qual horário você prefere?",
        available.join(", ")
    )
}

pub fn time_not_understood() -> String {
    "Não consegui entender o horário 😕\n\n\
     Por favor, me diga o horário que você prefere.\n\
     💡 Exemplos: *15h*, *15:00*, *3 da tarde*"
        .to_string()
}

pub fn ask_name(date: NaiveDate, time: &str) -> String {
    format!(
        "Perfeito! ✨\n\
         📅 Data: *{}*\n\
         ⏰ Horário: *{time}*\n\n\
         👉 Para finalizar, qual é o seu *nome completo*?\n\
         (Nome e sobrenome, por favor)",
        date.format("%d/%m")
    )
}

pub fn ask_time(date: NaiveDate) -> String {
    format!(
        "Perfeito! ✨ Data escolhida: *{}*\n\n\
         👉 Qual horário você prefere?\n\
         💡 Funcionamos das *9h às 19h*",
        date.format("%d/%m")
    )
}

pub fn greeting_instead_of_name() -> String {
    "Opa! Isso é uma saudação 😊\n\n\
     Preciso do seu *nome completo* para finalizar o agendamento.\n\n\
     💡 Exemplo: *Maria Silva* ou *João Santos*\n\n\
     👉 Qual é o seu nome?"
        .to_string()
}

pub fn incomplete_name() -> String {
    "Por favor, me informe seu *nome completo* (nome e sobrenome) 😊\n\
     💡 Exemplo: Maria Silva"
        .to_string()
}

fn summary_block(state: &ConversationState) -> String {
    let name = state.name.as_deref().unwrap_or("");
    let service = state.service.as_ref().map(|s| s.name.as_str()).unwrap_or("");
    let date = state
        .date
        .map(|d| d.format("%d/%m").to_string())
        .unwrap_or_default();
    let time = state.time.as_deref().unwrap_or("");
    format!(
        "👤 Nome: *{name}*\n\
         ✨ Serviço: *{service}*\n\
         📅 Data: *{date}*\n\
         ⏰ Horário: *{time}*"
    )
}

pub fn booking_summary(state: &ConversationState) -> String {
    format!(
        "Prazer, *{}*! 😊\n\n\
         📝 Resumo do agendamento:\n{}\n\n\
         👉 Posso confirmar o agendamento?",
        state.name.as_deref().unwrap_or(""),
        summary_block(state)
    )
}

pub fn greeting_instead_of_confirmation(state: &ConversationState) -> String {
    format!(
        "Entendi a saudação! 😊\n\n\
         Mas preciso saber: você quer confirmar este agendamento?\n\n\
         📝 Resumo:\n{}\n\n\
         👉 Responda *sim* para confirmar ou *não* para cancelar",
        summary_block(state)
    )
}

pub fn booking_confirmed(state: &ConversationState) -> String {
    let date = state
        .date
        .map(|d| d.format("%d/%m").to_string())
        .unwrap_or_default();
    format!(
        "Agendamento confirmado com sucesso, *{}*! 🎉✨\n\n\
         Estamos te esperando no *Studio Olhar Sob Medida* 💖\n\n\
         📍 Rua Horácio de Castilho, 21 - Vila Maria Alta\n\
         📅 {date} às {}\n\n\
         Vai ficar lindo! Será um prazer te receber ✨\n\n\
         👉 Posso te ajudar com mais alguma coisa? 😊",
        state.name.as_deref().unwrap_or(""),
        state.time.as_deref().unwrap_or("")
    )
}

pub fn booking_slot_taken() -> String {
    "Poxa, esse horário acabou de ser ocupado 😕\n\n\
     👉 Pode escolher outro horário? É só me dizer *cancelar* para recomeçar \
     ou mandar outro horário."
        .to_string()
}

pub fn booking_failed() -> String {
    "Desculpe, tive um problema ao registrar o agendamento agora 😕\n\n\
     Pode tentar confirmar de novo em instantes, por favor?"
        .to_string()
}

pub fn confirmation_reprompt() -> String {
    "👉 Posso confirmar o agendamento? (responda *sim* ou *não*)".to_string()
}

pub fn confirmation_declined() -> String {
    "Tudo bem! 😊\n\n\
     Quando quiser agendar, é só me chamar!\n\
     Estamos ansiosos pelo seu retorno! ✨"
        .to_string()
}

pub fn handoff_ack() -> String {
    "Entendi 😊\n\
     Vou te direcionar para atendimento humano agora.\n\
     ⏳ Por favor, aguarde um momento que você será atendida.\n\
     Obrigada pela paciência 💖"
        .to_string()
}

pub fn farewell_after_booking(booking: &LastBooking) -> String {
    format!(
        "Perfeito, *{}*! 💖\n\n\
         Foi um prazer te atender!\n\
         Nos vemos em *{}* às *{}* ✨\n\n\
         Até lá! 👋",
        booking.name, booking.date, booking.time
    )
}

pub fn farewell_plain() -> String {
    "Perfeito! 💖\n\n\
     Foi um prazer te atender!\n\
     Até breve! 👋"
        .to_string()
}

pub fn goodbye(name: Option<&str>) -> String {
    match name {
        Some(name) => format!("Até logo, *{name}*! 💖 Foi um prazer te atender! 👋"),
        None => "Até logo! 💖 Foi um prazer te atender! 👋".to_string(),
    }
}

pub fn cancellation_done(booking: &LastBooking) -> String {
    format!(
        "✅ Agendamento cancelado com sucesso, *{}*!\n\n\
         📋 Detalhes do cancelamento:\n\
         ✨ Serviço: {}\n\
         📅 Data: {}\n\
         ⏰ Horário: {}\n\n\
         💡 *Gostaria de:*\n\
         📅 Reagendar para outro dia ou horário?\n\
         ✨ Agendar outro serviço?\n\
         📍 Ver nossos serviços disponíveis?\n\n\
         É só me dizer! Estou aqui para ajudar 💖",
        booking.name, booking.service, booking.date, booking.time
    )
}

pub fn cancellation_needs_contact(booking: &LastBooking) -> String {
    format!(
        "Entendi, *{}*! 😊\n\n\
         ⚠️ *IMPORTANTE:* Entre em contato conosco para confirmar o cancelamento!\n\n\
         📞 WhatsApp: (11) 9 1234-5678\n\n\
         Se quiser reagendar depois, é só me chamar! 💖",
        booking.name
    )
}

pub fn cancellation_of_draft(
    service: Option<&str>,
    date: Option<NaiveDate>,
    time: Option<&str>,
) -> String {
    let mut msg = String::from("Tudo bem! Agendamento cancelado. 😊\n\n");
    if service.is_some() || date.is_some() || time.is_some() {
        msg.push_str("📋 Você estava agendando:\n");
        if let Some(service) = service {
            msg.push_str(&format!("✨ Serviço: {service}\n"));
        }
        if let Some(date) = date {
            msg.push_str(&format!("📅 Data: {}\n", date.format("%d/%m")));
        }
        if let Some(time) = time {
            msg.push_str(&format!("⏰ Horário: {time}\n"));
        }
        msg.push('\n');
    }
    msg.push_str(
        "💡 *Gostaria de:*\n\
         📅 Reagendar para outro dia ou horário?\n\
         ✨ Conhecer outros serviços?\n\
         📍 Saber mais sobre o studio?\n\n\
         É só me dizer! Estou aqui para ajudar 💖",
    );
    msg
}

pub fn cancellation_nothing_pending() -> String {
    "Tudo bem! Se precisar de algo, é só chamar. 👋".to_string()
}

const ADDRESS_CARD: &str = "📍 *Endereço do Studio Olhar Sob Medida:*\n\n\
                            Rua Horácio de Castilho, 21\n\
                            Vila Maria Alta – São Paulo/SP\n\n\
                            🕘 Funcionamos de terça a sábado, das 9h às 19h.";

pub fn address(booking: Option<&LastBooking>) -> String {
    match booking {
        Some(b) => format!(
            "{ADDRESS_CARD}\n\n✨ Nos vemos em *{}* às *{}*! 💖",
            b.date, b.time
        ),
        None => format!("{ADDRESS_CARD}\n\nSe quiser, posso te mostrar nossos serviços 😊"),
    }
}

const PHONE_CARD: &str = "📞 *Nossos contatos:*\n\n\
                          WhatsApp: (11) 9 1234-5678\n\
                          Telefone fixo: (11) 1234-5678";

pub fn phone(booking: Option<&LastBooking>, mid_welcome: bool) -> String {
    match booking {
        Some(b) => format!(
            "{PHONE_CARD}\n\nQualquer dúvida, estou aqui! 😊\n\
             Nos vemos em *{}* às *{}* ✨",
            b.date, b.time
        ),
        None if mid_welcome => format!("{PHONE_CARD}\n\nQualquer dúvida, estou aqui! 😊"),
        None => format!("{PHONE_CARD}\n\n👉 Posso te ajudar com algum agendamento? 😊"),
    }
}

const INSTAGRAM_CARD: &str = "📱 *Siga a gente no Instagram!*\n\n\
                              🌟 @olharsobmedida\n\
                              https://www.instagram.com/olharsobmedida\n\n\
                              Lá você encontra:\n\
                              ✨ Nossos trabalhos\n\
                              📸 Fotos antes e depois\n\
                              🎁 Promoções exclusivas\n\
                              💄 Dicas de beleza";

pub fn instagram(booking: Option<&LastBooking>, mid_welcome: bool) -> String {
    match booking {
        Some(b) => format!(
            "{INSTAGRAM_CARD}\n\nConfira nossos trabalhos! Te esperamos em *{}* às *{}* 💖",
            b.date, b.time
        ),
        None if mid_welcome => format!("{INSTAGRAM_CARD}\n\nVem conferir! 😊💖"),
        None => format!(
            "{INSTAGRAM_CARD}\n\n👉 Viu algum serviço que te interessou? Posso agendar para você! 💖"
        ),
    }
}

pub fn engagement_reprompt() -> String {
    "Desculpe, não entendi 😕 Você gostaria de agendar um serviço? \
     (responda *sim* ou *não*)"
        .to_string()
}

pub fn engagement_declined() -> String {
    "Tudo bem 😊 Quando quiser conhecer ou agendar um serviço, é só me chamar. \
     Estarei por aqui ✨"
        .to_string()
}

pub fn fallback_with_history() -> String {
    "Desculpe, não entendi sua mensagem 😊\n\n\
     💡 Posso te ajudar com:\n\
     📍 Informações sobre o studio\n\
     📞 Nossos contatos\n\
     📱 Redes sociais\n\
     🔄 Cancelar ou reagendar\n\n\
     Como posso te ajudar?"
        .to_string()
}

pub fn fallback_reset() -> String {
    "Desculpa, não entendi 😊 Em que posso te ajudar?".to_string()
}
