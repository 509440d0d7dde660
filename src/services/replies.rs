use chrono::{NaiveDateTime, Timelike};

use crate::models::{format_price, Appointment, SalonConfig, Service, StaffMember, ANY_STAFF};

const YES_NO_PROMPT: &str = "¿Quieres reservar una cita? Responde Sí o No 😊";

fn salutation(now: NaiveDateTime) -> &'static str {
    match now.hour() {
        5..=11 => "¡Buenos días",
        12..=19 => "¡Buenas tardes",
        _ => "¡Buenas noches",
    }
}

pub fn greeting(salon: &SalonConfig, now: NaiveDateTime, open: bool) -> String {
    let mut reply = format!(
        "{}! 👋 Bienvenido/a a {} 💇‍♀️",
        salutation(now),
        salon.name
    );
    if !open {
        reply.push_str(&format!(
            "\n\n🌙 Ahora mismo estamos cerrados.\n🕐 Horario: {}\n📅 {}\nAun así puedes reservar tu cita por aquí.",
            salon.hours_label(),
            salon.working_days_label()
        ));
    }
    reply.push_str("\n\n");
    reply.push_str(YES_NO_PROMPT);
    reply
}

pub fn booking_declined() -> String {
    "De acuerdo 😊 Si cambias de idea, escríbenos cuando quieras.".to_string()
}

pub fn service_menu(services: &[Service]) -> String {
    let list = services
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "{}. {} - {}€ ({} min)",
                i + 1,
                s.name,
                format_price(s.price),
                s.duration_minutes
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("¿Qué servicio te gustaría reservar?\n\n{list}\n\nResponde con el número del servicio.")
}

pub fn invalid_service(count: usize) -> String {
    format!("Por favor, elige un número de la lista de servicios (1-{count}) 😊")
}

pub fn staff_menu(service: &Service, staff: &[StaffMember]) -> String {
    let mut lines = staff
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {} - {}", i + 1, s.name, s.specialty))
        .collect::<Vec<_>>();
    lines.push(format!("{}. {} (sin preferencia)", staff.len() + 1, ANY_STAFF));
    format!(
        "¡Perfecto! ✨ Has elegido {}.\n\n¿Con quién prefieres tu cita?\n\n{}\n\nResponde con el número.",
        service.name,
        lines.join("\n")
    )
}

pub fn invalid_staff(options: usize) -> String {
    format!("Por favor, elige un número de la lista (1-{options}) 😊")
}

pub fn date_time_prompt(staff: &str) -> String {
    let with = if staff == ANY_STAFF {
        "Te asignaremos a quien esté libre 👏".to_string()
    } else {
        format!("¡Genial! Con {staff} 👏")
    };
    format!("{with}\n\n¿Para qué día y hora?\nEscribe: DD/MM/AAAA HH:MM\n\nEjemplo: 25/12/2031 15:30")
}

pub fn invalid_date_time() -> String {
    "No he entendido la fecha 🤔 Escríbela así: DD/MM/AAAA HH:MM\nEjemplo: 25/12/2031 15:30"
        .to_string()
}

pub fn summary(date_formatted: &str, time: &str, service: &Service, staff: &str) -> String {
    format!(
        "🎯 Resumen de tu cita:\n\n📅 {date_formatted} a las {time}\n✂️ {}\n👤 {staff}\n💰 {}€\n\nResponde CONFIRMA para reservar o RECHAZA para cancelar.",
        service.name,
        format_price(service.price)
    )
}

pub fn confirmed(appointment: &Appointment, salon: &SalonConfig) -> String {
    format!(
        "🎉 ¡CITA CONFIRMADA!\n\nTe esperamos el {} a las {} para {} 😊\n\n¡Gracias por confiar en {}! 💕",
        appointment.date_formatted, appointment.time, appointment.service.name, salon.name
    )
}

pub fn appointment_cancelled() -> String {
    "😊 No hay problema, no hemos reservado nada.\n\nEscribe \"hola\" cuando quieras empezar de nuevo."
        .to_string()
}

pub fn confirm_reprompt() -> String {
    "Por favor, responde CONFIRMA para reservar o RECHAZA para cancelar 😊".to_string()
}

pub fn persist_failed() -> String {
    "Lo siento, no hemos podido guardar tu cita 😔 Vuelve a enviar CONFIRMA en unos minutos."
        .to_string()
}

pub fn out_of_scope() -> String {
    format!("Solo puedo ayudarte con la reserva de citas 🙏\n\n{YES_NO_PROMPT}")
}

pub fn temporary_failure() -> String {
    "Lo siento, estoy teniendo problemas ahora mismo. Inténtalo de nuevo en un momento.".to_string()
}
