use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Duration, NaiveDateTime};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::models::{
    format_date, format_time, Appointment, AppointmentIds, ConversationState, ConversationStep,
    Intent, SalonConfig, StaffRef, ANY_STAFF,
};
use crate::services::availability::AvailabilityChecker;
use crate::services::clock::Clock;
use crate::services::intent::{extract_date_time, extract_selection};
use crate::services::messaging::MessagingProvider;
use crate::services::replies;
use crate::store::{AppointmentStore, ConversationStore, SalonConfigStore, StoreError};

enum Outcome {
    Continue,
    Finished,
}

/// One async mutex per sender so that two messages from the same customer
/// never interleave their read-transition-write cycle.
#[derive(Default)]
struct SenderLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SenderLocks {
    async fn lock(&self, sender: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(sender.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    fn prune(&self) {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}

pub struct ConversationEngine {
    salon: Arc<SalonConfigStore>,
    appointments: Arc<dyn AppointmentStore>,
    conversations: Arc<dyn ConversationStore>,
    messaging: Arc<dyn MessagingProvider>,
    clock: Arc<dyn Clock>,
    idle_timeout: Duration,
    ids: AppointmentIds,
    sender_locks: SenderLocks,
    booking_lock: AsyncMutex<()>,
}

impl ConversationEngine {
    pub async fn new(
        salon: Arc<SalonConfigStore>,
        appointments: Arc<dyn AppointmentStore>,
        conversations: Arc<dyn ConversationStore>,
        messaging: Arc<dyn MessagingProvider>,
        clock: Arc<dyn Clock>,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let existing = appointments.load_all().await?;
        Ok(Self {
            salon,
            appointments,
            conversations,
            messaging,
            clock,
            idle_timeout,
            ids: AppointmentIds::seeded(&existing),
            sender_locks: SenderLocks::default(),
            booking_lock: AsyncMutex::new(()),
        })
    }

    pub fn is_open_now(&self) -> bool {
        let salon = self.salon.snapshot();
        AvailabilityChecker::new(&salon, &[], self.clock.now()).is_open_now()
    }

    pub async fn active_conversations(&self) -> Result<usize, StoreError> {
        self.conversations.count().await
    }

    /// Processes one inbound message and delivers the reply. Delivery failures
    /// are logged only; the state transition already applied stays applied.
    pub async fn on_message(&self, sender: &str, text: &str) {
        let reply = match self.reply_to(sender, text).await {
            Ok(Some(reply)) => reply,
            Ok(None) => return,
            Err(e) => {
                tracing::error!(error = %e, phone = %sender, "conversation processing failed");
                replies::temporary_failure()
            }
        };

        if let Err(e) = self.messaging.send_message(sender, &reply).await {
            tracing::error!(error = %e, phone = %sender, "failed to send reply");
        }
    }

    /// Advances the sender's conversation by one step and returns the reply,
    /// or `None` for an empty message.
    pub async fn reply_to(&self, sender: &str, text: &str) -> Result<Option<String>, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!(phone = %sender, "ignoring empty message");
            return Ok(None);
        }

        let _turn = self.sender_locks.lock(sender).await;

        let now = self.clock.now();

        let mut conv = match self.conversations.get(sender).await? {
            Some(conv) if conv.is_idle(now, self.idle_timeout) => {
                tracing::info!(phone = %sender, step = conv.step.as_str(), "conversation expired, starting over");
                ConversationState::new(now)
            }
            Some(conv) => conv,
            None => ConversationState::new(now),
        };
        let salon = conv
            .salon
            .get_or_insert_with(|| self.salon.snapshot())
            .clone();
        let from = conv.step;
        conv.last_activity = now;

        let (reply, outcome) = self.advance(&salon, sender, &mut conv, text, now).await?;

        match outcome {
            Outcome::Continue => {
                tracing::info!(phone = %sender, from = from.as_str(), to = conv.step.as_str(), "processed message");
                self.conversations.put(sender, conv).await?;
            }
            Outcome::Finished => {
                tracing::info!(phone = %sender, from = from.as_str(), "conversation finished");
                self.conversations.delete(sender).await?;
            }
        }

        Ok(Some(reply))
    }

    pub async fn expire_idle_conversations(&self) -> Result<usize, StoreError> {
        let cutoff = self.clock.now() - self.idle_timeout;
        let removed = self.conversations.expire_idle(cutoff).await?;
        self.sender_locks.prune();
        Ok(removed)
    }

    async fn advance(
        &self,
        salon: &SalonConfig,
        sender: &str,
        conv: &mut ConversationState,
        text: &str,
        now: NaiveDateTime,
    ) -> Result<(String, Outcome), StoreError> {
        let reply = match conv.step {
            ConversationStep::Initial => {
                let open = AvailabilityChecker::new(salon, &[], now).is_open_now();
                conv.step = ConversationStep::ConfirmBooking;
                replies::greeting(salon, now, open)
            }

            ConversationStep::ConfirmBooking => {
                if !salon.vocabulary.matches(Intent::Affirmative, text) {
                    return Ok((replies::booking_declined(), Outcome::Finished));
                }
                conv.step = ConversationStep::SelectService;
                replies::service_menu(&salon.services)
            }

            ConversationStep::SelectService => {
                let chosen = extract_selection(text)
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| salon.services.get(i));
                match chosen {
                    Some(service) => {
                        conv.pending.service = Some(service.clone());
                        conv.step = ConversationStep::SelectStaff;
                        replies::staff_menu(service, &salon.staff)
                    }
                    None => replies::invalid_service(salon.services.len()),
                }
            }

            ConversationStep::SelectStaff => {
                if conv.pending.service.is_none() {
                    return Ok(fall_back(conv));
                }
                let count = salon.staff.len();
                let staff = match extract_selection(text) {
                    Some(n) if n == count + 1 => ANY_STAFF.to_string(),
                    Some(n) => match n.checked_sub(1).and_then(|i| salon.staff.get(i)) {
                        Some(member) => member.name.clone(),
                        None => return Ok((replies::invalid_staff(count + 1), Outcome::Continue)),
                    },
                    None => return Ok((replies::invalid_staff(count + 1), Outcome::Continue)),
                };
                let reply = replies::date_time_prompt(&staff);
                conv.pending.staff = Some(staff);
                conv.step = ConversationStep::SelectDateTime;
                reply
            }

            ConversationStep::SelectDateTime => {
                let (Some(service), Some(staff)) =
                    (conv.pending.service.clone(), conv.pending.staff.clone())
                else {
                    return Ok(fall_back(conv));
                };
                let Some((date, time)) = extract_date_time(text) else {
                    return Ok((replies::invalid_date_time(), Outcome::Continue));
                };

                let appointments = self.appointments.load_all().await?;
                let checker = AvailabilityChecker::new(salon, &appointments, now);
                if let Err(rejection) = checker.validate_slot(&staff, date, time) {
                    tracing::info!(phone = %sender, reason = ?rejection, "requested slot rejected");
                    return Ok((rejection.to_string(), Outcome::Continue));
                }

                let date_formatted = format_date(date);
                let time_formatted = format_time(time);
                let reply = replies::summary(&date_formatted, &time_formatted, &service, &staff);
                conv.pending.date_formatted = Some(date_formatted);
                conv.pending.time = Some(time_formatted);
                conv.pending.iso_date_time = Some(date.and_time(time));
                conv.step = ConversationStep::ConfirmAppointment;
                reply
            }

            ConversationStep::ConfirmAppointment => {
                if salon.vocabulary.matches(Intent::Confirm, text) {
                    return self.book(salon, sender, conv, now).await;
                }
                if salon.vocabulary.matches(Intent::Reject, text) {
                    return Ok((replies::appointment_cancelled(), Outcome::Finished));
                }
                replies::confirm_reprompt()
            }
        };

        Ok((reply, Outcome::Continue))
    }

    /// Re-validates the slot and appends the appointment under the booking
    /// lock. The confirmation is only sent once the store accepted the write.
    async fn book(
        &self,
        salon: &SalonConfig,
        sender: &str,
        conv: &mut ConversationState,
        now: NaiveDateTime,
    ) -> Result<(String, Outcome), StoreError> {
        let (Some(service), Some(staff), Some(at)) = (
            conv.pending.service.clone(),
            conv.pending.staff.clone(),
            conv.pending.iso_date_time,
        ) else {
            return Ok(fall_back(conv));
        };

        let _booking = self.booking_lock.lock().await;

        let appointments = self.appointments.load_all().await?;
        let checker = AvailabilityChecker::new(salon, &appointments, now);
        if let Err(rejection) = checker.validate_slot(&staff, at.date(), at.time()) {
            tracing::info!(phone = %sender, reason = ?rejection, "slot no longer available at confirmation");
            conv.pending.clear_slot();
            conv.step = ConversationStep::SelectDateTime;
            return Ok((rejection.to_string(), Outcome::Continue));
        }

        let appointment = Appointment {
            id: self.ids.next(now),
            phone: sender.to_string(),
            date_formatted: format_date(at.date()),
            time: format_time(at.time()),
            iso_date_time: at,
            service,
            staff: StaffRef { name: staff },
            created_at: now,
        };

        match self.appointments.append(appointment.clone()).await {
            Ok(()) => {
                tracing::info!(
                    id = appointment.id,
                    phone = %sender,
                    date = %appointment.date_formatted,
                    time = %appointment.time,
                    staff = %appointment.staff.name,
                    "appointment booked"
                );
                Ok((replies::confirmed(&appointment, salon), Outcome::Finished))
            }
            Err(e) => {
                tracing::error!(error = %e, phone = %sender, "failed to persist appointment");
                Ok((replies::persist_failed(), Outcome::Continue))
            }
        }
    }
}

/// The stored draft does not fit its step; restart at the yes/no question.
fn fall_back(conv: &mut ConversationState) -> (String, Outcome) {
    tracing::warn!(step = conv.step.as_str(), "inconsistent conversation state, resetting");
    conv.pending = Default::default();
    conv.step = ConversationStep::ConfirmBooking;
    (replies::out_of_scope(), Outcome::Continue)
}
