pub mod appointment;
pub mod conversation;
pub mod intent;
pub mod salon;

pub use appointment::{format_date, format_time, Appointment, AppointmentIds, StaffRef};
pub use conversation::{ConversationState, ConversationStep, PendingAppointment};
pub use intent::{Intent, Vocabulary};
pub use salon::{format_price, SalonConfig, Service, StaffMember, ANY_STAFF};
