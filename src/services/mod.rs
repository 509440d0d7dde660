pub mod availability;
pub mod clock;
pub mod conversation;
pub mod intent;
pub mod messaging;
pub mod replies;
