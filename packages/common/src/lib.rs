pub mod activity;
pub mod bracket;
pub mod event_status;
pub mod registration_status;
pub mod role;
pub mod seat;
pub mod team;

pub use activity::{Activity, AuditRecord, NotificationRecord};
pub use bracket::{BracketFormat, BracketStatus};
pub use event_status::EventStatus;
pub use registration_status::RegistrationStatus;
pub use role::UserRole;
pub use seat::{SeatStatus, SeatType, seat_label};
pub use team::{MemberStatus, TeamRole};
