pub mod announcement;
pub mod audit_log;
pub mod bracket;
pub mod event;
pub mod notification;
pub mod registration;
pub mod seat;
pub mod seat_map;
pub mod team;
pub mod team_member;
pub mod user;
