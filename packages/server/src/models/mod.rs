pub mod admin;
pub mod announcement;
pub mod auth;
pub mod bracket;
pub mod event;
pub mod notification;
pub mod registration;
pub mod seat_map;
pub mod shared;
pub mod team;
