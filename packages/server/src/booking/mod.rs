//! Transactional booking operations: seat claims and team rosters.

pub mod roster;
pub mod seats;
