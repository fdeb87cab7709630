//! Business rules. Every operation takes the acting user and performs its
//! own permission checks before touching the database.

pub mod accounts;
pub mod activity;
pub mod assignment;
pub mod conversion;
pub mod deletion;
pub mod followups;
pub mod inactivity;
pub mod intake;
pub mod leads;
pub mod normalize;
pub mod reports;
pub mod tags;
pub mod users;
pub mod visibility;
pub mod workflows;

#[cfg(test)]
pub(crate) mod testing;
