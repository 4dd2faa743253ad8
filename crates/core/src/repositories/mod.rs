//! Table repositories.
//!
//! Each module owns the SQL for one table (or a tightly-coupled pair). Functions take a
//! `&Connection`, so they work the same on a plain connection and inside a transaction.

pub(crate) mod helpers;

pub mod diagnoses;
pub mod patients;
pub mod prescriptions;
pub mod profiles;
