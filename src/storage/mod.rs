//! On-disk title artifacts and the ticket upsert.

pub mod layout;
pub mod writer;
