//! Rows read from and written to the catalog.

use crate::identity::TitleId;
use uuid::Uuid;

/// Primary key of the `application` table.
pub type ApplicationId = i32;

/// An application eligible for packaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    /// Application ID.
    pub id: ApplicationId,
    /// Uploaded content asset, stored as `<uuid>.zip`.
    pub asset: Uuid,
}

/// A row of the ticket table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRow {
    /// Title the ticket belongs to.
    pub title_id: TitleId,
    /// Serialized ticket.
    pub ticket: Vec<u8>,
    /// Title version recorded with the ticket.
    pub version: i32,
}
