use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{api, db};

pub use crate::db::ticket::Id;

/// A ticket joined with its assigned employee and owning customer.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Ticket {
    pub id: Id,
    pub description: String,
    pub emergency: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub date_completed: Option<OffsetDateTime>,
    pub employee: Option<api::Employee>,
    pub customer: api::Customer,
}

impl Ticket {
    pub fn new(
        ticket: db::Ticket,
        employee: Option<db::Employee>,
        customer: db::Customer,
    ) -> Self {
        Self {
            id: ticket.id,
            description: ticket.description,
            emergency: ticket.emergency,
            date_completed: ticket.date_completed,
            employee: employee.map(Into::into),
            customer: customer.into(),
        }
    }
}
