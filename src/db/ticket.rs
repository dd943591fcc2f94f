use time::OffsetDateTime;
use tokio_postgres::{Error, Row};

use super::{customer, employee, Client};

#[derive(Clone, Debug)]
pub struct Ticket {
    pub id: Id,
    pub description: String,
    pub emergency: bool,
    pub date_completed: Option<OffsetDateTime>,
    pub employee: Option<employee::Id>,
    pub customer: customer::Id,
}

int_id!(Id);

/// A ticket which has not been persisted yet.
#[derive(Clone, Debug)]
pub struct New {
    pub description: String,
    pub emergency: bool,
    pub customer: customer::Id,
}

/// Which tickets [`get_tickets()`] returns.
///
/// [`get_tickets()`]: super::Storage::get_tickets
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Filter {
    All,

    /// Only tickets with a completion date.
    Completed,

    OwnedBy(customer::Id),
}

impl Filter {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        match self {
            Self::All => true,
            Self::Completed => ticket.date_completed.is_some(),
            Self::OwnedBy(customer) => ticket.customer == *customer,
        }
    }
}

fn from_row(row: &Row) -> Ticket {
    Ticket {
        id: row.get("id"),
        description: row.get("description"),
        emergency: row.get("emergency"),
        date_completed: row.get("date_completed"),
        employee: row.get("employee_id"),
        customer: row.get("customer_id"),
    }
}

impl Client {
    pub(super) async fn select_ticket_by_id(
        &self,
        id: Id,
    ) -> Result<Option<Ticket>, Error> {
        const SQL: &str = "\
            SELECT id, description, emergency, date_completed, \
                   employee_id, customer_id \
            FROM service_tickets \
            WHERE id = $1";
        Ok(self.0.query_opt(SQL, &[&id]).await?.as_ref().map(from_row))
    }

    pub(super) async fn select_tickets(
        &self,
        filter: Filter,
    ) -> Result<Vec<Ticket>, Error> {
        const SQL: &str = "\
            SELECT id, description, emergency, date_completed, \
                   employee_id, customer_id \
            FROM service_tickets";

        let rows = match filter {
            Filter::All => {
                self.0.query(&format!("{SQL} ORDER BY id"), &[]).await?
            }
            Filter::Completed => {
                let sql = format!(
                    "{SQL} WHERE date_completed IS NOT NULL ORDER BY id"
                );
                self.0.query(&sql, &[]).await?
            }
            Filter::OwnedBy(customer) => {
                let sql = format!("{SQL} WHERE customer_id = $1 ORDER BY id");
                self.0.query(&sql, &[&customer]).await?
            }
        };
        Ok(rows.iter().map(from_row).collect())
    }

    pub(super) async fn insert_new_ticket(
        &self,
        ticket: &New,
    ) -> Result<Ticket, Error> {
        const SQL: &str = "\
            INSERT INTO service_tickets (description, emergency, customer_id) \
            VALUES ($1, $2, $3) \
            RETURNING id, description, emergency, date_completed, \
                      employee_id, customer_id";

        let row = self
            .0
            .query_one(
                SQL,
                &[&ticket.description, &ticket.emergency, &ticket.customer],
            )
            .await?;
        Ok(from_row(&row))
    }

    pub(super) async fn update_ticket(
        &self,
        ticket: &Ticket,
    ) -> Result<(), Error> {
        const SQL: &str = "\
            UPDATE service_tickets \
            SET description = $2, \
                emergency = $3, \
                date_completed = $4, \
                employee_id = $5, \
                customer_id = $6 \
            WHERE id = $1";

        self.0
            .execute(
                SQL,
                &[
                    &ticket.id,
                    &ticket.description,
                    &ticket.emergency,
                    &ticket.date_completed,
                    &ticket.employee,
                    &ticket.customer,
                ],
            )
            .await
            .map(drop)
    }

    pub(super) async fn delete_ticket_by_id(
        &self,
        id: Id,
    ) -> Result<bool, Error> {
        const SQL: &str = "DELETE FROM service_tickets WHERE id = $1";
        Ok(self.0.execute(SQL, &[&id]).await? > 0)
    }
}
