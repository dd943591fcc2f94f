//! Service tickets as a resource: the five CRUD operations, visibility rules
//! and the joined representation returned to clients.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use derive_more::{Display, From};
use futures::{future::OptionFuture, FutureExt as _};
use itertools::Itertools as _;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::{
    api,
    db::{self, customer, employee, ticket, user, Storage},
};

/// Authenticated identity a request is made on behalf of.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Principal {
    pub user_id: user::Id,
    pub is_staff: bool,
}

impl From<&db::User> for Principal {
    fn from(user: &db::User) -> Self {
        Self {
            user_id: user.id,
            is_staff: user.is_staff,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ListFilter {
    /// `done` keeps completed tickets only. Other values, or none, keep all.
    /// Ignored for non-staff principals.
    pub status: Option<String>,
}

/// Collects query parameters. A repeated `status` keeps its last value,
/// unknown parameters are ignored.
impl FromIterator<(String, String)> for ListFilter {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(params: I) -> Self {
        Self {
            status: params
                .into_iter()
                .filter(|(key, _)| key == "status")
                .map(|(_, value)| value)
                .last(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewTicket {
    pub description: Option<String>,
    pub emergency: Option<bool>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct Assignment {
    pub employee: Option<employee::Id>,
}

#[async_trait]
pub trait TicketResource: Send + Sync {
    /// Staff see every ticket, anyone else only tickets of their own
    /// customer record.
    async fn list(
        &self,
        principal: &Principal,
        filter: &ListFilter,
    ) -> Result<Vec<api::Ticket>, Error>;

    async fn retrieve(
        &self,
        principal: &Principal,
        id: ticket::Id,
    ) -> Result<api::Ticket, Error>;

    /// Opens a ticket for the principal's customer record.
    async fn create(
        &self,
        principal: &Principal,
        input: NewTicket,
    ) -> Result<api::Ticket, Error>;

    /// Assigns an employee to the ticket, replacing any previous one.
    async fn update(
        &self,
        principal: &Principal,
        id: ticket::Id,
        input: Assignment,
    ) -> Result<(), Error>;

    async fn destroy(
        &self,
        principal: &Principal,
        id: ticket::Id,
    ) -> Result<(), Error>;
}

/// [`TicketResource`] over a [`Storage`].
pub struct Tickets {
    storage: Arc<dyn Storage>,
}

impl Tickets {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    async fn represent(
        &self,
        ticket: db::Ticket,
    ) -> Result<api::Ticket, Error> {
        use Error as E;

        let storage = &self.storage;
        let customer_id = ticket.customer;

        let customer = async move {
            storage
                .get_customer_by_id(customer_id)
                .await?
                .ok_or(E::DanglingCustomer(customer_id))
        };
        let employee =
            OptionFuture::from(ticket.employee.map(|id| async move {
                storage
                    .get_employee_by_id(id)
                    .await?
                    .ok_or(E::DanglingEmployee(id))
            }))
            .map(Option::transpose);
        let (customer, employee) = tokio::try_join!(customer, employee)?;

        Ok(api::Ticket::new(ticket, employee, customer))
    }

    async fn represent_all(
        &self,
        tickets: Vec<db::Ticket>,
    ) -> Result<Vec<api::Ticket>, Error> {
        use Error as E;

        let customer_ids = tickets
            .iter()
            .map(|ticket| ticket.customer)
            .unique()
            .collect::<Vec<_>>();
        let employee_ids = tickets
            .iter()
            .filter_map(|ticket| ticket.employee)
            .unique()
            .collect::<Vec<_>>();
        let (customers, employees) = tokio::try_join!(
            self.storage.get_customers_by_ids(&customer_ids),
            self.storage.get_employees_by_ids(&employee_ids),
        )?;

        tickets
            .into_iter()
            .map(|ticket| {
                let customer = customers
                    .get(&ticket.customer)
                    .cloned()
                    .ok_or(E::DanglingCustomer(ticket.customer))?;
                let employee = ticket
                    .employee
                    .map(|id| {
                        employees
                            .get(&id)
                            .cloned()
                            .ok_or(E::DanglingEmployee(id))
                    })
                    .transpose()?;
                Ok::<_, E>(api::Ticket::new(ticket, employee, customer))
            })
            .collect()
    }
}

#[async_trait]
impl TicketResource for Tickets {
    async fn list(
        &self,
        principal: &Principal,
        filter: &ListFilter,
    ) -> Result<Vec<api::Ticket>, Error> {
        let filter = if principal.is_staff {
            match filter.status.as_deref() {
                Some("done") => ticket::Filter::Completed,
                _ => ticket::Filter::All,
            }
        } else {
            match self.storage.get_customer_by_user(principal.user_id).await? {
                Some(customer) => ticket::Filter::OwnedBy(customer.id),
                None => {
                    debug!(user = %principal.user_id, "no customer record");
                    return Ok(Vec::new());
                }
            }
        };

        let tickets = self.storage.get_tickets(filter).await?;
        debug!(?filter, count = tickets.len(), "listing tickets");
        self.represent_all(tickets).await
    }

    async fn retrieve(
        &self,
        _: &Principal,
        id: ticket::Id,
    ) -> Result<api::Ticket, Error> {
        let ticket = self
            .storage
            .get_ticket_by_id(id)
            .await?
            .ok_or(Error::TicketNotFound(id))?;
        self.represent(ticket).await
    }

    async fn create(
        &self,
        principal: &Principal,
        input: NewTicket,
    ) -> Result<api::Ticket, Error> {
        use Error as E;

        let description =
            input.description.ok_or(E::MissingField("description"))?;
        let emergency =
            input.emergency.ok_or(E::MissingField("emergency"))?;

        let customer = self
            .storage
            .get_customer_by_user(principal.user_id)
            .await?
            .ok_or(E::NoLinkedCustomer)?;

        let ticket = self
            .storage
            .insert_ticket(&ticket::New {
                description,
                emergency,
                customer: customer.id,
            })
            .await?;
        info!(ticket = %ticket.id, customer = %customer.id, "ticket created");

        // The new ticket has no employee yet.
        Ok(api::Ticket::new(ticket, None, customer))
    }

    async fn update(
        &self,
        principal: &Principal,
        id: ticket::Id,
        input: Assignment,
    ) -> Result<(), Error> {
        use Error as E;

        let employee_id =
            input.employee.ok_or(E::MissingField("employee"))?;

        let mut ticket = self
            .storage
            .get_ticket_by_id(id)
            .await?
            .ok_or(E::TicketNotFound(id))?;
        let employee = self
            .storage
            .get_employee_by_id(employee_id)
            .await?
            .ok_or(E::EmployeeNotFound(employee_id))?;

        ticket.employee = Some(employee.id);
        self.storage.write_ticket(&ticket).await?;
        info!(
            ticket = %id,
            employee = %employee.id,
            user = %principal.user_id,
            "employee assigned",
        );

        Ok(())
    }

    async fn destroy(
        &self,
        principal: &Principal,
        id: ticket::Id,
    ) -> Result<(), Error> {
        if !self.storage.delete_ticket(id).await? {
            return Err(Error::TicketNotFound(id));
        }
        info!(ticket = %id, user = %principal.user_id, "ticket deleted");
        Ok(())
    }
}

#[derive(Debug, Display, From)]
pub enum Error {
    #[from]
    #[display("storage failure: {_0}")]
    DbError(db::Error),

    #[display("ticket references missing customer {_0}")]
    DanglingCustomer(customer::Id),

    #[display("ticket references missing employee {_0}")]
    DanglingEmployee(employee::Id),

    #[display("employee {_0} not found")]
    EmployeeNotFound(employee::Id),

    #[display("`{_0}` is required")]
    MissingField(&'static str),

    #[display("principal has no customer record")]
    NoLinkedCustomer,

    #[display("ticket {_0} not found")]
    TicketNotFound(ticket::Id),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::MissingField(_) | Self::NoLinkedCustomer => {
                StatusCode::BAD_REQUEST
            }
            Self::EmployeeNotFound(_) | Self::TicketNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::DbError(_)
            | Self::DanglingCustomer(_)
            | Self::DanglingEmployee(_) => {
                error!(error = %self, "failed to handle ticket request");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
        .into_response()
    }
}
