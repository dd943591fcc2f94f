/// Declares an `INT4`-backed identifier newtype.
macro_rules! int_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            Debug,
            ::serde::Deserialize,
            ::derive_more::Display,
            Eq,
            Hash,
            Ord,
            PartialEq,
            PartialOrd,
            ::serde::Serialize,
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            pub const fn new(value: i32) -> Self {
                Self(value)
            }
        }

        impl From<i32> for $name {
            fn from(value: i32) -> Self {
                Self::new(value)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl ::tokio_postgres::types::FromSql<'_> for $name {
            ::tokio_postgres::types::accepts!(INT4);

            fn from_sql(
                ty: &::tokio_postgres::types::Type,
                raw: &[u8],
            ) -> Result<Self, Box<dyn ::std::error::Error + Sync + Send>> {
                <i32 as ::tokio_postgres::types::FromSql>::from_sql(ty, raw)
                    .map(Self)
            }
        }

        impl ::tokio_postgres::types::ToSql for $name {
            ::tokio_postgres::types::accepts!(INT4);

            ::tokio_postgres::types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &::tokio_postgres::types::Type,
                out: &mut ::tokio_postgres::types::private::BytesMut,
            ) -> Result<
                ::tokio_postgres::types::IsNull,
                Box<dyn ::std::error::Error + Sync + Send>,
            > {
                ::tokio_postgres::types::ToSql::to_sql(&self.0, ty, out)
            }
        }
    };
}

pub mod customer;
pub mod employee;
pub mod memory;
pub mod ticket;
pub mod user;

use std::collections::HashMap;

use async_trait::async_trait;
use tokio_postgres::{tls::NoTlsStream, NoTls, Socket};

use crate::config;

pub use tokio_postgres::Error;

pub use self::{
    customer::Customer, employee::Employee, ticket::Ticket, user::User,
};

pub type Connection = tokio_postgres::Connection<Socket, NoTlsStream>;

pub async fn connect(
    config: config::Db,
) -> Result<(Client, Connection), Error> {
    tokio_postgres::connect(&config.url, NoTls)
        .await
        .map(|(client, connection)| (Client(client), connection))
}

/// PostgreSQL-backed [`Storage`].
pub struct Client(tokio_postgres::Client);

/// Record-level access to users, customers, employees and tickets.
///
/// Implementations never enforce visibility rules, callers do.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_user_by_login(
        &self,
        login: &str,
    ) -> Result<Option<User>, Error>;

    async fn get_user_by_id(&self, id: user::Id)
        -> Result<Option<User>, Error>;

    async fn get_customer_by_id(
        &self,
        id: customer::Id,
    ) -> Result<Option<Customer>, Error>;

    async fn get_customer_by_user(
        &self,
        user: user::Id,
    ) -> Result<Option<Customer>, Error>;

    async fn get_customers_by_ids(
        &self,
        ids: &[customer::Id],
    ) -> Result<HashMap<customer::Id, Customer>, Error>;

    async fn get_employee_by_id(
        &self,
        id: employee::Id,
    ) -> Result<Option<Employee>, Error>;

    async fn get_employees_by_ids(
        &self,
        ids: &[employee::Id],
    ) -> Result<HashMap<employee::Id, Employee>, Error>;

    async fn get_tickets(
        &self,
        filter: ticket::Filter,
    ) -> Result<Vec<Ticket>, Error>;

    async fn get_ticket_by_id(
        &self,
        id: ticket::Id,
    ) -> Result<Option<Ticket>, Error>;

    /// Persists a new ticket, assigning its id.
    async fn insert_ticket(&self, ticket: &ticket::New)
        -> Result<Ticket, Error>;

    async fn write_ticket(&self, ticket: &Ticket) -> Result<(), Error>;

    /// Returns `false` if there was no ticket with the given id.
    async fn delete_ticket(&self, id: ticket::Id) -> Result<bool, Error>;
}

#[async_trait]
impl Storage for Client {
    async fn get_user_by_login(
        &self,
        login: &str,
    ) -> Result<Option<User>, Error> {
        self.select_user_by_login(login).await
    }

    async fn get_user_by_id(
        &self,
        id: user::Id,
    ) -> Result<Option<User>, Error> {
        self.select_user_by_id(id).await
    }

    async fn get_customer_by_id(
        &self,
        id: customer::Id,
    ) -> Result<Option<Customer>, Error> {
        self.select_customer_by_id(id).await
    }

    async fn get_customer_by_user(
        &self,
        user: user::Id,
    ) -> Result<Option<Customer>, Error> {
        self.select_customer_by_user(user).await
    }

    async fn get_customers_by_ids(
        &self,
        ids: &[customer::Id],
    ) -> Result<HashMap<customer::Id, Customer>, Error> {
        self.select_customers_by_ids(ids).await
    }

    async fn get_employee_by_id(
        &self,
        id: employee::Id,
    ) -> Result<Option<Employee>, Error> {
        self.select_employee_by_id(id).await
    }

    async fn get_employees_by_ids(
        &self,
        ids: &[employee::Id],
    ) -> Result<HashMap<employee::Id, Employee>, Error> {
        self.select_employees_by_ids(ids).await
    }

    async fn get_tickets(
        &self,
        filter: ticket::Filter,
    ) -> Result<Vec<Ticket>, Error> {
        self.select_tickets(filter).await
    }

    async fn get_ticket_by_id(
        &self,
        id: ticket::Id,
    ) -> Result<Option<Ticket>, Error> {
        self.select_ticket_by_id(id).await
    }

    async fn insert_ticket(
        &self,
        ticket: &ticket::New,
    ) -> Result<Ticket, Error> {
        self.insert_new_ticket(ticket).await
    }

    async fn write_ticket(&self, ticket: &Ticket) -> Result<(), Error> {
        self.update_ticket(ticket).await
    }

    async fn delete_ticket(&self, id: ticket::Id) -> Result<bool, Error> {
        self.delete_ticket_by_id(id).await
    }
}
