//! In-process [`Storage`](super::Storage), seeded directly by tests.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;

use super::{
    customer, employee, ticket, user, Customer, Employee, Error, Ticket, User,
};

#[derive(Default)]
pub struct Storage(Mutex<Tables>);

#[derive(Default)]
struct Tables {
    users: BTreeMap<user::Id, User>,
    customers: BTreeMap<customer::Id, Customer>,
    employees: BTreeMap<employee::Id, Employee>,
    tickets: BTreeMap<ticket::Id, Ticket>,
    last_ticket_id: i32,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // Every mutation is a single map operation, so poisoning is harmless.
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn put_user(&self, user: User) -> &Self {
        self.tables().users.insert(user.id, user);
        self
    }

    pub fn put_customer(&self, customer: Customer) -> &Self {
        self.tables().customers.insert(customer.id, customer);
        self
    }

    pub fn put_employee(&self, employee: Employee) -> &Self {
        self.tables().employees.insert(employee.id, employee);
        self
    }

    /// Stores a ticket as is, so fixtures may carry a completion date.
    pub fn put_ticket(&self, ticket: Ticket) -> &Self {
        let mut tables = self.tables();
        let id = i32::from(ticket.id);
        tables.last_ticket_id = tables.last_ticket_id.max(id);
        tables.tickets.insert(ticket.id, ticket);
        self
    }
}

#[async_trait]
impl super::Storage for Storage {
    async fn get_user_by_login(
        &self,
        login: &str,
    ) -> Result<Option<User>, Error> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|u| u.login == login)
            .cloned())
    }

    async fn get_user_by_id(
        &self,
        id: user::Id,
    ) -> Result<Option<User>, Error> {
        Ok(self.tables().users.get(&id).cloned())
    }

    async fn get_customer_by_id(
        &self,
        id: customer::Id,
    ) -> Result<Option<Customer>, Error> {
        Ok(self.tables().customers.get(&id).cloned())
    }

    async fn get_customer_by_user(
        &self,
        user: user::Id,
    ) -> Result<Option<Customer>, Error> {
        Ok(self
            .tables()
            .customers
            .values()
            .find(|c| c.user == user)
            .cloned())
    }

    async fn get_customers_by_ids(
        &self,
        ids: &[customer::Id],
    ) -> Result<HashMap<customer::Id, Customer>, Error> {
        let tables = self.tables();
        Ok(ids
            .iter()
            .filter_map(|id| tables.customers.get(id))
            .map(|c| (c.id, c.clone()))
            .collect())
    }

    async fn get_employee_by_id(
        &self,
        id: employee::Id,
    ) -> Result<Option<Employee>, Error> {
        Ok(self.tables().employees.get(&id).cloned())
    }

    async fn get_employees_by_ids(
        &self,
        ids: &[employee::Id],
    ) -> Result<HashMap<employee::Id, Employee>, Error> {
        let tables = self.tables();
        Ok(ids
            .iter()
            .filter_map(|id| tables.employees.get(id))
            .map(|e| (e.id, e.clone()))
            .collect())
    }

    async fn get_tickets(
        &self,
        filter: ticket::Filter,
    ) -> Result<Vec<Ticket>, Error> {
        Ok(self
            .tables()
            .tickets
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    async fn get_ticket_by_id(
        &self,
        id: ticket::Id,
    ) -> Result<Option<Ticket>, Error> {
        Ok(self.tables().tickets.get(&id).cloned())
    }

    async fn insert_ticket(
        &self,
        new: &ticket::New,
    ) -> Result<Ticket, Error> {
        let mut tables = self.tables();
        tables.last_ticket_id += 1;
        let ticket = Ticket {
            id: ticket::Id::from(tables.last_ticket_id),
            description: new.description.clone(),
            emergency: new.emergency,
            date_completed: None,
            employee: None,
            customer: new.customer,
        };
        tables.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn write_ticket(&self, ticket: &Ticket) -> Result<(), Error> {
        // Like an SQL `UPDATE`, writing a missing ticket is a no-op.
        if let Some(stored) = self.tables().tickets.get_mut(&ticket.id) {
            *stored = ticket.clone();
        }
        Ok(())
    }

    async fn delete_ticket(&self, id: ticket::Id) -> Result<bool, Error> {
        Ok(self.tables().tickets.remove(&id).is_some())
    }
}
