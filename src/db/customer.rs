use std::collections::HashMap;

use tokio_postgres::{Error, Row};

use super::{user, Client};

#[derive(Clone, Debug)]
pub struct Customer {
    pub id: Id,
    pub user: user::Id,
    pub address: String,
    pub full_name: String,
}

int_id!(Id);

const SELECT: &str = "\
    SELECT c.id, c.user_id, c.address, \
           u.first_name || ' ' || u.last_name AS full_name \
    FROM customers c \
    JOIN users u ON u.id = c.user_id";

fn from_row(row: &Row) -> Customer {
    Customer {
        id: row.get("id"),
        user: row.get("user_id"),
        address: row.get("address"),
        full_name: row.get("full_name"),
    }
}

impl Client {
    pub(super) async fn select_customer_by_id(
        &self,
        id: Id,
    ) -> Result<Option<Customer>, Error> {
        let sql = format!("{SELECT} WHERE c.id = $1");
        Ok(self.0.query_opt(&sql, &[&id]).await?.as_ref().map(from_row))
    }

    pub(super) async fn select_customer_by_user(
        &self,
        user: user::Id,
    ) -> Result<Option<Customer>, Error> {
        let sql = format!("{SELECT} WHERE c.user_id = $1 LIMIT 1");
        Ok(self.0.query_opt(&sql, &[&user]).await?.as_ref().map(from_row))
    }

    pub(super) async fn select_customers_by_ids(
        &self,
        ids: &[Id],
    ) -> Result<HashMap<Id, Customer>, Error> {
        let sql =
            format!("{SELECT} WHERE c.id IN (SELECT unnest($1::INT4[]))");
        Ok(self
            .0
            .query(&sql, &[&ids])
            .await?
            .iter()
            .map(from_row)
            .map(|customer| (customer.id, customer))
            .collect())
    }
}
