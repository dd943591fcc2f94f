use std::collections::HashMap;

use tokio_postgres::{Error, Row};

use super::{user, Client};

#[derive(Clone, Debug)]
pub struct Employee {
    pub id: Id,
    pub user: user::Id,
    pub specialty: String,
    pub full_name: String,
}

int_id!(Id);

const SELECT: &str = "\
    SELECT e.id, e.user_id, e.specialty, \
           u.first_name || ' ' || u.last_name AS full_name \
    FROM employees e \
    JOIN users u ON u.id = e.user_id";

fn from_row(row: &Row) -> Employee {
    Employee {
        id: row.get("id"),
        user: row.get("user_id"),
        specialty: row.get("specialty"),
        full_name: row.get("full_name"),
    }
}

impl Client {
    pub(super) async fn select_employee_by_id(
        &self,
        id: Id,
    ) -> Result<Option<Employee>, Error> {
        let sql = format!("{SELECT} WHERE e.id = $1");
        Ok(self.0.query_opt(&sql, &[&id]).await?.as_ref().map(from_row))
    }

    pub(super) async fn select_employees_by_ids(
        &self,
        ids: &[Id],
    ) -> Result<HashMap<Id, Employee>, Error> {
        let sql =
            format!("{SELECT} WHERE e.id IN (SELECT unnest($1::INT4[]))");
        Ok(self
            .0
            .query(&sql, &[&ids])
            .await?
            .iter()
            .map(from_row)
            .map(|employee| (employee.id, employee))
            .collect())
    }
}
