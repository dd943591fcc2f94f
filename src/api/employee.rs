use serde::{Deserialize, Serialize};

use crate::db;

pub use crate::db::employee::Id;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Employee {
    pub id: Id,
    pub specialty: String,
    pub full_name: String,
}

impl From<db::Employee> for Employee {
    fn from(employee: db::Employee) -> Self {
        Self {
            id: employee.id,
            specialty: employee.specialty,
            full_name: employee.full_name,
        }
    }
}
