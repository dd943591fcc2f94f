use serde::{Deserialize, Serialize};

use crate::db;

pub use crate::db::customer::Id;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Customer {
    pub id: Id,
    pub address: String,
    pub full_name: String,
}

impl From<db::Customer> for Customer {
    fn from(customer: db::Customer) -> Self {
        Self {
            id: customer.id,
            address: customer.address,
            full_name: customer.full_name,
        }
    }
}
