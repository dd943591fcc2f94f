use std::error::Error as StdError;

use sha2::{Digest as _, Sha256};
use tokio_postgres::{
    types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    },
    Error, Row,
};

use super::Client;

#[derive(Clone, Debug)]
pub struct User {
    pub id: Id,
    pub login: String,
    pub password_hash: PasswordHash,
    pub first_name: String,
    pub last_name: String,

    /// Grants read access to every ticket.
    pub is_staff: bool,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

int_id!(Id);

/// Hex-encoded SHA-256 digest of a password.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(secret: &str) -> Self {
        Self(hex::encode(Sha256::digest(secret.as_bytes())))
    }
}

impl FromSql<'_> for PasswordHash {
    accepts!(TEXT, VARCHAR);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        String::from_sql(ty, raw).map(Self)
    }
}

impl ToSql for PasswordHash {
    accepts!(TEXT, VARCHAR);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.0.to_sql(ty, out)
    }
}

const COLUMNS: &str =
    "id, login, password_hash, first_name, last_name, is_staff";

fn from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        login: row.get("login"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        is_staff: row.get("is_staff"),
    }
}

impl Client {
    pub(super) async fn select_user_by_login(
        &self,
        login: &str,
    ) -> Result<Option<User>, Error> {
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM users \
             WHERE login = $1 \
             LIMIT 1"
        );
        Ok(self.0.query_opt(&sql, &[&login]).await?.as_ref().map(from_row))
    }

    pub(super) async fn select_user_by_id(
        &self,
        id: Id,
    ) -> Result<Option<User>, Error> {
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM users \
             WHERE id = $1 \
             LIMIT 1"
        );
        Ok(self.0.query_opt(&sql, &[&id]).await?.as_ref().map(from_row))
    }
}
