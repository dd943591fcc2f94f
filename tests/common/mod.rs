use std::{sync::Arc, time::Duration};

use repairs_api::{
    api, config,
    db::{self, customer, employee, memory, ticket, user},
    http,
};
use reqwest::StatusCode;
use serde_json::{json, Value};
use time::macros::datetime;
use tokio::net::TcpListener;

/// Application served on an ephemeral port over an in-memory store.
///
/// Users (all with password `password`):
/// - `alice`, customer 1;
/// - `bob`, customer 2, owns completed ticket 1 handled by employee 1;
/// - `ghost`, neither customer nor staff;
/// - `carol`, `dave` and `erin`, staff and employees 1, 2 and 3.
pub struct Server {
    base_url: String,
}

impl Server {
    pub async fn start() -> Self {
        let app = http::router(
            Arc::new(fixture()),
            &config::Http {
                server: config::Server {
                    addr: ([127, 0, 0, 1], 0).into(),
                },
                cors: config::Cors::default(),
            },
            &config::Jwt {
                secret: "test-secret".into(),
                expiration_time: Duration::from_secs(60 * 60),
            },
        )
        .expect("failed to build router");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind");
        let addr = listener.local_addr().expect("failed to get address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server failed");
        });

        Self {
            base_url: format!("http://{addr}"),
        }
    }

    pub fn client(&self) -> Client {
        Client {
            inner: reqwest::Client::new(),
            base_url: self.base_url.clone(),
            auth_token: None,
        }
    }
}

fn fixture() -> memory::Storage {
    let users = [
        (1, "alice", "Alice", "Smith", false),
        (2, "bob", "Bob", "Jones", false),
        (3, "ghost", "Casper", "Ghost", false),
        (4, "carol", "Carol", "White", true),
        (5, "dave", "Dave", "Brown", true),
        (6, "erin", "Erin", "Moss", true),
    ]
    .map(|(id, login, first_name, last_name, is_staff)| db::User {
        id: user::Id::from(id),
        login: login.into(),
        password_hash: user::PasswordHash::new("password"),
        first_name: first_name.into(),
        last_name: last_name.into(),
        is_staff,
    });

    let storage = memory::Storage::new();
    for (id, user, address) in
        [(1, 0, "100 Main St"), (2, 1, "200 Oak Ave")]
    {
        storage.put_customer(db::Customer {
            id: customer::Id::from(id),
            user: users[user].id,
            address: address.into(),
            full_name: users[user].full_name(),
        });
    }
    for (id, user, specialty) in
        [(1, 3, "Plumbing"), (2, 4, "Electrical"), (3, 5, "Carpentry")]
    {
        storage.put_employee(db::Employee {
            id: employee::Id::from(id),
            user: users[user].id,
            specialty: specialty.into(),
            full_name: users[user].full_name(),
        });
    }
    storage.put_ticket(db::Ticket {
        id: ticket::Id::from(1),
        description: "Broken heater".into(),
        emergency: true,
        date_completed: Some(datetime!(2024-01-15 09:00 UTC)),
        employee: Some(employee::Id::from(1)),
        customer: customer::Id::from(2),
    });
    for user in users {
        storage.put_user(user);
    }
    storage
}

pub struct Client {
    inner: reqwest::Client,
    base_url: String,
    pub auth_token: Option<String>,
}

impl Client {
    pub async fn auth(mut self, login: &str, password: &str) -> Self {
        self.auth_token = Some(
            self.try_auth(login, password)
                .await
                .expect("wrong status code"),
        );
        self
    }

    pub async fn try_auth(
        &self,
        login: &str,
        password: &str,
    ) -> Result<String, StatusCode> {
        Ok(self
            .inner
            .post(format!("{}/auth", self.base_url))
            .json(&json!({
                "login": login,
                "password": password,
            }))
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .text()
            .await
            .expect("failed to get a response"))
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> reqwest::RequestBuilder {
        let mut req =
            self.inner.request(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        req
    }

    pub async fn get_tickets(
        &self,
        status: Option<&str>,
    ) -> Result<Vec<api::Ticket>, StatusCode> {
        match status {
            Some(status) => self.get_tickets_query(&[("status", status)]).await,
            None => self.get_tickets_query(&[]).await,
        }
    }

    /// Lists tickets with the given query parameters, repeated keys included.
    pub async fn get_tickets_query(
        &self,
        params: &[(&str, &str)],
    ) -> Result<Vec<api::Ticket>, StatusCode> {
        Ok(self
            .request(reqwest::Method::GET, "/tickets")
            .query(params)
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<Vec<api::Ticket>>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn get_ticket(
        &self,
        id: api::ticket::Id,
    ) -> Result<api::Ticket, StatusCode> {
        Ok(self
            .request(reqwest::Method::GET, &format!("/tickets/{id}"))
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::Ticket>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn add_ticket(
        &self,
        description: &str,
        emergency: bool,
    ) -> Result<api::Ticket, StatusCode> {
        let (status, ticket) = self
            .add_ticket_json(json!({
                "description": description,
                "emergency": emergency,
            }))
            .await?;
        assert_eq!(status, StatusCode::CREATED);
        Ok(serde_json::from_value(ticket).expect("malformed ticket"))
    }

    /// Posts an arbitrary body, returning the raw representation.
    pub async fn add_ticket_json(
        &self,
        body: Value,
    ) -> Result<(StatusCode, Value), StatusCode> {
        let res = self
            .request(reqwest::Method::POST, "/tickets")
            .json(&body)
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?;
        let status = res.status();
        let body = res
            .json::<Value>()
            .await
            .expect("failed to get a response");
        Ok((status, body))
    }

    pub async fn assign_employee(
        &self,
        id: api::ticket::Id,
        employee: i32,
    ) -> Result<(), StatusCode> {
        self.update_ticket_json(id, json!({ "employee": employee }))
            .await
    }

    pub async fn update_ticket_json(
        &self,
        id: api::ticket::Id,
        body: Value,
    ) -> Result<(), StatusCode> {
        let res = self
            .request(reqwest::Method::PUT, &format!("/tickets/{id}"))
            .json(&body)
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        let body = res.bytes().await.expect("failed to get a response");
        assert!(body.is_empty());
        Ok(())
    }

    pub async fn delete_ticket(
        &self,
        id: api::ticket::Id,
    ) -> Result<(), StatusCode> {
        let res = self
            .request(reqwest::Method::DELETE, &format!("/tickets/{id}"))
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        Ok(())
    }
}
