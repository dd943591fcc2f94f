pub mod api;
pub mod config;
pub mod db;
pub mod http;
pub mod resource;

pub use self::{
    config::Config,
    resource::{Principal, TicketResource, Tickets},
};
