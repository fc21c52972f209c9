// Campus marketplace backend: REST API over a relational store.

pub mod app_state;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod models;
pub mod repo;
pub mod routes;
pub mod seed;

pub use error::{AppError, AppResult};
