pub mod auth;
pub mod configuration;
pub mod domain;
pub mod error;
pub mod listing;
pub mod logger;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod validators;
