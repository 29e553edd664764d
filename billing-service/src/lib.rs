//! billing-service: recurring subscriptions and the ledger they charge into.

pub mod config;
pub mod errors;
pub mod models;
pub mod repositories;
pub mod services;
pub mod specifications;
pub mod startup;
