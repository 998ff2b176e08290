//! HTTP handlers. Thin adapters from the axum surface onto the services;
//! no transition logic lives here.

pub mod catalog;
pub mod health;
pub mod inventory;
pub mod orders;
pub mod purchase_orders;
