//! Belle
//!
//! Storefront core for Belle Parfumerie: catalog filtering and ordering, a tiered-price
//! shopping cart with decant rules, sliding-expiry cart persistence and the `WhatsApp`
//! checkout hand-off.

pub mod cart;
pub mod catalog;
pub mod config;
pub mod fixtures;
pub mod observability;
pub mod prices;
pub mod pricing;
pub mod products;
pub mod storage;
