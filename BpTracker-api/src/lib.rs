// BpTracker-api lib.rs
//
// Local HTTP surface over the record store, import and analysis services.

pub mod api;
pub mod config;
pub mod entities;
pub mod openapi;
