// BpTracker Data
// This crate owns persistence: stored models, the key-value port and the record store

// Database connection management
pub mod database;

// Record store and storage backends
pub mod repository;

// Data storage models
pub mod models;
