// BpTracker Domain
// This crate contains the business logic for the BpTracker application

// Services that implement business logic
pub mod services;

// External text-generation collaborators
pub mod clients;

// Collaborator configuration
pub mod config;

// Domain entities
pub mod entities;

// Health checks and system status
pub mod health;

// Re-export the data crate for convenience
pub use bp_tracker_data as data;

// Testing utilities - available to dependents with the mock feature
#[cfg(any(test, feature = "mock"))]
pub mod testing;
