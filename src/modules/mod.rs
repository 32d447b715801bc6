//! Modules layer - Infrastructure components for external integrations
//!
//! Contains the adapters for collaborators the services depend on, such as
//! blob storage.

pub mod storage;
