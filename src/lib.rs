//! cloudmark — a minimal bookmark manager client backed by a hosted data service.
//!
//! Users sign in against the service, then create, list, edit, and delete
//! bookmark records; a change-notification feed keeps the local list current.
//! This library crate exposes all modules for use by the RPC binary and the
//! integration tests.

pub mod app;
pub mod remote;
pub mod rpc_handler;
pub mod settings;
pub mod types;
pub mod views;
