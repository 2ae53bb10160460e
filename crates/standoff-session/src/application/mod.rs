//! Application layer: session store, settings, command and query handlers.

pub mod command_handlers;
pub mod query_handlers;
pub mod settings;
pub mod store;
