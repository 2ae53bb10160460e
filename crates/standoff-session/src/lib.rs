//! Standoff — game session bounded context.
//!
//! Responsible for the per-player session state machine (stage, suspicion,
//! history, ending), the keyed session store, and the command and query
//! handlers the realtime channel calls into.

pub mod application;
pub mod domain;
