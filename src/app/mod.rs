//! Binary wiring: startup, command routing, and process exit mapping.

pub(crate) mod command_dispatcher;
pub(crate) mod context;
pub(crate) mod exit_handler;
pub(crate) mod runtime;
pub(crate) mod terminal;
