// src/application/commands/mod.rs
//
// Command Handlers
//
// ARCHITECTURE:
// - Commands are thin adapters between the chooser UI and the resolver
// - Commands accept DTOs, return DTOs
// - Commands convert AppError into ErrorResponse
// - Commands NEVER contain business logic

pub mod resolve_commands;
pub mod settings_commands;

pub use resolve_commands::*;
pub use settings_commands::*;
