// src/application/mod.rs
//
// Application Layer
//
// ARCHITECTURE:
// - Boundary between a front-end (chooser sheet, CLI) and the services
// - Builds the object graph once (ResolverState)
// - Translates between DTOs and domain results

pub mod commands;
pub mod dto;
pub mod error_handling;
pub mod state;

pub use commands::*;
pub use dto::*;
pub use error_handling::{ErrorResponse, ErrorType, ToErrorResponse};
pub use state::{NetworkOptions, ResolverState};
