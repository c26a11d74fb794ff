//! Text tools for conversational agents.
//!
//! Each tool takes free-text input and returns text meant to be shown to a
//! user. Failures are rendered as text too; see [`render_error`].

mod context;
mod eda;
mod fiscal;
mod registry;

pub use context::{DataContext, ValidationCache};
pub use registry::{render_error, Domain, FunctionTool, Tool, ToolHandler, ToolRegistry, ToolSession};
