//! # dbx Core
//!
//! Shared plumbing for every dbx operation:
//!
//! - [`ToolCommand`]: runs a vendor executable found on `PATH` with a timeout,
//!   captured stderr and environment scoped to the child process.
//! - [`ToolError`]: the missing-tool / failed-tool / timeout error family that
//!   every backup, restore and upload path reports.
//! - [`OperationReport`]: the structured record emitted after each operation.

pub mod error;
pub mod hints;
pub mod process;
pub mod report;

pub use error::ToolError;
pub use hints::install_hint;
pub use process::{is_available, locate, ToolCommand, ToolOutput, DEFAULT_TOOL_TIMEOUT};
pub use report::{format_duration, OperationReport, OperationStatus, PendingOperation};
