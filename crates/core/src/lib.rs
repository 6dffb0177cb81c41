//! Reelworks project fulfillment workflow core.
//!
//! - [`transitions`]: the status state machine and its guard table.
//! - [`revision`], [`payment`], [`assignment`]: the facts attached to a project.
//! - [`stats`]: dashboard aggregation.
//! - [`workflow::Workflow`]: the operation surface, over a [`store::WorkflowStore`].

pub mod assignment;
pub mod error;
pub mod memory;
pub mod notifications;
pub mod payment;
pub mod project;
pub mod revision;
pub mod roles;
pub mod stats;
pub mod status;
pub mod store;
pub mod transitions;
pub mod types;
pub mod workflow;

pub use error::CoreError;
pub use memory::MemoryStore;
pub use roles::{Actor, Role};
pub use workflow::{Workflow, WorkflowConfig};
