//! Thin HTTP adapters over [`reelworks_core::Workflow`]. Authorization and
//! validation live in the workflow; handlers only decode and encode.

pub mod assignment;
pub mod payment;
pub mod project;
pub mod revision;
pub mod stats;
