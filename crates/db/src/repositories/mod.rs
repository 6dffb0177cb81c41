//! Zero-sized repositories, one per table.
//!
//! Reads take the pool. Writes that belong to a project commit take a
//! connection so they run inside the caller's transaction.

pub mod assignment_repo;
pub mod identity_repo;
pub mod notification_repo;
pub mod package_repo;
pub mod payment_repo;
pub mod project_repo;
pub mod revision_repo;

pub use assignment_repo::AssignmentRepo;
pub use identity_repo::IdentityRepo;
pub use notification_repo::NotificationRepo;
pub use package_repo::PackageRepo;
pub use payment_repo::PaymentRepo;
pub use project_repo::ProjectRepo;
pub use revision_repo::RevisionRepo;
