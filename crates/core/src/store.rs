//! Persistence seam for the workflow service.
//!
//! Every project mutation goes through [`WorkflowStore::commit`] as a single
//! [`ProjectCommit`]: a compare-and-swap on the `(status, updated_at)` pair
//! observed at read time plus every attached fact written with it. A store
//! must apply all of it or none of it, and must answer a stale expectation
//! or a lock it cannot take in bounded time with [`CoreError::Contention`].
//!
//! Payment appends are the exception: they never take the project lock.

use async_trait::async_trait;

use crate::assignment::{Assignment, NewAssignment};
use crate::error::CoreError;
use crate::payment::{NewPayment, Payment};
use crate::project::{NewProject, Package, Project};
use crate::revision::{NewRevision, Revision, RevisionResolution};
use crate::roles::Identity;
use crate::status::ProjectStatus;
use crate::types::{DbId, Timestamp};

/// Narrows a project listing. `None` fields do not filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub client_id: Option<DbId>,
    pub assigned_to: Option<DbId>,
}

impl ProjectFilter {
    pub fn client(client_id: DbId) -> Self {
        Self {
            client_id: Some(client_id),
            ..Self::default()
        }
    }

    pub fn assigned_to(editor_id: DbId) -> Self {
        Self {
            assigned_to: Some(editor_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, project: &Project) -> bool {
        self.client_id.map_or(true, |id| project.client_id == id)
            && self
                .assigned_to
                .map_or(true, |id| project.assigned_to == Some(id))
    }
}

/// One atomic project mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCommit {
    pub project_id: DbId,
    pub expected_status: ProjectStatus,
    pub expected_updated_at: Timestamp,
    /// The full row after the mutation.
    pub project: Project,
    pub new_revision: Option<NewRevision>,
    pub resolution: Option<RevisionResolution>,
    /// Supersedes whatever assignment is currently active.
    pub new_assignment: Option<NewAssignment>,
}

impl ProjectCommit {
    pub fn new(current: &Project, next: Project) -> Self {
        Self {
            project_id: current.id,
            expected_status: current.status,
            expected_updated_at: current.updated_at,
            project: next,
            new_revision: None,
            resolution: None,
            new_assignment: None,
        }
    }

    pub fn with_revision(mut self, revision: NewRevision) -> Self {
        self.new_revision = Some(revision);
        self
    }

    pub fn with_resolution(mut self, resolution: Option<RevisionResolution>) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_assignment(mut self, assignment: NewAssignment) -> Self {
        self.new_assignment = Some(assignment);
        self
    }

    /// Whether the stored row still matches what this commit was planned against.
    pub fn expects(&self, stored: &Project) -> bool {
        stored.status == self.expected_status && stored.updated_at == self.expected_updated_at
    }

    pub fn stale(&self) -> CoreError {
        CoreError::Contention {
            project_id: self.project_id,
        }
    }
}

/// What a successful commit wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub project: Project,
    pub revision: Option<Revision>,
    pub resolved: Option<Revision>,
    pub assignment: Option<Assignment>,
}

#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn ping(&self) -> Result<(), CoreError>;

    async fn find_package(&self, id: DbId) -> Result<Option<Package>, CoreError>;

    async fn find_identity(&self, id: DbId) -> Result<Option<Identity>, CoreError>;

    async fn insert_project(&self, project: NewProject) -> Result<Project, CoreError>;

    async fn find_project(&self, id: DbId) -> Result<Option<Project>, CoreError>;

    /// Committed projects matching `filter`, ordered by id.
    async fn list_projects(&self, filter: ProjectFilter) -> Result<Vec<Project>, CoreError>;

    async fn find_revision(&self, id: DbId) -> Result<Option<Revision>, CoreError>;

    async fn list_revisions(&self, project_id: DbId) -> Result<Vec<Revision>, CoreError>;

    async fn list_assignments(&self, project_id: DbId) -> Result<Vec<Assignment>, CoreError>;

    async fn append_payment(&self, payment: NewPayment) -> Result<Payment, CoreError>;

    async fn list_payments(&self, project_id: DbId) -> Result<Vec<Payment>, CoreError>;

    /// Payments of one client's projects, or of every project when `None`.
    async fn list_payments_for_client(
        &self,
        client_id: Option<DbId>,
    ) -> Result<Vec<Payment>, CoreError>;

    async fn commit(&self, commit: ProjectCommit) -> Result<CommitOutcome, CoreError>;
}
