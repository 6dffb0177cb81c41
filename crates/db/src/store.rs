//! Postgres implementation of [`WorkflowStore`].
//!
//! A commit runs in one transaction: the project row is taken with
//! `SELECT ... FOR UPDATE` under a `lock_timeout`, the expectation is
//! checked, and every attached fact is written before the row itself.

use std::time::Duration;

use async_trait::async_trait;
use reelworks_core::assignment::Assignment;
use reelworks_core::error::CoreError;
use reelworks_core::memory::DEFAULT_LOCK_WAIT;
use reelworks_core::payment::{NewPayment, Payment};
use reelworks_core::project::{NewProject, Package, Project};
use reelworks_core::revision::Revision;
use reelworks_core::roles::Identity;
use reelworks_core::store::{CommitOutcome, ProjectCommit, ProjectFilter, WorkflowStore};
use reelworks_core::types::DbId;
use sqlx::PgPool;

use crate::error::{classify, internal};
use crate::repositories::{
    AssignmentRepo, IdentityRepo, PackageRepo, PaymentRepo, ProjectRepo, RevisionRepo,
};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    lock_wait: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_wait: DEFAULT_LOCK_WAIT,
        }
    }

    /// Bound on how long a commit waits for the project row lock.
    pub fn with_lock_wait(mut self, lock_wait: Duration) -> Self {
        self.lock_wait = lock_wait;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn commit_in_tx(&self, commit: ProjectCommit) -> Result<CommitOutcome, CoreError> {
        let project_id = commit.project_id;
        let db = |err: sqlx::Error| classify(err, Some(project_id));

        let mut tx = self.pool.begin().await.map_err(db)?;

        // SET does not accept bind parameters.
        let timeout = format!("SET LOCAL lock_timeout = '{}ms'", self.lock_wait.as_millis());
        sqlx::query(&timeout).execute(&mut *tx).await.map_err(db)?;

        let stored: Project = ProjectRepo::lock_for_update(&mut tx, project_id)
            .await
            .map_err(db)?
            .ok_or(CoreError::NotFound {
                entity: "project",
                id: project_id,
            })?
            .try_into()?;

        if !commit.expects(&stored) {
            return Err(commit.stale());
        }

        let resolved = match &commit.resolution {
            Some(resolution) => {
                let row = RevisionRepo::resolve(&mut tx, project_id, resolution)
                    .await
                    .map_err(db)?
                    .ok_or_else(|| commit.stale())?;
                Some(Revision::try_from(row)?)
            }
            None => None,
        };

        let revision = match &commit.new_revision {
            Some(new_revision) => {
                let row = RevisionRepo::create(&mut tx, new_revision).await.map_err(db)?;
                Some(Revision::try_from(row)?)
            }
            None => None,
        };

        let assignment = match &commit.new_assignment {
            Some(new_assignment) => {
                AssignmentRepo::supersede_active(&mut tx, project_id, new_assignment.assigned_at)
                    .await
                    .map_err(db)?;
                let row = AssignmentRepo::create(&mut tx, new_assignment)
                    .await
                    .map_err(db)?;
                Some(Assignment::from(row))
            }
            None => None,
        };

        let project: Project = ProjectRepo::update(&mut tx, &commit.project)
            .await
            .map_err(db)?
            .try_into()?;

        tx.commit().await.map_err(db)?;

        Ok(CommitOutcome {
            project,
            revision,
            resolved,
            assignment,
        })
    }
}

#[async_trait]
impl WorkflowStore for PgStore {
    async fn ping(&self) -> Result<(), CoreError> {
        crate::health_check(&self.pool).await.map_err(internal)
    }

    async fn find_package(&self, id: DbId) -> Result<Option<Package>, CoreError> {
        let row = PackageRepo::find_by_id(&self.pool, id)
            .await
            .map_err(internal)?;
        Ok(row.map(Package::from))
    }

    async fn find_identity(&self, id: DbId) -> Result<Option<Identity>, CoreError> {
        IdentityRepo::find_by_id(&self.pool, id)
            .await
            .map_err(internal)?
            .map(Identity::try_from)
            .transpose()
    }

    async fn insert_project(&self, project: NewProject) -> Result<Project, CoreError> {
        ProjectRepo::create(&self.pool, &project)
            .await
            .map_err(internal)?
            .try_into()
    }

    async fn find_project(&self, id: DbId) -> Result<Option<Project>, CoreError> {
        ProjectRepo::find_by_id(&self.pool, id)
            .await
            .map_err(internal)?
            .map(Project::try_from)
            .transpose()
    }

    async fn list_projects(&self, filter: ProjectFilter) -> Result<Vec<Project>, CoreError> {
        ProjectRepo::list(&self.pool, filter.client_id, filter.assigned_to)
            .await
            .map_err(internal)?
            .into_iter()
            .map(Project::try_from)
            .collect()
    }

    async fn find_revision(&self, id: DbId) -> Result<Option<Revision>, CoreError> {
        RevisionRepo::find_by_id(&self.pool, id)
            .await
            .map_err(internal)?
            .map(Revision::try_from)
            .transpose()
    }

    async fn list_revisions(&self, project_id: DbId) -> Result<Vec<Revision>, CoreError> {
        RevisionRepo::list_for_project(&self.pool, project_id)
            .await
            .map_err(internal)?
            .into_iter()
            .map(Revision::try_from)
            .collect()
    }

    async fn list_assignments(&self, project_id: DbId) -> Result<Vec<Assignment>, CoreError> {
        let rows = AssignmentRepo::list_for_project(&self.pool, project_id)
            .await
            .map_err(internal)?;
        Ok(rows.into_iter().map(Assignment::from).collect())
    }

    async fn append_payment(&self, payment: NewPayment) -> Result<Payment, CoreError> {
        PaymentRepo::create(&self.pool, &payment)
            .await
            .map_err(internal)?
            .try_into()
    }

    async fn list_payments(&self, project_id: DbId) -> Result<Vec<Payment>, CoreError> {
        PaymentRepo::list_for_project(&self.pool, project_id)
            .await
            .map_err(internal)?
            .into_iter()
            .map(Payment::try_from)
            .collect()
    }

    async fn list_payments_for_client(
        &self,
        client_id: Option<DbId>,
    ) -> Result<Vec<Payment>, CoreError> {
        PaymentRepo::list_for_client(&self.pool, client_id)
            .await
            .map_err(internal)?
            .into_iter()
            .map(Payment::try_from)
            .collect()
    }

    async fn commit(&self, commit: ProjectCommit) -> Result<CommitOutcome, CoreError> {
        let project_id = commit.project_id;
        let outcome = self.commit_in_tx(commit).await;
        if let Err(CoreError::Contention { .. }) = &outcome {
            tracing::debug!(project_id, "Project commit lost the race");
        }
        outcome
    }
}
