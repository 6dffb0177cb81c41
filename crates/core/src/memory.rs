//! In-process [`WorkflowStore`].
//!
//! Each project owns a `tokio::sync::RwLock` over its row, revisions and
//! assignment history, so writers on different projects never wait on each
//! other. Those locks are taken with a bounded wait and answer a timeout
//! with `Contention`.
//!
//! Project reads go through a committed snapshot that is swapped at the end
//! of every commit, so listings and stats never wait on a writer. Payment
//! logs sit behind short `parking_lot` locks that are never held across an
//! await.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::assignment::Assignment;
use crate::error::CoreError;
use crate::payment::{NewPayment, Payment};
use crate::project::{NewProject, Package, Project};
use crate::revision::Revision;
use crate::roles::Identity;
use crate::store::{CommitOutcome, ProjectCommit, ProjectFilter, WorkflowStore};
use crate::types::DbId;

/// Default bound on lock acquisition.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug)]
struct ProjectRecord {
    project: Project,
    revisions: Vec<Revision>,
    assignments: Vec<Assignment>,
}

#[derive(Debug)]
struct ProjectEntry {
    record: RwLock<ProjectRecord>,
    /// Last committed row.
    committed: parking_lot::RwLock<Arc<Project>>,
}

impl ProjectEntry {
    fn new(record: ProjectRecord) -> Self {
        let committed = Arc::new(record.project.clone());
        Self {
            record: RwLock::new(record),
            committed: parking_lot::RwLock::new(committed),
        }
    }

    fn snapshot(&self) -> Arc<Project> {
        Arc::clone(&self.committed.read())
    }
}

type PaymentLog = Arc<parking_lot::RwLock<Vec<Payment>>>;

#[derive(Debug, Default)]
struct Sequence(AtomicI64);

impl Sequence {
    fn next(&self) -> DbId {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[derive(Debug, Default)]
struct Sequences {
    project: Sequence,
    revision: Sequence,
    payment: Sequence,
    assignment: Sequence,
}

pub struct MemoryStore {
    lock_wait: Duration,
    ids: Sequences,
    projects: RwLock<HashMap<DbId, Arc<ProjectEntry>>>,
    payments: RwLock<HashMap<DbId, PaymentLog>>,
    revision_index: RwLock<HashMap<DbId, DbId>>,
    packages: RwLock<HashMap<DbId, Package>>,
    identities: RwLock<HashMap<DbId, Identity>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_WAIT)
    }
}

impl MemoryStore {
    pub fn new(lock_wait: Duration) -> Self {
        Self {
            lock_wait,
            ids: Sequences::default(),
            projects: RwLock::default(),
            payments: RwLock::default(),
            revision_index: RwLock::default(),
            packages: RwLock::default(),
            identities: RwLock::default(),
        }
    }

    pub async fn add_package(&self, package: Package) {
        self.packages.write().await.insert(package.id, package);
    }

    pub async fn add_identity(&self, identity: Identity) {
        self.identities.write().await.insert(identity.id, identity);
    }

    async fn entry(&self, project_id: DbId) -> Option<Arc<ProjectEntry>> {
        self.projects.read().await.get(&project_id).cloned()
    }

    async fn read_record<'a>(
        &self,
        project_id: DbId,
        record: &'a RwLock<ProjectRecord>,
    ) -> Result<RwLockReadGuard<'a, ProjectRecord>, CoreError> {
        tokio::time::timeout(self.lock_wait, record.read())
            .await
            .map_err(|_| CoreError::Contention { project_id })
    }

    async fn write_record<'a>(
        &self,
        project_id: DbId,
        record: &'a RwLock<ProjectRecord>,
    ) -> Result<RwLockWriteGuard<'a, ProjectRecord>, CoreError> {
        tokio::time::timeout(self.lock_wait, record.write())
            .await
            .map_err(|_| CoreError::Contention { project_id })
    }

    async fn payment_log(&self, project_id: DbId) -> Option<PaymentLog> {
        self.payments.read().await.get(&project_id).cloned()
    }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn ping(&self) -> Result<(), CoreError> {
        Ok(())
    }

    async fn find_package(&self, id: DbId) -> Result<Option<Package>, CoreError> {
        Ok(self.packages.read().await.get(&id).cloned())
    }

    async fn find_identity(&self, id: DbId) -> Result<Option<Identity>, CoreError> {
        Ok(self.identities.read().await.get(&id).cloned())
    }

    async fn insert_project(&self, project: NewProject) -> Result<Project, CoreError> {
        let project = project.into_project(self.ids.project.next());
        let record = ProjectRecord {
            project: project.clone(),
            revisions: Vec::new(),
            assignments: Vec::new(),
        };

        self.payments
            .write()
            .await
            .insert(project.id, PaymentLog::default());
        self.projects
            .write()
            .await
            .insert(project.id, Arc::new(ProjectEntry::new(record)));

        Ok(project)
    }

    async fn find_project(&self, id: DbId) -> Result<Option<Project>, CoreError> {
        Ok(self
            .entry(id)
            .await
            .map(|entry| Project::clone(&entry.snapshot())))
    }

    async fn list_projects(&self, filter: ProjectFilter) -> Result<Vec<Project>, CoreError> {
        let snapshots: Vec<Arc<Project>> = self
            .projects
            .read()
            .await
            .values()
            .map(|entry| entry.snapshot())
            .collect();

        let mut projects: Vec<Project> = snapshots
            .iter()
            .filter(|p| filter.matches(p))
            .map(|p| Project::clone(p))
            .collect();
        projects.sort_by_key(|p| p.id);
        Ok(projects)
    }

    async fn find_revision(&self, id: DbId) -> Result<Option<Revision>, CoreError> {
        let Some(project_id) = self.revision_index.read().await.get(&id).copied() else {
            return Ok(None);
        };
        let Some(entry) = self.entry(project_id).await else {
            return Ok(None);
        };
        let guard = self.read_record(project_id, &entry.record).await?;
        Ok(guard.revisions.iter().find(|r| r.id == id).cloned())
    }

    async fn list_revisions(&self, project_id: DbId) -> Result<Vec<Revision>, CoreError> {
        let Some(entry) = self.entry(project_id).await else {
            return Ok(Vec::new());
        };
        let guard = self.read_record(project_id, &entry.record).await?;
        Ok(guard.revisions.clone())
    }

    async fn list_assignments(&self, project_id: DbId) -> Result<Vec<Assignment>, CoreError> {
        let Some(entry) = self.entry(project_id).await else {
            return Ok(Vec::new());
        };
        let guard = self.read_record(project_id, &entry.record).await?;
        Ok(guard.assignments.clone())
    }

    async fn append_payment(&self, payment: NewPayment) -> Result<Payment, CoreError> {
        let project_id = payment.project_id;
        let log = self.payment_log(project_id).await.ok_or(CoreError::NotFound {
            entity: "project",
            id: project_id,
        })?;

        let payment = payment.into_payment(self.ids.payment.next());
        log.write().push(payment.clone());
        Ok(payment)
    }

    async fn list_payments(&self, project_id: DbId) -> Result<Vec<Payment>, CoreError> {
        Ok(self
            .payment_log(project_id)
            .await
            .map(|log| log.read().clone())
            .unwrap_or_default())
    }

    async fn list_payments_for_client(
        &self,
        client_id: Option<DbId>,
    ) -> Result<Vec<Payment>, CoreError> {
        let logs: Vec<PaymentLog> = self.payments.read().await.values().cloned().collect();

        let mut payments: Vec<Payment> = logs
            .iter()
            .flat_map(|log| log.read().clone())
            .filter(|p| client_id.map_or(true, |id| p.client_id == id))
            .collect();
        payments.sort_by_key(|p| (p.created_at, p.id));
        Ok(payments)
    }

    async fn commit(&self, commit: ProjectCommit) -> Result<CommitOutcome, CoreError> {
        let project_id = commit.project_id;
        let entry = self.entry(project_id).await.ok_or(CoreError::NotFound {
            entity: "project",
            id: project_id,
        })?;
        let mut guard = self.write_record(project_id, &entry.record).await?;

        if !commit.expects(&guard.project) {
            return Err(commit.stale());
        }

        // Validate everything before the first write.
        let resolve_at = match &commit.resolution {
            Some(resolution) => {
                let idx = guard
                    .revisions
                    .iter()
                    .position(|r| r.id == resolution.revision_id)
                    .ok_or(CoreError::NotFound {
                        entity: "revision",
                        id: resolution.revision_id,
                    })?;
                if !guard.revisions[idx].is_open() {
                    return Err(commit.stale());
                }
                Some(idx)
            }
            None => None,
        };

        let mut outcome = CommitOutcome {
            project: commit.project.clone(),
            revision: None,
            resolved: None,
            assignment: None,
        };

        if let (Some(idx), Some(resolution)) = (resolve_at, commit.resolution) {
            let revision = &mut guard.revisions[idx];
            revision.status = resolution.status;
            revision.resolved_at = Some(resolution.resolved_at);
            outcome.resolved = Some(revision.clone());
        }

        if let Some(new) = commit.new_revision {
            let revision = new.into_revision(self.ids.revision.next());
            self.revision_index
                .write()
                .await
                .insert(revision.id, project_id);
            guard.revisions.push(revision.clone());
            outcome.revision = Some(revision);
        }

        if let Some(new) = commit.new_assignment {
            let superseded_at = new.assigned_at;
            for prior in guard.assignments.iter_mut().filter(|a| a.is_active) {
                prior.is_active = false;
                prior.superseded_at = Some(superseded_at);
            }
            let assignment = new.into_assignment(self.ids.assignment.next());
            guard.assignments.push(assignment.clone());
            outcome.assignment = Some(assignment);
        }

        *entry.committed.write() = Arc::new(commit.project.clone());
        guard.project = commit.project;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::NewAssignment;
    use crate::project::ProjectIntake;
    use crate::revision::NewRevision;
    use crate::status::ProjectStatus;
    use assert_matches::assert_matches;
    use chrono::Utc;

    fn new_project(client_id: DbId) -> NewProject {
        NewProject {
            client_id,
            package_id: 1,
            intake: ProjectIntake {
                title: "Promo".to_string(),
                description: "Brief".to_string(),
                ..Default::default()
            },
            total_amount: 1500,
            max_revisions: 2,
            delivery_days: 3,
            created_at: Utc::now(),
        }
    }

    fn bumped(project: &Project, status: ProjectStatus) -> Project {
        let mut next = project.clone();
        next.status = status;
        next.updated_at = project.next_updated_at(Utc::now());
        next
    }

    #[tokio::test]
    async fn ids_are_sequential() {
        let store = MemoryStore::default();
        let a = store.insert_project(new_project(1)).await.unwrap();
        let b = store.insert_project(new_project(1)).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
    }

    #[tokio::test]
    async fn stale_commit_is_contention() {
        let store = MemoryStore::default();
        let project = store.insert_project(new_project(1)).await.unwrap();

        let first = ProjectCommit::new(&project, bumped(&project, ProjectStatus::Queued));
        store.commit(first).await.unwrap();

        let second = ProjectCommit::new(&project, bumped(&project, ProjectStatus::Cancelled));
        assert_matches!(
            store.commit(second).await,
            Err(CoreError::Contention { project_id }) if project_id == project.id
        );
        let stored = store.find_project(project.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ProjectStatus::Queued);
    }

    #[tokio::test]
    async fn commit_writes_revision_and_indexes_it() {
        let store = MemoryStore::default();
        let project = store.insert_project(new_project(1)).await.unwrap();
        let commit = ProjectCommit::new(&project, bumped(&project, ProjectStatus::InRevision))
            .with_revision(NewRevision {
                project_id: project.id,
                revision_number: 1,
                requested_by: 1,
                description: "Shorter intro".to_string(),
                created_at: Utc::now(),
            });
        let outcome = store.commit(commit).await.unwrap();
        let revision = outcome.revision.unwrap();
        assert_eq!(
            store.find_revision(revision.id).await.unwrap(),
            Some(revision)
        );
    }

    #[tokio::test]
    async fn new_assignment_supersedes_active_one() {
        let store = MemoryStore::default();
        let mut project = store.insert_project(new_project(1)).await.unwrap();
        for editor_id in [20, 21] {
            let mut next = bumped(&project, project.status);
            next.assigned_to = Some(editor_id);
            let commit = ProjectCommit::new(&project, next).with_assignment(NewAssignment {
                project_id: project.id,
                editor_id,
                assigned_by: 99,
                assigned_at: Utc::now(),
            });
            project = store.commit(commit).await.unwrap().project;
        }
        let history = store.list_assignments(project.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(!history[0].is_active);
        assert!(history[0].superseded_at.is_some());
        assert!(history[1].is_active);
    }

    #[tokio::test]
    async fn held_lock_times_out_as_contention() {
        let store = MemoryStore::new(Duration::from_millis(20));
        let project = store.insert_project(new_project(1)).await.unwrap();
        let entry = store.entry(project.id).await.unwrap();
        let _held = entry.record.write().await;

        let commit = ProjectCommit::new(&project, bumped(&project, ProjectStatus::Queued));
        assert_matches!(
            store.commit(commit).await,
            Err(CoreError::Contention { .. })
        );
    }

    #[tokio::test]
    async fn reads_see_committed_row_while_writer_holds_lock() {
        let store = MemoryStore::new(Duration::from_millis(20));
        let project = store.insert_project(new_project(1)).await.unwrap();
        let queued = bumped(&project, ProjectStatus::Queued);
        store
            .commit(ProjectCommit::new(&project, queued))
            .await
            .unwrap();

        let entry = store.entry(project.id).await.unwrap();
        let _held = entry.record.write().await;

        let listed = store.list_projects(ProjectFilter::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, ProjectStatus::Queued);
        let found = store.find_project(project.id).await.unwrap().unwrap();
        assert_eq!(found.status, ProjectStatus::Queued);
    }

    #[tokio::test]
    async fn stats_succeed_while_a_project_is_mid_commit() {
        use crate::notifications::DiscardSink;
        use crate::roles::Actor;
        use crate::stats::StatsScope;
        use crate::workflow::{Workflow, WorkflowConfig};

        let store = Arc::new(MemoryStore::new(Duration::from_millis(20)));
        let busy = store.insert_project(new_project(1)).await.unwrap();
        store.insert_project(new_project(2)).await.unwrap();
        let workflow = Workflow::new(
            store.clone(),
            Arc::new(DiscardSink),
            WorkflowConfig::default(),
        );

        let entry = store.entry(busy.id).await.unwrap();
        let _held = entry.record.write().await;

        let stats = workflow
            .get_stats(&Actor::admin(99), StatsScope::Global)
            .await
            .unwrap();
        assert_eq!(stats.total_projects, 2);
        assert_eq!(stats.pending_payments, 2);
    }

    #[tokio::test]
    async fn payments_do_not_wait_on_project_lock() {
        let store = MemoryStore::new(Duration::from_millis(20));
        let project = store.insert_project(new_project(7)).await.unwrap();
        let entry = store.entry(project.id).await.unwrap();
        let _held = entry.record.write().await;

        let payment = NewPayment {
            project_id: project.id,
            client_id: 7,
            amount: 1500,
            currency: "KES".to_string(),
            method: crate::payment::PaymentMethod::Mpesa,
            status: crate::status::PaymentStatus::Completed,
            transaction_ref: None,
            payment_date: None,
            created_at: Utc::now(),
        };
        assert!(store.append_payment(payment).await.is_ok());
        assert_eq!(store.list_payments_for_client(Some(7)).await.unwrap().len(), 1);
        assert!(store.list_payments_for_client(Some(8)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn payment_for_unknown_project_is_not_found() {
        let store = MemoryStore::default();
        let payment = NewPayment::from_input(
            42,
            1,
            crate::payment::RecordPayment {
                amount: 10,
                method: crate::payment::PaymentMethod::Cash,
                status: crate::status::PaymentStatus::Pending,
                transaction_ref: None,
                currency: None,
                payment_date: None,
            },
            Utc::now(),
        );
        assert_matches!(
            store.append_payment(payment).await,
            Err(CoreError::NotFound { entity: "project", id: 42 })
        );
    }
}
