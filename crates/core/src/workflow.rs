//! The workflow service: every client and operator action funnels through
//! here.
//!
//! Each mutating call reads the project, checks every guard, and hands the
//! store one [`ProjectCommit`]. A stale read or a lock that cannot be taken
//! in time comes back as `Contention`, which is retried with linear backoff
//! up to [`WorkflowConfig::max_attempts`] before being surfaced.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::assignment::{active_assignment, check_assignable, Assignment, NewAssignment};
use crate::error::CoreError;
use crate::notifications::{NotificationKind, NotificationRequest, NotificationSink};
use crate::payment::{
    derive_payment_status, summarize, validate_payment, NewPayment, Payment, RecordPayment,
};
use crate::project::{validate_intake, NewProject, Project, ProjectIntake, ProjectView};
use crate::revision::{
    check_can_open_revision, next_revision_number, open_revision, validate_revision_description,
    NewRevision, Revision, RevisionResolution, DEFAULT_REVISION_DESCRIPTION,
};
use crate::roles::{Actor, Identity, Role};
use crate::stats::{compute_stats, DashboardStats, StatsScope};
use crate::status::{PaymentStatus, ProjectStatus, RevisionStatus};
use crate::store::{ProjectCommit, ProjectFilter, WorkflowStore};
use crate::transitions::{
    apply_edge, find_edge, plan_transition, Effect, TransitionFacts, TransitionPlan,
};
use crate::types::DbId;

/// Default number of attempts for a contended mutation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default backoff step between contended attempts.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Attempt `n` sleeps `n * retry_backoff` before the next one.
    pub retry_backoff: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

#[derive(Clone)]
pub struct Workflow {
    store: Arc<dyn WorkflowStore>,
    notifier: Arc<dyn NotificationSink>,
    config: WorkflowConfig,
}

impl Workflow {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        notifier: Arc<dyn NotificationSink>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn WorkflowStore> {
        &self.store
    }

    /* ---- Internals ---- */

    async fn with_retry<T, F, Fut>(&self, project_id: DbId, mut op: F) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        project_id,
                        attempt,
                        max_attempts,
                        "Project contended, retrying"
                    );
                    tokio::time::sleep(self.config.retry_backoff * attempt).await;
                    attempt += 1;
                }
                Err(err) if err.is_retryable() => {
                    tracing::warn!(
                        project_id,
                        attempts = attempt,
                        "Project contention not resolved"
                    );
                    return Err(err);
                }
                other => return other,
            }
        }
    }

    async fn load_project(&self, project_id: DbId) -> Result<Project, CoreError> {
        self.store
            .find_project(project_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "project",
                id: project_id,
            })
    }

    async fn facts(&self, project: &Project) -> Result<TransitionFacts, CoreError> {
        let payments = self.store.list_payments(project.id).await?;
        let assignments = self.store.list_assignments(project.id).await?;
        let revisions = self.store.list_revisions(project.id).await?;
        Ok(TransitionFacts {
            payment_status: derive_payment_status(project.total_amount, &payments),
            has_active_assignment: active_assignment(&assignments).is_some(),
            has_open_revision: open_revision(&revisions).is_some(),
        })
    }

    fn notify(&self, request: NotificationRequest) {
        self.notifier.notify(request);
    }

    fn notify_status(&self, project: &Project, actor: &Actor) {
        let (kind, title) = match project.status {
            ProjectStatus::Completed => {
                (NotificationKind::DeliveryReady, "Your video is complete")
            }
            _ => (NotificationKind::StatusUpdate, "Project status updated"),
        };
        let message = format!(
            "\"{}\" is now {}",
            project.intake.title,
            project.status.as_str().replace('_', " ")
        );
        if actor.id != project.client_id {
            self.notify(
                NotificationRequest::new(project.client_id, kind, title, message.clone())
                    .for_project(project.id),
            );
        }
        if let Some(editor_id) = project.assigned_to.filter(|id| *id != actor.id) {
            self.notify(
                NotificationRequest::new(
                    editor_id,
                    NotificationKind::StatusUpdate,
                    "Project status updated",
                    message,
                )
                .for_project(project.id),
            );
        }
    }

    /* ---- Project ledger ---- */

    /// Create a project in `pending_payment` from a client's intake form.
    pub async fn create_project(
        &self,
        actor: &Actor,
        client_id: DbId,
        package_id: DbId,
        intake: ProjectIntake,
    ) -> Result<Project, CoreError> {
        match actor.role {
            Role::Client if actor.id == client_id => {}
            Role::Admin => {}
            _ => {
                return Err(CoreError::Unauthorized(format!(
                    "Role '{}' may not create projects for client {client_id}",
                    actor.role
                )))
            }
        }

        validate_intake(&intake)?;

        let package = self
            .store
            .find_package(package_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "package",
                id: package_id,
            })?;
        package.ensure_orderable()?;

        let project = self
            .store
            .insert_project(NewProject::from_package(
                client_id,
                &package,
                intake,
                Utc::now(),
            ))
            .await?;

        tracing::info!(
            project_id = project.id,
            client_id,
            package_id,
            total_amount = project.total_amount,
            "Project created",
        );
        self.notify(
            NotificationRequest::new(
                client_id,
                NotificationKind::OrderConfirmation,
                "Order received",
                format!(
                    "We received \"{}\" ({}). It will be queued once payment completes.",
                    project.intake.title, package.name
                ),
            )
            .for_project(project.id),
        );

        Ok(project)
    }

    /// Move a project along one edge of the status table.
    ///
    /// Requesting the current status is a no-op success. A target of
    /// `in_revision` opens a revision with a default description.
    pub async fn transition_status(
        &self,
        project_id: DbId,
        actor: &Actor,
        target: ProjectStatus,
    ) -> Result<Project, CoreError> {
        if target == ProjectStatus::InRevision {
            let project = self.load_project(project_id).await?;
            actor.require_owner_or_operator(project.client_id)?;
            if project.status == target {
                return Ok(project);
            }
            let (project, _) = self
                .open_revision_with_retry(project_id, actor, DEFAULT_REVISION_DESCRIPTION)
                .await?;
            return Ok(project);
        }

        let (project, changed) = self
            .with_retry(project_id, || self.try_transition(project_id, actor, target))
            .await?;
        if changed {
            self.notify_status(&project, actor);
        }
        Ok(project)
    }

    async fn try_transition(
        &self,
        project_id: DbId,
        actor: &Actor,
        target: ProjectStatus,
    ) -> Result<(Project, bool), CoreError> {
        let project = self.load_project(project_id).await?;
        actor.require_owner_or_operator(project.client_id)?;
        let facts = self.facts(&project).await?;

        let edge = match plan_transition(&project, actor, target, &facts)? {
            TransitionPlan::NoOp => return Ok((project, false)),
            TransitionPlan::Apply(edge) => edge,
        };
        if edge.effect == Effect::OpenRevision {
            return Err(CoreError::Internal(
                "revision edges must go through request_revision".to_string(),
            ));
        }

        let now = Utc::now();
        let next = apply_edge(&project, edge, now);

        let resolution = if edge.effect == Effect::CloseOpenRevision {
            let revisions = self.store.list_revisions(project_id).await?;
            open_revision(&revisions).map(|open| RevisionResolution {
                revision_id: open.id,
                status: RevisionStatus::Cancelled,
                resolved_at: now,
            })
        } else {
            None
        };

        let outcome = self
            .store
            .commit(ProjectCommit::new(&project, next).with_resolution(resolution))
            .await?;

        tracing::info!(
            project_id,
            actor_id = actor.id,
            role = %actor.role,
            from = %project.status,
            to = %outcome.project.status,
            "Project status changed",
        );
        if let Some(cancelled) = &outcome.resolved {
            tracing::info!(
                project_id,
                revision_id = cancelled.id,
                "Open revision cancelled with project",
            );
        }

        Ok((outcome.project, true))
    }

    /* ---- Revision tracker ---- */

    /// Open the next revision and move the project to `in_revision` in one commit.
    pub async fn request_revision(
        &self,
        project_id: DbId,
        actor: &Actor,
        description: &str,
    ) -> Result<Revision, CoreError> {
        let (_, revision) = self
            .open_revision_with_retry(project_id, actor, description)
            .await?;
        Ok(revision)
    }

    async fn open_revision_with_retry(
        &self,
        project_id: DbId,
        actor: &Actor,
        description: &str,
    ) -> Result<(Project, Revision), CoreError> {
        validate_revision_description(description)?;
        let (project, revision) = self
            .with_retry(project_id, || {
                self.try_open_revision(project_id, actor, description)
            })
            .await?;

        if let Some(editor_id) = project.assigned_to {
            self.notify(
                NotificationRequest::new(
                    editor_id,
                    NotificationKind::RevisionRequested,
                    format!("Revision #{} requested", revision.revision_number),
                    revision.description.clone(),
                )
                .for_project(project_id),
            );
        }
        Ok((project, revision))
    }

    async fn try_open_revision(
        &self,
        project_id: DbId,
        actor: &Actor,
        description: &str,
    ) -> Result<(Project, Revision), CoreError> {
        let project = self.load_project(project_id).await?;

        let edge = find_edge(project.status, ProjectStatus::InRevision).ok_or_else(|| {
            CoreError::invalid_transition(
                project.status,
                ProjectStatus::InRevision,
                "revisions can only be requested while awaiting approval",
            )
        })?;
        if !edge.allows_role(actor.role) {
            return Err(CoreError::Unauthorized(format!(
                "Role '{}' may not request revisions",
                actor.role
            )));
        }
        actor.require_owner_or_operator(project.client_id)?;

        let revisions = self.store.list_revisions(project_id).await?;
        check_can_open_revision(
            project.status,
            project.revision_count_used,
            project.max_revisions,
            &revisions,
        )?;

        let now = Utc::now();
        let new_revision = NewRevision {
            project_id,
            revision_number: next_revision_number(&revisions),
            requested_by: actor.id,
            description: description.to_string(),
            created_at: now,
        };
        let next = apply_edge(&project, edge, now);

        let outcome = self
            .store
            .commit(ProjectCommit::new(&project, next).with_revision(new_revision))
            .await?;
        let revision = outcome
            .revision
            .ok_or_else(|| CoreError::Internal("store did not return the new revision".into()))?;

        tracing::info!(
            project_id,
            revision_id = revision.id,
            revision_number = revision.revision_number,
            used = outcome.project.revision_count_used,
            max = outcome.project.max_revisions,
            "Revision requested",
        );

        Ok((outcome.project, revision))
    }

    /// Mark an open revision as done. Resolving a closed revision returns it unchanged.
    ///
    /// The project stays in `in_revision`; moving it back to `in_review` is a
    /// separate [`Workflow::transition_status`] call.
    pub async fn resolve_revision(
        &self,
        revision_id: DbId,
        actor: &Actor,
    ) -> Result<Revision, CoreError> {
        actor.require_operator("resolve revisions")?;

        let revision = self.find_revision(revision_id).await?;
        let project_id = revision.project_id;

        let resolved = self
            .with_retry(project_id, || self.try_resolve_revision(revision_id, actor))
            .await?;

        self.notify(
            NotificationRequest::new(
                resolved.requested_by,
                NotificationKind::StatusUpdate,
                format!("Revision #{} addressed", resolved.revision_number),
                "Your requested changes are done and going back to review.",
            )
            .for_project(project_id),
        );
        Ok(resolved)
    }

    async fn find_revision(&self, revision_id: DbId) -> Result<Revision, CoreError> {
        self.store
            .find_revision(revision_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "revision",
                id: revision_id,
            })
    }

    async fn try_resolve_revision(
        &self,
        revision_id: DbId,
        actor: &Actor,
    ) -> Result<Revision, CoreError> {
        let revision = self.find_revision(revision_id).await?;
        if !revision.is_open() {
            return Ok(revision);
        }

        let project = self.load_project(revision.project_id).await?;
        let now = Utc::now();
        let mut next = project.clone();
        next.updated_at = project.next_updated_at(now);

        let outcome = self
            .store
            .commit(ProjectCommit::new(&project, next).with_resolution(Some(
                RevisionResolution {
                    revision_id,
                    status: RevisionStatus::Completed,
                    resolved_at: now,
                },
            )))
            .await?;

        tracing::info!(
            project_id = project.id,
            revision_id,
            actor_id = actor.id,
            "Revision resolved",
        );

        outcome
            .resolved
            .ok_or_else(|| CoreError::Internal("store did not return the resolved revision".into()))
    }

    /* ---- Payment ledger ---- */

    /// Append a payment record.
    ///
    /// When the new record completes payment on a `pending_payment` project,
    /// the project is queued under the usual exclusion. If that keeps
    /// contending the payment still stands and the transition can be retried.
    pub async fn record_payment(
        &self,
        project_id: DbId,
        actor: &Actor,
        input: RecordPayment,
    ) -> Result<Payment, CoreError> {
        validate_payment(&input)?;

        let project = self.load_project(project_id).await?;
        match actor.role {
            Role::Admin => {}
            Role::Client if actor.id == project.client_id => {}
            _ => {
                return Err(CoreError::Unauthorized(format!(
                    "Role '{}' may not record payments for project {project_id}",
                    actor.role
                )))
            }
        }

        let payment = self
            .store
            .append_payment(NewPayment::from_input(
                project_id,
                project.client_id,
                input,
                Utc::now(),
            ))
            .await?;

        tracing::info!(
            project_id,
            payment_id = payment.id,
            amount = payment.amount,
            status = %payment.status,
            method = %payment.method,
            "Payment recorded",
        );

        let payments = self.store.list_payments(project_id).await?;
        let summary = summarize(project.total_amount, &payments);
        if summary.reconciliation_required {
            tracing::warn!(
                project_id,
                amount_paid = summary.amount_paid,
                total_amount = project.total_amount,
                "Payments exceed project price; manual reconciliation required",
            );
        }

        if payment.status == PaymentStatus::Completed {
            self.notify(
                NotificationRequest::new(
                    project.client_id,
                    NotificationKind::PaymentReceived,
                    "Payment received",
                    format!(
                        "We received {} {} for \"{}\"",
                        payment.currency, payment.amount, project.intake.title
                    ),
                )
                .for_project(project_id),
            );
        }

        let paid =
            derive_payment_status(project.total_amount, &payments) == PaymentStatus::Completed;
        if paid && project.status == ProjectStatus::PendingPayment {
            if let Err(err) = self
                .transition_status(project_id, actor, ProjectStatus::Queued)
                .await
            {
                tracing::warn!(
                    project_id,
                    payment_id = payment.id,
                    error = %err,
                    "Payment completed but project was not queued",
                );
            }
        }

        Ok(payment)
    }

    /* ---- Assignment manager ---- */

    /// Assign an editor, superseding any active assignment.
    pub async fn assign_editor(
        &self,
        project_id: DbId,
        editor_id: DbId,
        actor: &Actor,
    ) -> Result<Assignment, CoreError> {
        actor.require_admin("assign editors")?;

        let editor = self
            .store
            .find_identity(editor_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "editor",
                id: editor_id,
            })?;

        let (assignment, changed) = self
            .with_retry(project_id, || self.try_assign(project_id, &editor, actor))
            .await?;

        if changed {
            self.notify(
                NotificationRequest::new(
                    editor_id,
                    NotificationKind::System,
                    "New project assignment",
                    format!("You have been assigned project {project_id}"),
                )
                .for_project(project_id),
            );
        }
        Ok(assignment)
    }

    async fn try_assign(
        &self,
        project_id: DbId,
        editor: &Identity,
        actor: &Actor,
    ) -> Result<(Assignment, bool), CoreError> {
        let project = self.load_project(project_id).await?;
        check_assignable(&project, editor)?;

        let history = self.store.list_assignments(project_id).await?;
        if let Some(current) = active_assignment(&history) {
            if current.editor_id == editor.id {
                return Ok((current.clone(), false));
            }
        }

        let now = Utc::now();
        let mut next = project.clone();
        next.assigned_to = Some(editor.id);
        next.updated_at = project.next_updated_at(now);

        let outcome = self
            .store
            .commit(ProjectCommit::new(&project, next).with_assignment(NewAssignment {
                project_id,
                editor_id: editor.id,
                assigned_by: actor.id,
                assigned_at: now,
            }))
            .await?;

        tracing::info!(
            project_id,
            editor_id = editor.id,
            previous_editor = ?project.assigned_to,
            actor_id = actor.id,
            "Editor assigned",
        );

        let assignment = outcome
            .assignment
            .ok_or_else(|| CoreError::Internal("store did not return the assignment".into()))?;
        Ok((assignment, true))
    }

    /* ---- Reads ---- */

    /// A project with its derived payment position.
    pub async fn get_project(
        &self,
        project_id: DbId,
        actor: &Actor,
    ) -> Result<ProjectView, CoreError> {
        let project = self.load_project(project_id).await?;
        actor.require_owner_or_operator(project.client_id)?;

        let payments = self.store.list_payments(project_id).await?;
        Ok(ProjectView {
            payment_status: derive_payment_status(project.total_amount, &payments),
            payment: summarize(project.total_amount, &payments),
            project,
        })
    }

    /// Clients see their own projects, editors those assigned to them, admins all.
    pub async fn list_projects(&self, actor: &Actor) -> Result<Vec<Project>, CoreError> {
        let filter = match actor.role {
            Role::Client => ProjectFilter::client(actor.id),
            Role::Editor => ProjectFilter::assigned_to(actor.id),
            Role::Admin => ProjectFilter::default(),
        };
        self.store.list_projects(filter).await
    }

    pub async fn list_revisions(
        &self,
        project_id: DbId,
        actor: &Actor,
    ) -> Result<Vec<Revision>, CoreError> {
        let project = self.load_project(project_id).await?;
        actor.require_owner_or_operator(project.client_id)?;
        self.store.list_revisions(project_id).await
    }

    pub async fn list_payments(
        &self,
        project_id: DbId,
        actor: &Actor,
    ) -> Result<Vec<Payment>, CoreError> {
        let project = self.load_project(project_id).await?;
        actor.require_owner_or_operator(project.client_id)?;
        self.store.list_payments(project_id).await
    }

    pub async fn list_assignments(
        &self,
        project_id: DbId,
        actor: &Actor,
    ) -> Result<Vec<Assignment>, CoreError> {
        let project = self.load_project(project_id).await?;
        actor.require_owner_or_operator(project.client_id)?;
        self.store.list_assignments(project_id).await
    }

    /* ---- Stats ---- */

    /// Dashboard numbers for one client or across all clients, read at call time.
    pub async fn get_stats(
        &self,
        actor: &Actor,
        scope: StatsScope,
    ) -> Result<DashboardStats, CoreError> {
        scope.authorize(actor)?;

        let filter = ProjectFilter {
            client_id: scope.client_id(),
            assigned_to: None,
        };
        let projects = self.store.list_projects(filter).await?;
        let payments = self.store.list_payments_for_client(scope.client_id()).await?;

        let stats = compute_stats(&projects, &payments);
        tracing::debug!(%scope, total_projects = stats.total_projects, "Stats computed");
        Ok(stats)
    }
}
