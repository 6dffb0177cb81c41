//! Project status state machine.
//!
//! Every permitted edge lives in [`EDGES`]: source status, target status,
//! the roles allowed to drive it, the guard that must hold, and the side
//! effect applied on commit. Nothing outside this table decides whether a
//! status change is legal.
//!
//! ```text
//! pending_payment -> queued             any role        payment completed
//! queued          -> in_production      editor, admin   active assignment     stamps started_at
//! in_production   -> in_review          editor, admin
//! in_review       -> awaiting_approval  editor, admin
//! awaiting_approval -> completed        client, admin                         stamps completed_at
//! awaiting_approval -> in_revision      client, admin   budget left           opens a revision
//! in_revision     -> in_review          editor, admin   revision resolved
//! <non-terminal>  -> cancelled          admin                                 closes open revision
//! ```

use crate::error::CoreError;
use crate::project::Project;
use crate::revision::check_revision_budget;
use crate::roles::{Actor, Role};
use crate::status::{PaymentStatus, ProjectStatus};
use crate::types::Timestamp;

/// Precondition on the project's attached facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    None,
    PaymentCompleted,
    ActiveAssignment,
    RevisionBudgetAvailable,
    OpenRevisionResolved,
}

/// What committing the edge does besides changing the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    StampStarted,
    StampCompleted,
    OpenRevision,
    CloseOpenRevision,
}

/// Source side of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Exactly(ProjectStatus),
    AnyNonTerminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: Source,
    pub to: ProjectStatus,
    pub roles: &'static [Role],
    pub guard: Guard,
    pub effect: Effect,
}

const ANY_ROLE: &[Role] = &[Role::Client, Role::Editor, Role::Admin];
const OPERATORS: &[Role] = &[Role::Editor, Role::Admin];
const CLIENT_OR_ADMIN: &[Role] = &[Role::Client, Role::Admin];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

pub const EDGES: &[Edge] = &[
    Edge {
        from: Source::Exactly(ProjectStatus::PendingPayment),
        to: ProjectStatus::Queued,
        roles: ANY_ROLE,
        guard: Guard::PaymentCompleted,
        effect: Effect::None,
    },
    Edge {
        from: Source::Exactly(ProjectStatus::Queued),
        to: ProjectStatus::InProduction,
        roles: OPERATORS,
        guard: Guard::ActiveAssignment,
        effect: Effect::StampStarted,
    },
    Edge {
        from: Source::Exactly(ProjectStatus::InProduction),
        to: ProjectStatus::InReview,
        roles: OPERATORS,
        guard: Guard::None,
        effect: Effect::None,
    },
    Edge {
        from: Source::Exactly(ProjectStatus::InReview),
        to: ProjectStatus::AwaitingApproval,
        roles: OPERATORS,
        guard: Guard::None,
        effect: Effect::None,
    },
    Edge {
        from: Source::Exactly(ProjectStatus::AwaitingApproval),
        to: ProjectStatus::Completed,
        roles: CLIENT_OR_ADMIN,
        guard: Guard::None,
        effect: Effect::StampCompleted,
    },
    Edge {
        from: Source::Exactly(ProjectStatus::AwaitingApproval),
        to: ProjectStatus::InRevision,
        roles: CLIENT_OR_ADMIN,
        guard: Guard::RevisionBudgetAvailable,
        effect: Effect::OpenRevision,
    },
    Edge {
        from: Source::Exactly(ProjectStatus::InRevision),
        to: ProjectStatus::InReview,
        roles: OPERATORS,
        guard: Guard::OpenRevisionResolved,
        effect: Effect::None,
    },
    Edge {
        from: Source::AnyNonTerminal,
        to: ProjectStatus::Cancelled,
        roles: ADMIN_ONLY,
        guard: Guard::None,
        effect: Effect::CloseOpenRevision,
    },
];

/// Facts from the sub-ledgers that guards consult, gathered at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionFacts {
    pub payment_status: PaymentStatus,
    pub has_active_assignment: bool,
    pub has_open_revision: bool,
}

/// Outcome of planning a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPlan {
    /// Target equals the current status; nothing to write.
    NoOp,
    Apply(&'static Edge),
}

impl Edge {
    fn leaves(&self, from: ProjectStatus) -> bool {
        match self.from {
            Source::Exactly(status) => status == from,
            Source::AnyNonTerminal => !from.is_terminal(),
        }
    }

    /// Pure role gate for this edge.
    pub fn allows_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Look up the edge between two statuses.
pub fn find_edge(from: ProjectStatus, to: ProjectStatus) -> Option<&'static Edge> {
    EDGES.iter().find(|e| e.to == to && e.leaves(from))
}

/// Statuses reachable from `from` in one step, ignoring role and guards.
pub fn allowed_targets(from: ProjectStatus) -> Vec<ProjectStatus> {
    EDGES
        .iter()
        .filter(|e| e.leaves(from))
        .map(|e| e.to)
        .collect()
}

fn check_guard(
    edge: &Edge,
    project: &Project,
    facts: &TransitionFacts,
) -> Result<(), CoreError> {
    let (from, to) = (project.status, edge.to);
    match edge.guard {
        Guard::None => Ok(()),
        Guard::PaymentCompleted if facts.payment_status != PaymentStatus::Completed => {
            Err(CoreError::invalid_transition(
                from,
                to,
                format!(
                    "payment must be completed (payment status is '{}')",
                    facts.payment_status
                ),
            ))
        }
        Guard::ActiveAssignment if !facts.has_active_assignment => {
            Err(CoreError::invalid_transition(
                from,
                to,
                "an editor must be assigned before production starts",
            ))
        }
        Guard::RevisionBudgetAvailable => {
            check_revision_budget(project.revision_count_used, project.max_revisions)
        }
        Guard::OpenRevisionResolved if facts.has_open_revision => {
            Err(CoreError::invalid_transition(
                from,
                to,
                "the open revision must be resolved first",
            ))
        }
        _ => Ok(()),
    }
}

/// Decide whether `actor` may move `project` to `to`.
///
/// Checks run before any write, in this order: self-transition no-op,
/// terminal source, edge existence, role, client ownership, guard.
pub fn plan_transition(
    project: &Project,
    actor: &Actor,
    to: ProjectStatus,
    facts: &TransitionFacts,
) -> Result<TransitionPlan, CoreError> {
    let from = project.status;

    if from == to {
        return Ok(TransitionPlan::NoOp);
    }

    if from.is_terminal() {
        return Err(CoreError::invalid_transition(
            from,
            to,
            format!("'{from}' is a terminal status"),
        ));
    }

    let edge = find_edge(from, to).ok_or_else(|| {
        CoreError::invalid_transition(from, to, format!("no transition from '{from}' to '{to}'"))
    })?;

    if !edge.allows_role(actor.role) {
        return Err(CoreError::Unauthorized(format!(
            "Role '{}' may not move a project from '{from}' to '{to}'",
            actor.role
        )));
    }

    actor.require_owner_or_operator(project.client_id)?;

    check_guard(edge, project, facts)?;

    Ok(TransitionPlan::Apply(edge))
}

/// Produce the project row after committing `edge` at `now`.
pub fn apply_edge(project: &Project, edge: &Edge, now: Timestamp) -> Project {
    let mut next = project.clone();
    next.status = edge.to;
    next.updated_at = project.next_updated_at(now);

    match edge.effect {
        Effect::StampStarted => {
            let started = *next.started_at.get_or_insert(now);
            if next.deadline_date.is_none() {
                next.deadline_date = Some(project.deadline_from(started));
            }
        }
        Effect::StampCompleted => next.completed_at = Some(now),
        Effect::OpenRevision => next.revision_count_used += 1,
        Effect::CloseOpenRevision | Effect::None => {}
    }

    next
}
