//! Read-side dashboard aggregation over the project and payment ledgers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::payment::Payment;
use crate::project::Project;
use crate::roles::{Actor, Role};
use crate::status::{PaymentStatus, ProjectStatus};
use crate::types::{Amount, DbId};

/// Which projects a stats request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatsScope {
    Client(DbId),
    Global,
}

impl StatsScope {
    /// Clients may only see their own numbers.
    pub fn authorize(self, actor: &Actor) -> Result<(), CoreError> {
        match (actor.role, self) {
            (Role::Client, StatsScope::Client(id)) if id == actor.id => Ok(()),
            (Role::Client, _) => Err(CoreError::Unauthorized(format!(
                "Client {} may only view their own stats",
                actor.id
            ))),
            _ => Ok(()),
        }
    }

    pub fn client_id(self) -> Option<DbId> {
        match self {
            StatsScope::Client(id) => Some(id),
            StatsScope::Global => None,
        }
    }
}

impl fmt::Display for StatsScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsScope::Client(id) => write!(f, "client:{id}"),
            StatsScope::Global => f.write_str("global"),
        }
    }
}

impl FromStr for StatsScope {
    type Err = CoreError;

    /// Accepts `global` or a numeric client id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("global") {
            return Ok(StatsScope::Global);
        }
        s.parse::<DbId>()
            .map(StatsScope::Client)
            .map_err(|_| CoreError::Validation(format!("Invalid stats scope '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_projects: i64,
    pub active_projects: i64,
    pub completed_projects: i64,
    pub pending_payments: i64,
    /// Sum of completed payments. For a client scope this is what they spent.
    pub total_revenue: Amount,
    pub total_refunded: Amount,
    /// Mean hours from production start to completion; `None` when no
    /// completed project has both timestamps.
    pub average_delivery_time: Option<f64>,
}

/// Hours between start and completion, if both are known.
fn delivery_hours(project: &Project) -> Option<f64> {
    if project.status != ProjectStatus::Completed {
        return None;
    }
    let (started, completed) = (project.started_at?, project.completed_at?);
    Some((completed - started).num_seconds() as f64 / 3600.0)
}

/// Fold already-scoped projects and payments into dashboard numbers.
pub fn compute_stats(projects: &[Project], payments: &[Payment]) -> DashboardStats {
    let count =
        |pred: &dyn Fn(&Project) -> bool| projects.iter().filter(|p| pred(p)).count() as i64;

    let sum = |status: PaymentStatus| -> Amount {
        payments
            .iter()
            .filter(|p| p.status == status)
            .map(|p| p.amount)
            .sum()
    };

    let durations: Vec<f64> = projects.iter().filter_map(delivery_hours).collect();
    let average_delivery_time = if durations.is_empty() {
        None
    } else {
        Some(durations.iter().sum::<f64>() / durations.len() as f64)
    };

    DashboardStats {
        total_projects: projects.len() as i64,
        active_projects: count(&|p| p.status.is_active()),
        completed_projects: count(&|p| p.status == ProjectStatus::Completed),
        pending_payments: count(&|p| p.status == ProjectStatus::PendingPayment),
        total_revenue: sum(PaymentStatus::Completed),
        total_refunded: sum(PaymentStatus::Refunded),
        average_delivery_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::PaymentMethod;
    use crate::project::{NewProject, Package, ProjectIntake};
    use crate::types::Timestamp;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap()
    }

    fn project(id: DbId, client_id: DbId, status: ProjectStatus) -> Project {
        let package = Package {
            id: 1,
            name: "Standard".to_string(),
            price: 2000,
            delivery_days: 5,
            revision_count: 2,
            is_active: true,
        };
        let intake = ProjectIntake {
            title: format!("Project {id}"),
            description: "Brief".to_string(),
            ..Default::default()
        };
        let mut p = NewProject::from_package(client_id, &package, intake, t0()).into_project(id);
        p.status = status;
        p
    }

    fn payment(id: DbId, amount: Amount, status: PaymentStatus) -> Payment {
        Payment {
            id,
            project_id: 1,
            client_id: 10,
            amount,
            currency: "KES".to_string(),
            method: PaymentMethod::Mpesa,
            status,
            transaction_ref: None,
            payment_date: None,
            created_at: t0(),
        }
    }

    #[test]
    fn empty_ledgers_give_zeroes() {
        let stats = compute_stats(&[], &[]);
        assert_eq!(stats.total_projects, 0);
        assert_eq!(stats.total_revenue, 0);
        assert_eq!(stats.average_delivery_time, None);
    }

    #[test]
    fn mixed_statuses_and_revenue() {
        let projects = [
            project(1, 10, ProjectStatus::Completed),
            project(2, 10, ProjectStatus::InProduction),
            project(3, 11, ProjectStatus::Cancelled),
        ];
        let payments = [
            payment(1, 2000, PaymentStatus::Completed),
            payment(2, 2000, PaymentStatus::Completed),
            payment(3, 700, PaymentStatus::Failed),
        ];
        let stats = compute_stats(&projects, &payments);
        assert_eq!(stats.total_projects, 3);
        assert_eq!(stats.active_projects, 1);
        assert_eq!(stats.completed_projects, 1);
        assert_eq!(stats.total_revenue, 4000);
    }

    #[test]
    fn pending_payment_is_not_active() {
        let projects = [
            project(1, 10, ProjectStatus::PendingPayment),
            project(2, 10, ProjectStatus::InRevision),
        ];
        let stats = compute_stats(&projects, &[]);
        assert_eq!(stats.active_projects, 1);
        assert_eq!(stats.pending_payments, 1);
    }

    #[test]
    fn refunds_reported_separately() {
        let payments = [
            payment(1, 2000, PaymentStatus::Completed),
            payment(2, 2000, PaymentStatus::Refunded),
        ];
        let stats = compute_stats(&[], &payments);
        assert_eq!(stats.total_revenue, 2000);
        assert_eq!(stats.total_refunded, 2000);
    }

    #[test]
    fn delivery_time_skips_missing_timestamps() {
        let mut fast = project(1, 10, ProjectStatus::Completed);
        fast.started_at = Some(t0());
        fast.completed_at = Some(t0() + Duration::hours(24));

        let mut slow = project(2, 10, ProjectStatus::Completed);
        slow.started_at = Some(t0());
        slow.completed_at = Some(t0() + Duration::hours(48));

        let mut unstarted = project(3, 10, ProjectStatus::Completed);
        unstarted.completed_at = Some(t0() + Duration::hours(1));

        let stats = compute_stats(&[fast, slow, unstarted], &[]);
        assert_eq!(stats.average_delivery_time, Some(36.0));
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(compute_stats(&[], &[])).unwrap();
        assert!(json.get("totalProjects").is_some());
        assert!(json.get("averageDeliveryTime").unwrap().is_null());
    }

    #[test]
    fn scope_parsing() {
        assert_eq!("global".parse::<StatsScope>().unwrap(), StatsScope::Global);
        assert_eq!("42".parse::<StatsScope>().unwrap(), StatsScope::Client(42));
        assert_matches!("abc".parse::<StatsScope>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn clients_limited_to_own_scope() {
        let client = Actor::client(10);
        assert!(StatsScope::Client(10).authorize(&client).is_ok());
        assert_matches!(
            StatsScope::Client(11).authorize(&client),
            Err(CoreError::Unauthorized(_))
        );
        assert_matches!(
            StatsScope::Global.authorize(&client),
            Err(CoreError::Unauthorized(_))
        );
        assert!(StatsScope::Global.authorize(&Actor::editor(2)).is_ok());
    }
}
