//! Repository layer against a real database.
//!
//! - Identity and package seeding
//! - Project insert, lookup and filtered listing
//! - Append-only payments, per project and per client
//! - The one-open-revision and one-active-assignment indexes
//! - Notification outbox rows

use assert_matches::assert_matches;
use chrono::Utc;
use reelworks_core::assignment::NewAssignment;
use reelworks_core::notifications::{NotificationKind, NotificationRequest};
use reelworks_core::payment::{NewPayment, PaymentMethod, RecordPayment};
use reelworks_core::project::{NewProject, Package, Project, ProjectIntake};
use reelworks_core::revision::NewRevision;
use reelworks_core::roles::{Identity, Role};
use reelworks_core::status::{PaymentStatus, ProjectStatus};
use reelworks_core::types::DbId;
use reelworks_db::models::identity::CreateIdentity;
use reelworks_db::models::package::CreatePackage;
use reelworks_db::repositories::{
    AssignmentRepo, IdentityRepo, NotificationRepo, PackageRepo, PaymentRepo, ProjectRepo,
    RevisionRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn identity(pool: &PgPool, name: &str, role: &str) -> DbId {
    IdentityRepo::create(
        pool,
        &CreateIdentity {
            display_name: name.to_string(),
            role: role.to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn package(pool: &PgPool) -> Package {
    PackageRepo::create(
        pool,
        &CreatePackage {
            name: "Starter".to_string(),
            price: 1500,
            delivery_days: 3,
            revision_count: 2,
        },
    )
    .await
    .unwrap()
    .into()
}

async fn project(pool: &PgPool, client_id: DbId, package: &Package) -> Project {
    let intake = ProjectIntake {
        title: "Launch teaser".to_string(),
        description: "Thirty second product teaser".to_string(),
        brand_colors: vec!["#FF5733".to_string()],
        ..Default::default()
    };
    ProjectRepo::create(
        pool,
        &NewProject::from_package(client_id, package, intake, Utc::now()),
    )
    .await
    .unwrap()
    .try_into()
    .unwrap()
}

fn payment(project: &Project, amount: i64, status: PaymentStatus) -> NewPayment {
    NewPayment::from_input(
        project.id,
        project.client_id,
        RecordPayment {
            amount,
            method: PaymentMethod::Mpesa,
            status,
            transaction_ref: Some("QK7TX2".to_string()),
            currency: None,
            payment_date: None,
        },
        Utc::now(),
    )
}

// ---------------------------------------------------------------------------
// Identities and packages
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_identity_round_trip(pool: PgPool) {
    let id = identity(&pool, "Otieno", "editor").await;

    let row = IdentityRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    let identity = Identity::try_from(row).unwrap();
    assert_eq!(identity.role, Role::Editor);
    assert!(identity.is_active);

    assert!(IdentityRepo::set_active(&pool, id, false).await.unwrap());
    let row = IdentityRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert!(!row.is_active);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_identity_role_is_checked(pool: PgPool) {
    let result = IdentityRepo::create(
        &pool,
        &CreateIdentity {
            display_name: "Root".to_string(),
            role: "superuser".to_string(),
        },
    )
    .await;
    assert!(result.is_err());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_package_listing_hides_inactive(pool: PgPool) {
    let starter = package(&pool).await;
    let premium = PackageRepo::create(
        &pool,
        &CreatePackage {
            name: "Premium".to_string(),
            price: 5000,
            delivery_days: 7,
            revision_count: 5,
        },
    )
    .await
    .unwrap();

    assert!(PackageRepo::deactivate(&pool, premium.id).await.unwrap());

    let active = PackageRepo::list_active(&pool).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, starter.id);
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_project_starts_pending_payment(pool: PgPool) {
    let client_id = identity(&pool, "Acme Ltd", "client").await;
    let package = package(&pool).await;

    let created = project(&pool, client_id, &package).await;
    assert_eq!(created.status, ProjectStatus::PendingPayment);
    assert_eq!(created.total_amount, 1500);
    assert_eq!(created.max_revisions, 2);
    assert_eq!(created.revision_count_used, 0);
    assert_eq!(created.intake.brand_colors, vec!["#FF5733".to_string()]);

    let found: Project = ProjectRepo::find_by_id(&pool, created.id)
        .await
        .unwrap()
        .unwrap()
        .try_into()
        .unwrap();
    assert_eq!(found, created);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_project_listing_filters(pool: PgPool) {
    let acme = identity(&pool, "Acme Ltd", "client").await;
    let globex = identity(&pool, "Globex", "client").await;
    let editor = identity(&pool, "Otieno", "editor").await;
    let package = package(&pool).await;

    let first = project(&pool, acme, &package).await;
    project(&pool, acme, &package).await;
    project(&pool, globex, &package).await;

    let mut conn = pool.acquire().await.unwrap();
    let mut assigned = first.clone();
    assigned.assigned_to = Some(editor);
    ProjectRepo::update(&mut conn, &assigned).await.unwrap();

    let all = ProjectRepo::list(&pool, None, None).await.unwrap();
    assert_eq!(all.len(), 3);
    let mine = ProjectRepo::list(&pool, Some(acme), None).await.unwrap();
    assert_eq!(mine.len(), 2);
    let assigned = ProjectRepo::list(&pool, None, Some(editor)).await.unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].id, first.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_revision_counter_cannot_exceed_budget(pool: PgPool) {
    let client_id = identity(&pool, "Acme Ltd", "client").await;
    let package = package(&pool).await;
    let mut over = project(&pool, client_id, &package).await;
    over.revision_count_used = over.max_revisions + 1;

    let mut conn = pool.acquire().await.unwrap();
    let result = ProjectRepo::update(&mut conn, &over).await;
    assert!(result.is_err());
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_payments_append_in_order(pool: PgPool) {
    let acme = identity(&pool, "Acme Ltd", "client").await;
    let globex = identity(&pool, "Globex", "client").await;
    let package = package(&pool).await;
    let first = project(&pool, acme, &package).await;
    let second = project(&pool, globex, &package).await;

    PaymentRepo::create(&pool, &payment(&first, 500, PaymentStatus::Failed))
        .await
        .unwrap();
    let completed = PaymentRepo::create(&pool, &payment(&first, 1500, PaymentStatus::Completed))
        .await
        .unwrap();
    PaymentRepo::create(&pool, &payment(&second, 1500, PaymentStatus::Completed))
        .await
        .unwrap();

    assert_eq!(completed.currency, "KES");
    assert!(completed.payment_date.is_some());

    let ledger = PaymentRepo::list_for_project(&pool, first.id).await.unwrap();
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[1].id, completed.id);

    let acme_payments = PaymentRepo::list_for_client(&pool, Some(acme)).await.unwrap();
    assert_eq!(acme_payments.len(), 2);
    let everything = PaymentRepo::list_for_client(&pool, None).await.unwrap();
    assert_eq!(everything.len(), 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_payment_currency_must_be_iso(pool: PgPool) {
    let client_id = identity(&pool, "Acme Ltd", "client").await;
    let package = package(&pool).await;
    let project = project(&pool, client_id, &package).await;

    let mut bad = payment(&project, 1500, PaymentStatus::Completed);
    bad.currency = "kes".to_string();
    assert!(PaymentRepo::create(&pool, &bad).await.is_err());
}

// ---------------------------------------------------------------------------
// Revisions and assignments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_only_one_open_revision(pool: PgPool) {
    let client_id = identity(&pool, "Acme Ltd", "client").await;
    let package = package(&pool).await;
    let project = project(&pool, client_id, &package).await;

    let new_revision = |number| NewRevision {
        project_id: project.id,
        revision_number: number,
        requested_by: client_id,
        description: "Tighten the intro".to_string(),
        created_at: Utc::now(),
    };

    let mut conn = pool.acquire().await.unwrap();
    RevisionRepo::create(&mut conn, &new_revision(1)).await.unwrap();
    let err = RevisionRepo::create(&mut conn, &new_revision(2))
        .await
        .unwrap_err();
    let db_err = err.as_database_error().unwrap();
    assert_eq!(db_err.constraint(), Some("uq_revisions_open"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_assignment_supersede(pool: PgPool) {
    let client_id = identity(&pool, "Acme Ltd", "client").await;
    let admin = identity(&pool, "Amina", "admin").await;
    let first_editor = identity(&pool, "Otieno", "editor").await;
    let second_editor = identity(&pool, "Njeri", "editor").await;
    let package = package(&pool).await;
    let project = project(&pool, client_id, &package).await;

    let assign = |editor_id| NewAssignment {
        project_id: project.id,
        editor_id,
        assigned_by: admin,
        assigned_at: Utc::now(),
    };

    let mut conn = pool.acquire().await.unwrap();
    AssignmentRepo::create(&mut conn, &assign(first_editor))
        .await
        .unwrap();

    // A second active row is rejected by the partial unique index.
    assert_matches!(
        AssignmentRepo::create(&mut conn, &assign(second_editor)).await,
        Err(sqlx::Error::Database(_))
    );

    let superseded = AssignmentRepo::supersede_active(&mut conn, project.id, Utc::now())
        .await
        .unwrap();
    assert_eq!(superseded, 1);
    AssignmentRepo::create(&mut conn, &assign(second_editor))
        .await
        .unwrap();

    let history = AssignmentRepo::list_for_project(&pool, project.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert!(!history[0].is_active);
    assert!(history[0].superseded_at.is_some());
    assert!(history[1].is_active);
    assert_eq!(history[1].editor_id, second_editor);
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_notification_outbox(pool: PgPool) {
    let client_id = identity(&pool, "Acme Ltd", "client").await;

    let request = NotificationRequest::new(
        client_id,
        NotificationKind::PaymentReceived,
        "Payment received",
        "We received KES 1500.",
    )
    .for_project(7);
    let created = NotificationRepo::create(&pool, &request).await.unwrap();
    assert_eq!(created.kind, "payment_received");
    assert_eq!(created.link.as_deref(), Some("/projects/7"));
    assert!(!created.is_read);

    assert!(NotificationRepo::mark_read(&pool, created.id, client_id)
        .await
        .unwrap());
    // Someone else cannot mark it.
    assert!(!NotificationRepo::mark_read(&pool, created.id, client_id + 1)
        .await
        .unwrap());

    let inbox = NotificationRepo::list_for_recipient(&pool, client_id, 10)
        .await
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert!(inbox[0].is_read);
}
