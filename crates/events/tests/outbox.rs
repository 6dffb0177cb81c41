use std::time::Duration;

use reelworks_core::notifications::{NotificationKind, NotificationRequest, NotificationSink};
use reelworks_db::models::identity::CreateIdentity;
use reelworks_db::repositories::{IdentityRepo, NotificationRepo};
use reelworks_events::{EventBus, NotificationOutbox};
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn test_outbox_persists_until_bus_closes(pool: PgPool) {
    let client = IdentityRepo::create(
        &pool,
        &CreateIdentity {
            display_name: "Acme Ltd".to_string(),
            role: "client".to_string(),
        },
    )
    .await
    .unwrap();

    let bus = EventBus::default();
    let task = tokio::spawn(NotificationOutbox::run(pool.clone(), bus.subscribe()));

    bus.notify(
        NotificationRequest::new(
            client.id,
            NotificationKind::OrderConfirmation,
            "Order received",
            "We received \"Launch teaser\".",
        )
        .for_project(1),
    );
    // Unknown recipient: the insert fails and the loop keeps going.
    bus.notify(NotificationRequest::new(
        client.id + 1000,
        NotificationKind::System,
        "Lost",
        "Nobody home",
    ));
    bus.notify(NotificationRequest::new(
        client.id,
        NotificationKind::PaymentReceived,
        "Payment received",
        "KES 1500",
    ));

    drop(bus);
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("outbox should stop when the bus is dropped")
        .unwrap();

    let stored = NotificationRepo::list_for_recipient(&pool, client.id, 10)
        .await
        .unwrap();
    let mut kinds: Vec<_> = stored.iter().map(|n| n.kind.as_str()).collect();
    kinds.sort();
    assert_eq!(kinds, ["order_confirmation", "payment_received"]);
}
