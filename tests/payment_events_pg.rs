use std::sync::Arc;

use chrono::{Duration, Utc};
use storefront_relay::{
    config::SweeperConfig,
    db::{self, pg::PgPaymentEventStore, PaymentEventStore},
    domain::PaymentEventStatus,
    sweeper::RetentionSweeper,
};

#[derive(sqlx::FromRow)]
struct RemainingRow {
    id: String,
    status: PaymentEventStatus,
}

#[tokio::test]
async fn postgres_sweep_removes_only_expired_rows() -> Result<(), Box<dyn std::error::Error>> {
    let Some(database_url) = std::env::var("DATABASE_URL").ok() else {
        eprintln!("skipping integration test: DATABASE_URL is not set");
        return Ok(());
    };

    let pool = db::connect(&database_url).await?;
    db::run_migrations(&pool).await?;

    let prefix = format!("evt_it_{}", uuid::Uuid::new_v4().simple());
    let now = Utc::now();
    let rows = [
        ("processed-old", PaymentEventStatus::Processed, now - Duration::days(8)),
        ("processed-new", PaymentEventStatus::Processed, now - Duration::days(2)),
        ("error-mid", PaymentEventStatus::Error, now - Duration::days(8)),
        ("error-old", PaymentEventStatus::Error, now - Duration::days(31)),
    ];
    for (suffix, status, created_at) in rows {
        sqlx::query("INSERT INTO payment_events (id, status, created_at) VALUES ($1, $2, $3)")
            .bind(format!("{prefix}-{suffix}"))
            .bind(status)
            .bind(created_at)
            .execute(&pool)
            .await?;
    }

    let store = PgPaymentEventStore::new(pool.clone());
    let expired = store
        .expired_ids(PaymentEventStatus::Processed, now - Duration::days(7), 10)
        .await?;
    assert!(expired.contains(&format!("{prefix}-processed-old")));
    assert!(!expired.contains(&format!("{prefix}-processed-new")));

    let sweeper = RetentionSweeper::new(
        Arc::new(store),
        SweeperConfig {
            batch_size: 1,
            ..SweeperConfig::default()
        },
    );
    let report = sweeper.purge_expired_at(now).await?;
    assert!(report.processed >= 1);
    assert!(report.error >= 1);

    let remaining = sqlx::query_as::<_, RemainingRow>(
        r#"
        SELECT id, status
        FROM payment_events
        WHERE id LIKE $1
        ORDER BY id ASC
        "#,
    )
    .bind(format!("{prefix}%"))
    .fetch_all(&pool)
    .await?;

    let remaining = remaining
        .into_iter()
        .map(|row| (row.id, row.status))
        .collect::<Vec<_>>();
    assert_eq!(
        remaining,
        vec![
            (format!("{prefix}-error-mid"), PaymentEventStatus::Error),
            (format!("{prefix}-processed-new"), PaymentEventStatus::Processed),
        ]
    );

    sqlx::query("DELETE FROM payment_events WHERE id LIKE $1")
        .bind(format!("{prefix}%"))
        .execute(&pool)
        .await?;

    Ok(())
}
