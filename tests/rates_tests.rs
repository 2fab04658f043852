//! Rate store behavior against the real SQLite backend.

mod support;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use support::TempDb;
use teamex::domain::UserId;
use teamex::error::Error;
use teamex::service::{AdminDirectory, AdminToken, RateService};
use teamex::stores::SqliteRateStore;
use teamex::testkit::domain::snapshot;

fn admin() -> AdminToken {
    AdminDirectory::new([UserId::new("admin")])
        .authorize(&UserId::new("admin"))
        .expect("admin is on the allowlist")
}

fn service(db: &TempDb) -> RateService<SqliteRateStore> {
    RateService::new(
        SqliteRateStore::new(db.pool()),
        snapshot(dec!(80.5), dec!(78.0)),
    )
}

#[tokio::test]
async fn default_is_persisted_on_first_read() {
    let db = TempDb::create("rates-default");
    let service = service(&db);

    let current = service.get_current().await.unwrap();
    assert_eq!(current, snapshot(dec!(80.5), dec!(78.0)));

    // A second service over the same database sees the persisted seed,
    // not its own default.
    let other = RateService::new(SqliteRateStore::new(db.pool()), snapshot(dec!(1), dec!(1)));
    assert_eq!(
        other.get_current().await.unwrap(),
        snapshot(dec!(80.5), dec!(78.0))
    );
}

#[tokio::test]
async fn update_then_read_returns_exactly_the_new_pair() {
    let db = TempDb::create("rates-update");
    let service = service(&db);

    service
        .update_rates(dec!(96.5), dec!(95.0), &admin())
        .await
        .unwrap();

    let current = service.get_current().await.unwrap();
    assert_eq!(current.buy_rate, dec!(96.5));
    assert_eq!(current.sell_rate, dec!(95.0));

    // The newest history entry is the snapshot that was just replaced.
    let history = service.history(None).await.unwrap();
    assert_eq!(history[0].snapshot(), snapshot(dec!(80.5), dec!(78.0)));
    assert_eq!(history[0].editor, "admin");
}

#[tokio::test]
async fn successive_updates_stack_newest_first() {
    let db = TempDb::create("rates-stack");
    let service = service(&db);

    service
        .update_rates(dec!(90), dec!(88), &admin())
        .await
        .unwrap();
    service
        .update_rates(dec!(96.5), dec!(95.0), &admin())
        .await
        .unwrap();

    let history = service.history(None).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].snapshot(), snapshot(dec!(90), dec!(88)));
    assert_eq!(history[1].snapshot(), snapshot(dec!(80.5), dec!(78.0)));
}

#[tokio::test]
async fn invalid_rates_leave_store_untouched() {
    let db = TempDb::create("rates-invalid");
    let service = service(&db);

    let before = service.get_current().await.unwrap();
    let err = service
        .update_rates(dec!(-5), dec!(95.0), &admin())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Domain(_)));

    assert_eq!(service.get_current().await.unwrap(), before);
    assert!(service.history(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_updates_lose_no_history() {
    let db = TempDb::create("rates-concurrent");
    let service = std::sync::Arc::new(service(&db));
    service.get_current().await.unwrap();

    let mut handles = Vec::new();
    for i in 1..=8i64 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .update_rates(Decimal::from(100 + i), Decimal::from(90 + i), &admin())
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Every update retired exactly one snapshot: the seed plus seven of
    // the eight new pairs.
    let history = service.history(None).await.unwrap();
    assert_eq!(history.len(), 8);
}
