//! Database-backed engine tests.
//!
//! Each test gets a fresh migrated database from `sqlx::test`.
//! Run with: DATABASE_URL=postgres://... cargo test -- --ignored

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use rust_decimal_macros::dec;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

use gymslots_server::{
    api::create_router,
    config::AppConfig,
    models::{
        client::{CreateClient, UpdateClient},
        equipment::CreateEquipment,
        receipt::{BillingPeriod, GenerateReceipts, StandingMode},
        EquipmentCategory, PrincipalClaims, Role,
    },
    services::Services,
    AppError, AppState,
};

const NATIONAL_IDS: [&str; 5] = ["12345678Z", "23456789D", "34567890V", "45678901G", "56789012B"];

fn services(pool: PgPool) -> Services {
    let state = AppState::new(AppConfig::default(), pool);
    (*state.services).clone()
}

async fn add_client(services: &Services, n: usize, last_name: &str) -> i32 {
    services
        .catalog
        .create_client(CreateClient {
            first_name: format!("Client{}", n),
            last_name: last_name.to_string(),
            national_id: NATIONAL_IDS[n].to_string(),
            phone: None,
            email: Some(format!("client{}@example.com", n)),
        })
        .await
        .unwrap()
        .id
}

async fn add_equipment(services: &Services, name: &str) -> i32 {
    services
        .equipment
        .create(&CreateEquipment {
            name: name.to_string(),
            category: Some(EquipmentCategory::Cardio),
            description: None,
        })
        .await
        .unwrap()
        .id
}

fn starts(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
}

// ---- Reservations ----

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_book_single_slot_then_conflict(pool: PgPool) {
    let services = services(pool);
    let client = add_client(&services, 0, "García").await;
    let other = add_client(&services, 1, "Fernández").await;
    let treadmill = add_equipment(&services, "Treadmill 1").await;

    let created = services
        .reservations
        .book(client, treadmill, 1, &starts(&["09:00"]))
        .await
        .unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].start_time.label(), "09:00");
    assert_eq!(created[0].end_time.label(), "09:30");

    let again = services
        .reservations
        .book(other, treadmill, 1, &starts(&["09:00"]))
        .await;
    match again {
        Err(AppError::SlotConflict { slots }) => assert_eq!(slots, vec!["09:00".to_string()]),
        other => panic!("expected slot conflict, got {:?}", other),
    }

    // Same slot on another weekday or another machine is fine
    services.reservations.book(other, treadmill, 2, &starts(&["09:00"])).await.unwrap();
    let bike = add_equipment(&services, "Bike 1").await;
    services.reservations.book(other, bike, 1, &starts(&["09:00"])).await.unwrap();
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_batch_is_all_or_nothing(pool: PgPool) {
    let services = services(pool);
    let juan = add_client(&services, 0, "García").await;
    let maria = add_client(&services, 1, "Fernández").await;
    let treadmill = add_equipment(&services, "Treadmill 1").await;

    services.reservations.book(maria, treadmill, 1, &starts(&["09:30"])).await.unwrap();

    let result = services
        .reservations
        .book(juan, treadmill, 1, &starts(&["09:00", "09:30", "10:00"]))
        .await;
    match result {
        Err(AppError::SlotConflict { slots }) => assert_eq!(slots, vec!["09:30".to_string()]),
        other => panic!("expected slot conflict, got {:?}", other),
    }

    let free = services.calendar.is_free(treadmill, 1, "09:00").await.unwrap();
    assert!(free.free);
    let free = services.calendar.is_free(treadmill, 1, "10:00").await.unwrap();
    assert!(free.free);
    assert!(services.reservations.list_by_client(juan).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_concurrent_bookings_single_winner(pool: PgPool) {
    let services = services(pool);
    let a = add_client(&services, 0, "García").await;
    let b = add_client(&services, 1, "Fernández").await;
    let treadmill = add_equipment(&services, "Treadmill 1").await;

    let s1 = services.clone();
    let s2 = services.clone();
    let first = tokio::spawn(async move { s1.reservations.book(a, treadmill, 3, &starts(&["18:00"])).await });
    let second = tokio::spawn(async move { s2.reservations.book(b, treadmill, 3, &starts(&["18:00"])).await });

    let results = [first.await.unwrap(), second.await.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::SlotConflict { .. })))
        .count();
    assert_eq!(wins, 1);
    assert_eq!(conflicts, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_batch_losing_insert_race_reports_all_taken_slots(pool: PgPool) {
    let services = services(pool.clone());
    let juan = add_client(&services, 0, "García").await;
    let maria = add_client(&services, 1, "Fernández").await;
    let treadmill = add_equipment(&services, "Treadmill 1").await;

    // Maria's rows are inserted but not committed: the availability check
    // cannot see them and Juan's insert blocks on the unique index
    let mut rival = pool.begin().await.unwrap();
    for start in ["09:30", "10:00"] {
        sqlx::query(
            r#"
            INSERT INTO reservations (client_id, equipment_id, weekday, start_time, end_time)
            VALUES ($1, $2, 1, $3::time, $3::time + INTERVAL '30 minutes')
            "#,
        )
        .bind(maria)
        .bind(treadmill)
        .bind(start)
        .execute(&mut *rival)
        .await
        .unwrap();
    }

    let booker = services.clone();
    let batch = tokio::spawn(async move {
        booker
            .reservations
            .book(juan, treadmill, 1, &starts(&["09:00", "09:30", "10:00"]))
            .await
    });
    tokio::time::sleep(Duration::from_millis(300)).await;
    rival.commit().await.unwrap();

    match batch.await.unwrap() {
        Err(AppError::SlotConflict { slots }) => {
            assert_eq!(slots, vec!["09:30".to_string(), "10:00".to_string()])
        }
        other => panic!("expected slot conflict, got {:?}", other),
    }
    assert!(services.reservations.list_by_client(juan).await.unwrap().is_empty());
    assert!(services.calendar.is_free(treadmill, 1, "09:00").await.unwrap().free);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_booking_requires_active_references(pool: PgPool) {
    let services = services(pool);
    let client = add_client(&services, 0, "García").await;
    let treadmill = add_equipment(&services, "Treadmill 1").await;

    let missing = services.reservations.book(999, treadmill, 1, &starts(&["09:00"])).await;
    assert!(matches!(missing, Err(AppError::InvalidReference(_))));

    services.equipment.deactivate(treadmill).await.unwrap();
    let retired = services.reservations.book(client, treadmill, 1, &starts(&["09:00"])).await;
    assert!(matches!(retired, Err(AppError::InvalidReference(_))));

    let bike = add_equipment(&services, "Bike 1").await;
    services.catalog.deactivate_client(client).await.unwrap();
    let inactive = services.reservations.book(client, bike, 1, &starts(&["09:00"])).await;
    assert!(matches!(inactive, Err(AppError::InvalidReference(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_cancel_frees_slot(pool: PgPool) {
    let services = services(pool);
    let client = add_client(&services, 0, "García").await;
    let treadmill = add_equipment(&services, "Treadmill 1").await;

    let created = services.reservations.book(client, treadmill, 5, &starts(&["20:00"])).await.unwrap();
    assert!(!services.calendar.is_free(treadmill, 5, "20:00").await.unwrap().free);

    services.reservations.cancel(created[0].id).await.unwrap();
    assert!(services.calendar.is_free(treadmill, 5, "20:00").await.unwrap().free);

    let gone = services.reservations.cancel(created[0].id).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_occupancy_grid(pool: PgPool) {
    let services = services(pool);
    let juan = add_client(&services, 0, "García").await;
    let treadmill = add_equipment(&services, "Treadmill 1").await;
    let bike = add_equipment(&services, "Bike 1").await;
    let retired = add_equipment(&services, "Old rower").await;

    services.reservations.book(juan, treadmill, 1, &starts(&["09:00", "09:30"])).await.unwrap();
    services.reservations.book(juan, retired, 1, &starts(&["09:00"])).await.unwrap();
    services.equipment.deactivate(retired).await.unwrap();

    let grid = services.calendar.occupancy_grid(1).await.unwrap();
    assert_eq!(grid.equipment.len(), 2);
    assert!(grid.equipment.iter().all(|e| e.slots.len() == 48));

    let row = grid.equipment.iter().find(|e| e.equipment_id == treadmill).unwrap();
    assert_eq!(row.occupied_slots, 2);
    assert_eq!(row.slots[18].client_name.as_deref(), Some("Client0 García"));
    let row = grid.equipment.iter().find(|e| e.equipment_id == bike).unwrap();
    assert_eq!(row.occupied_slots, 0);

    let tuesday = services.calendar.occupancy_grid(2).await.unwrap();
    assert!(tuesday.equipment.iter().all(|e| e.occupied_slots == 0));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_listings_are_ordered(pool: PgPool) {
    let services = services(pool);
    let juan = add_client(&services, 0, "García").await;
    let treadmill = add_equipment(&services, "Treadmill 1").await;
    let bike = add_equipment(&services, "Bike 1").await;

    services.reservations.book(juan, treadmill, 2, &starts(&["08:00"])).await.unwrap();
    services.reservations.book(juan, treadmill, 1, &starts(&["10:00"])).await.unwrap();
    services.reservations.book(juan, bike, 1, &starts(&["11:00"])).await.unwrap();

    let by_client = services.reservations.list_by_client(juan).await.unwrap();
    let order: Vec<(i16, &str)> = by_client
        .iter()
        .map(|r| (r.weekday.number(), r.start_time.label()))
        .collect();
    assert_eq!(order, vec![(1, "10:00"), (1, "11:00"), (2, "08:00")]);

    let monday = services.reservations.list_by_day(1).await.unwrap();
    let names: Vec<&str> = monday.iter().map(|r| r.equipment_name.as_str()).collect();
    assert_eq!(names, vec!["Bike 1", "Treadmill 1"]);

    let missing = services.reservations.list_by_client(999).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_email_only_client_login_books_for_itself(pool: PgPool) {
    const SECRET: &str = "engine-test-secret";
    let mut config = AppConfig::default();
    config.auth.jwt_secret = SECRET.to_string();
    let state = AppState::new(config, pool);
    let services = (*state.services).clone();
    let juan = add_client(&services, 0, "García").await;
    let treadmill = add_equipment(&services, "Treadmill 1").await;
    let app = create_router(state);

    let book = |email: &str| {
        let now = chrono::Utc::now().timestamp();
        let token = PrincipalClaims {
            sub: "gate-user".to_string(),
            role: Role::Client,
            client_id: None,
            email: Some(email.to_string()),
            exp: now + 3600,
            iat: now,
        }
        .create_token(SECRET)
        .unwrap();
        let body = json!({ "equipment_id": treadmill, "weekday": 2, "starts": ["07:00"] });
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/reservations")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let response = app.clone().oneshot(book("CLIENT0@example.com")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let booked = services.reservations.list_by_client(juan).await.unwrap();
    assert_eq!(booked.len(), 1);
    assert_eq!(booked[0].start_time.label(), "07:00");

    let response = app.oneshot(book("stranger@example.com")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---- Clients ----

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_national_id_stays_reserved_after_deactivation(pool: PgPool) {
    let services = services(pool);
    let juan = add_client(&services, 0, "García").await;

    let lower = CreateClient {
        first_name: "Other".to_string(),
        last_name: "Person".to_string(),
        national_id: "12345678z".to_string(),
        phone: None,
        email: None,
    };
    assert!(matches!(
        services.catalog.create_client(lower).await,
        Err(AppError::DuplicateKey(_))
    ));

    services.catalog.deactivate_client(juan).await.unwrap();
    let again = CreateClient {
        first_name: "Juan".to_string(),
        last_name: "García".to_string(),
        national_id: "12345678Z".to_string(),
        phone: None,
        email: None,
    };
    match services.catalog.create_client(again).await {
        Err(AppError::DuplicateKey(msg)) => assert!(msg.contains("deactivated")),
        other => panic!("expected duplicate key, got {:?}", other),
    }

    let reactivated = services
        .catalog
        .update_client(
            juan,
            UpdateClient {
                first_name: None,
                last_name: None,
                phone: None,
                email: None,
                active: Some(true),
            },
        )
        .await
        .unwrap();
    assert!(reactivated.active);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_email_is_unique_case_insensitive(pool: PgPool) {
    let services = services(pool);
    add_client(&services, 0, "García").await;

    let shouting = CreateClient {
        first_name: "Other".to_string(),
        last_name: "Person".to_string(),
        national_id: NATIONAL_IDS[1].to_string(),
        phone: None,
        email: Some("CLIENT0@Example.com".to_string()),
    };
    assert!(matches!(
        services.catalog.create_client(shouting).await,
        Err(AppError::DuplicateKey(_))
    ));

    let found = services.catalog.find_by_email("Client0@example.com").await.unwrap();
    assert_eq!(found.national_id, NATIONAL_IDS[0]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_hard_delete_cascades(pool: PgPool) {
    let services = services(pool);
    let juan = add_client(&services, 0, "García").await;
    let treadmill = add_equipment(&services, "Treadmill 1").await;
    services.reservations.book(juan, treadmill, 1, &starts(&["09:00"])).await.unwrap();
    services
        .billing
        .generate(&GenerateReceipts { month: 1, year: 2025, amount: None })
        .await
        .unwrap();

    services.catalog.delete_client(juan).await.unwrap();
    assert!(services.calendar.is_free(treadmill, 1, "09:00").await.unwrap().free);
    assert!(services.billing.pending(None).await.unwrap().is_empty());
    assert!(matches!(
        services.catalog.get_client(juan).await,
        Err(AppError::NotFound(_))
    ));
}

// ---- Billing ----

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_generation_is_idempotent(pool: PgPool) {
    let services = services(pool);
    for (n, name) in ["García", "Fernández", "Martínez", "López", "Sánchez"].iter().enumerate() {
        add_client(&services, n, name).await;
    }
    let request = GenerateReceipts { month: 3, year: 2025, amount: Some(dec!(45.00)) };

    let first = services.billing.generate(&request).await.unwrap();
    assert_eq!(first.created, 5);
    assert_eq!(first.amount, dec!(45.00));

    let second = services.billing.generate(&request).await.unwrap();
    assert_eq!(second.created, 0);

    let period = BillingPeriod::new(3, 2025).unwrap();
    let receipts = services.billing.list_receipts(Some(period)).await.unwrap();
    assert_eq!(receipts.len(), 5);
    assert!(receipts.iter().all(|r| !r.paid && r.amount == dec!(45.00)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_generation_skips_inactive_and_uses_default_fee(pool: PgPool) {
    let services = services(pool);
    add_client(&services, 0, "García").await;
    let gone = add_client(&services, 1, "Fernández").await;
    services.catalog.deactivate_client(gone).await.unwrap();

    let summary = services
        .billing
        .generate(&GenerateReceipts { month: 4, year: 2025, amount: None })
        .await
        .unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.amount, dec!(50.00));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_payment_and_delinquents(pool: PgPool) {
    let services = services(pool);
    let mut ids = Vec::new();
    for (n, name) in ["García", "Fernández", "Martínez", "López", "Sánchez"].iter().enumerate() {
        ids.push(add_client(&services, n, name).await);
    }
    services
        .billing
        .generate(&GenerateReceipts { month: 3, year: 2025, amount: None })
        .await
        .unwrap();

    let pending = services.billing.pending(Some(ids[0])).await.unwrap();
    assert_eq!(pending.len(), 1);

    let outcome = services.billing.record_payment(pending[0].id).await.unwrap();
    assert!(!outcome.already_paid);
    assert!(outcome.receipt.paid);
    let paid_on = outcome.receipt.payment_date;
    assert!(paid_on.is_some());

    let repeat = services.billing.record_payment(pending[0].id).await.unwrap();
    assert!(repeat.already_paid);
    assert!(repeat.warning.is_some());
    assert_eq!(repeat.receipt.payment_date, paid_on);

    assert!(matches!(
        services.billing.record_payment(99_999).await,
        Err(AppError::NotFound(_))
    ));

    let delinquents = services.billing.delinquents().await.unwrap();
    assert_eq!(delinquents.len(), 4);
    assert!(delinquents.iter().all(|d| d.client_id != ids[0]));
    assert!(delinquents.iter().all(|d| d.unpaid_count == 1 && d.total_owed == dec!(50.00)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_delinquent_totals_and_order(pool: PgPool) {
    let services = services(pool);
    let garcia = add_client(&services, 0, "García").await;
    let lopez = add_client(&services, 1, "López").await;

    for month in [1, 2] {
        services
            .billing
            .generate(&GenerateReceipts { month, year: 2025, amount: Some(dec!(30.00)) })
            .await
            .unwrap();
    }
    let lopez_pending = services.billing.pending(Some(lopez)).await.unwrap();
    services.billing.record_payment(lopez_pending[0].id).await.unwrap();

    let delinquents = services.billing.delinquents().await.unwrap();
    assert_eq!(delinquents.len(), 2);
    assert_eq!(delinquents[0].client_id, garcia);
    assert_eq!(delinquents[0].unpaid_count, 2);
    assert_eq!(delinquents[0].total_owed, dec!(60.00));
    assert_eq!(delinquents[1].client_id, lopez);
    assert_eq!(delinquents[1].total_owed, dec!(30.00));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_good_standing_modes(pool: PgPool) {
    let services = services(pool);
    let garcia = add_client(&services, 0, "García").await;
    let lopez = add_client(&services, 1, "López").await;
    let martinez = add_client(&services, 2, "Martínez").await;

    services
        .billing
        .generate(&GenerateReceipts { month: 3, year: 2025, amount: None })
        .await
        .unwrap();
    for id in [garcia, martinez] {
        let pending = services.billing.pending(Some(id)).await.unwrap();
        services.billing.record_payment(pending[0].id).await.unwrap();
    }

    let march = StandingMode::PaidForPeriod(BillingPeriod::new(3, 2025).unwrap());
    let paid: Vec<i32> = services.billing.good_standing(march).await.unwrap().iter().map(|c| c.id).collect();
    assert_eq!(paid, vec![garcia, martinez]);

    let april = StandingMode::PaidForPeriod(BillingPeriod::new(4, 2025).unwrap());
    assert!(services.billing.good_standing(april).await.unwrap().is_empty());

    let clean: Vec<i32> = services
        .billing
        .good_standing(StandingMode::NoOutstandingReceipts)
        .await
        .unwrap()
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(clean, vec![garcia, martinez]);
    assert!(!clean.contains(&lopez));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_regeneration_keeps_paid_receipts(pool: PgPool) {
    let services = services(pool);
    let juan = add_client(&services, 0, "García").await;
    let march = GenerateReceipts { month: 3, year: 2025, amount: None };
    services.billing.generate(&march).await.unwrap();

    let pending = services.billing.pending(Some(juan)).await.unwrap();
    let paid = services.billing.record_payment(pending[0].id).await.unwrap();

    let rerun = GenerateReceipts { month: 3, year: 2025, amount: Some(dec!(70.00)) };
    assert_eq!(services.billing.generate(&rerun).await.unwrap().created, 0);

    let history = services.billing.client_receipts(juan).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].paid);
    assert_eq!(history[0].amount, dec!(50.00));
    assert_eq!(history[0].payment_date, paid.receipt.payment_date);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_deactivated_debtor_is_left_out_of_reports(pool: PgPool) {
    let services = services(pool);
    let garcia = add_client(&services, 0, "García").await;
    let lopez = add_client(&services, 1, "López").await;
    services
        .billing
        .generate(&GenerateReceipts { month: 5, year: 2025, amount: None })
        .await
        .unwrap();
    let pending = services.billing.pending(Some(garcia)).await.unwrap();
    services.billing.record_payment(pending[0].id).await.unwrap();

    services.catalog.deactivate_client(lopez).await.unwrap();
    assert_eq!(services.billing.pending(Some(lopez)).await.unwrap().len(), 1);
    assert!(services.billing.delinquents().await.unwrap().is_empty());

    let clean: Vec<i32> = services
        .billing
        .good_standing(StandingMode::NoOutstandingReceipts)
        .await
        .unwrap()
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(clean, vec![garcia]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_global_pending_is_ordered_by_client_then_period(pool: PgPool) {
    let services = services(pool);
    let lopez = add_client(&services, 0, "López").await;
    let garcia = add_client(&services, 1, "García").await;
    for (month, year) in [(2, 2025), (12, 2024), (1, 2025)] {
        services
            .billing
            .generate(&GenerateReceipts { month, year, amount: None })
            .await
            .unwrap();
    }

    let order: Vec<(i32, i32, i16)> = services
        .billing
        .pending(None)
        .await
        .unwrap()
        .iter()
        .map(|r| (r.client_id, r.year, r.month))
        .collect();
    assert_eq!(
        order,
        vec![
            (garcia, 2024, 12),
            (garcia, 2025, 1),
            (garcia, 2025, 2),
            (lopez, 2024, 12),
            (lopez, 2025, 1),
            (lopez, 2025, 2),
        ]
    );
}
