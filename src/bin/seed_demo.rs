//! Load a small demo data set: five clients, seven machines and a few
//! standing reservations. Re-running skips what already exists.

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gymslots_server::{
    config::AppConfig,
    models::{client::CreateClient, equipment::CreateEquipment, EquipmentCategory},
    AppError, AppState,
};

const CLIENTS: &[(&str, &str, &str, &str, &str)] = &[
    ("Juan", "García López", "12345678Z", "600111222", "juan@email.com"),
    ("María", "Fernández Ruiz", "23456789D", "600222333", "maria@email.com"),
    ("Carlos", "Martínez Sanz", "34567890V", "600333444", "carlos@email.com"),
    ("Ana", "López Pérez", "45678901G", "600444555", "ana@email.com"),
    ("Pedro", "Sánchez Gil", "56789012B", "600555666", "pedro@email.com"),
];

const EQUIPMENT: &[(&str, EquipmentCategory, &str)] = &[
    ("Cinta de correr 1", EquipmentCategory::Cardio, "Cinta de correr profesional"),
    ("Cinta de correr 2", EquipmentCategory::Cardio, "Cinta de correr profesional"),
    ("Bicicleta estática 1", EquipmentCategory::Cardio, "Bicicleta estática con monitor"),
    ("Press de banca", EquipmentCategory::Strength, "Press de banca con barra olímpica"),
    ("Máquina de poleas", EquipmentCategory::Strength, "Máquina multiusos de poleas"),
    ("Elíptica 1", EquipmentCategory::Cardio, "Máquina elíptica"),
    ("Rack de sentadillas", EquipmentCategory::Strength, "Rack para sentadillas y dominadas"),
];

/// (client index, equipment index, weekday, start)
const RESERVATIONS: &[(usize, usize, i16, &str)] = &[
    (0, 0, 1, "09:00"),
    (0, 0, 1, "09:30"),
    (1, 0, 1, "10:00"),
    (2, 3, 2, "18:00"),
    (3, 2, 3, "07:00"),
    (4, 4, 4, "20:00"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "seed_demo={0},gymslots_server={0}",
            config.logging.level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let state = AppState::new(config, pool);
    let services = &state.services;

    let mut client_ids = Vec::with_capacity(CLIENTS.len());
    for &(first_name, last_name, national_id, phone, email) in CLIENTS {
        let data = CreateClient {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            national_id: national_id.to_string(),
            phone: Some(phone.to_string()),
            email: Some(email.to_string()),
        };
        let client = match services.catalog.create_client(data).await {
            Ok(client) => client,
            Err(AppError::DuplicateKey(_)) => services.catalog.find_by_national_id(national_id).await?,
            Err(e) => return Err(e.into()),
        };
        client_ids.push(client.id);
    }

    let existing = services.equipment.list(false).await?;
    let mut equipment_ids = Vec::with_capacity(EQUIPMENT.len());
    for &(name, category, description) in EQUIPMENT {
        let id = match existing.iter().find(|e| e.name == name) {
            Some(eq) => eq.id,
            None => {
                let data = CreateEquipment {
                    name: name.to_string(),
                    category: Some(category),
                    description: Some(description.to_string()),
                };
                services.equipment.create(&data).await?.id
            }
        };
        equipment_ids.push(id);
    }

    let mut booked = 0;
    for &(client, equipment, weekday, start) in RESERVATIONS {
        let result = services
            .reservations
            .book(client_ids[client], equipment_ids[equipment], weekday, &[start.to_string()])
            .await;
        match result {
            Ok(created) => booked += created.len(),
            Err(AppError::SlotConflict { .. }) => {}
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(
        "Demo data ready: {} clients, {} equipment, {} new reservations",
        client_ids.len(),
        equipment_ids.len(),
        booked
    );
    Ok(())
}
