//! Integration tests for the Car repository using in-memory SurrealDB.

use fleethire_core::models::car::{CreateCar, UpdateCar};
use fleethire_core::repository::CarRepository;
use fleethire_db::repository::SurrealCarRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    fleethire_db::run_migrations(&db).await.unwrap();
    db
}

fn hatchback(rate: f64) -> CreateCar {
    CreateCar {
        description: "Ford Fiesta".into(),
        daily_rate: rate,
        disabled: false,
        over_25: false,
        seats: 5,
        fuel_type: 1,
        gear_type: 1,
        body_type: 2,
        size: 1,
        colour: 3,
        image: "fiesta.jpg".into(),
    }
}

#[tokio::test]
async fn create_and_get_car() {
    let db = setup().await;
    let repo = SurrealCarRepository::new(db);

    let car = repo.create(hatchback(34.5)).await.unwrap();
    assert_eq!(car.description, "Ford Fiesta");
    assert_eq!(car.daily_rate, 34.5);
    assert!(!car.over_25);

    let fetched = repo.get(car.id).await.unwrap();
    assert_eq!(fetched.id, car.id);
    assert_eq!(fetched.seats, 5);
}

#[tokio::test]
async fn list_cars() {
    let db = setup().await;
    let repo = SurrealCarRepository::new(db);

    repo.create(hatchback(30.0)).await.unwrap();
    repo.create(CreateCar {
        description: "Audi A6".into(),
        daily_rate: 89.0,
        over_25: true,
        ..hatchback(0.0)
    })
    .await
    .unwrap();

    let cars = repo.list().await.unwrap();
    assert_eq!(cars.len(), 2);
}

#[tokio::test]
async fn partial_update_leaves_other_fields() {
    let db = setup().await;
    let repo = SurrealCarRepository::new(db);

    let car = repo.create(hatchback(34.5)).await.unwrap();

    let updated = repo
        .update(
            car.id,
            UpdateCar {
                daily_rate: Some(39.0),
                disabled: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.daily_rate, 39.0);
    assert!(updated.disabled);
    assert_eq!(updated.description, "Ford Fiesta");
    assert_eq!(updated.seats, 5);
}
