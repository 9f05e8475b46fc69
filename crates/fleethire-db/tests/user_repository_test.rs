//! Integration tests for the User repository using in-memory SurrealDB.

use chrono::NaiveDate;
use fleethire_core::models::user::CreateUser;
use fleethire_core::repository::UserRepository;
use fleethire_db::repository::SurrealUserRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    fleethire_db::run_migrations(&db).await.unwrap();
    db
}

fn new_user(email: &str, name: &str) -> CreateUser {
    CreateUser {
        email: email.into(),
        full_name: name.into(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
        dob: NaiveDate::from_ymd_opt(1990, 3, 12).unwrap(),
    }
}

#[tokio::test]
async fn create_and_get_user() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(new_user("alice@example.com", "Alice Smith"))
        .await
        .unwrap();

    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.full_name, "Alice Smith");
    assert!(!user.blacklisted);
    assert!(!user.repeat);
    assert!(!user.admin);

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.dob, user.dob);
}

#[tokio::test]
async fn get_user_by_email() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(new_user("bob@example.com", "Bob Jones"))
        .await
        .unwrap();

    let fetched = repo.get_by_email("bob@example.com").await.unwrap();
    assert_eq!(fetched.id, user.id);

    let missing = repo.get_by_email("nobody@example.com").await;
    assert!(missing.is_err());
}

#[tokio::test]
async fn duplicate_email_rejected() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.create(new_user("same@example.com", "First"))
        .await
        .unwrap();

    let result = repo.create(new_user("same@example.com", "Second")).await;
    assert!(result.is_err(), "duplicate email should be rejected");
}

#[tokio::test]
async fn account_flags_round_trip() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(new_user("carol@example.com", "Carol White"))
        .await
        .unwrap();

    repo.set_blacklisted(user.id, true).await.unwrap();
    repo.set_repeat(user.id).await.unwrap();
    repo.set_disabled(user.id, true).await.unwrap();
    repo.set_admin(user.id, true).await.unwrap();

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert!(fetched.blacklisted);
    assert!(fetched.repeat);
    assert!(fetched.disabled);
    assert!(fetched.admin);

    repo.set_blacklisted(user.id, false).await.unwrap();
    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert!(!fetched.blacklisted);
    assert!(fetched.repeat, "repeat flag is one-way");
}

#[tokio::test]
async fn search_matches_email_and_name() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.create(new_user("dave@example.com", "Dave Green"))
        .await
        .unwrap();
    repo.create(new_user("erin@example.com", "Erin Greenwood"))
        .await
        .unwrap();
    repo.create(new_user("frank@example.com", "Frank Black"))
        .await
        .unwrap();

    let hits = repo.search("green").await.unwrap();
    assert_eq!(hits.len(), 2);

    let hits = repo.search("frank@").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].full_name, "Frank Black");
}
