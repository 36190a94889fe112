//! Runs against a real MongoDB server. Ignored by default:
//!
//! `SHELTER_MONGO_USERNAME=aacuser SHELTER_MONGO_PASSWORD=... cargo test -- --ignored`
//!
//! Optional: `SHELTER_MONGO_HOST`, `SHELTER_MONGO_PORT`.

use shelter_core::{doc, AnimalShelter, Bson, ConnectionConfig};

fn live_config() -> ConnectionConfig {
    let username = std::env::var("SHELTER_MONGO_USERNAME").expect("SHELTER_MONGO_USERNAME");
    let password = std::env::var("SHELTER_MONGO_PASSWORD").expect("SHELTER_MONGO_PASSWORD");
    let mut config = ConnectionConfig::new(username, password)
        .with_data_database("shelter_core_test")
        .with_collection(format!("animals_{}", std::process::id()));
    if let Ok(host) = std::env::var("SHELTER_MONGO_HOST") {
        config = config.with_host(host);
    }
    if let Ok(port) = std::env::var("SHELTER_MONGO_PORT") {
        config = config.with_port(port.parse().expect("SHELTER_MONGO_PORT must be a port"));
    }
    config
}

#[test]
#[ignore = "needs a running MongoDB server"]
fn live_rex_lifecycle() {
    let shelter = AnimalShelter::connect(&live_config());
    assert!(shelter.is_connected(), "{:?}", shelter.disabled_reason());
    shelter.delete(doc! {});

    assert!(shelter.create(doc! { "_id": "caller", "name": "Rex", "species": "dog" }));
    let found = shelter.read(doc! { "name": "Rex" }, Bson::Null);
    assert_eq!(found.len(), 1);
    assert!(matches!(found[0].get("_id"), Some(Bson::ObjectId(_))));

    assert_eq!(shelter.update(doc! { "name": "Rex" }, doc! { "species": "canine" }), 1);
    assert_eq!(shelter.update(doc! { "name": "Rex" }, doc! { "species": "canine" }), 0);
    assert_eq!(shelter.delete(doc! { "name": "Rex" }), 1);
    assert!(shelter.read(doc! { "name": "Rex" }, Bson::Null).is_empty());
}

#[test]
#[ignore = "needs a running MongoDB server"]
fn live_wrong_password_disables_facade() {
    let mut config = live_config();
    config.password.push_str("-wrong");
    let shelter = AnimalShelter::connect(&config);

    assert!(!shelter.is_connected());
    assert!(!shelter.create(doc! { "name": "Rex" }));
    assert!(shelter.read(Bson::Null, Bson::Null).is_empty());
    assert_eq!(shelter.update(doc! {}, doc! { "species": "dog" }), 0);
    assert_eq!(shelter.delete(doc! {}), 0);
}
