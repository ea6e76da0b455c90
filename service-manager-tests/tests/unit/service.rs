//! Construction defaults and validation of services

use service_manager::models::{validation, Field, Service};
use service_manager::store::{JsonStore, ServiceRepository};
use test_utils::{env, new_service, postgres_service, service_on_port};

#[test]
fn test_defaults_fill_missing_fields_only() {
    let service = Service::new(postgres_service("orders"));

    assert!(service.port.is_some());
    assert_eq!(service.image.as_deref(), Some("postgres"));
    // Supplied credentials survive defaulting
    assert_eq!(service.env("POSTGRES_USER"), "app");
    assert_eq!(service.env("POSTGRES_DB"), "appdb");
}

#[test]
fn test_generated_secrets_differ_between_services() {
    let a = Service::new(new_service("a", "redis"));
    let b = Service::new(new_service("b", "redis"));

    assert_eq!(a.env("REDIS_PASS").len(), 32);
    assert_ne!(a.env("REDIS_PASS"), b.env("REDIS_PASS"));
}

#[test]
fn test_taken_port_is_reported() {
    let store = JsonStore::in_memory();
    store
        .insert_service(Service::new(service_on_port("a", "redis", 7000)))
        .unwrap();

    let errors = Service::new(service_on_port("b", "redis", 7000))
        .validate(&store)
        .unwrap_err();

    assert_eq!(errors.on(Field::Port), vec![validation::TAKEN]);
    assert_eq!(errors.full_messages(), vec!["port has already been taken"]);
}

#[test]
fn test_saved_service_does_not_collide_with_itself() {
    let store = JsonStore::in_memory();
    let saved = store
        .insert_service(Service::new(service_on_port("a", "redis", 7000)))
        .unwrap();

    assert!(saved.validate(&store).is_ok());
}

#[test]
fn test_missing_required_variables_are_listed() {
    let mut fields = postgres_service("orders");
    fields.environment_variables = env(&[("POSTGRES_USER", ""), ("POSTGRES_DB", "")]);
    fields.environment_variables.insert("POSTGRES_PASSWORD".to_string(), " ".to_string());
    let service = Service::new(fields);

    let errors = service.validate(&JsonStore::in_memory()).unwrap_err();

    assert_eq!(
        errors.on(Field::EnvironmentVariables),
        vec![
            "POSTGRES_USER is required",
            "POSTGRES_PASSWORD is required",
            "POSTGRES_DB is required",
        ]
    );
}

#[test]
fn test_blank_type_is_blank_not_unknown() {
    let service = Service::new(service_on_port("x", "", 7000));

    let errors = service.validate(&JsonStore::in_memory()).unwrap_err();

    assert_eq!(errors.on(Field::ServiceType), vec![validation::BLANK]);
}
