//! Test fixtures and sample data

use service_manager::models::{EnvironmentVariables, NewService};

/// Fields for a service of `service_type` with every default left to construction
pub fn new_service(name: &str, service_type: &str) -> NewService {
    NewService {
        name: name.to_string(),
        service_type: service_type.to_string(),
        ..NewService::default()
    }
}

/// Fields for a service bound to an explicit port
pub fn service_on_port(name: &str, service_type: &str, port: u16) -> NewService {
    NewService {
        port: Some(port),
        ..new_service(name, service_type)
    }
}

/// Fields for a service already associated with a container
pub fn service_with_container(name: &str, service_type: &str, container_id: &str) -> NewService {
    NewService {
        container_id: Some(container_id.to_string()),
        ..new_service(name, service_type)
    }
}

/// Build an environment from literal pairs
pub fn env(pairs: &[(&str, &str)]) -> EnvironmentVariables {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A postgres service with known credentials
pub fn postgres_service(name: &str) -> NewService {
    NewService {
        environment_variables: env(&[
            ("POSTGRES_USER", "app"),
            ("POSTGRES_PASSWORD", "s3cret"),
            ("POSTGRES_DB", "appdb"),
        ]),
        ..new_service(name, "postgres")
    }
}

/// A mysql service with known credentials
pub fn mysql_service(name: &str) -> NewService {
    NewService {
        environment_variables: env(&[
            ("MYSQL_ROOT_PASSWORD", "s3cret"),
            ("MYSQL_DATABASE", "shop"),
        ]),
        ..new_service(name, "mysql")
    }
}

/// Minimal valid config TOML: every field defaulted
pub fn minimal_config_toml() -> &'static str {
    ""
}

/// Config TOML overriding the host and one image
pub fn custom_config_toml() -> &'static str {
    r#"
[global]
host = "db.internal"
max_port_attempts = 3

[images]
postgres = "postgres:16-alpine"
"#
}
