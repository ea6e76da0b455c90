//! PostgreSQL strategy

use super::{database_identifier, ServiceStrategy, ServiceType, UnsupportedCapability};
use crate::models::{EnvironmentVariables, Service};
use crate::utils::secret::generate_secret;
use std::path::PathBuf;

const USER: &str = "POSTGRES_USER";
const PASSWORD: &str = "POSTGRES_PASSWORD";
const DATABASE: &str = "POSTGRES_DB";

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresStrategy;

impl PostgresStrategy {
    fn database<'a>(&self, service: &'a Service) -> &'a str {
        match service.env(DATABASE) {
            "" => "postgres",
            db => db,
        }
    }
}

impl ServiceStrategy for PostgresStrategy {
    fn service_type(&self) -> ServiceType {
        ServiceType::Postgres
    }

    fn container_port(&self) -> u16 {
        5432
    }

    fn connection_string(&self, service: &Service, host: &str) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            service.env(USER),
            service.env(PASSWORD),
            host,
            service.port.unwrap_or_default(),
            self.database(service)
        )
    }

    fn connection_command(&self, service: &Service, host: &str) -> String {
        format!(
            "PGPASSWORD={} psql -h {} -p {} -U {} {}",
            service.env(PASSWORD),
            host,
            service.port.unwrap_or_default(),
            service.env(USER),
            self.database(service)
        )
    }

    fn default_environment_variables(&self, service: &Service) -> EnvironmentVariables {
        EnvironmentVariables::from([
            (USER.to_string(), "postgres".to_string()),
            (PASSWORD.to_string(), generate_secret()),
            (DATABASE.to_string(), database_identifier(&service.name, "postgres")),
        ])
    }

    fn required_environment_variables(&self) -> &'static [&'static str] {
        &[USER, PASSWORD, DATABASE]
    }

    fn backup_environment_variables(
        &self,
        service: &Service,
        host: &str,
    ) -> Result<EnvironmentVariables, UnsupportedCapability> {
        Ok(EnvironmentVariables::from([
            ("PGHOST".to_string(), host.to_string()),
            ("PGPORT".to_string(), service.port.unwrap_or_default().to_string()),
            ("PGUSER".to_string(), service.env(USER).to_string()),
            ("PGPASSWORD".to_string(), service.env(PASSWORD).to_string()),
            ("PGDATABASE".to_string(), self.database(service).to_string()),
        ]))
    }

    fn backup_script_path(&self) -> Result<PathBuf, UnsupportedCapability> {
        Ok(PathBuf::from("postgres.sh"))
    }

    fn backup_file_name(&self, service: &Service) -> Result<String, UnsupportedCapability> {
        Ok(format!("{}.sql.gz", self.database(service)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewService;

    fn orders() -> Service {
        Service::new(NewService {
            name: "Orders".to_string(),
            service_type: "postgres".to_string(),
            port: Some(15432),
            environment_variables: EnvironmentVariables::from([(
                PASSWORD.to_string(),
                "pw".to_string(),
            )]),
            ..NewService::default()
        })
    }

    #[test]
    fn test_defaults_derive_database_from_name() {
        let service = orders();

        assert_eq!(service.env(USER), "postgres");
        assert_eq!(service.env(DATABASE), "orders");
        // explicit value survives the merge
        assert_eq!(service.env(PASSWORD), "pw");
    }

    #[test]
    fn test_connection_details() {
        let service = orders();

        assert_eq!(
            PostgresStrategy.connection_string(&service, "localhost"),
            "postgres://postgres:pw@localhost:15432/orders"
        );
        assert_eq!(
            PostgresStrategy.connection_command(&service, "localhost"),
            "PGPASSWORD=pw psql -h localhost -p 15432 -U postgres orders"
        );
    }

    #[test]
    fn test_backup_metadata() {
        let service = orders();

        let env = PostgresStrategy
            .backup_environment_variables(&service, "10.0.0.5")
            .unwrap();
        assert_eq!(env["PGHOST"], "10.0.0.5");
        assert_eq!(env["PGPORT"], "15432");
        assert_eq!(env["PGDATABASE"], "orders");

        assert!(PostgresStrategy.supports_backup());
        assert_eq!(PostgresStrategy.backup_script_path().unwrap(), PathBuf::from("postgres.sh"));
        assert_eq!(PostgresStrategy.backup_file_name(&service).unwrap(), "orders.sql.gz");
    }
}
