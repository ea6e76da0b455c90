//! Redis (tutum/redis) strategy

use super::{ServiceStrategy, ServiceType};
use crate::models::{EnvironmentVariables, Service};
use crate::utils::secret::generate_secret;

const PASSWORD: &str = "REDIS_PASS";

/// Password-protected redis cache. Backups are not supported.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisStrategy;

impl ServiceStrategy for RedisStrategy {
    fn service_type(&self) -> ServiceType {
        ServiceType::Redis
    }

    fn container_port(&self) -> u16 {
        6379
    }

    fn connection_string(&self, service: &Service, host: &str) -> String {
        format!(
            "redis://:{}@{}:{}",
            service.env(PASSWORD),
            host,
            service.port.unwrap_or_default()
        )
    }

    fn connection_command(&self, service: &Service, host: &str) -> String {
        format!(
            "redis-cli -h {} -p {} -a {}",
            host,
            service.port.unwrap_or_default(),
            service.env(PASSWORD)
        )
    }

    fn default_environment_variables(&self, _service: &Service) -> EnvironmentVariables {
        EnvironmentVariables::from([(PASSWORD.to_string(), generate_secret())])
    }

    fn required_environment_variables(&self) -> &'static [&'static str] {
        &[PASSWORD]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewService;

    fn cache() -> Service {
        Service::new(NewService {
            name: "cache1".to_string(),
            service_type: "redis".to_string(),
            port: Some(6400),
            environment_variables: EnvironmentVariables::from([(
                PASSWORD.to_string(),
                "s3cret".to_string(),
            )]),
            ..NewService::default()
        })
    }

    #[test]
    fn test_connection_details() {
        let service = cache();

        assert_eq!(
            RedisStrategy.connection_string(&service, "db.internal"),
            "redis://:s3cret@db.internal:6400"
        );
        assert_eq!(
            RedisStrategy.connection_command(&service, "db.internal"),
            "redis-cli -h db.internal -p 6400 -a s3cret"
        );
    }

    #[test]
    fn test_backup_is_unsupported() {
        let service = cache();

        assert!(!RedisStrategy.supports_backup());
        assert!(RedisStrategy.backup_environment_variables(&service, "localhost").is_err());
        assert!(RedisStrategy.backup_script_path().is_err());
        assert!(RedisStrategy.backup_file_name(&service).is_err());
    }
}
