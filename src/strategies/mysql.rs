//! MySQL strategy

use super::{database_identifier, ServiceStrategy, ServiceType, UnsupportedCapability};
use crate::models::{EnvironmentVariables, Service};
use crate::utils::secret::generate_secret;
use std::path::PathBuf;

const ROOT_PASSWORD: &str = "MYSQL_ROOT_PASSWORD";
const DATABASE: &str = "MYSQL_DATABASE";

#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlStrategy;

impl ServiceStrategy for MysqlStrategy {
    fn service_type(&self) -> ServiceType {
        ServiceType::Mysql
    }

    fn container_port(&self) -> u16 {
        3306
    }

    fn connection_string(&self, service: &Service, host: &str) -> String {
        format!(
            "mysql://root:{}@{}:{}/{}",
            service.env(ROOT_PASSWORD),
            host,
            service.port.unwrap_or_default(),
            service.env(DATABASE)
        )
    }

    fn connection_command(&self, service: &Service, host: &str) -> String {
        format!(
            "mysql -h {} -P {} -u root -p{} {}",
            host,
            service.port.unwrap_or_default(),
            service.env(ROOT_PASSWORD),
            service.env(DATABASE)
        )
        .trim_end()
        .to_string()
    }

    fn default_environment_variables(&self, service: &Service) -> EnvironmentVariables {
        EnvironmentVariables::from([
            (ROOT_PASSWORD.to_string(), generate_secret()),
            (DATABASE.to_string(), database_identifier(&service.name, "mysql")),
        ])
    }

    fn required_environment_variables(&self) -> &'static [&'static str] {
        &[ROOT_PASSWORD]
    }

    fn backup_environment_variables(
        &self,
        service: &Service,
        host: &str,
    ) -> Result<EnvironmentVariables, UnsupportedCapability> {
        Ok(EnvironmentVariables::from([
            ("MYSQL_HOST".to_string(), host.to_string()),
            ("MYSQL_TCP_PORT".to_string(), service.port.unwrap_or_default().to_string()),
            ("MYSQL_USER".to_string(), "root".to_string()),
            ("MYSQL_PWD".to_string(), service.env(ROOT_PASSWORD).to_string()),
            ("MYSQL_DATABASE".to_string(), service.env(DATABASE).to_string()),
        ]))
    }

    fn backup_script_path(&self) -> Result<PathBuf, UnsupportedCapability> {
        Ok(PathBuf::from("mysql.sh"))
    }

    fn backup_file_name(&self, service: &Service) -> Result<String, UnsupportedCapability> {
        let name = match service.env(DATABASE) {
            "" => "all-databases",
            db => db,
        };
        Ok(format!("{}.sql.gz", name))
    }
}
