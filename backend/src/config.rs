use std::env;
use std::str::FromStr;

use crate::adapters::DynamoDbConfig;
use crate::domain::identity::DirectoryDefinition;
use crate::domain::schema::TableDefinition;
use crate::domain::stack::StackDefinition;
use crate::error::ConfigError;

/// Which entity store engine to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    DynamoDb,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "dynamodb" => Ok(StoreBackend::DynamoDb),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment stage, appended to resource names
    pub stage: String,
    pub table_name: String,
    pub user_pool_name: String,
    pub store_backend: StoreBackend,
    /// AWS region; the SDK default chain applies when unset
    pub aws_region: Option<String>,
    /// Endpoint override, e.g. DynamoDB Local or LocalStack
    pub dynamodb_endpoint: Option<String>,
    pub dynamodb_timeout_ms: Option<u64>,
    /// Existing directory identifiers, set together; generated in-process when unset
    pub user_pool_id: Option<String>,
    pub user_pool_client_id: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let stage = var("STAGE").unwrap_or_else(|| "dev".to_string());
        let store_backend = match var("STORE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StoreBackend::Memory,
        };
        let dynamodb_timeout_ms = var("DYNAMODB_TIMEOUT_MS")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidValue {
                        name: "DYNAMODB_TIMEOUT_MS",
                        value: raw.clone(),
                    })
            })
            .transpose()?;

        let user_pool_id = var("USER_POOL_ID");
        let user_pool_client_id = var("USER_POOL_CLIENT_ID");
        match (&user_pool_id, &user_pool_client_id) {
            (Some(_), None) => {
                return Err(ConfigError::IncompletePair {
                    set: "USER_POOL_ID",
                    missing: "USER_POOL_CLIENT_ID",
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::IncompletePair {
                    set: "USER_POOL_CLIENT_ID",
                    missing: "USER_POOL_ID",
                })
            }
            _ => {}
        }

        Ok(Self {
            table_name: var("TABLE_NAME").unwrap_or_else(|| TableDefinition::default_name(&stage)),
            user_pool_name: var("USER_POOL_NAME")
                .unwrap_or_else(|| DirectoryDefinition::default_name(&stage)),
            store_backend,
            aws_region: var("AWS_REGION"),
            dynamodb_endpoint: var("DYNAMODB_ENDPOINT"),
            dynamodb_timeout_ms,
            user_pool_id,
            user_pool_client_id,
            stage,
        })
    }

    /// Declared resources for the configured stage and names
    pub fn stack(&self) -> StackDefinition {
        StackDefinition::new(
            self.stage.clone(),
            self.table_name.clone(),
            self.user_pool_name.clone(),
        )
    }

    pub fn dynamodb(&self) -> DynamoDbConfig {
        DynamoDbConfig {
            table_name: self.table_name.clone(),
            region: self.aws_region.clone(),
            endpoint: self.dynamodb_endpoint.clone(),
            timeout_ms: self.dynamodb_timeout_ms,
        }
    }
}
