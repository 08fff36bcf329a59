//! Stack declaration and published outputs
//!
//! The stack is build-time configuration: one entity store table and one user
//! directory, named per stage. Provisioning happens elsewhere; what this crate
//! guarantees is that the identifiers it publishes stay stable.

use serde::{Deserialize, Serialize};

use super::identity::DirectoryDefinition;
use super::schema::TableDefinition;

/// Desired state of the backend for one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDefinition {
    pub stage: String,
    pub table: TableDefinition,
    pub directory: DirectoryDefinition,
}

impl StackDefinition {
    pub fn new(stage: impl Into<String>, table_name: String, pool_name: String) -> Self {
        Self {
            stage: stage.into(),
            table: TableDefinition::ticketpro(table_name),
            directory: DirectoryDefinition::ticketpro(pool_name),
        }
    }

    /// Stack with default resource names for `stage`
    pub fn for_stage(stage: &str) -> Self {
        Self::new(
            stage,
            TableDefinition::default_name(stage),
            DirectoryDefinition::default_name(stage),
        )
    }
}

/// Identifiers published for downstream consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackOutputs {
    #[serde(rename = "TableName")]
    pub table_name: String,
    #[serde(rename = "UserPoolId")]
    pub user_pool_id: String,
    #[serde(rename = "UserPoolClientId")]
    pub user_pool_client_id: String,
}

impl StackOutputs {
    /// (output name, description, value) for every output
    pub fn described(&self) -> [(&'static str, &'static str, &str); 3] {
        [
            ("TableName", "Entity store table name", &self.table_name),
            ("UserPoolId", "Identity directory id", &self.user_pool_id),
            (
                "UserPoolClientId",
                "Web client id of the identity directory",
                &self.user_pool_client_id,
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stage_names_resources() {
        let stack = StackDefinition::for_stage("dev");

        assert_eq!(stack.table.name, "ticketpro-main-dev");
        assert_eq!(stack.directory.pool_name, "ticketpro-users-dev");
    }

    #[test]
    fn outputs_use_published_names() {
        let outputs = StackOutputs {
            table_name: "ticketpro-main-dev".to_string(),
            user_pool_id: "eu-west-1_abc".to_string(),
            user_pool_client_id: "client123".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&outputs).unwrap(),
            json!({
                "TableName": "ticketpro-main-dev",
                "UserPoolId": "eu-west-1_abc",
                "UserPoolClientId": "client123",
            })
        );
        assert_eq!(outputs.described()[2].2, "client123");
    }
}
