//! ARM resource shapes for the `Microsoft.Sql` provider.
//!
//! Only the fields the workflow reads or writes are modelled. Read-only
//! fields are skipped on serialization so a fetched record can be sent
//! back as an update body.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Paged list envelope returned by ARM collection endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceList<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(default)]
    pub next_link: Option<String>,
}

/// Pricing/performance tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sku {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

impl Sku {
    pub fn new(name: impl Into<String>, tier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tier: Some(tier.into()),
            capacity: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerProperties {
    #[serde(default)]
    pub fully_qualified_domain_name: Option<String>,
}

/// A logical SQL server inside a resource group
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub properties: ServerProperties,
}

/// An Elastic Pool hosted on a server
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElasticPool {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub sku: Option<Sku>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elastic_pool_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size_bytes: Option<u64>,
    #[serde(default, skip_serializing)]
    pub status: Option<String>,
}

/// A database record as returned by `GET .../databases/{name}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(default, skip_serializing)]
    pub name: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    #[serde(default)]
    pub properties: DatabaseProperties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageKeyType {
    StorageAccessKey,
    #[allow(dead_code)]
    SharedAccessKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthenticationType {
    #[serde(rename = "SQL")]
    Sql,
    #[serde(rename = "ADPassword")]
    #[allow(dead_code)]
    AdPassword,
}

/// Body of `POST .../servers/{server}/import`
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub database_name: String,
    pub edition: String,
    pub service_objective_name: String,
    pub max_size_bytes: String,
    pub storage_key_type: StorageKeyType,
    pub storage_key: String,
    pub storage_uri: String,
    pub administrator_login: String,
    pub administrator_login_password: String,
    pub authentication_type: AuthenticationType,
}

impl fmt::Debug for ImportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportRequest")
            .field("database_name", &self.database_name)
            .field("edition", &self.edition)
            .field("service_objective_name", &self.service_objective_name)
            .field("max_size_bytes", &self.max_size_bytes)
            .field("storage_key_type", &self.storage_key_type)
            .field("storage_key", &"<redacted>")
            .field("storage_uri", &self.storage_uri)
            .field("administrator_login", &self.administrator_login)
            .field("administrator_login_password", &"<redacted>")
            .field("authentication_type", &self.authentication_type)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportExportProperties {
    #[serde(default)]
    pub database_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Result of an import request once the operation has completed
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportExportResponse {
    #[serde(default)]
    pub properties: ImportExportProperties,
}

impl ImportExportResponse {
    /// Name of the database the import produced
    pub fn database_name(&self) -> Option<&str> {
        self.properties.database_name.as_deref()
    }
}
