//! Azure identity and `Microsoft.Sql` management API access.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod operation;

pub use auth::{ClientCredentials, ClientSecretAuthenticator};
pub use client::{ArmSqlClient, SqlManagement};
pub use models::{Database, ElasticPool, ImportExportResponse, ImportRequest, Server, Sku};

#[cfg(test)]
pub use client::{MockSqlManagement, SqlCall};
