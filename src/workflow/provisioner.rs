//! Import a BACPAC as a new database and move it into an Elastic Pool.
//!
//! Nothing here is rolled back: a failure after the import leaves the new
//! database on the server, and a rerun imports another one.

use super::validation::LoginDetails;
use crate::azure::models::{AuthenticationType, StorageKeyType};
use crate::azure::{Database, ElasticPool, ImportExportResponse, ImportRequest, Sku};
use crate::config::{PoolSkuConfig, Settings};
use crate::context::Context;
use anyhow::{Context as _, Result};
use tracing::{debug, info};

pub const TEMPLATE_DB_SUFFIX: &str = "-templatedb";

/// Server the database lives on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget {
    pub resource_group: String,
    pub server: String,
}

pub fn template_database_name(pool_name: &str) -> String {
    format!("{}{}", pool_name, TEMPLATE_DB_SUFFIX)
}

/// Build the import body. Edition and objective must be compatible with the pool tier.
pub fn build_import_request(settings: &Settings, login: &LoginDetails, pool: &ElasticPool) -> ImportRequest {
    ImportRequest {
        database_name: template_database_name(&pool.name),
        edition: settings.import.edition.clone(),
        service_objective_name: settings.import.service_objective.clone(),
        max_size_bytes: settings.import.max_size_bytes.clone(),
        storage_key_type: StorageKeyType::StorageAccessKey,
        storage_key: settings.storage_key.clone(),
        storage_uri: settings.blob_uri.to_string(),
        administrator_login: login.username.clone(),
        administrator_login_password: login.password.clone(),
        authentication_type: AuthenticationType::Sql,
    }
}

pub fn import_database(ctx: &Context, target: &ServerTarget, request: &ImportRequest) -> Result<ImportExportResponse> {
    info!(
        resource_group = %target.resource_group,
        server = %target.server,
        database = %request.database_name,
        "Submitting import"
    );

    ctx.sql
        .import_database(&target.resource_group, &target.server, request)
        .with_context(|| format!("Failed to import database '{}'", request.database_name))
}

pub fn get_database(ctx: &Context, target: &ServerTarget, database_name: &str) -> Result<Database> {
    let database = ctx
        .sql
        .get_database(&target.resource_group, &target.server, database_name)
        .with_context(|| format!("Failed to fetch database '{}'", database_name))?;

    debug!(id = %database.id, name = %database.name, status = ?database.properties.status, "Fetched database");
    Ok(database)
}

/// Point the record at the pool and give it the pool-compatible SKU
pub fn assign_to_pool(database: &mut Database, pool: &ElasticPool, sku: &PoolSkuConfig) {
    database.properties.elastic_pool_id = Some(pool.id.clone());
    database.sku = Some(Sku::new(sku.name.clone(), sku.tier.clone()));
}

/// Assign the database to `pool` and submit the update
pub fn link_to_pool(
    ctx: &Context,
    target: &ServerTarget,
    database_name: &str,
    mut database: Database,
    pool: &ElasticPool,
    sku: &PoolSkuConfig,
) -> Result<Database> {
    assign_to_pool(&mut database, pool, sku);

    info!(database = database_name, pool = %pool.name, "Linking database to elastic pool");

    ctx.sql
        .create_or_update_database(&target.resource_group, &target.server, database_name, &database)
        .with_context(|| format!("Failed to add database '{}' to Elastic Pool '{}'", database_name, pool.name))
}
