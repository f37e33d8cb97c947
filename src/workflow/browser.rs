//! Listing servers and pools so the user can pick from them.

use crate::azure::{ElasticPool, Server};
use crate::context::Context;
use anyhow::{Context as _, Result};
use tracing::{debug, info, warn};

/// Fetch and print the servers of a resource group. An empty list is not an error.
pub fn list_servers(ctx: &Context, resource_group: &str) -> Result<Vec<Server>> {
    let servers = ctx
        .sql
        .list_servers(resource_group)
        .with_context(|| format!("Failed to list servers in resource group '{}'", resource_group))?;

    info!(resource_group, count = servers.len(), "Listed servers");

    ctx.output.section("Available Servers");
    if servers.is_empty() {
        warn!(resource_group, "Resource group has no SQL servers");
        ctx.output
            .warning(&format!("No SQL servers found in resource group '{}'", resource_group));
    }
    for server in &servers {
        debug!(
            id = %server.id,
            location = %server.location,
            fqdn = ?server.properties.fully_qualified_domain_name,
            "Server"
        );
        ctx.output.list_item(&server.name);
    }

    Ok(servers)
}

/// Fetch and print the Elastic Pools of a server
pub fn list_elastic_pools(ctx: &Context, resource_group: &str, server: &str) -> Result<Vec<ElasticPool>> {
    let pools = ctx
        .sql
        .list_elastic_pools(resource_group, server)
        .with_context(|| format!("Failed to list Elastic Pools on server '{}'", server))?;

    info!(resource_group, server, count = pools.len(), "Listed elastic pools");

    ctx.output.section("Available Elastic Pools");
    for pool in &pools {
        debug!(
            id = %pool.id,
            location = %pool.location,
            sku = ?pool.sku.as_ref().map(|sku| sku.name.as_str()),
            "Elastic pool"
        );
        ctx.output.list_item(&pool.name);
    }

    Ok(pools)
}
