use crate::config::Settings;
use crate::context::Context;
use crate::workflow::provisioner::{self, ServerTarget};
use crate::workflow::{browser, collector};
use anyhow::{anyhow, Result};
use tracing::info;

/// How a run ended without an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The template database was imported and attached to the pool
    Linked { database: String, pool: String },
    /// The chosen server has no Elastic Pools, so nothing was imported
    NoElasticPools,
}

pub struct LinkCommand;

impl LinkCommand {
    /// Run the interactive import-and-link workflow once
    pub fn execute(ctx: &Context, settings: &Settings) -> Result<LinkOutcome> {
        // Resource group, re-asked while it holds no servers
        let (resource_group, servers) = loop {
            let resource_group = collector::collect_resource_group(ctx)?;
            let servers = browser::list_servers(ctx, &resource_group)?;
            if servers.is_empty() {
                continue;
            }
            break (resource_group, servers);
        };

        let server = collector::collect_server(ctx, &servers)?;
        let login = collector::collect_login_details(ctx)?;

        let target = ServerTarget {
            resource_group,
            server: server.name,
        };

        let pools = browser::list_elastic_pools(ctx, &target.resource_group, &target.server)?;
        if pools.is_empty() {
            info!(server = %target.server, "No elastic pools, stopping");
            ctx.output.blank();
            ctx.output.warning("Please create an Elastic Pool first!");
            return Ok(LinkOutcome::NoElasticPools);
        }

        let pool = collector::collect_elastic_pool(ctx, &pools)?;

        ctx.output.blank();
        ctx.output.info("Creating template database, this may take some time...");

        let request = provisioner::build_import_request(settings, &login, &pool);
        let response = provisioner::import_database(ctx, &target, &request)?;
        let database_name = response
            .database_name()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Import response did not name the created database"))?;

        ctx.output.info("Adding template database to Elastic Pool, this may take some time...");

        let database = provisioner::get_database(ctx, &target, &database_name)?;
        provisioner::link_to_pool(ctx, &target, &database_name, database, &pool, &settings.pool_sku)?;

        ctx.output.blank();
        ctx.output
            .success("Created database and linked it to the selected Elastic Pool successfully!");
        ctx.output.key_value("Database", &database_name);
        ctx.output.key_value("Elastic Pool", &pool.name);

        Ok(LinkOutcome::Linked {
            database: database_name,
            pool: pool.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::{ClientCredentials, MockSqlManagement, Sku, SqlCall};
    use crate::config::{ImportConfig, PoolSkuConfig};
    use crate::traits::{MockOutput, MockUserInput};
    use std::sync::Arc;
    use std::time::Duration;
    use url::Url;

    fn settings() -> Settings {
        Settings {
            credentials: ClientCredentials {
                tenant_id: "t".to_string(),
                client_id: "c".to_string(),
                client_secret: "s".to_string(),
            },
            subscription_id: "sub".to_string(),
            storage_key: "key".to_string(),
            blob_uri: Url::parse("https://acct.blob.core.windows.net/bak/template.bacpac").unwrap(),
            import: ImportConfig::default(),
            pool_sku: PoolSkuConfig::default(),
            authority: Url::parse("https://login.microsoftonline.com").unwrap(),
            management: Url::parse("https://management.azure.com").unwrap(),
            poll_interval: Duration::from_secs(1),
        }
    }

    fn run(sql: Arc<MockSqlManagement>, answers: &[&str]) -> (Result<LinkOutcome>, Arc<MockOutput>, Arc<MockUserInput>) {
        let input = Arc::new(MockUserInput::with_responses(answers.iter().copied()));
        let output = Arc::new(MockOutput::new());
        let ctx = Context::test_with(input.clone(), output.clone(), sql);
        (LinkCommand::execute(&ctx, &settings()), output, input)
    }

    #[test]
    fn test_end_to_end_import_and_link() {
        let sql = Arc::new(
            MockSqlManagement::new()
                .with_servers("rg1", &["srv-a", "srv-b"])
                .with_pools("rg1", "srv-a", &[("pool-x", "poolid-x")]),
        );

        let (result, output, input) = run(sql.clone(), &["rg1", "srv-a", "admin,Secr3t!", "pool-x"]);

        assert_eq!(
            result.unwrap(),
            LinkOutcome::Linked {
                database: "pool-x-templatedb".to_string(),
                pool: "pool-x".to_string(),
            }
        );
        assert_eq!(input.remaining(), 0);
        assert!(output.has_success());

        let imports = sql.imports();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].database_name, "pool-x-templatedb");
        assert_eq!(imports[0].administrator_login, "admin");

        let updates = sql.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].properties.elastic_pool_id.as_deref(), Some("poolid-x"));
        assert_eq!(updates[0].sku, Some(Sku::new("ElasticPool", "Standard")));

        let calls = sql.calls();
        assert!(matches!(calls[0], SqlCall::ListServers { .. }));
        assert!(matches!(calls[1], SqlCall::ListElasticPools { .. }));
        assert!(matches!(calls[2], SqlCall::Import { .. }));
        assert!(matches!(calls[3], SqlCall::GetDatabase { ref database, .. } if database == "pool-x-templatedb"));
        assert!(matches!(calls[4], SqlCall::UpdateDatabase { ref server, .. } if server == "srv-a"));
    }

    #[test]
    fn test_no_pools_stops_before_import() {
        let sql = Arc::new(MockSqlManagement::new().with_servers("rg1", &["srv-a"]));

        let (result, output, _) = run(sql.clone(), &["rg1", "srv-a", "admin,pw"]);

        assert_eq!(result.unwrap(), LinkOutcome::NoElasticPools);
        assert!(sql.imports().is_empty());
        assert!(sql.updates().is_empty());
        assert!(output
            .get_warnings()
            .contains(&"Please create an Elastic Pool first!".to_string()));
    }

    #[test]
    fn test_invalid_answers_are_reasked() {
        let sql = Arc::new(
            MockSqlManagement::new()
                .with_servers("rg1", &["SQLSRV1"])
                .with_pools("rg1", "SQLSRV1", &[("Pool1", "poolid-123")]),
        );

        let answers = [
            "",
            "empty-rg",
            "rg1",
            "nope",
            "sqlsrv1",
            "adminonly",
            "a,b,c",
            "pool9",
            "pool1",
        ];
        let (result, _, input) = run(sql.clone(), &answers);

        assert_eq!(
            result.unwrap(),
            LinkOutcome::Linked {
                database: "Pool1-templatedb".to_string(),
                pool: "Pool1".to_string(),
            }
        );
        assert_eq!(input.remaining(), 0);

        // listed server name is used, not what was typed
        let imports = sql.imports();
        assert_eq!(imports[0].administrator_login, "a");
        assert_eq!(imports[0].administrator_login_password, "b");
        assert!(sql.calls().iter().any(|call| matches!(
            call,
            SqlCall::Import { server, .. } if server == "SQLSRV1"
        )));
        assert_eq!(
            sql.calls()
                .iter()
                .filter(|call| matches!(call, SqlCall::ListServers { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_import_failure_is_fatal_and_skips_update() {
        let sql = Arc::new(
            MockSqlManagement::new()
                .with_servers("rg1", &["srv-a"])
                .with_pools("rg1", "srv-a", &[("pool-x", "poolid-x")])
                .failing_import("The storage URI is not reachable"),
        );

        let (result, output, _) = run(sql.clone(), &["rg1", "srv-a", "admin,pw", "pool-x"]);

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("The storage URI is not reachable"));
        assert!(sql.updates().is_empty());
        assert!(!output.has_success());
    }
}
