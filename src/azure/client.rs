use super::auth::AccessToken;
use super::error::{api_error, AzureError, AzureResult};
use super::models::{Database, ElasticPool, ImportExportResponse, ImportRequest, ResourceList, Server, Sku};
use super::operation::{retry_after, OperationState, OperationStatus, PollTargets};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// api-version for servers, pools and databases
pub const SQL_API_VERSION: &str = "2017-10-01-preview";

/// api-version for the server-level import extension
pub const IMPORT_API_VERSION: &str = "2014-04-01";

/// Operations the workflow needs from the `Microsoft.Sql` management API.
///
/// Every call blocks until ARM has answered, including the polling of
/// long-running writes.
pub trait SqlManagement: Send + Sync {
    /// List all servers in a resource group
    fn list_servers(&self, resource_group: &str) -> AzureResult<Vec<Server>>;

    /// List all Elastic Pools on a server
    fn list_elastic_pools(&self, resource_group: &str, server: &str) -> AzureResult<Vec<ElasticPool>>;

    /// Create a new database from a BACPAC and wait until the import finishes
    fn import_database(
        &self,
        resource_group: &str,
        server: &str,
        request: &ImportRequest,
    ) -> AzureResult<ImportExportResponse>;

    /// Fetch a database record
    fn get_database(&self, resource_group: &str, server: &str, database: &str) -> AzureResult<Database>;

    /// Replace a database record and wait until ARM has applied it
    fn create_or_update_database(
        &self,
        resource_group: &str,
        server: &str,
        database_name: &str,
        database: &Database,
    ) -> AzureResult<Database>;
}

/// `SqlManagement` over the ARM REST API using a blocking reqwest client
pub struct ArmSqlClient {
    http: Client,
    token: AccessToken,
    subscription_id: String,
    management: Url,
    poll_interval: Duration,
}

impl ArmSqlClient {
    pub fn new(
        token: AccessToken,
        subscription_id: impl Into<String>,
        management: Url,
        poll_interval: Duration,
    ) -> Self {
        Self {
            http: Client::new(),
            token,
            subscription_id: subscription_id.into(),
            management,
            poll_interval,
        }
    }

    /// `{management}/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.Sql/servers/{path..}?api-version=..`
    pub fn servers_url(&self, resource_group: &str, path: &[&str], api_version: &str) -> AzureResult<Url> {
        let mut url = self.management.clone();
        url.path_segments_mut()
            .map_err(|_| AzureError::InvalidUrl(format!("cannot use {} as a base URL", self.management)))?
            .pop_if_empty()
            .extend([
                "subscriptions",
                self.subscription_id.as_str(),
                "resourceGroups",
                resource_group,
                "providers",
                "Microsoft.Sql",
                "servers",
            ])
            .extend(path);
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    fn send(&self, request: RequestBuilder) -> AzureResult<Response> {
        let response = request.bearer_auth(self.token.secret()).send()?;
        check(response)
    }

    fn get(&self, url: &Url) -> AzureResult<Response> {
        debug!(url = %url, "GET");
        self.send(self.http.get(url.clone()))
    }

    fn list_all<T: DeserializeOwned>(&self, url: Url) -> AzureResult<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(url);

        while let Some(url) = next {
            let page: ResourceList<T> = read_json(self.get(&url)?)?;
            items.extend(page.value);
            next = match page.next_link.filter(|link| !link.is_empty()) {
                Some(link) => Some(
                    Url::parse(&link).map_err(|e| AzureError::InvalidUrl(format!("nextLink {}: {}", link, e)))?,
                ),
                None => None,
            };
        }

        Ok(items)
    }

    /// Drive a write to completion and return the final body, if ARM sent one.
    ///
    /// `result_url` is the resource a PUT wrote. It is read after an
    /// `Azure-AsyncOperation` poll succeeds, and after `Location` polling
    /// ends without a body.
    fn await_completion(&self, response: Response, result_url: Option<&Url>) -> AzureResult<Option<String>> {
        let status = response.status();
        let targets = PollTargets::from_headers(response.headers());

        let pending = status == StatusCode::CREATED || status == StatusCode::ACCEPTED;
        if !pending || targets.is_empty() {
            return Ok(non_empty(response.text()?));
        }

        let mut delay = retry_after(response.headers(), self.poll_interval);
        drop(response);

        if let Some(operation_url) = &targets.async_operation {
            loop {
                std::thread::sleep(delay);
                let poll = self.get(operation_url)?;
                delay = retry_after(poll.headers(), self.poll_interval);
                let operation: OperationStatus = read_json(poll)?;

                match OperationState::from_status(&operation.status) {
                    OperationState::InProgress => {
                        debug!(status = %operation.status, "Operation still running");
                        continue;
                    }
                    OperationState::Succeeded => break,
                    OperationState::Failed => {
                        return Err(AzureError::OperationFailed {
                            status: operation.status,
                            message: operation.error.and_then(|e| e.message.or(e.code)),
                        });
                    }
                }
            }

            // A PUT's final state is the resource itself; Location only
            // carries the result for POST actions such as import
            return match result_url.or(targets.location.as_ref()) {
                Some(url) => Ok(non_empty(self.get(url)?.text()?)),
                None => Ok(None),
            };
        }

        if let Some(location) = &targets.location {
            loop {
                std::thread::sleep(delay);
                let poll = self.get(location)?;

                if poll.status() == StatusCode::ACCEPTED {
                    delay = retry_after(poll.headers(), self.poll_interval);
                    debug!("Operation still running");
                    continue;
                }

                if let Some(body) = non_empty(poll.text()?) {
                    return Ok(Some(body));
                }
                break;
            }
        }

        match result_url {
            Some(url) => Ok(non_empty(self.get(url)?.text()?)),
            None => Ok(None),
        }
    }
}

impl SqlManagement for ArmSqlClient {
    fn list_servers(&self, resource_group: &str) -> AzureResult<Vec<Server>> {
        let url = self.servers_url(resource_group, &[], SQL_API_VERSION)?;
        self.list_all(url)
    }

    fn list_elastic_pools(&self, resource_group: &str, server: &str) -> AzureResult<Vec<ElasticPool>> {
        let url = self.servers_url(resource_group, &[server, "elasticPools"], SQL_API_VERSION)?;
        self.list_all(url)
    }

    fn import_database(
        &self,
        resource_group: &str,
        server: &str,
        request: &ImportRequest,
    ) -> AzureResult<ImportExportResponse> {
        let url = self.servers_url(resource_group, &[server, "import"], IMPORT_API_VERSION)?;
        debug!(url = %url, database = %request.database_name, "POST import");

        let response = self.send(self.http.post(url).json(request))?;
        let body = self.await_completion(response, None)?;

        let mut result = match body {
            Some(body) => serde_json::from_str::<ImportExportResponse>(&body)?,
            None => ImportExportResponse::default(),
        };
        if result.properties.database_name.is_none() {
            result.properties.database_name = Some(request.database_name.clone());
        }

        info!(
            database = ?result.database_name(),
            status = ?result.properties.status,
            error = ?result.properties.error_message,
            "Import finished"
        );
        Ok(result)
    }

    fn get_database(&self, resource_group: &str, server: &str, database: &str) -> AzureResult<Database> {
        let url = self.servers_url(resource_group, &[server, "databases", database], SQL_API_VERSION)?;
        read_json(self.get(&url)?)
    }

    fn create_or_update_database(
        &self,
        resource_group: &str,
        server: &str,
        database_name: &str,
        database: &Database,
    ) -> AzureResult<Database> {
        let url = self.servers_url(resource_group, &[server, "databases", database_name], SQL_API_VERSION)?;
        debug!(url = %url, "PUT database");

        let response = self.send(self.http.put(url.clone()).json(database))?;
        match self.await_completion(response, Some(&url))? {
            Some(body) => Ok(serde_json::from_str(&body)?),
            None => self.get_database(resource_group, server, database_name),
        }
    }
}

fn check(response: Response) -> AzureResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    Err(api_error(status, &body))
}

fn read_json<T: DeserializeOwned>(response: Response) -> AzureResult<T> {
    let body = response.text()?;
    Ok(serde_json::from_str(&body)?)
}

fn non_empty(body: String) -> Option<String> {
    if body.trim().is_empty() { None } else { Some(body) }
}

/// A call recorded by `MockSqlManagement`
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum SqlCall {
    ListServers { resource_group: String },
    ListElasticPools { resource_group: String, server: String },
    Import { resource_group: String, server: String, request: ImportRequest },
    GetDatabase { resource_group: String, server: String, database: String },
    UpdateDatabase { resource_group: String, server: String, database_name: String, database: Database },
}

/// In-memory `SqlManagement` for testing.
///
/// Servers and pools are keyed by the names the workflow asks for; anything
/// unknown lists as empty. Every call is recorded in order.
#[allow(dead_code)]
pub struct MockSqlManagement {
    servers: Mutex<Vec<(String, Vec<Server>)>>,
    pools: Mutex<Vec<((String, String), Vec<ElasticPool>)>>,
    import_failure: Mutex<Option<String>>,
    calls: Mutex<Vec<SqlCall>>,
}

#[allow(dead_code)]
impl MockSqlManagement {
    pub fn new() -> Self {
        Self {
            servers: Mutex::new(Vec::new()),
            pools: Mutex::new(Vec::new()),
            import_failure: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Register servers by name for a resource group
    pub fn with_servers(self, resource_group: &str, names: &[&str]) -> Self {
        let servers = names
            .iter()
            .map(|name| Server {
                id: format!(
                    "/subscriptions/sub/resourceGroups/{}/providers/Microsoft.Sql/servers/{}",
                    resource_group, name
                ),
                name: name.to_string(),
                location: "westeurope".to_string(),
                properties: Default::default(),
            })
            .collect();
        self.servers.lock().unwrap().push((resource_group.to_string(), servers));
        self
    }

    /// Register pools as `(name, id)` pairs for a server
    pub fn with_pools(self, resource_group: &str, server: &str, pools: &[(&str, &str)]) -> Self {
        let pools = pools
            .iter()
            .map(|(name, id)| ElasticPool {
                id: id.to_string(),
                name: name.to_string(),
                location: "westeurope".to_string(),
                sku: None,
            })
            .collect();
        self.pools
            .lock()
            .unwrap()
            .push(((resource_group.to_string(), server.to_string()), pools));
        self
    }

    /// Make the import call fail with an API error
    pub fn failing_import(self, message: &str) -> Self {
        *self.import_failure.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<SqlCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn imports(&self) -> Vec<ImportRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SqlCall::Import { request, .. } => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn updates(&self) -> Vec<Database> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SqlCall::UpdateDatabase { database, .. } => Some(database),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: SqlCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Default for MockSqlManagement {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlManagement for MockSqlManagement {
    fn list_servers(&self, resource_group: &str) -> AzureResult<Vec<Server>> {
        self.record(SqlCall::ListServers {
            resource_group: resource_group.to_string(),
        });
        Ok(self
            .servers
            .lock()
            .unwrap()
            .iter()
            .find(|(rg, _)| rg == resource_group)
            .map(|(_, servers)| servers.clone())
            .unwrap_or_default())
    }

    fn list_elastic_pools(&self, resource_group: &str, server: &str) -> AzureResult<Vec<ElasticPool>> {
        self.record(SqlCall::ListElasticPools {
            resource_group: resource_group.to_string(),
            server: server.to_string(),
        });
        Ok(self
            .pools
            .lock()
            .unwrap()
            .iter()
            .find(|((rg, srv), _)| rg == resource_group && srv == server)
            .map(|(_, pools)| pools.clone())
            .unwrap_or_default())
    }

    fn import_database(
        &self,
        resource_group: &str,
        server: &str,
        request: &ImportRequest,
    ) -> AzureResult<ImportExportResponse> {
        self.record(SqlCall::Import {
            resource_group: resource_group.to_string(),
            server: server.to_string(),
            request: request.clone(),
        });

        if let Some(message) = self.import_failure.lock().unwrap().clone() {
            return Err(AzureError::Api {
                status: 400,
                code: Some("ImportFailed".to_string()),
                message,
            });
        }

        let mut response = ImportExportResponse::default();
        response.properties.database_name = Some(request.database_name.clone());
        response.properties.status = Some("Completed".to_string());
        Ok(response)
    }

    fn get_database(&self, resource_group: &str, server: &str, database: &str) -> AzureResult<Database> {
        self.record(SqlCall::GetDatabase {
            resource_group: resource_group.to_string(),
            server: server.to_string(),
            database: database.to_string(),
        });
        Ok(Database {
            id: format!(
                "/subscriptions/sub/resourceGroups/{}/providers/Microsoft.Sql/servers/{}/databases/{}",
                resource_group, server, database
            ),
            name: database.to_string(),
            location: "westeurope".to_string(),
            sku: Some(Sku::new("S2", "Standard")),
            properties: Default::default(),
        })
    }

    fn create_or_update_database(
        &self,
        resource_group: &str,
        server: &str,
        database_name: &str,
        database: &Database,
    ) -> AzureResult<Database> {
        self.record(SqlCall::UpdateDatabase {
            resource_group: resource_group.to_string(),
            server: server.to_string(),
            database_name: database_name.to_string(),
            database: database.clone(),
        });
        Ok(database.clone())
    }
}
