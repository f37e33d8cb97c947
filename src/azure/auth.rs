use super::error::{AzureError, AzureResult};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, info};
use url::Url;

/// Resource the management token is issued for
pub const MANAGEMENT_RESOURCE: &str = "https://management.core.windows.net/";

/// Service principal credentials for the client-credentials grant
#[derive(Clone)]
pub struct ClientCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Bearer token for Azure Resource Manager
#[derive(Clone)]
pub struct AccessToken {
    token: String,
    expires_in: Option<u64>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_in: Option<u64>) -> Self {
        Self {
            token: token.into(),
            expires_in,
        }
    }

    pub fn secret(&self) -> &str {
        &self.token
    }

    /// Lifetime in seconds as reported by the identity provider
    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenReply {
    #[serde(default)]
    access_token: Option<String>,
    // v1 endpoints send this as a string, v2 as a number
    #[serde(default)]
    expires_in: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Client-credentials authenticator against the Microsoft identity platform
pub struct ClientSecretAuthenticator {
    http: reqwest::blocking::Client,
    authority: Url,
}

impl ClientSecretAuthenticator {
    pub fn new(authority: Url) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            authority,
        }
    }

    /// Token endpoint for a tenant: `{authority}/{tenant}/oauth2/token`
    pub fn token_url(&self, tenant_id: &str) -> AzureResult<Url> {
        let mut url = self.authority.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AzureError::Authentication(format!("invalid authority URL: {}", self.authority))
            })?
            .pop_if_empty()
            .extend([tenant_id, "oauth2", "token"]);
        Ok(url)
    }

    /// Acquire a management token. Any failure here ends the run.
    pub fn acquire_token(&self, credentials: &ClientCredentials) -> AzureResult<AccessToken> {
        let url = self.token_url(&credentials.tenant_id)?;
        debug!(url = %url, client_id = %credentials.client_id, "Requesting access token");

        let response = self
            .http
            .post(url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("resource", MANAGEMENT_RESOURCE),
            ])
            .send()?;

        let status = response.status().as_u16();
        let body = response.text()?;
        let token = parse_token_reply(status, &body)?;

        info!(expires_in = ?token.expires_in(), "Access token acquired");
        Ok(token)
    }
}

/// Interpret the identity provider's reply
pub fn parse_token_reply(status: u16, body: &str) -> AzureResult<AccessToken> {
    let reply: TokenReply = serde_json::from_str(body).map_err(|e| {
        AzureError::Authentication(format!(
            "identity provider returned HTTP {} with an unreadable body: {}",
            status, e
        ))
    })?;

    if !(200..300).contains(&status) {
        let description = reply
            .error_description
            .or(reply.error)
            .unwrap_or_else(|| "no error description".to_string());
        return Err(AzureError::Authentication(format!(
            "HTTP {}: {}",
            status,
            description.lines().next().unwrap_or_default()
        )));
    }

    let token = reply
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AzureError::Authentication("reply contained no access_token".to_string()))?;

    let expires_in = match reply.expires_in {
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::String(s)) => s.parse().ok(),
        _ => None,
    };

    Ok(AccessToken::new(token, expires_in))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> ClientCredentials {
        ClientCredentials {
            tenant_id: "tenant-1".to_string(),
            client_id: "client-1".to_string(),
            client_secret: "secret-1".to_string(),
        }
    }

    #[test]
    fn test_token_url() {
        let auth = ClientSecretAuthenticator::new(Url::parse("https://login.microsoftonline.com").unwrap());
        let url = auth.token_url("tenant-1").unwrap();
        assert_eq!(url.as_str(), "https://login.microsoftonline.com/tenant-1/oauth2/token");

        let auth = ClientSecretAuthenticator::new(Url::parse("https://login.windows.net/").unwrap());
        let url = auth.token_url("tenant-1").unwrap();
        assert_eq!(url.as_str(), "https://login.windows.net/tenant-1/oauth2/token");
    }

    #[test]
    fn test_parse_v1_reply_with_string_expiry() {
        let body = r#"{"token_type":"Bearer","expires_in":"3599","resource":"https://management.core.windows.net/","access_token":"eyJ0eXAi"}"#;
        let token = parse_token_reply(200, body).unwrap();
        assert_eq!(token.secret(), "eyJ0eXAi");
        assert_eq!(token.expires_in(), Some(3599));
    }

    #[test]
    fn test_parse_reply_with_numeric_expiry() {
        let body = r#"{"token_type":"Bearer","expires_in":3600,"access_token":"abc"}"#;
        let token = parse_token_reply(200, body).unwrap();
        assert_eq!(token.expires_in(), Some(3600));
    }

    #[test]
    fn test_parse_error_reply_uses_description() {
        let body = r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret provided.\r\nTrace ID: 123"}"#;
        let err = parse_token_reply(401, body).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Authentication failed: HTTP 401: AADSTS7000215"));
        assert!(!message.contains("Trace ID"));
    }

    #[test]
    fn test_parse_reply_without_token_fails() {
        let err = parse_token_reply(200, r#"{"token_type":"Bearer"}"#).unwrap_err();
        assert!(matches!(err, AzureError::Authentication(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_acquire_token_posts_client_credentials_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=client-1"))
            .and(body_string_contains("client_secret=secret-1"))
            .and(body_string_contains("resource=https%3A%2F%2Fmanagement.core.windows.net%2F"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "Bearer",
                "expires_in": "3599",
                "resource": MANAGEMENT_RESOURCE,
                "access_token": "arm-token"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let authority = Url::parse(&server.uri()).unwrap();
        let token = tokio::task::spawn_blocking(move || {
            ClientSecretAuthenticator::new(authority).acquire_token(&credentials())
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(token.secret(), "arm-token");
        assert_eq!(token.expires_in(), Some(3599));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_acquire_token_reports_rejected_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "invalid_client",
                "error_description": "AADSTS7000215: Invalid client secret provided.\r\nTrace ID: 42"
            })))
            .mount(&server)
            .await;

        let authority = Url::parse(&server.uri()).unwrap();
        let err = tokio::task::spawn_blocking(move || {
            ClientSecretAuthenticator::new(authority).acquire_token(&credentials())
        })
        .await
        .unwrap()
        .unwrap_err();

        match &err {
            AzureError::Authentication(message) => {
                assert_eq!(message, "HTTP 401: AADSTS7000215: Invalid client secret provided.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!err.to_string().contains("secret-1"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let token = AccessToken::new("super-secret-token", None);
        assert!(!format!("{:?}", token).contains("super-secret-token"));

        let credentials = ClientCredentials {
            tenant_id: "t".to_string(),
            client_id: "c".to_string(),
            client_secret: "hunter2".to_string(),
        };
        assert!(!format!("{:?}", credentials).contains("hunter2"));
    }
}
