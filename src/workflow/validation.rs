//! Input predicates used by the prompt loops.

use crate::azure::{ElasticPool, Server};
use std::fmt;

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn is_valid_resource_group(value: &str) -> bool {
    !is_blank(value)
}

fn same_name(listed: &str, entered: &str) -> bool {
    listed.to_lowercase() == entered.to_lowercase()
}

/// Listed server whose name matches `name`, ignoring case
pub fn find_server<'a>(servers: &'a [Server], name: &str) -> Option<&'a Server> {
    if is_blank(name) {
        return None;
    }
    servers.iter().find(|server| same_name(&server.name, name))
}

/// Listed pool whose name matches `name`, ignoring case
pub fn find_pool<'a>(pools: &'a [ElasticPool], name: &str) -> Option<&'a ElasticPool> {
    if is_blank(name) {
        return None;
    }
    pools.iter().find(|pool| same_name(&pool.name, name))
}

/// SQL admin login entered as `username,password`
#[derive(Clone, PartialEq, Eq)]
pub struct LoginDetails {
    pub username: String,
    pub password: String,
    /// Comma-separated fields after the password; accepted and dropped
    pub ignored_fields: usize,
}

impl fmt::Debug for LoginDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginDetails")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("ignored_fields", &self.ignored_fields)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginRejection {
    Blank,
    MissingComma,
    EmptyUsername,
    EmptyPassword,
}

impl fmt::Display for LoginRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            LoginRejection::Blank => "Login details cannot be empty",
            LoginRejection::MissingComma => "Separate username and password with a comma",
            LoginRejection::EmptyUsername => "Username cannot be empty",
            LoginRejection::EmptyPassword => "Password cannot be empty",
        };
        f.write_str(reason)
    }
}

/// Split `username,password`. Anything after a second comma is ignored.
pub fn parse_login_details(value: &str) -> Result<LoginDetails, LoginRejection> {
    if is_blank(value) {
        return Err(LoginRejection::Blank);
    }

    let mut parts = value.split(',');
    let username = parts.next().unwrap_or_default();
    let password = parts.next().ok_or(LoginRejection::MissingComma)?;

    if username.is_empty() {
        return Err(LoginRejection::EmptyUsername);
    }
    if password.is_empty() {
        return Err(LoginRejection::EmptyPassword);
    }

    Ok(LoginDetails {
        username: username.to_string(),
        password: password.to_string(),
        ignored_fields: parts.count(),
    })
}
