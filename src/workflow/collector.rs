//! Retry-until-valid prompts.
//!
//! Each collector re-asks until its predicate accepts the answer. There is
//! no attempt limit; an interrupted prompt is the only way out.

use super::validation::{find_pool, find_server, is_valid_resource_group, parse_login_details, LoginDetails};
use crate::azure::{ElasticPool, Server};
use crate::context::Context;
use anyhow::Result;
use tracing::{debug, warn};

pub const RESOURCE_GROUP_PROMPT: &str = "Enter Resource Group Name:";
pub const SERVER_PROMPT: &str = "Enter a Server Name:";
pub const LOGIN_PROMPT: &str = "Enter Server Login Details (Username and Password Comma Separated (,)):";
pub const POOL_PROMPT: &str = "Enter Elastic Pool Name:";

/// Ask `prompt` until `accept` returns a value; rejection reasons are shown as warnings
pub fn prompt_until_valid<T, F>(ctx: &Context, prompt: &str, mut accept: F) -> Result<T>
where
    F: FnMut(&str) -> Result<T, String>,
{
    loop {
        let answer = ctx.input.text(prompt)?;

        match accept(&answer) {
            Ok(value) => return Ok(value),
            Err(reason) => {
                debug!(prompt, reason = %reason, "Rejected input");
                ctx.output.warning(&reason);
                continue;
            }
        }
    }
}

pub fn collect_resource_group(ctx: &Context) -> Result<String> {
    prompt_until_valid(ctx, RESOURCE_GROUP_PROMPT, |answer| {
        if is_valid_resource_group(answer) {
            Ok(answer.to_string())
        } else {
            Err("Resource group name cannot be empty".to_string())
        }
    })
}

/// Pick one of `servers` by name; the listed record is returned
pub fn collect_server(ctx: &Context, servers: &[Server]) -> Result<Server> {
    prompt_until_valid(ctx, SERVER_PROMPT, |answer| {
        find_server(servers, answer)
            .cloned()
            .ok_or_else(|| format!("'{}' is not one of the available servers", answer))
    })
}

pub fn collect_login_details(ctx: &Context) -> Result<LoginDetails> {
    let login = prompt_until_valid(ctx, LOGIN_PROMPT, |answer| {
        parse_login_details(answer).map_err(|rejection| rejection.to_string())
    })?;

    if login.ignored_fields > 0 {
        warn!(ignored = login.ignored_fields, "Extra comma-separated login fields were ignored");
    }

    Ok(login)
}

/// Pick one of `pools` by name; the listed record (with its ID) is returned
pub fn collect_elastic_pool(ctx: &Context, pools: &[ElasticPool]) -> Result<ElasticPool> {
    prompt_until_valid(ctx, POOL_PROMPT, |answer| {
        find_pool(pools, answer)
            .cloned()
            .ok_or_else(|| format!("'{}' is not one of the available Elastic Pools", answer))
    })
}
