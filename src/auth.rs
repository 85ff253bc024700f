use anyhow::Context;
use async_trait::async_trait;
use log::{info, warn};
use reqwest::header::AUTHORIZATION;

use crate::config::AuthConfig;

/// Decides whether a bearer token belongs to a site administrator.
#[async_trait]
pub trait AdminVerifier: Send + Sync {
    async fn verify(&self, bearer: &str) -> bool;
}

/// Compares against one configured token.
#[derive(Debug)]
pub struct StaticTokenVerifier {
    token: String,
}

impl StaticTokenVerifier {
    pub fn new(token: &str) -> Self {
        StaticTokenVerifier {
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl AdminVerifier for StaticTokenVerifier {
    async fn verify(&self, bearer: &str) -> bool {
        constant_time_eq(bearer.as_bytes(), self.token.as_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Asks an identity service whether the session is an admin session. Any
/// 2xx answer is a yes.
#[derive(Debug)]
pub struct RemoteSessionVerifier {
    client: reqwest::Client,
    session_url: String,
}

impl RemoteSessionVerifier {
    pub fn new(session_url: &str) -> Self {
        RemoteSessionVerifier {
            client: reqwest::Client::new(),
            session_url: session_url.to_string(),
        }
    }

    async fn check(&self, bearer: &str) -> anyhow::Result<bool> {
        let response = self
            .client
            .get(&self.session_url)
            .header(AUTHORIZATION, format!("Bearer {bearer}"))
            .send()
            .await
            .context("Failed to reach session service")?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl AdminVerifier for RemoteSessionVerifier {
    async fn verify(&self, bearer: &str) -> bool {
        match self.check(bearer).await {
            Ok(ok) => ok,
            Err(e) => {
                warn!("Session check failed: {e:#}");
                false
            }
        }
    }
}

/// Used when no admin authentication is configured.
#[derive(Debug)]
pub struct DenyAll;

#[async_trait]
impl AdminVerifier for DenyAll {
    async fn verify(&self, _bearer: &str) -> bool {
        false
    }
}

pub fn verifier_from_config(config: &AuthConfig) -> Box<dyn AdminVerifier> {
    if let Some(session_url) = &config.session_url {
        info!("Admin sessions verified against {session_url}");
        return Box::new(RemoteSessionVerifier::new(session_url));
    }
    if let Some(token) = &config.admin_token {
        info!("Admin access uses the configured static token");
        return Box::new(StaticTokenVerifier::new(token));
    }
    warn!("No admin authentication configured, editing endpoints are disabled");
    Box::new(DenyAll)
}
