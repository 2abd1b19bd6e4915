use std::time::Duration;

use rand::{seq::SliceRandom, SeedableRng};
use tokio::task::JoinSet;

use crate::config::TransportConfig;

/// The client for one request attempt, and the relay it routes through if any
pub struct Dispatch {
    pub client: reqwest::Client,
    pub relay: Option<String>,
}

impl Dispatch {
    pub fn direct(client: reqwest::Client) -> Self {
        Self {
            client,
            relay: None,
        }
    }
}

/// Produces the HTTP client to use for a single request attempt, `attempt` is 0-based and
/// `attempts` the total number of attempts the caller makes
pub trait Transport: Send + Sync {
    fn dispatch(&self, attempt: u32, attempts: u32) -> Result<Dispatch, reqwest::Error>;
}

/// Talks to the API directly, every attempt shares the same client
pub struct DirectTransport {
    client: reqwest::Client,
}

impl DirectTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .no_proxy()
            .build()?;

        Ok(Self { client })
    }
}

impl Transport for DirectTransport {
    fn dispatch(&self, _attempt: u32, _attempts: u32) -> Result<Dispatch, reqwest::Error> {
        Ok(Dispatch::direct(self.client.clone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'r> {
    Relay(&'r str),
    Direct,
}

/// Routes the first attempts through randomly picked HTTP relays with a random user agent,
/// and falls back to a direct connection afterwards. The last attempt always goes direct.
pub struct RotatingTransport {
    relays: Vec<String>,
    user_agents: Vec<String>,
    relay_attempts: u32,
    timeout: Duration,
}

const FALLBACK_USER_AGENT: &str = "Mozilla/5.0";

impl RotatingTransport {
    pub fn new(
        relays: Vec<String>,
        user_agents: Vec<String>,
        relay_attempts: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            relays,
            user_agents,
            relay_attempts,
            timeout,
        }
    }

    pub fn relays(&self) -> &[String] {
        &self.relays
    }

    pub fn route(&self, attempt: u32, attempts: u32) -> Route<'_> {
        if attempt >= self.relay_attempts || attempt + 1 >= attempts {
            return Route::Direct;
        }

        let mut rng = rand::rngs::SmallRng::from_entropy();
        match self.relays.choose(&mut rng) {
            Some(relay) => Route::Relay(relay.as_str()),
            None => Route::Direct,
        }
    }

    fn user_agent(&self) -> &str {
        let mut rng = rand::rngs::SmallRng::from_entropy();
        self.user_agents
            .choose(&mut rng)
            .map(|agent| agent.as_str())
            .unwrap_or(FALLBACK_USER_AGENT)
    }

    fn build(&self, route: Route<'_>) -> Result<reqwest::Client, reqwest::Error> {
        let builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent());

        let builder = match route {
            Route::Relay(relay) => builder.proxy(reqwest::Proxy::all(relay_url(relay))?),
            Route::Direct => builder.no_proxy(),
        };

        builder.build()
    }

    /// Keeps only the relays that answer a GET for `url` with a success status
    #[tracing::instrument(skip(self))]
    pub async fn check_relays(self, url: &str) -> Self {
        let mut checks = JoinSet::new();

        for relay in self.relays.iter().cloned() {
            let client = match self.build(Route::Relay(&relay)) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("Dropping relay {}: {:?}", relay, e);
                    continue;
                }
            };
            let url = url.to_string();

            checks.spawn(async move {
                let healthy = match client.get(&url).send().await {
                    Ok(resp) => resp.status().is_success(),
                    Err(e) => {
                        tracing::debug!("Relay {} failed: {:?}", relay, e);
                        false
                    }
                };

                (relay, healthy)
            });
        }

        let mut healthy = Vec::new();
        while let Some(joined) = checks.join_next().await {
            match joined {
                Ok((relay, true)) => healthy.push(relay),
                Ok((relay, false)) => tracing::warn!("Relay {} is not usable", relay),
                Err(e) => tracing::error!("Checking relay {:?}", e),
            }
        }

        // Keep the configured order, join order depends on response times
        let relays = self
            .relays
            .into_iter()
            .filter(|relay| healthy.contains(relay))
            .collect::<Vec<_>>();
        tracing::info!("{} relays usable", relays.len());

        Self { relays, ..self }
    }
}

impl Transport for RotatingTransport {
    fn dispatch(&self, attempt: u32, attempts: u32) -> Result<Dispatch, reqwest::Error> {
        let route = self.route(attempt, attempts);
        tracing::debug!(?route, attempt, "Selected route");

        match route {
            Route::Relay(relay) => match self.build(route) {
                Ok(client) => Ok(Dispatch {
                    client,
                    relay: Some(relay.to_string()),
                }),
                Err(e) => {
                    tracing::warn!("Unusable relay {}, going direct: {:?}", relay, e);
                    self.build(Route::Direct).map(Dispatch::direct)
                }
            },
            Route::Direct => self.build(Route::Direct).map(Dispatch::direct),
        }
    }
}

fn relay_url(relay: &str) -> String {
    if relay.contains("://") {
        relay.to_string()
    } else {
        format!("http://{relay}")
    }
}

/// Builds the transport described by the config, checking relays against `check_url` when the
/// config asks for it
pub async fn from_config(
    config: &TransportConfig,
    timeout: Duration,
    check_url: impl FnOnce(crate::ItemId) -> String,
) -> Result<std::sync::Arc<dyn Transport>, reqwest::Error> {
    match config {
        TransportConfig::Direct { user_agent } => {
            Ok(std::sync::Arc::new(DirectTransport::new(timeout, user_agent)?))
        }
        TransportConfig::Rotating {
            relays,
            user_agents,
            relay_attempts,
            check_item,
        } => {
            let mut transport = RotatingTransport::new(
                relays.clone(),
                user_agents.clone(),
                *relay_attempts,
                timeout,
            );

            if let Some(item) = check_item {
                transport = transport.check_relays(&check_url(*item)).await;
            }

            Ok(std::sync::Arc::new(transport))
        }
    }
}
