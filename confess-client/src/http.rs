//! Hosted-service gateway (PostgREST dialect)
//!
//! Talks to a Supabase-style REST endpoint:
//! - `GET/POST/DELETE {url}/rest/v1/confessions` with PostgREST filters
//! - `POST {url}/rest/v1/rpc/increment_views` and `rpc/set_like` for counters
//!
//! Every request carries the anon key as both `apikey` and bearer token.
//! The change feed polls the approved list and diffs snapshots.

use std::time::Duration;

use confess_common::config::RemoteConfig;
use confess_common::{ChangeEvent, Confession, Error, NewConfession, Result};
use reqwest::{Method, RequestBuilder, Response};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::gateway::{ConfessionGateway, FeedSnapshot, Subscription, SUBSCRIPTION_BUFFER};

const TABLE: &str = "confessions";
const USER_AGENT: &str = concat!("confessworld/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    poll_interval: Duration,
}

impl HttpGateway {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let base_url = config.url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::Config(
                "remote.url is not configured (set it in config.toml or CONFESS_REMOTE_URL)"
                    .to_string(),
            ));
        }
        if config.anon_key.trim().is_empty() {
            return Err(Error::Config(
                "remote.anon_key is not configured (set it in config.toml or CONFESS_ANON_KEY)"
                    .to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Remote(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            anon_key: config.anon_key.trim().to_string(),
            poll_interval: config.poll_interval(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, TABLE)
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, function)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    /// Send and map transport failures and non-2xx statuses to `Error::Remote`
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Remote(format!("{} failed: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(format!(
                "{} failed with status {}: {}",
                what,
                status.as_u16(),
                body
            )));
        }

        Ok(response)
    }

    async fn fetch_rows(&self, query: &[(&str, &str)], what: &str) -> Result<Vec<Confession>> {
        debug!(url = %self.table_url(), ?query, "{}", what);
        let response = self
            .send(self.request(Method::GET, &self.table_url()).query(query), what)
            .await?;
        response
            .json()
            .await
            .map_err(|e| Error::Remote(format!("{} returned malformed rows: {}", what, e)))
    }

    async fn poll_feed(self, tx: mpsc::Sender<ChangeEvent>) {
        let mut snapshot = FeedSnapshot::default();
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_ms = self.poll_interval.as_millis() as u64, "Change feed polling started");

        loop {
            ticker.tick().await;
            if tx.is_closed() {
                break;
            }

            match self.list_approved().await {
                Ok(records) => {
                    for event in snapshot.diff(records) {
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                }
                // Best-effort feed: a failed poll is skipped, not retried
                Err(e) => warn!(error = %e, "Change feed poll failed"),
            }
        }

        debug!("Change feed polling stopped");
    }
}

impl ConfessionGateway for HttpGateway {
    async fn create(&self, record: NewConfession) -> Result<Confession> {
        let request = self
            .request(Method::POST, &self.table_url())
            .header("Prefer", "return=representation")
            .json(&[&record]);

        let mut rows: Vec<Confession> = self
            .send(request, "Create confession")
            .await?
            .json()
            .await
            .map_err(|e| Error::Remote(format!("Create confession returned malformed row: {}", e)))?;

        if rows.is_empty() {
            return Err(Error::Remote(
                "Create confession returned no representation".to_string(),
            ));
        }
        let confession = rows.swap_remove(0);
        info!(id = %confession.id, slug = %confession.unique_slug, "Confession created");
        Ok(confession)
    }

    async fn list_approved(&self) -> Result<Vec<Confession>> {
        self.fetch_rows(
            &[
                ("select", "*"),
                ("is_approved", "eq.true"),
                ("order", "created_at.desc"),
            ],
            "List approved confessions",
        )
        .await
    }

    async fn list_all(&self) -> Result<Vec<Confession>> {
        self.fetch_rows(
            &[("select", "*"), ("order", "created_at.desc")],
            "List all confessions",
        )
        .await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Confession>> {
        let slug_filter = format!("eq.{}", slug);
        let rows = self
            .fetch_rows(
                &[
                    ("select", "*"),
                    ("unique_slug", slug_filter.as_str()),
                    ("is_approved", "eq.true"),
                    ("limit", "1"),
                ],
                "Get confession by slug",
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn increment_view(&self, id: Uuid) -> Result<()> {
        let request = self
            .request(Method::POST, &self.rpc_url("increment_views"))
            .json(&json!({ "confession_id": id }));
        self.send(request, "Increment views").await?;
        Ok(())
    }

    async fn set_like(&self, id: Uuid, liked: bool) -> Result<()> {
        let request = self
            .request(Method::POST, &self.rpc_url("set_like"))
            .json(&json!({ "confession_id": id, "liked": liked }));
        self.send(request, "Set like").await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let id_filter = format!("eq.{}", id);
        let request = self
            .request(Method::DELETE, &self.table_url())
            .query(&[("id", id_filter.as_str())]);
        self.send(request, "Delete confession").await?;
        info!(id = %id, "Confession deleted");
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let task = tokio::spawn(self.clone().poll_feed(tx));
        Subscription::new(rx, task)
    }
}
