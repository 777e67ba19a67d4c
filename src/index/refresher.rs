//! Index refresher
//!
//! Pulls the index list from one active cluster node, parses it and
//! publishes the result to the `IndexCache`.
//!
//! # Node selection
//!
//! Index metadata propagates cluster-wide faster than application-visible
//! staleness windows, so one node's view is trusted. Nodes are tried in
//! random order until one answers. If none answers, an empty snapshot is
//! published and the planner degrades to "nothing indexed".
//!
//! # Concurrency
//!
//! Refreshes may run concurrently from several triggers (startup, after
//! index DDL, periodic poll). Each publishes a complete snapshot; the last
//! one to publish wins.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::QueryConfig;
use crate::store::ClusterInfo;

use super::cache::IndexCache;
use super::errors::IndexResult;
use super::info_parser::parse_indexes_info;
use super::model::IndexesInfo;

/// Info command listing secondary indexes
pub const DEFAULT_INFO_COMMAND: &str = "sindex-list:";

/// Outcome of one refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A node answered; the parsed snapshot was published
    Published { node: String, indexes: usize },
    /// No node answered; an empty snapshot was published
    Unreachable,
}

/// Keeps an `IndexCache` in line with the cluster
pub struct IndexRefresher<C: ClusterInfo> {
    cluster: Arc<C>,
    cache: Arc<IndexCache>,
    info_command: String,
}

impl<C: ClusterInfo> IndexRefresher<C> {
    /// Creates a refresher using the default `sindex-list:` command
    pub fn new(cluster: Arc<C>, cache: Arc<IndexCache>) -> Self {
        Self::with_command(cluster, cache, DEFAULT_INFO_COMMAND)
    }

    pub fn with_command(
        cluster: Arc<C>,
        cache: Arc<IndexCache>,
        info_command: impl Into<String>,
    ) -> Self {
        Self {
            cluster,
            cache,
            info_command: info_command.into(),
        }
    }

    /// Creates a refresher using the configured info command
    pub fn from_config(cluster: Arc<C>, cache: Arc<IndexCache>, config: &QueryConfig) -> Self {
        Self::with_command(cluster, cache, config.info_command.clone())
    }

    /// The cache this refresher publishes to
    pub fn cache(&self) -> &Arc<IndexCache> {
        &self.cache
    }

    /// Fetches, parses and publishes the index list.
    ///
    /// A parse failure leaves the current snapshot in place and is returned.
    pub fn refresh_indexes(&self) -> IndexResult<RefreshOutcome> {
        let Some((node, response)) = self.fetch_from_any_node() else {
            warn!(
                command = %self.info_command,
                "no cluster node answered index info request, assuming no indexes"
            );
            self.cache.update(IndexesInfo::empty());
            return Ok(RefreshOutcome::Unreachable);
        };

        let info = parse_indexes_info(&response).map_err(|err| {
            warn!(node = %node, error = %err, "index info response rejected, keeping previous snapshot");
            err
        })?;

        let indexes = info.len();
        self.cache.update(info);
        info!(node = %node, indexes, "published index snapshot");

        Ok(RefreshOutcome::Published { node, indexes })
    }

    fn fetch_from_any_node(&self) -> Option<(String, String)> {
        let mut nodes = self.cluster.active_nodes();
        nodes.shuffle(&mut rand::thread_rng());

        for node in nodes {
            match self.cluster.request_info(&node, &self.info_command) {
                Ok(response) => return Some((node, response)),
                Err(err) => debug!(node = %node, error = %err, "index info request failed"),
            }
        }
        None
    }
}

impl<C: ClusterInfo + 'static> IndexRefresher<C> {
    /// Spawns a background task refreshing every `interval`.
    ///
    /// The first refresh runs immediately. Failures are logged and the task
    /// keeps polling; abort the returned handle to stop it.
    pub fn spawn_periodic(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let refresher = Arc::clone(&self);
                match tokio::task::spawn_blocking(move || refresher.refresh_indexes()).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(err)) => warn!(error = %err, "periodic index refresh failed"),
                    Err(err) => warn!(error = %err, "periodic index refresh task panicked"),
                }
            }
        })
    }

    /// Starts periodic polling if the config sets an interval
    pub fn spawn_configured(self: Arc<Self>, config: &QueryConfig) -> Option<JoinHandle<()>> {
        config
            .refresh_interval()
            .map(|interval| self.spawn_periodic(interval))
    }
}
