use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::task::{self, JoinSet};
use tracing::{debug, error, info};

use crate::api::{AdminApi, ApiError, ListPage, Pagination};
use crate::config::AdminConfig;
use crate::filter::{adapt, AdaptedFilters, FilterError, FilterSet, FilterValue};

type Fetched = (u64, Result<ListPage, ApiError>);

/// A filterable, paginated list view.
///
/// Every change refetches the whole list. Each fetch is tagged with a version and
/// only the response to the latest issued fetch is applied, whatever order the
/// responses arrive in. A fetch task that dies counts as a failed fetch.
pub struct ListController {
    api: Arc<dyn AdminApi>,
    endpoint: String,
    page_parameter: String,
    filters: FilterSet,
    page: u32,
    issued: u64,
    applied: Option<u64>,
    items: Vec<Value>,
    pagination: Option<Pagination>,
    fetches: JoinSet<Fetched>,
    versions: HashMap<task::Id, u64>,
}

impl ListController {
    pub fn new(
        conf: &AdminConfig,
        api: Arc<dyn AdminApi>,
        endpoint: impl Into<String>,
        filters: FilterSet,
    ) -> Self {
        ListController {
            api,
            endpoint: endpoint.into(),
            page_parameter: conf.page_parameter.clone(),
            filters,
            page: 1,
            issued: 0,
            applied: None,
            items: Vec::new(),
            pagination: None,
            fetches: JoinSet::new(),
            versions: HashMap::new(),
        }
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.pagination
    }

    pub fn latest_version(&self) -> u64 {
        self.issued
    }

    pub fn applied_version(&self) -> Option<u64> {
        self.applied
    }

    pub fn adapted_filters(&self) -> AdaptedFilters {
        adapt(&self.filters)
    }

    /// Adapted filters plus the page parameter when past the first page.
    pub fn query(&self) -> Vec<(String, String)> {
        let mut query = self.adapted_filters().to_query();
        if self.page > 1 {
            query.push((self.page_parameter.clone(), self.page.to_string()));
        }
        query
    }

    /// Sets one filter and refetches from the first page. Returns the version of the
    /// fetch that was issued.
    pub fn set_filter(&mut self, key: &str, value: FilterValue) -> Result<u64, FilterError> {
        self.filters.set(key, value)?;
        self.page = 1;
        Ok(self.refresh())
    }

    pub fn set_page(&mut self, page: u32) -> u64 {
        self.page = page.max(1);
        self.refresh()
    }

    pub fn refresh(&mut self) -> u64 {
        self.issued += 1;
        let version = self.issued;
        let query = self.query();
        debug!(version, ?query, endpoint = %self.endpoint, "Issuing list fetch");

        let api = self.api.clone();
        let endpoint = self.endpoint.clone();
        let handle = self.fetches.spawn(async move {
            let result = api.list(&endpoint, &query).await;
            (version, result)
        });
        self.versions.insert(handle.id(), version);

        version
    }

    /// Waits for the next response that belongs to the latest fetch and applies it,
    /// dropping stale ones on the way. `None` once nothing is in flight.
    pub async fn next_applied(&mut self) -> Option<Result<u64, ApiError>> {
        loop {
            let (version, result) = match self.fetches.join_next_with_id().await? {
                Ok((id, fetched)) => {
                    self.versions.remove(&id);
                    fetched
                }
                Err(e) => {
                    let version = self.versions.remove(&e.id()).unwrap_or_default();
                    error!(?e, version, "List fetch task failed");
                    (version, Err(ApiError::Task(e)))
                }
            };

            if version != self.issued {
                debug!(version, latest = self.issued, "Discarding stale list response");
                continue;
            }

            return Some(match result {
                Ok(page) => {
                    self.apply(version, page);
                    Ok(version)
                }
                Err(e) => {
                    error!(?e, version, "List fetch failed");
                    Err(e)
                }
            });
        }
    }

    /// Fetches the current state and waits for it to be applied.
    pub async fn load(&mut self) -> Result<(), ApiError> {
        self.refresh();
        self.settle().await
    }

    /// Drains every in-flight fetch, applying the latest.
    pub async fn settle(&mut self) -> Result<(), ApiError> {
        let mut outcome = Ok(());
        while let Some(result) = self.next_applied().await {
            outcome = result.map(|_| ());
        }
        outcome
    }

    fn apply(&mut self, version: u64, page: ListPage) {
        info!(version, items = page.items.len(), "Applying list response");
        if self.filters.is_empty() {
            self.filters = page.filters;
        }
        self.items = page.items;
        self.pagination = page.pagination;
        self.applied = Some(version);
    }
}
