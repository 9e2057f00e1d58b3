//! Paginated, searchable list views.
//!
//! Students, documents, users and services share one contract: a debounced
//! search term, a 1-based page, and a fetch whenever either changes.

mod controller;
mod debounce;

pub use controller::{ListController, ListEvent, ListHandle};
pub use debounce::Debouncer;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::api::{ApiClient, ClientError, Page, Resource};

/// Default page size requested from list endpoints
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Query sent to a list endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub search: String,
    /// 1-based
    pub page: u32,
    pub limit: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Explicit pagination controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNav {
    First,
    Previous,
    Next,
    Last,
    To(u32),
}

impl PageNav {
    /// Target page, or `None` when the control is disabled or a no-op
    pub fn target(self, page: u32, total_pages: u32) -> Option<u32> {
        let controls = PaginationControls::new(page, total_pages);
        let target = match self {
            PageNav::First if controls.first => 1,
            PageNav::Previous if controls.previous => page - 1,
            PageNav::Next if controls.next => page + 1,
            PageNav::Last if controls.last => total_pages,
            PageNav::To(n) if (1..=total_pages.max(1)).contains(&n) && n != page => n,
            _ => return None,
        };
        Some(target)
    }
}

/// Which pagination controls are enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationControls {
    pub first: bool,
    pub previous: bool,
    pub next: bool,
    pub last: bool,
}

impl PaginationControls {
    pub fn new(page: u32, total_pages: u32) -> Self {
        let at_start = page <= 1;
        let at_end = page >= total_pages;
        Self {
            first: !at_start,
            previous: !at_start,
            next: !at_end,
            last: !at_end,
        }
    }
}

/// What a list view should present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    Loading,
    Failed,
    Empty,
    Ready,
}

/// State of one mounted list view
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T> {
    /// Search input as typed
    pub raw_search: String,
    /// Search term last settled by the debouncer
    pub search: String,
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
    pub items: Vec<T>,
    pub is_loading: bool,
    /// A search edit is waiting out its quiet period
    pub search_pending: bool,
    /// Notification for the last failed fetch
    pub error: Option<String>,
    /// Number of events processed by the controller
    pub events_seen: u64,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            raw_search: String::new(),
            search: String::new(),
            page: 1,
            total_pages: 1,
            total: 0,
            items: Vec::new(),
            is_loading: false,
            search_pending: false,
            error: None,
            events_seen: 0,
        }
    }
}

impl<T> ListState<T> {
    pub fn controls(&self) -> PaginationControls {
        PaginationControls::new(self.page, self.total_pages)
    }

    pub fn status(&self) -> ViewStatus {
        if self.is_loading {
            ViewStatus::Loading
        } else if self.error.is_some() {
            ViewStatus::Failed
        } else if self.items.is_empty() {
            ViewStatus::Empty
        } else {
            ViewStatus::Ready
        }
    }
}

/// Where a list view gets its pages from
#[async_trait]
pub trait ListSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    async fn fetch(&self, query: &ListQuery) -> Result<Page<Self::Item>, ClientError>;
}

/// A list endpoint of the UniVault API
pub struct ResourceSource<T> {
    client: Arc<ApiClient>,
    resource: Resource,
    _item: PhantomData<fn() -> T>,
}

impl<T> ResourceSource<T> {
    pub fn new(client: Arc<ApiClient>, resource: Resource) -> Self {
        Self {
            client,
            resource,
            _item: PhantomData,
        }
    }
}

#[async_trait]
impl<T> ListSource for ResourceSource<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Item = T;

    async fn fetch(&self, query: &ListQuery) -> Result<Page<T>, ClientError> {
        self.client.list(self.resource, query).await
    }
}
