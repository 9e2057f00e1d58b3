//! List view controller.
//!
//! One tokio task per mounted view owns the view's [`ListState`]. The view
//! talks to it through a [`ListHandle`]; dropping the handle unmounts the
//! view and stops the task.
//!
//! Every fetch is tagged with a sequence number. Only the most recently
//! issued fetch is applied, so a slow response can never overwrite a newer
//! query's results.

use futures::future::OptionFuture;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use super::{Debouncer, ListQuery, ListSource, ListState, PageNav};
use crate::api::{ClientError, Page};
use crate::config::ListConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    /// The search input changed
    Search(String),
    Navigate(PageNav),
    /// Refetch the current query
    Refresh,
}

struct Completed<T> {
    seq: u64,
    query: ListQuery,
    result: Result<Page<T>, ClientError>,
}

pub struct ListController<S: ListSource> {
    source: Arc<S>,
    page_size: u32,
    debouncer: Debouncer<String>,
    state: ListState<S::Item>,
    state_tx: watch::Sender<ListState<S::Item>>,
    /// Sequence number of the latest issued fetch
    seq: u64,
    completed_tx: mpsc::UnboundedSender<Completed<S::Item>>,
}

impl<S: ListSource> ListController<S> {
    /// Mount a list view and issue its initial fetch
    pub fn spawn(source: S, config: &ListConfig) -> ListHandle<S::Item> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (completed_tx, completed_rx) = mpsc::unbounded_channel();
        // Mounted views are loading until the initial fetch lands
        let initial = ListState {
            is_loading: true,
            ..ListState::default()
        };
        let (state_tx, state_rx) = watch::channel(initial.clone());

        let controller = Self {
            source: Arc::new(source),
            page_size: config.page_size,
            debouncer: Debouncer::new(config.debounce()),
            state: initial,
            state_tx,
            seq: 0,
            completed_tx,
        };
        let task = tokio::spawn(controller.run(events_rx, completed_rx));

        ListHandle {
            events: events_tx,
            state: state_rx,
            sent: AtomicU64::new(0),
            task,
        }
    }

    async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<ListEvent>,
        mut completed: mpsc::UnboundedReceiver<Completed<S::Item>>,
    ) {
        self.issue_fetch();

        loop {
            let timer: OptionFuture<_> = self.debouncer.deadline().map(sleep_until).into();

            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
                Some(()) = timer => self.settle_search(),
                Some(done) = completed.recv() => self.apply(done),
            }
        }

        debug!("List view unmounted");
    }

    fn handle(&mut self, event: ListEvent) {
        self.state.events_seen += 1;
        match event {
            ListEvent::Search(term) => {
                self.state.raw_search = term.clone();
                self.debouncer.push(term, Instant::now());
                self.publish();
            }
            ListEvent::Navigate(nav) => {
                match nav.target(self.state.page, self.state.total_pages) {
                    Some(page) => {
                        self.state.page = page;
                        self.issue_fetch();
                    }
                    None => {
                        debug!(?nav, page = self.state.page, "Pagination control disabled");
                        self.publish();
                    }
                }
            }
            ListEvent::Refresh => self.issue_fetch(),
        }
    }

    fn settle_search(&mut self) {
        let Some(term) = self.debouncer.poll(Instant::now()) else {
            return;
        };
        if term == self.state.search {
            self.publish();
            return;
        }
        debug!(search = %term, "Search settled");
        self.state.search = term;
        self.state.page = 1;
        self.issue_fetch();
    }

    fn issue_fetch(&mut self) {
        self.seq += 1;
        let seq = self.seq;
        let query = ListQuery {
            search: self.state.search.clone(),
            page: self.state.page,
            limit: self.page_size,
        };
        debug!(seq, search = %query.search, page = query.page, "Fetching list page");

        self.state.is_loading = true;
        self.publish();

        let source = self.source.clone();
        let completed_tx = self.completed_tx.clone();
        tokio::spawn(async move {
            let result = source.fetch(&query).await;
            // The view may be gone by now; nothing to deliver to
            let _ = completed_tx.send(Completed { seq, query, result });
        });
    }

    fn apply(&mut self, done: Completed<S::Item>) {
        if done.seq != self.seq {
            debug!(
                seq = done.seq,
                latest = self.seq,
                search = %done.query.search,
                "Discarding stale list response"
            );
            return;
        }

        self.state.is_loading = false;
        match done.result {
            Ok(page) => {
                self.state.items = page.items;
                self.state.total = page.total;
                self.state.total_pages = page.pages;
                self.state.error = None;
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind().as_str(), "List fetch failed");
                self.state.items.clear();
                self.state.error = Some(e.user_message());
            }
        }
        self.publish();
    }

    fn publish(&mut self) {
        self.state.search_pending = self.debouncer.is_pending();
        self.state_tx.send_replace(self.state.clone());
    }
}

/// Handle to a mounted list view
pub struct ListHandle<T> {
    events: mpsc::UnboundedSender<ListEvent>,
    state: watch::Receiver<ListState<T>>,
    sent: AtomicU64,
    task: JoinHandle<()>,
}

impl<T: Clone> ListHandle<T> {
    pub fn search(&self, term: impl Into<String>) {
        self.send(ListEvent::Search(term.into()));
    }

    pub fn navigate(&self, nav: PageNav) {
        self.send(ListEvent::Navigate(nav));
    }

    pub fn refresh(&self) {
        self.send(ListEvent::Refresh);
    }

    fn send(&self, event: ListEvent) {
        if self.events.send(event).is_ok() {
            self.sent.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Latest published state
    pub fn state(&self) -> ListState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState<T>> {
        self.state.clone()
    }

    /// Wait until every sent event is processed, no search is pending and
    /// no fetch is in flight.
    pub async fn settled(&self) -> ListState<T> {
        let sent = self.sent.load(Ordering::SeqCst);
        let mut rx = self.state.clone();
        let result = rx
            .wait_for(|s| s.events_seen >= sent && !s.is_loading && !s.search_pending)
            .await
            .map(|state| state.clone());
        // The controller only stops once the handle is gone
        result.unwrap_or_else(|_| self.state())
    }
}

impl<T> Drop for ListHandle<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
