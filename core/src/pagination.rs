//! Aggregating a paginated collection into one list.
//!
//! The backend has no bulk fetch, so the client walks `page`/`limit` pages
//! until one comes back short. `Pager` is the sans-IO state machine for that
//! walk: ask it for the next request, feed it the response, repeat until it
//! has nothing more to ask.

use tracing::{debug, warn};

use crate::client::LibraryClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::Resource;

#[derive(Debug)]
pub struct Pager<R> {
    page: u32,
    limit: u32,
    max_pages: u32,
    items: Vec<R>,
    done: bool,
}

impl<R: Resource> Pager<R> {
    pub fn new(limit: u32, max_pages: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
            max_pages: max_pages.max(1),
            items: Vec::new(),
            done: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The request for the current page, or `None` once the walk is over.
    pub fn next_request(&self, client: &LibraryClient) -> Option<HttpRequest> {
        (!self.done).then(|| client.build_list_page::<R>(self.page, self.limit))
    }

    /// Consume the current page's response. A failed page aborts the walk and
    /// discards nothing already collected.
    pub fn feed(&mut self, client: &LibraryClient, response: HttpResponse) -> Result<(), ApiError> {
        let batch = match client.parse_list::<R>(response) {
            Ok(batch) => batch,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };
        let received = batch.len();
        self.items.extend(batch);
        debug!(resource = R::LABEL, page = self.page, received, "page received");

        if received < self.limit as usize {
            self.done = true;
        } else if self.page >= self.max_pages {
            warn!(resource = R::LABEL, pages = self.page, "page limit reached; list may be truncated");
            self.done = true;
        } else {
            self.page += 1;
        }
        Ok(())
    }

    pub fn into_items(self) -> Vec<R> {
        self.items
    }
}
