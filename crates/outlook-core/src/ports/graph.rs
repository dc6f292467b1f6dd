//! Graph URL + Query Engine port (component D), grounded on
//! `graph_mail_url.py`'s `GraphMailUrlBuilder` and the teacher's
//! `ICloudProvider::get_delta` paginated-fetch shape.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{ExcludeParams, FilterParams, SelectParams};
use crate::error::{CoreError, PerItemError};

/// A page of raw Graph message JSON objects, the next-page link if Graph
/// reported one beyond what was fetched, and any per-page failures
/// encountered while assembling it (§4.4.3's `GraphPartialFailure`: a page
/// failure never discards the pages that did succeed).
#[derive(Debug, Clone)]
pub struct MessagePage {
    pub messages: Vec<Value>,
    pub next_link: Option<String>,
    pub errors: Vec<PerItemError>,
}

/// Result of a `$filter`/`$search` query: succeeded messages plus any
/// per-page failures (§4.4.3's `GraphPartialFailure`).
#[derive(Debug, Clone)]
pub struct PagedFetchResult {
    pub messages: Vec<Value>,
    pub errors: Vec<PerItemError>,
}

/// Outcome of a multi-id batch fetch: succeeded items plus per-id failures.
/// Order across `messages` is not guaranteed to match the input id order
/// (see DESIGN.md's Open Question decision on batch ordering).
#[derive(Debug, Clone)]
pub struct BatchFetchResult {
    pub messages: Vec<Value>,
    pub errors: Vec<PerItemError>,
}

/// Issues OData-shaped queries against Microsoft Graph's mail endpoints and
/// paginates results. Access-token attachment and 429 retry/backoff are
/// implementation details of the adapter, not part of this contract.
#[async_trait]
pub trait GraphQueryEngine: Send + Sync {
    /// Runs a `$filter`-based query, fetching `ceil(max_results/150)` pages
    /// of 150 in parallel (default target 450 per §4.4.2/§4.4.3), applying
    /// `exclude` client-side to each page per §4.4.4. A page-level failure
    /// is captured in the result's `errors` rather than aborting the other
    /// pages.
    async fn query_filter(
        &self,
        access_token: &str,
        filter: &FilterParams,
        select: &SelectParams,
        exclude: Option<&ExcludeParams>,
        max_results: Option<usize>,
    ) -> Result<PagedFetchResult, CoreError>;

    /// Runs a single-page `$search` (KQL) query (Graph does not paginate
    /// `$search`; §4.4.2).
    async fn query_search(
        &self,
        access_token: &str,
        search_text: &str,
        select: &SelectParams,
        exclude: Option<&ExcludeParams>,
        max_results: Option<usize>,
    ) -> Result<PagedFetchResult, CoreError>;

    /// Fetches a single already-built Graph URL, appending `$top`/`$skip`
    /// and fetching `ceil(max_results/150)` pages in parallel just like
    /// [`Self::query_filter`] (§4.4.2).
    async fn query_url(
        &self,
        access_token: &str,
        url: &str,
        max_results: Option<usize>,
    ) -> Result<MessagePage, CoreError>;

    /// Fetches a set of messages by id via `$batch` (grouped into
    /// sub-requests of at most 20 per §4.4.3), continuing past per-item
    /// failures and reporting them in [`BatchFetchResult::errors`].
    async fn batch_fetch_by_ids(
        &self,
        access_token: &str,
        message_ids: &[String],
        select: &SelectParams,
    ) -> Result<BatchFetchResult, CoreError>;
}
