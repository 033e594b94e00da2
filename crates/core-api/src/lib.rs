//! Remote content API.
//!
//! The reader pulls scripture text one source page at a time. [`ContentApi`]
//! is the seam the pagination core depends on; [`BaniDbClient`] is the HTTP
//! implementation. Callers own retry policy: a failed fetch is reported once
//! and never retried here.

mod client;
mod error;

pub use client::{BaniDbClient, ClientOptions, DEFAULT_BASE_URL};
pub use error::FetchError;

use async_trait::async_trait;
use core_model::{ApiPage, PageNumber, SourceId};
use std::sync::Arc;

#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Fetch one page of verse records. An empty page signals end of content.
    async fn fetch_page(&self, source: SourceId, page: PageNumber) -> Result<ApiPage, FetchError>;
}

#[async_trait]
impl<T> ContentApi for Arc<T>
where
    T: ContentApi + ?Sized,
{
    async fn fetch_page(&self, source: SourceId, page: PageNumber) -> Result<ApiPage, FetchError> {
        (**self).fetch_page(source, page).await
    }
}
