mod page;

use crate::model::Result;

pub use page::ConfluenceClient;

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub id: String,
    pub title: String,
    pub version: u64,
    pub body: String,
}

/// The wiki page the report lives in. Writes are optimistic: they carry the
/// version that was read and fail if the page moved on since.
pub trait DocumentStore {
    async fn read_body(&self, page_id: &str) -> Result<String>;

    async fn read_body_and_version(&self, page_id: &str) -> Result<Page>;

    async fn write(&self, page_id: &str, title: &str, body: &str, expected_version: u64)
        -> Result<()>;
}
