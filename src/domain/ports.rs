use crate::codec::{Code128Options, QrOptions};
use crate::domain::model::{LabelBatch, Order};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Where the pipeline gets its orders from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSource {
    /// Saved "my orders" listing page.
    ListingHtml(String),
    /// Orders collected by an earlier run.
    OrdersJson(String),
}

pub trait ConfigProvider: Send + Sync {
    fn order_source(&self) -> Option<OrderSource>;
    /// Base used to absolutize relative order links.
    fn base_url(&self) -> Option<&str>;
    fn output_path(&self) -> &str;
    fn concurrent_requests(&self) -> usize;
    fn fetch_enabled(&self) -> bool;
    fn bundle(&self) -> bool;
    fn code128_options(&self) -> Code128Options;
    fn qr_options(&self) -> QrOptions;
}

/// Fetches an order detail page. `Ok(None)` means the page could not be
/// loaded and the order stays unresolved.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Option<String>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Order>>;
    async fn transform(&self, orders: Vec<Order>) -> Result<LabelBatch>;
    async fn load(&self, batch: LabelBatch) -> Result<String>;
}
