use crate::core::extract::extract;
use crate::core::labels::{manifest_csv, render_labels, RenderOptions};
use crate::core::page::HtmlPage;
use crate::core::rows::collect_orders;
use crate::core::{
    ConfigProvider, LabelBatch, Order, OrderSource, PageFetcher, Pipeline, Storage,
};
use crate::utils::error::{LabelError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Semaphore;
use url::Url;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const ORDERS_FILE: &str = "orders.json";
pub const LABELS_FILE: &str = "labels.json";
pub const MANIFEST_FILE: &str = "labels.csv";
pub const BUNDLE_FILE: &str = "labels.zip";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LabelsFile<'a> {
    generated_at: DateTime<Utc>,
    labels: &'a [crate::core::Label],
}

pub struct LabelPipeline<S: Storage, C: ConfigProvider, F: PageFetcher> {
    storage: S,
    config: C,
    fetcher: Arc<F>,
}

impl<S: Storage, C: ConfigProvider, F: PageFetcher + 'static> LabelPipeline<S, C, F> {
    pub fn new(storage: S, config: C, fetcher: F) -> Self {
        Self {
            storage,
            config,
            fetcher: Arc::new(fetcher),
        }
    }

    async fn load_orders(&self) -> Result<Vec<Order>> {
        let source = self
            .config
            .order_source()
            .ok_or_else(|| LabelError::MissingConfigError {
                field: "source.orders_html or source.orders_json".to_string(),
            })?;

        match source {
            OrderSource::ListingHtml(path) => {
                tracing::debug!("Reading listing page from {}", path);
                let html = tokio::fs::read_to_string(&path).await?;
                let base = self.config.base_url().map(Url::parse).transpose()?;
                Ok(collect_orders(&html, base.as_ref()))
            }
            OrderSource::OrdersJson(path) => {
                tracing::debug!("Reading saved orders from {}", path);
                let json = tokio::fs::read_to_string(&path).await?;
                Ok(serde_json::from_str(&json)?)
            }
        }
    }

    /// Visits detail pages of orders whose row did not carry a usable code.
    async fn resolve(&self, mut orders: Vec<Order>) -> Result<Vec<Order>> {
        let pending: Vec<usize> = orders
            .iter()
            .enumerate()
            .filter(|(_, o)| o.needs_resolution())
            .map(|(i, _)| i)
            .collect();
        if pending.is_empty() {
            return Ok(orders);
        }
        tracing::info!("Resolving {} orders from detail pages", pending.len());

        let semaphore = Arc::new(Semaphore::new(self.config.concurrent_requests().max(1)));
        let mut handles = Vec::with_capacity(pending.len());

        for index in pending {
            let url = orders[index].order_url.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let sem = Arc::clone(&semaphore);

            handles.push(tokio::spawn(async move {
                let _permit = sem.acquire().await.ok()?;
                match fetcher.fetch(&url).await {
                    Ok(page) => page.map(|html| (index, html)),
                    Err(e) => {
                        tracing::warn!("Failed to fetch {}: {}", url, e);
                        None
                    }
                }
            }));
        }

        for handle in handles {
            let fetched = handle.await.map_err(|e| LabelError::ProcessingError {
                message: format!("Fetch task failed: {}", e),
            })?;
            let Some((index, html)) = fetched else {
                continue;
            };

            let order = &mut orders[index];
            let code = extract(&HtmlPage::parse(&html), order.carrier());
            if code.is_empty() {
                tracing::warn!(
                    "No tracking number on {} ({})",
                    order.order_url,
                    order.service
                );
            } else {
                tracing::debug!("Resolved {} -> {}", order.order_url, code);
                order.tracking_number = code;
            }
        }

        Ok(orders)
    }

    fn bundle_zip(&self, batch: &LabelBatch) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

        zip.start_file(MANIFEST_FILE, SimpleFileOptions::default())?;
        zip.write_all(batch.manifest_csv.as_bytes())?;

        for label in &batch.labels {
            if let (Some(name), Some(svg)) = (label.file_name(), &label.svg) {
                zip.start_file(name, SimpleFileOptions::default())?;
                zip.write_all(svg.as_bytes())?;
            }
        }

        Ok(zip.finish()?.into_inner())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, F: PageFetcher + 'static> Pipeline for LabelPipeline<S, C, F> {
    async fn extract(&self) -> Result<Vec<Order>> {
        let orders = self.load_orders().await?;
        if orders.is_empty() {
            tracing::warn!("No orders waiting to be sent");
            return Ok(orders);
        }

        if self.config.fetch_enabled() {
            self.resolve(orders).await
        } else {
            tracing::debug!("Detail page fetching disabled");
            Ok(orders)
        }
    }

    async fn transform(&self, orders: Vec<Order>) -> Result<LabelBatch> {
        let options = RenderOptions {
            code128: self.config.code128_options(),
            qr: self.config.qr_options(),
        };
        let labels = render_labels(&orders, &options);
        let manifest_csv = manifest_csv(&labels)?;

        Ok(LabelBatch {
            generated_at: Utc::now(),
            orders,
            labels,
            manifest_csv,
        })
    }

    async fn load(&self, batch: LabelBatch) -> Result<String> {
        let orders_json = serde_json::to_string_pretty(&batch.orders)?;
        self.storage
            .write_file(ORDERS_FILE, orders_json.as_bytes())
            .await?;

        let labels_json = serde_json::to_string_pretty(&LabelsFile {
            generated_at: batch.generated_at,
            labels: &batch.labels,
        })?;
        self.storage
            .write_file(LABELS_FILE, labels_json.as_bytes())
            .await?;

        self.storage
            .write_file(MANIFEST_FILE, batch.manifest_csv.as_bytes())
            .await?;

        for label in &batch.labels {
            if let (Some(name), Some(svg)) = (label.file_name(), &label.svg) {
                self.storage.write_file(&name, svg.as_bytes()).await?;
            }
        }

        if self.config.bundle() {
            let zip_data = self.bundle_zip(&batch)?;
            tracing::debug!("Writing bundle ({} bytes)", zip_data.len());
            self.storage.write_file(BUNDLE_FILE, &zip_data).await?;
            return Ok(format!("{}/{}", self.config.output_path(), BUNDLE_FILE));
        }

        Ok(self.config.output_path().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Code128Options, QrOptions};
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockFetcher {
        pages: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl PageFetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<Option<String>> {
            self.requests.lock().await.push(url.to_string());
            Ok(self.pages.get(url).cloned())
        }
    }

    struct TestConfig {
        source: Option<OrderSource>,
        fetch: bool,
        bundle: bool,
    }

    impl ConfigProvider for TestConfig {
        fn order_source(&self) -> Option<OrderSource> {
            self.source.clone()
        }
        fn base_url(&self) -> Option<&str> {
            Some("https://www.avito.ru")
        }
        fn output_path(&self) -> &str {
            "out"
        }
        fn concurrent_requests(&self) -> usize {
            2
        }
        fn fetch_enabled(&self) -> bool {
            self.fetch
        }
        fn bundle(&self) -> bool {
            self.bundle
        }
        fn code128_options(&self) -> Code128Options {
            Code128Options::default()
        }
        fn qr_options(&self) -> QrOptions {
            QrOptions::default()
        }
    }

    fn order(service: &str, tracking: &str, url: &str) -> Order {
        Order {
            service: service.to_string(),
            product_name: "Товар".to_string(),
            tracking_number: tracking.to_string(),
            order_url: url.to_string(),
        }
    }

    fn pipeline(
        fetch: bool,
        bundle: bool,
        pages: &[(&str, &str)],
    ) -> LabelPipeline<MockStorage, TestConfig, MockFetcher> {
        let fetcher = MockFetcher {
            pages: pages
                .iter()
                .map(|(u, h)| (u.to_string(), h.to_string()))
                .collect(),
            ..Default::default()
        };
        let config = TestConfig {
            source: None,
            fetch,
            bundle,
        };
        LabelPipeline::new(MockStorage::default(), config, fetcher)
    }

    #[tokio::test]
    async fn test_resolve_fills_codes_from_detail_pages() {
        let p = pipeline(
            true,
            false,
            &[
                (
                    "https://www.avito.ru/orders/1",
                    "<html><body><p>Код для постамата</p><span>12 34 56 78</span> Посмотреть постамат</body></html>",
                ),
                (
                    "https://www.avito.ru/orders/2",
                    "<html><body>Назовите этот номер оператору: <b>987 654 321</b></body></html>",
                ),
            ],
        );
        let orders = vec![
            order("5Post", "", "https://www.avito.ru/orders/1"),
            order("Авито", "", "https://www.avito.ru/orders/2"),
            order("СДЭК", "CDEK1", "https://www.avito.ru/orders/3"),
            order("5Post", "", "https://www.avito.ru/orders/404"),
        ];

        let resolved = p.resolve(orders).await.unwrap();

        assert_eq!(resolved[0].tracking_number, "12345678");
        assert_eq!(resolved[1].tracking_number, "987654321");
        assert_eq!(resolved[2].tracking_number, "CDEK1");
        assert_eq!(resolved[3].tracking_number, "");

        let requests = p.fetcher.requests.lock().await;
        assert_eq!(requests.len(), 3);
        assert!(!requests.contains(&"https://www.avito.ru/orders/3".to_string()));
    }

    #[tokio::test]
    async fn test_extract_requires_a_source() {
        let p = pipeline(false, false, &[]);
        let err = p.extract().await.unwrap_err();
        assert!(matches!(err, LabelError::MissingConfigError { .. }));
    }

    #[tokio::test]
    async fn test_transform_and_load_write_outputs() {
        let p = pipeline(false, true, &[]);
        let orders = vec![
            order("5Post", "77889900", ""),
            order("Авито", "123456789", ""),
            order("Boxberry", "555555", ""),
        ];

        let batch = p.transform(orders).await.unwrap();
        assert_eq!(batch.labels.len(), 3);
        assert_eq!(batch.orders.len(), 3);

        let output = p.load(batch).await.unwrap();
        assert_eq!(output, "out/labels.zip");

        let storage = &p.storage;
        assert!(storage.get_file("labels/001.svg").await.is_some());
        assert!(storage.get_file("labels/002.svg").await.is_some());
        assert!(storage.get_file("labels/003.svg").await.is_none());

        let manifest = String::from_utf8(storage.get_file(MANIFEST_FILE).await.unwrap()).unwrap();
        assert!(manifest.contains("3,Boxberry,Товар,555555,not_implemented,"));

        let saved: Vec<Order> =
            serde_json::from_slice(&storage.get_file(ORDERS_FILE).await.unwrap()).unwrap();
        assert_eq!(saved.len(), 3);

        let labels: serde_json::Value =
            serde_json::from_slice(&storage.get_file(LABELS_FILE).await.unwrap()).unwrap();
        assert!(labels["generatedAt"].is_string());
        assert_eq!(labels["labels"][1]["outcome"]["kind"], "qr_code");

        let zip_data = storage.get_file(BUNDLE_FILE).await.unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        assert_eq!(archive.len(), 3);
    }
}
