// Order rows on the marketplace "my orders" listing page.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::core::normalize::{clean_tracking, normalize_text};
use crate::core::page::visible_text;
use crate::domain::model::{Carrier, DeliveryService, Order};

/// Only orders waiting to be handed over get labels.
pub const STATUS_TARGET: &str = "Отправьте заказ";

/// Checked in this order: the marketplace's own name can appear in rows
/// delivered by others, so it goes last.
const DETECTION_ORDER: [DeliveryService; 6] = [
    DeliveryService::RussianPost,
    DeliveryService::YandexDelivery,
    DeliveryService::Dpd,
    DeliveryService::Cdek,
    DeliveryService::FivePost,
    DeliveryService::Avito,
];

const MONTH_STEMS: [&str; 12] = [
    "январ", "феврал", "март", "апрел", "мая", "июн", "июл", "август", "сентябр", "октябр",
    "ноябр", "декабр",
];

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static ROW: LazyLock<Selector> = LazyLock::new(|| selector(r#"[data-marker="order-row"]"#));
static STATUS: LazyLock<Selector> = LazyLock::new(|| selector(r#"[data-marker="order-status"]"#));
static PRODUCT_IMAGE: LazyLock<Selector> = LazyLock::new(|| selector("img[alt]"));
static ORDER_LINK: LazyLock<Selector> = LazyLock::new(|| selector(r#"a[href*="/orders/"]"#));
static BUTTON_TEXT: LazyLock<Selector> = LazyLock::new(|| selector(r#"div[role="button"] p"#));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| selector("p"));

pub fn is_price(text: &str) -> bool {
    text.contains('₽')
}

pub fn looks_like_date(text: &str) -> bool {
    let lowered = text.to_lowercase();
    MONTH_STEMS.iter().any(|m| lowered.contains(m))
}

pub fn looks_like_tracking(text: &str) -> bool {
    let clean = normalize_text(text);
    if clean.is_empty() || is_price(&clean) || looks_like_date(&clean) {
        return false;
    }
    let compact = clean_tracking(&clean);
    compact.len() >= 6 && compact.bytes().any(|b| b.is_ascii_digit())
}

fn texts(row: ElementRef<'_>, sel: &Selector) -> Vec<String> {
    row.select(sel)
        .map(|el| normalize_text(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .collect()
}

fn absolute_url(base: Option<&Url>, href: &str) -> String {
    if href.is_empty() {
        return String::new();
    }
    match base.map(|b| b.join(href)) {
        Some(Ok(url)) => url.to_string(),
        _ => href.to_string(),
    }
}

fn row_tracking(row: ElementRef<'_>) -> String {
    texts(row, &BUTTON_TEXT)
        .into_iter()
        .find(|t| looks_like_tracking(t))
        .or_else(|| {
            texts(row, &PARAGRAPH)
                .into_iter()
                .find(|t| looks_like_tracking(t))
        })
        .map(|t| clean_tracking(&t))
        .unwrap_or_default()
}

fn row_service(row: ElementRef<'_>, status: &str, tracking: &str) -> String {
    let row_text = normalize_text(&visible_text(row));
    if let Some(known) = DETECTION_ORDER
        .iter()
        .find(|s| row_text.contains(s.display_name()))
    {
        return known.display_name().to_string();
    }

    texts(row, &PARAGRAPH)
        .into_iter()
        .find(|text| {
            text != status
                && !(!tracking.is_empty() && text.replace(' ', "") == tracking)
                && !is_price(text)
                && !looks_like_date(text)
        })
        .unwrap_or_default()
}

/// Orders in the "send the order" state, in page order.
///
/// `base` resolves relative order links; without it hrefs are kept as found.
pub fn collect_orders(html: &str, base: Option<&Url>) -> Vec<Order> {
    let document = Html::parse_document(html);
    let mut orders = Vec::new();

    for row in document.select(&ROW) {
        let status = row
            .select(&STATUS)
            .next()
            .map(|el| normalize_text(&el.text().collect::<String>()))
            .unwrap_or_default();
        if status != STATUS_TARGET {
            continue;
        }

        let product_name = row
            .select(&PRODUCT_IMAGE)
            .next()
            .and_then(|img| img.value().attr("alt"))
            .map(normalize_text)
            .unwrap_or_default();

        let href = row
            .select(&ORDER_LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .unwrap_or_default();

        let tracking = row_tracking(row);
        let service = row_service(row, &status, &tracking);

        // Locker codes only appear on the detail page; the row value is
        // something else and must not be trusted.
        let tracking_number = if Carrier::from_service(&service) == Some(Carrier::FivePost) {
            String::new()
        } else {
            tracking
        };

        orders.push(Order {
            service,
            product_name,
            tracking_number,
            order_url: absolute_url(base, href),
        });
    }

    tracing::debug!("Collected {} orders from listing page", orders.len());
    orders
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str, product: &str, href: &str, button: &str, paragraphs: &[&str]) -> String {
        let ps: String = paragraphs.iter().map(|p| format!("<p>{}</p>", p)).collect();
        format!(
            r#"<div data-marker="order-row">
                 <img src="x.jpg" alt="{product}">
                 <a href="{href}">Открыть</a>
                 <span data-marker="order-status">{status}</span>
                 <div role="button"><p>{button}</p></div>
                 <div>{ps}</div>
               </div>"#
        )
    }

    fn page(rows: &[String]) -> String {
        format!("<html><body>{}</body></html>", rows.concat())
    }

    #[test]
    fn test_collects_only_pending_orders() {
        let html = page(&[
            row(
                "Отправьте заказ",
                "Товар 1",
                "/orders/abc123",
                "123 456 789",
                &["Авито", "123 456 789"],
            ),
            row("Получен", "Товар 2", "/orders/ignore", "999 111", &["Авито"]),
        ]);
        let base = Url::parse("https://www.avito.ru").unwrap();

        let orders = collect_orders(&html, Some(&base));

        assert_eq!(orders.len(), 1);
        assert_eq!(
            orders[0],
            Order {
                service: "Авито".to_string(),
                product_name: "Товар 1".to_string(),
                tracking_number: "123456789".to_string(),
                order_url: "https://www.avito.ru/orders/abc123".to_string(),
            }
        );
    }

    #[test]
    fn test_locker_row_keeps_tracking_empty() {
        let html = page(&[row(
            "Отправьте заказ",
            "Товар 5Post",
            "/orders/fivepost",
            "777 888 999",
            &["5Post", "777 888 999"],
        )]);

        let orders = collect_orders(&html, None);

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].service, "5Post");
        assert_eq!(orders[0].tracking_number, "");
        assert_eq!(orders[0].order_url, "/orders/fivepost");
    }

    #[test]
    fn test_unknown_service_falls_back_to_first_plain_paragraph() {
        let html = page(&[row(
            "Отправьте заказ",
            "Лампа",
            "/orders/7",
            "AB 12 34 56",
            &["1 990 ₽", "12 февраля", "Boxberry"],
        )]);

        let orders = collect_orders(&html, None);

        assert_eq!(orders[0].service, "Boxberry");
        assert_eq!(orders[0].tracking_number, "AB123456");
    }

    #[test]
    fn test_specific_service_wins_over_marketplace_name() {
        let html = page(&[row(
            "Отправьте заказ",
            "Чайник",
            "/orders/9",
            "CDEK 1234567",
            &["СДЭК", "Доставка через Авито"],
        )]);

        let orders = collect_orders(&html, None);

        assert_eq!(orders[0].service, "СДЭК");
        assert_eq!(orders[0].tracking_number, "CDEK1234567");
    }

    #[test]
    fn test_looks_like_tracking() {
        assert!(!looks_like_tracking("1 990 ₽"));
        assert!(!looks_like_tracking("12 февраля"));
        assert!(!looks_like_tracking("ABCDEFG"));
        assert!(!looks_like_tracking("12-34"));
        assert!(looks_like_tracking("A1B2C3D4"));
    }
}
