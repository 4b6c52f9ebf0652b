use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::normalize::{clean_digits, is_valid_tracking, normalize_text};

/// Services with a tracking-number convention the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Carrier {
    /// Marketplace delivery: the customer names the number to the operator.
    Avito,
    /// Parcel lockers: a pickup code entered at the locker or the checkout.
    FivePost,
}

impl Carrier {
    pub fn from_service(service: &str) -> Option<Self> {
        match DeliveryService::from_name(service) {
            DeliveryService::Avito => Some(Carrier::Avito),
            DeliveryService::FivePost => Some(Carrier::FivePost),
            _ => None,
        }
    }
}

/// Delivery services shown on the orders page, in print order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeliveryService {
    Avito,
    YandexDelivery,
    RussianPost,
    Dpd,
    Cdek,
    FivePost,
    Other(String),
}

impl DeliveryService {
    pub const KNOWN: [DeliveryService; 6] = [
        DeliveryService::Avito,
        DeliveryService::YandexDelivery,
        DeliveryService::RussianPost,
        DeliveryService::Dpd,
        DeliveryService::Cdek,
        DeliveryService::FivePost,
    ];

    pub fn from_name(name: &str) -> Self {
        let name = normalize_text(name);
        Self::KNOWN
            .iter()
            .find(|s| s.display_name() == name)
            .cloned()
            .unwrap_or(DeliveryService::Other(name))
    }

    pub fn display_name(&self) -> &str {
        match self {
            DeliveryService::Avito => "Авито",
            DeliveryService::YandexDelivery => "Яндекс Доставка",
            DeliveryService::RussianPost => "Почта России",
            DeliveryService::Dpd => "DPD",
            DeliveryService::Cdek => "СДЭК",
            DeliveryService::FivePost => "5Post",
            DeliveryService::Other(name) => name,
        }
    }

    /// Position in the print order; unknown services sort last.
    pub fn rank(&self) -> usize {
        Self::KNOWN
            .iter()
            .position(|s| s == self)
            .unwrap_or(usize::MAX)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, DeliveryService::Other(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub service: String,
    pub product_name: String,
    pub tracking_number: String,
    pub order_url: String,
}

impl Order {
    pub fn delivery_service(&self) -> DeliveryService {
        DeliveryService::from_name(&self.service)
    }

    pub fn carrier(&self) -> Option<Carrier> {
        Carrier::from_service(&self.service)
    }

    /// Whether the detail page has to be visited to get a usable number.
    pub fn needs_resolution(&self) -> bool {
        if self.order_url.is_empty() {
            return false;
        }
        match self.carrier() {
            Some(Carrier::FivePost) => true,
            Some(Carrier::Avito) => !is_valid_tracking(&clean_digits(&self.tracking_number)),
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LabelOutcome {
    Barcode { payload: String },
    QrCode { payload: String },
    /// Known service but no number to encode.
    MissingTracking,
    /// Service without a label convention yet.
    NotImplemented,
    /// The number was found but the encoder rejected it.
    EncodeFailed { payload: String },
}

impl LabelOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelOutcome::Barcode { .. } => "barcode",
            LabelOutcome::QrCode { .. } => "qr_code",
            LabelOutcome::MissingTracking => "missing_tracking",
            LabelOutcome::NotImplemented => "not_implemented",
            LabelOutcome::EncodeFailed { .. } => "encode_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    /// 1-based position in print order.
    pub index: usize,
    pub order: Order,
    pub outcome: LabelOutcome,
    #[serde(skip)]
    pub svg: Option<String>,
}

impl Label {
    pub fn file_name(&self) -> Option<String> {
        self.svg
            .as_ref()
            .map(|_| format!("labels/{:03}.svg", self.index))
    }
}

#[derive(Debug, Clone)]
pub struct LabelBatch {
    pub generated_at: DateTime<Utc>,
    pub orders: Vec<Order>,
    pub labels: Vec<Label>,
    pub manifest_csv: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(service: &str, tracking: &str, url: &str) -> Order {
        Order {
            service: service.to_string(),
            product_name: "Товар".to_string(),
            tracking_number: tracking.to_string(),
            order_url: url.to_string(),
        }
    }

    #[test]
    fn test_needs_resolution() {
        assert!(!order("5Post", "", "").needs_resolution());
        assert!(order("5Post", "", "https://www.avito.ru/orders/1").needs_resolution());
        assert!(!order("Авито", "123 456 789", "https://www.avito.ru/orders/2").needs_resolution());
        assert!(order("Авито", "12", "https://www.avito.ru/orders/3").needs_resolution());
        assert!(!order("СДЭК", "", "https://www.avito.ru/orders/4").needs_resolution());
    }

    #[test]
    fn test_service_lookup_normalizes_spaces() {
        assert_eq!(
            DeliveryService::from_name("Яндекс\u{00A0}Доставка "),
            DeliveryService::YandexDelivery
        );
        assert_eq!(DeliveryService::from_name("Boxberry").rank(), usize::MAX);
        assert_eq!(DeliveryService::Avito.rank(), 0);
        assert_eq!(Carrier::from_service("5Post"), Some(Carrier::FivePost));
        assert_eq!(Carrier::from_service("DPD"), None);
    }

    #[test]
    fn test_order_json_uses_camel_case() {
        let json = serde_json::to_value(order("Авито", "123456", "u")).unwrap();
        assert_eq!(json["trackingNumber"], "123456");
        assert_eq!(json["orderUrl"], "u");
        assert_eq!(json["productName"], "Товар");
    }
}
