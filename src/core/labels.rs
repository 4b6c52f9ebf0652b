use serde::Serialize;
use std::cmp::Ordering;

use crate::codec::{code128, qr, Code128Options, QrOptions, SvgDocument};
use crate::core::normalize::clean_tracking;
use crate::domain::model::{Carrier, DeliveryService, Label, LabelOutcome, Order};
use crate::utils::error::{LabelError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOptions {
    pub code128: Code128Options,
    pub qr: QrOptions,
}

/// Print order: known services by rank, unknown ones by name, ties in input
/// order.
pub fn sort_orders(orders: &[Order]) -> Vec<Order> {
    let mut sorted = orders.to_vec();
    sorted.sort_by(|a, b| {
        let (sa, sb) = (a.delivery_service(), b.delivery_service());
        sa.rank().cmp(&sb.rank()).then_with(|| {
            if sa.is_known() {
                Ordering::Equal
            } else {
                russian_collation(sa.display_name(), sb.display_name())
            }
        })
    });
    sorted
}

/// Primary weight of one character: punctuation, digits, Cyrillic, Latin,
/// everything else; letters compare without case and `ё` sorts with `е`.
fn collation_key(ch: char) -> (u8, char) {
    let lower = ch.to_lowercase().next().unwrap_or(ch);
    let lower = if lower == 'ё' { 'е' } else { lower };
    let class = match lower {
        c if c.is_whitespace() || c.is_ascii_punctuation() => 0,
        c if c.is_numeric() => 1,
        'а'..='я' => 2,
        c if c.is_ascii_alphabetic() => 3,
        _ => 4,
    };
    (class, lower)
}

/// Russian dictionary order: letters first, then lower before upper case at
/// the first difference, then code points.
fn russian_collation(a: &str, b: &str) -> Ordering {
    a.chars()
        .map(collation_key)
        .cmp(b.chars().map(collation_key))
        .then_with(|| {
            a.chars()
                .map(char::is_uppercase)
                .cmp(b.chars().map(char::is_uppercase))
        })
        .then_with(|| a.cmp(b))
}

/// Which symbol an order gets, before anything is drawn.
pub fn plan_label(order: &Order) -> LabelOutcome {
    let service = order.delivery_service();
    let tracking = clean_tracking(&order.tracking_number);

    if !service.is_known() {
        return LabelOutcome::NotImplemented;
    }
    if tracking.is_empty() {
        return LabelOutcome::MissingTracking;
    }
    match Carrier::from_service(service.display_name()) {
        Some(Carrier::FivePost) => LabelOutcome::QrCode { payload: tracking },
        _ => LabelOutcome::Barcode { payload: tracking },
    }
}

pub fn render_label(index: usize, order: &Order, options: &RenderOptions) -> Label {
    let planned = plan_label(order);
    let mut doc = SvgDocument::new();

    let (outcome, svg) = match planned {
        LabelOutcome::Barcode { payload } => {
            if code128::render(&mut doc, &payload, &options.code128) {
                (LabelOutcome::Barcode { payload }, Some(doc.to_svg_string()))
            } else {
                (LabelOutcome::EncodeFailed { payload }, None)
            }
        }
        LabelOutcome::QrCode { payload } => {
            if qr::render(&mut doc, &payload, &options.qr) {
                (LabelOutcome::QrCode { payload }, Some(doc.to_svg_string()))
            } else {
                (LabelOutcome::EncodeFailed { payload }, None)
            }
        }
        other => (other, None),
    };

    tracing::debug!(
        "Label {} ({}): {}",
        index,
        DeliveryService::from_name(&order.service).display_name(),
        outcome.as_str()
    );

    Label {
        index,
        order: order.clone(),
        outcome,
        svg,
    }
}

pub fn render_labels(orders: &[Order], options: &RenderOptions) -> Vec<Label> {
    sort_orders(orders)
        .iter()
        .enumerate()
        .map(|(i, order)| render_label(i + 1, order, options))
        .collect()
}

#[derive(Serialize)]
struct ManifestRow<'a> {
    index: usize,
    service: &'a str,
    product: &'a str,
    tracking: &'a str,
    outcome: &'static str,
    file: String,
}

/// One CSV row per label; `file` is empty when nothing was rendered.
pub fn manifest_csv(labels: &[Label]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for label in labels {
        writer.serialize(ManifestRow {
            index: label.index,
            service: &label.order.service,
            product: &label.order.product_name,
            tracking: &label.order.tracking_number,
            outcome: label.outcome.as_str(),
            file: label.file_name().unwrap_or_default(),
        })?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| LabelError::ProcessingError {
            message: format!("Failed to finish manifest: {}", e),
        })?;
    String::from_utf8(bytes).map_err(|e| LabelError::ProcessingError {
        message: format!("Manifest is not valid UTF-8: {}", e),
    })
}
