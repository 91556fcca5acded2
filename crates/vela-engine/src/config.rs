//! # Engine Configuration
//!
//! Tunables for the checkout flow, alerting and notification fan-out.
//! The server binary fills this from environment variables; tests build
//! it directly.

use std::time::Duration;

use vela_core::{
    TaxRate, LOW_STOCK_DEDUP_WINDOW_SECS, LOW_STOCK_THRESHOLD, SALE_TAX_RATE_BPS,
};

// =============================================================================
// Reservation Mode
// =============================================================================

/// How checkout treats a line item that cannot be reserved.
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Legacy  │ Skip the failing item with a warning; the sale proceeds     │
/// │          │ with whatever was reserved. Rejected only when NOTHING      │
/// │          │ could be reserved.                                          │
/// │          │                                                             │
/// │  Strict  │ Any failing item aborts the whole sale and every prior      │
/// │          │ reservation is unwound (single transaction).                │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReservationMode {
    /// Partial fulfillment: skip unreservable items, warn, continue.
    #[default]
    Legacy,
    /// All-or-nothing: one failure aborts the sale.
    Strict,
}

impl ReservationMode {
    /// Parses a mode name, case-insensitive. Unknown values fall back
    /// to [`ReservationMode::Legacy`].
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "strict" => ReservationMode::Strict,
            _ => ReservationMode::Legacy,
        }
    }
}

// =============================================================================
// Transport Configuration
// =============================================================================

/// Outbound email transport settings. Absent → email delivery is a
/// logged no-op.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// HTTP endpoint of the mail relay.
    pub endpoint: String,
    /// Bearer token for the relay.
    pub api_key: String,
    /// Recipient for operational alerts (the shop owner).
    pub recipient: String,
    /// Per-send timeout.
    pub timeout: Duration,
}

impl EmailConfig {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        EmailConfig {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            recipient: recipient.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Outbound SMS transport settings. Absent → SMS delivery is a
/// logged no-op.
#[derive(Debug, Clone)]
pub struct SmsConfig {
    /// HTTP endpoint of the SMS gateway.
    pub endpoint: String,
    /// API key for the gateway.
    pub api_key: String,
    /// Destination phone number for alerts.
    pub recipient: String,
    /// Per-send timeout.
    pub timeout: Duration,
}

impl SmsConfig {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        SmsConfig {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            recipient: recipient.into(),
            timeout: Duration::from_secs(5),
        }
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Configuration for the whole engine layer.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Checkout behavior on reservation failure.
    pub reservation_mode: ReservationMode,
    /// Stock level at or below which a low-stock warning fires.
    pub low_stock_threshold: i64,
    /// Suppress repeat warnings for the same product inside this window.
    pub dedup_window_secs: i64,
    /// Sales tax rate in basis points.
    pub tax_rate_bps: u32,
    /// Capacity of the notification delivery queue.
    pub queue_capacity: usize,
    /// Email transport, if configured.
    pub email: Option<EmailConfig>,
    /// SMS transport, if configured.
    pub sms: Option<SmsConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            reservation_mode: ReservationMode::Legacy,
            low_stock_threshold: LOW_STOCK_THRESHOLD,
            dedup_window_secs: LOW_STOCK_DEDUP_WINDOW_SECS,
            tax_rate_bps: SALE_TAX_RATE_BPS,
            queue_capacity: 64,
            email: None,
            sms: None,
        }
    }
}

impl EngineConfig {
    /// The configured tax rate as a typed value.
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
