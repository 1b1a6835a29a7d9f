//! Trade model
//!
//! A manually-entered trade with its sizing, lifecycle and screenshots.
//! Field names are camelCase so that journal archives stay interchangeable
//! with earlier exports.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::ids::{AccountId, TradeId, TradeUid};
use super::image::ImageSlot;
use super::sizing::{PositionSizing, SizingInput};

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "buy")]
    Long,
    #[serde(rename = "sell")]
    Short,
}

impl Direction {
    /// Parse a direction from user input
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "long" | "buy" | "l" => Some(Self::Long),
            "short" | "sell" | "s" => Some(Self::Short),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => f.pad("Long"),
            Self::Short => f.pad("Short"),
        }
    }
}

/// Lifecycle status of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    #[default]
    Open,
    Closed,
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.pad("Open"),
            Self::Closed => f.pad("Closed"),
        }
    }
}

/// A price as typed by the user plus its numeric value
#[derive(Debug, Clone, PartialEq)]
pub struct PriceInput {
    pub value: f64,
    pub text: String,
}

impl PriceInput {
    /// Parse a price, keeping the original text so precision is never lost on display
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let value: f64 = text.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        Some(Self {
            value,
            text: text.to_string(),
        })
    }
}

/// A journaled trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: TradeId,

    /// Stable uid that names archived screenshots; blank on legacy records
    #[serde(default = "blank_uid")]
    pub uid: TradeUid,

    #[serde(default = "primary_account")]
    pub account_id: AccountId,

    pub symbol: String,

    /// Local entry time, minute precision
    #[serde(with = "local_minute")]
    pub date: NaiveDateTime,

    #[serde(rename = "type")]
    pub direction: Direction,

    pub entry_price: f64,
    #[serde(default)]
    pub entry_price_str: String,
    pub stop_loss: f64,
    #[serde(default)]
    pub stop_loss_str: String,
    pub take_profit: f64,
    #[serde(default)]
    pub take_profit_str: String,

    #[serde(deserialize_with = "lenient_f64")]
    pub risk_percent: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_fee_percent: f64,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub fee_entry: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fee_exit: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_fee: f64,

    #[serde(default)]
    pub status: TradeStatus,
    #[serde(default)]
    pub closed_price: Option<f64>,
    #[serde(default)]
    pub closed_date: Option<DateTime<Utc>>,

    /// Data URI while live, filename inside an archive
    #[serde(default)]
    pub entry_screenshot: Option<String>,
    #[serde(default)]
    pub entry_screenshot_name: Option<String>,
    #[serde(default)]
    pub exit_screenshot: Option<String>,
    #[serde(default)]
    pub exit_screenshot_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_risk_amount: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub position_size: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub position_value: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub potential_profit: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub net_profit: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub risk_reward_ratio: f64,
}

fn blank_uid() -> TradeUid {
    TradeUid::from_string("")
}

fn primary_account() -> AccountId {
    AccountId::PRIMARY
}

/// Details for a new trade before sizing
#[derive(Debug, Clone)]
pub struct NewTrade {
    pub account_id: AccountId,
    pub symbol: String,
    pub date: NaiveDateTime,
    pub direction: Direction,
    pub entry: PriceInput,
    pub stop: PriceInput,
    pub target: PriceInput,
    pub risk_percent: f64,
    pub fee_percent: f64,
}

impl NewTrade {
    /// Sizing input against the given balance
    pub fn sizing_input(&self, balance: f64) -> SizingInput {
        SizingInput {
            balance,
            direction: self.direction,
            entry: self.entry.value,
            stop: self.stop.value,
            target: self.target.value,
            risk_percent: self.risk_percent,
            fee_percent: self.fee_percent,
        }
    }
}

impl Trade {
    /// Create an open trade from its details and computed sizing
    pub fn open(details: NewTrade, sizing: PositionSizing) -> Self {
        let mut trade = Self {
            id: TradeId::from_clock(),
            uid: TradeUid::generate(),
            account_id: details.account_id,
            symbol: String::new(),
            date: details.date,
            direction: details.direction,
            entry_price: 0.0,
            entry_price_str: String::new(),
            stop_loss: 0.0,
            stop_loss_str: String::new(),
            take_profit: 0.0,
            take_profit_str: String::new(),
            risk_percent: 0.0,
            total_fee_percent: 0.0,
            fee_entry: 0.0,
            fee_exit: 0.0,
            total_fee: 0.0,
            status: TradeStatus::Open,
            closed_price: None,
            closed_date: None,
            entry_screenshot: None,
            entry_screenshot_name: None,
            exit_screenshot: None,
            exit_screenshot_name: None,
            total_risk_amount: 0.0,
            position_size: 0.0,
            position_value: 0.0,
            potential_profit: 0.0,
            net_profit: 0.0,
            risk_reward_ratio: 0.0,
        };
        trade.apply_details(details, sizing);
        trade
    }

    /// Overwrite the user-entered fields and the sizing derived from them
    pub fn apply_details(&mut self, details: NewTrade, sizing: PositionSizing) {
        self.symbol = details.symbol.trim().to_uppercase();
        self.date = details.date;
        self.direction = details.direction;
        self.entry_price = details.entry.value;
        self.entry_price_str = details.entry.text;
        self.stop_loss = details.stop.value;
        self.stop_loss_str = details.stop.text;
        self.take_profit = details.target.value;
        self.take_profit_str = details.target.text;
        self.risk_percent = details.risk_percent;
        self.total_fee_percent = details.fee_percent;
        self.apply_sizing(sizing);
    }

    fn apply_sizing(&mut self, sizing: PositionSizing) {
        self.total_risk_amount = sizing.total_risk_amount;
        self.position_size = sizing.position_size;
        self.position_value = sizing.position_value;
        self.potential_profit = sizing.potential_profit;
        self.net_profit = sizing.net_profit;
        self.risk_reward_ratio = sizing.risk_reward_ratio;
        self.fee_entry = sizing.fee_entry;
        self.fee_exit = sizing.fee_exit;
        self.total_fee = sizing.total_fee;
    }

    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        self.status == TradeStatus::Closed
    }

    /// Mark the trade closed at `price`
    pub fn close(&mut self, price: f64, at: DateTime<Utc>) {
        self.status = TradeStatus::Closed;
        self.closed_price = Some(price);
        self.closed_date = Some(at);
    }

    /// Gross P&L before fees; zero for open trades
    pub fn gross_pnl(&self) -> f64 {
        match (self.status, self.closed_price) {
            (TradeStatus::Closed, Some(close)) if close != 0.0 => {
                let move_ = match self.direction {
                    Direction::Long => close - self.entry_price,
                    Direction::Short => self.entry_price - close,
                };
                self.position_size * move_
            }
            _ => 0.0,
        }
    }

    /// Realized P&L net of fees; zero for open trades
    pub fn pnl(&self) -> f64 {
        match (self.status, self.closed_price) {
            (TradeStatus::Closed, Some(close)) if close != 0.0 => {
                self.gross_pnl() - self.total_fee
            }
            _ => 0.0,
        }
    }

    /// Uid, or the synthesized legacy uid when the record has none
    pub fn effective_uid(&self) -> TradeUid {
        if self.uid.is_blank() {
            TradeUid::legacy(self.id)
        } else {
            self.uid.clone()
        }
    }

    /// Screenshot reference held in a slot
    pub fn image(&self, slot: ImageSlot) -> Option<&str> {
        match slot {
            ImageSlot::Entry => self.entry_screenshot.as_deref(),
            ImageSlot::Exit => self.exit_screenshot.as_deref(),
        }
        .filter(|s| !s.is_empty())
    }

    /// Screenshot filename held in a slot
    pub fn image_name(&self, slot: ImageSlot) -> Option<&str> {
        match slot {
            ImageSlot::Entry => self.entry_screenshot_name.as_deref(),
            ImageSlot::Exit => self.exit_screenshot_name.as_deref(),
        }
        .filter(|s| !s.is_empty())
    }

    /// Replace a slot's reference and filename together
    pub fn set_image(&mut self, slot: ImageSlot, reference: Option<String>, name: Option<String>) {
        match slot {
            ImageSlot::Entry => {
                self.entry_screenshot = reference;
                self.entry_screenshot_name = name;
            }
            ImageSlot::Exit => {
                self.exit_screenshot = reference;
                self.exit_screenshot_name = name;
            }
        }
    }

    /// Price as the user typed it
    pub fn entry_display(&self) -> String {
        display_price(&self.entry_price_str, self.entry_price)
    }

    pub fn stop_display(&self) -> String {
        display_price(&self.stop_loss_str, self.stop_loss)
    }

    pub fn target_display(&self) -> String {
        display_price(&self.take_profit_str, self.take_profit)
    }
}

fn display_price(text: &str, value: f64) -> String {
    if text.is_empty() {
        value.to_string()
    } else {
        text.to_string()
    }
}

/// Accept numbers, numeric strings and null
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(n)) => n,
        Some(NumberOrText::Text(s)) => s.trim().parse().unwrap_or(0.0),
        None => 0.0,
    })
}

/// `YYYY-MM-DDTHH:MM` entry timestamps, tolerant of seconds and RFC 3339 input
mod local_minute {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M";

    pub fn serialize<S>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| de::Error::custom(format!("invalid trade date: {}", s)))
    }

    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        for format in [FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
            if let Ok(date) = NaiveDateTime::parse_from_str(s, format) {
                return Some(date);
            }
        }
        DateTime::parse_from_rfc3339(s).ok().map(|d| d.naive_local())
    }
}

/// Parse a user-supplied trade date
pub fn parse_trade_date(s: &str) -> Option<NaiveDateTime> {
    local_minute::parse(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_trade(direction: Direction) -> Trade {
        let details = NewTrade {
            account_id: AccountId::PRIMARY,
            symbol: " btcusdt ".into(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(14, 30, 0)
                .unwrap(),
            direction,
            entry: PriceInput::parse("100").unwrap(),
            stop: PriceInput::parse(if direction == Direction::Long { "90" } else { "110" })
                .unwrap(),
            target: PriceInput::parse(if direction == Direction::Long { "130" } else { "70" })
                .unwrap(),
            risk_percent: 1.0,
            fee_percent: 0.0,
        };
        let sizing = details.sizing_input(1000.0).compute().unwrap();
        Trade::open(details, sizing)
    }

    #[test]
    fn test_open_trade() {
        let trade = sample_trade(Direction::Long);
        assert_eq!(trade.symbol, "BTCUSDT");
        assert!(trade.is_open());
        assert_eq!(trade.pnl(), 0.0);
        assert!(trade.uid.as_str().starts_with("trade_"));
    }

    #[test]
    fn test_long_pnl() {
        let mut trade = sample_trade(Direction::Long);
        trade.close(120.0, Utc::now());
        assert!((trade.pnl() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_pnl_with_fee() {
        let mut trade = sample_trade(Direction::Short);
        trade.total_fee = 1.5;
        trade.close(105.0, Utc::now());
        assert!((trade.gross_pnl() - 5.0).abs() < 1e-9);
        assert!((trade.pnl() - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_price_keeps_original_text() {
        let price = PriceInput::parse(" 0.00001230 ").unwrap();
        assert_eq!(price.text, "0.00001230");
        assert_eq!(price.value, 0.0000123);
        assert!(PriceInput::parse("abc").is_none());
    }

    #[test]
    fn test_json_uses_camel_case() {
        let trade = sample_trade(Direction::Long);
        let json = serde_json::to_value(&trade).unwrap();
        assert_eq!(json["type"], "buy");
        assert_eq!(json["status"], "open");
        assert_eq!(json["date"], "2024-05-01T14:30");
        assert!(json.get("entryPriceStr").is_some());
        assert!(json.get("accountId").is_some());
    }

    #[test]
    fn test_deserializes_legacy_record() {
        let json = r#"{
            "id": 42,
            "accountId": 1,
            "symbol": "ETH",
            "date": "2024-01-02T09:15",
            "type": "sell",
            "entryPrice": 2000,
            "stopLoss": 2100,
            "takeProfit": 1800,
            "riskPercent": 1,
            "riskRewardRatio": "2.00",
            "status": "closed",
            "closedPrice": 1900,
            "closedDate": "2024-01-03T10:00:00.000Z",
            "entryScreenshot": "entry_trade_42.png"
        }"#;
        let trade: Trade = serde_json::from_str(json).unwrap();
        assert!(trade.uid.is_blank());
        assert_eq!(trade.effective_uid().as_str(), "trade_42");
        assert_eq!(trade.risk_reward_ratio, 2.0);
        assert_eq!(trade.direction, Direction::Short);
        assert!(trade.is_closed());
        assert_eq!(trade.image(ImageSlot::Entry), Some("entry_trade_42.png"));
        assert_eq!(trade.image(ImageSlot::Exit), None);
    }

    #[test]
    fn test_parse_trade_date_formats() {
        assert!(parse_trade_date("2024-05-01T14:30").is_some());
        assert!(parse_trade_date("2024-05-01 14:30").is_some());
        assert!(parse_trade_date("2024-05-01T14:30:15").is_some());
        assert!(parse_trade_date("yesterday").is_none());
    }
}
