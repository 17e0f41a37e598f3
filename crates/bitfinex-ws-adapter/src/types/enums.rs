/*
[INPUT]:  Bitfinex v2 order, offer and channel vocabularies
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When the exchange adds order types, precisions or timeframes
*/

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    #[serde(rename = "LIMIT")]
    Limit,
    #[serde(rename = "MARKET")]
    Market,
    #[serde(rename = "STOP")]
    Stop,
    #[serde(rename = "STOP LIMIT")]
    StopLimit,
    #[serde(rename = "TRAILING STOP")]
    TrailingStop,
    #[serde(rename = "EXCHANGE MARKET")]
    ExchangeMarket,
    #[serde(rename = "EXCHANGE LIMIT")]
    ExchangeLimit,
    #[serde(rename = "EXCHANGE STOP")]
    ExchangeStop,
    #[serde(rename = "EXCHANGE STOP LIMIT")]
    ExchangeStopLimit,
    #[serde(rename = "EXCHANGE TRAILING STOP")]
    ExchangeTrailingStop,
    #[serde(rename = "FOK")]
    Fok,
    #[serde(rename = "EXCHANGE FOK")]
    ExchangeFok,
    #[serde(rename = "IOC")]
    Ioc,
    #[serde(rename = "EXCHANGE IOC")]
    ExchangeIoc,
}

/// Funding offer types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferType {
    #[serde(rename = "LIMIT")]
    Limit,
    #[serde(rename = "FRRDELTAVAR")]
    FrrDeltaVar,
    #[serde(rename = "FRRDELTAFIX")]
    FrrDeltaFix,
}

/// Level of price aggregation for the book channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BookPrecision {
    #[default]
    P0,
    P1,
    P2,
    P3,
    P4,
    /// Raw book, no aggregation
    R0,
}

impl BookPrecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookPrecision::P0 => "P0",
            BookPrecision::P1 => "P1",
            BookPrecision::P2 => "P2",
            BookPrecision::P3 => "P3",
            BookPrecision::P4 => "P4",
            BookPrecision::R0 => "R0",
        }
    }
}

/// Book update frequency: F0 realtime, F1 every 2 seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BookFrequency {
    #[default]
    F0,
    F1,
}

impl BookFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookFrequency::F0 => "F0",
            BookFrequency::F1 => "F1",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandleTimeframe {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "3h")]
    ThreeHours,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "7D")]
    OneWeek,
    #[serde(rename = "14D")]
    TwoWeeks,
    #[serde(rename = "1M")]
    OneMonth,
}

impl CandleTimeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandleTimeframe::OneMinute => "1m",
            CandleTimeframe::FiveMinutes => "5m",
            CandleTimeframe::FifteenMinutes => "15m",
            CandleTimeframe::ThirtyMinutes => "30m",
            CandleTimeframe::OneHour => "1h",
            CandleTimeframe::ThreeHours => "3h",
            CandleTimeframe::SixHours => "6h",
            CandleTimeframe::TwelveHours => "12h",
            CandleTimeframe::OneDay => "1D",
            CandleTimeframe::OneWeek => "7D",
            CandleTimeframe::TwoWeeks => "14D",
            CandleTimeframe::OneMonth => "1M",
        }
    }
}

impl fmt::Display for CandleTimeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation codes carried in the second slot of the command envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpCode {
    #[serde(rename = "on")]
    NewOrder,
    #[serde(rename = "ou")]
    UpdateOrder,
    #[serde(rename = "ox_multi")]
    OrderMulti,
    #[serde(rename = "oc")]
    CancelOrder,
    #[serde(rename = "oc_multi")]
    CancelOrderMulti,
    #[serde(rename = "fon")]
    NewOffer,
    #[serde(rename = "foc")]
    CancelOffer,
    #[serde(rename = "calc")]
    Calc,
}

impl OpCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpCode::NewOrder => "on",
            OpCode::UpdateOrder => "ou",
            OpCode::OrderMulti => "ox_multi",
            OpCode::CancelOrder => "oc",
            OpCode::CancelOrderMulti => "oc_multi",
            OpCode::NewOffer => "fon",
            OpCode::CancelOffer => "foc",
            OpCode::Calc => "calc",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_type_wire_names() {
        assert_eq!(
            serde_json::to_value(OrderType::ExchangeLimit).unwrap(),
            "EXCHANGE LIMIT"
        );
        assert_eq!(
            serde_json::to_value(OrderType::TrailingStop).unwrap(),
            "TRAILING STOP"
        );
        let parsed: OrderType = serde_json::from_str("\"EXCHANGE IOC\"").unwrap();
        assert_eq!(parsed, OrderType::ExchangeIoc);
    }

    #[test]
    fn test_book_defaults() {
        assert_eq!(BookPrecision::default().as_str(), "P0");
        assert_eq!(BookFrequency::default().as_str(), "F0");
    }

    #[test]
    fn test_op_codes_match_serde() {
        for op in [
            OpCode::NewOrder,
            OpCode::UpdateOrder,
            OpCode::OrderMulti,
            OpCode::CancelOrder,
            OpCode::CancelOrderMulti,
            OpCode::NewOffer,
            OpCode::CancelOffer,
            OpCode::Calc,
        ] {
            assert_eq!(serde_json::to_value(op).unwrap(), op.as_str());
        }
    }

    #[test]
    fn test_timeframe_display() {
        assert_eq!(CandleTimeframe::OneMinute.to_string(), "1m");
        assert_eq!(CandleTimeframe::OneMonth.to_string(), "1M");
    }
}
