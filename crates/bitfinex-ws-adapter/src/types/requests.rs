/*
[INPUT]:  Trading intents from callers
[OUTPUT]: Validated payloads for the private feed command envelope
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new command types added
*/

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use serde_json::{Value, json};

use super::enums::{OfferType, OpCode, OrderType};
use super::serde_util::tif_format;
use crate::error::{BitfinexError, Result};

/// Group id applied to new orders that do not set one
pub const DEFAULT_GROUP_ID: u64 = 1;
/// Affiliate code sent in `meta` unless the caller overrides it
pub const DEFAULT_AFFILIATE_CODE: &str = "eUGsdsOUZf";

fn blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|s| s.trim().is_empty())
}

/// New order (`on`)
///
/// Unset optional fields are omitted from the payload. An explicit zero is sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewOrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gid: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid: Option<u64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub order_type: Option<OrderType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lev: Option<u32>,
    #[serde(with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_trailing: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_aux_limit: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_oco_stop: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
    #[serde(with = "tif_format")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tif: Option<NaiveDateTime>,
}

impl NewOrderRequest {
    pub fn new(order_type: OrderType, symbol: impl Into<String>, amount: Decimal) -> Self {
        Self {
            order_type: Some(order_type),
            symbol: Some(symbol.into()),
            amount: Some(amount),
            ..Default::default()
        }
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    /// Leverage for derivative orders (1..=100, exchange default 10)
    pub fn with_leverage(mut self, lev: u32) -> Self {
        self.lev = Some(lev);
        self
    }

    pub fn with_price_trailing(mut self, price: Decimal) -> Self {
        self.price_trailing = Some(price);
        self
    }

    pub fn with_price_aux_limit(mut self, price: Decimal) -> Self {
        self.price_aux_limit = Some(price);
        self
    }

    pub fn with_price_oco_stop(mut self, price: Decimal) -> Self {
        self.price_oco_stop = Some(price);
        self
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn with_tif(mut self, tif: NaiveDateTime) -> Self {
        self.tif = Some(tif);
        self
    }

    pub fn with_group_id(mut self, gid: u64) -> Self {
        self.gid = Some(gid);
        self
    }

    pub fn with_client_id(mut self, cid: u64) -> Self {
        self.cid = Some(cid);
        self
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.order_type.is_none() {
            missing.push("type");
        }
        if blank(&self.symbol) {
            missing.push("symbol");
        }
        if self.amount.is_none_or(|amount| amount.is_zero()) {
            missing.push("amount");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(BitfinexError::missing_fields("new order", &missing))
        }
    }

    /// Fill group id, client id and affiliate meta where the caller left them unset
    pub fn with_defaults(mut self, client_id: u64) -> Self {
        self.gid.get_or_insert(DEFAULT_GROUP_ID);
        self.cid.get_or_insert(client_id);
        self.meta
            .get_or_insert_with(|| json!({ "aff_code": DEFAULT_AFFILIATE_CODE }));
        self
    }
}

/// Order update (`ou`)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateOrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gid: Option<u64>,
    #[serde(with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lev: Option<u32>,
    /// Change of amount
    #[serde(with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_aux_limit: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_trailing: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
    #[serde(with = "tif_format")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tif: Option<NaiveDateTime>,
}

impl UpdateOrderRequest {
    pub fn new(id: u64) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_delta(mut self, delta: Decimal) -> Self {
        self.delta = Some(delta);
        self
    }

    pub fn with_leverage(mut self, lev: u32) -> Self {
        self.lev = Some(lev);
        self
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn with_tif(mut self, tif: NaiveDateTime) -> Self {
        self.tif = Some(tif);
        self
    }

    pub fn validate(&self) -> Result<()> {
        match self.id {
            Some(id) if id != 0 => Ok(()),
            _ => Err(BitfinexError::missing_fields("update order", &["id"])),
        }
    }
}

/// Cancel a single order (`oc`) by exchange id or by client id and date
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CancelOrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid_date: Option<NaiveDate>,
}

impl CancelOrderRequest {
    pub fn by_id(id: u64) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn by_client_id(cid: u64, cid_date: NaiveDate) -> Self {
        Self {
            id: None,
            cid: Some(cid),
            cid_date: Some(cid_date),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let by_id = self.id.is_some_and(|id| id != 0);
        let by_cid = self.cid.is_some() && self.cid_date.is_some();
        if by_id || by_cid {
            Ok(())
        } else {
            Err(BitfinexError::Validation(
                "cancel order: id or both cid and cid_date is required".to_string(),
            ))
        }
    }
}

/// Cancel many orders (`oc_multi`) selected by id, client id, group id or all
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CancelOrderMultiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Vec<u64>>,
    /// `[cid, cid_date]` pairs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid: Option<Vec<(u64, NaiveDate)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gid: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all: Option<u8>,
}

impl CancelOrderMultiRequest {
    pub fn by_ids(ids: Vec<u64>) -> Self {
        Self {
            id: Some(ids),
            ..Default::default()
        }
    }

    pub fn by_client_ids(cids: Vec<(u64, NaiveDate)>) -> Self {
        Self {
            cid: Some(cids),
            ..Default::default()
        }
    }

    pub fn by_group_ids(gids: Vec<u64>) -> Self {
        Self {
            gid: Some(gids),
            ..Default::default()
        }
    }

    pub fn all() -> Self {
        Self {
            all: Some(1),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let selects = self.id.as_ref().is_some_and(|ids| !ids.is_empty())
            || self.cid.as_ref().is_some_and(|cids| !cids.is_empty())
            || self.gid.as_ref().is_some_and(|gids| !gids.is_empty())
            || self.all == Some(1);
        if selects {
            Ok(())
        } else {
            Err(BitfinexError::Validation(
                "cancel order multi: at least one of id, cid, gid or all is required".to_string(),
            ))
        }
    }
}

/// One entry of an `ox_multi` batch, sent as `[op, payload]`
#[derive(Debug, Clone, PartialEq)]
pub enum OrderOperation {
    New(NewOrderRequest),
    Update(UpdateOrderRequest),
    Cancel(CancelOrderRequest),
    CancelMulti(CancelOrderMultiRequest),
}

impl OrderOperation {
    pub fn op_code(&self) -> OpCode {
        match self {
            OrderOperation::New(_) => OpCode::NewOrder,
            OrderOperation::Update(_) => OpCode::UpdateOrder,
            OrderOperation::Cancel(_) => OpCode::CancelOrder,
            OrderOperation::CancelMulti(_) => OpCode::CancelOrderMulti,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            OrderOperation::New(request) => request.validate(),
            OrderOperation::Update(request) => request.validate(),
            OrderOperation::Cancel(request) => request.validate(),
            OrderOperation::CancelMulti(request) => request.validate(),
        }
    }
}

impl Serialize for OrderOperation {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let op = self.op_code();
        match self {
            OrderOperation::New(request) => (op, request).serialize(serializer),
            OrderOperation::Update(request) => (op, request).serialize(serializer),
            OrderOperation::Cancel(request) => (op, request).serialize(serializer),
            OrderOperation::CancelMulti(request) => (op, request).serialize(serializer),
        }
    }
}

/// New funding offer (`fon`); every field is mandatory
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewOfferRequest {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub offer_type: Option<OfferType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    /// Rate, or offset for FRRDELTA offers
    #[serde(with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<Decimal>,
    /// Days, 2 to 30
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
}

impl NewOfferRequest {
    pub fn new(
        offer_type: OfferType,
        symbol: impl Into<String>,
        amount: Decimal,
        rate: Decimal,
        period: u32,
        flags: u32,
    ) -> Self {
        Self {
            offer_type: Some(offer_type),
            symbol: Some(symbol.into()),
            amount: Some(amount),
            rate: Some(rate),
            period: Some(period),
            flags: Some(flags),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.offer_type.is_none() {
            missing.push("type");
        }
        if blank(&self.symbol) {
            missing.push("symbol");
        }
        if self.amount.is_none_or(|amount| amount.is_zero()) {
            missing.push("amount");
        }
        if self.rate.is_none() {
            missing.push("rate");
        }
        if self.period.is_none_or(|period| period == 0) {
            missing.push("period");
        }
        if self.flags.is_none() {
            missing.push("flags");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(BitfinexError::missing_fields("new offer", &missing))
        }
    }
}

/// Cancel a funding offer (`foc`)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CancelOfferRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

impl CancelOfferRequest {
    pub fn new(id: u64) -> Self {
        Self { id: Some(id) }
    }

    pub fn validate(&self) -> Result<()> {
        match self.id {
            Some(id) if id != 0 => Ok(()),
            _ => Err(BitfinexError::missing_fields("cancel offer", &["id"])),
        }
    }
}

/// Calculation request token, sent as a one element array
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalcRequest {
    MarginBase,
    MarginSymbol(String),
    Position(String),
    WalletMargin(String),
    WalletFunding(String),
    Balance,
    Raw(String),
}

impl CalcRequest {
    pub fn token(&self) -> String {
        match self {
            CalcRequest::MarginBase => "margin_base".to_string(),
            CalcRequest::MarginSymbol(symbol) => format!("margin_sym_{symbol}"),
            CalcRequest::Position(symbol) => format!("position_{symbol}"),
            CalcRequest::WalletMargin(currency) => format!("wallet_margin_{currency}"),
            CalcRequest::WalletFunding(currency) => format!("wallet_funding_{currency}"),
            CalcRequest::Balance => "balance".to_string(),
            CalcRequest::Raw(token) => token.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let empty = match self {
            CalcRequest::MarginBase | CalcRequest::Balance => false,
            CalcRequest::MarginSymbol(value)
            | CalcRequest::Position(value)
            | CalcRequest::WalletMargin(value)
            | CalcRequest::WalletFunding(value)
            | CalcRequest::Raw(value) => value.trim().is_empty(),
        };
        if empty {
            Err(BitfinexError::Validation(format!(
                "calc: incomplete request token {:?}",
                self.token()
            )))
        } else {
            Ok(())
        }
    }
}

impl Serialize for CalcRequest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [self.token()].serialize(serializer)
    }
}
