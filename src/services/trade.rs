//! Trade service
//!
//! Opening, closing, editing and deleting journaled trades. Sizing is always
//! computed against the owning account's current balance.

use chrono::{NaiveDateTime, Utc};
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::error::{JournalError, JournalResult};
use crate::models::{
    AccountId, Direction, ImageSlot, InlineImage, NewTrade, PriceInput, Trade, TradeId, TradeUid,
};
use crate::storage::Storage;

/// User input for opening or editing a trade
#[derive(Debug, Clone)]
pub struct TradeInput {
    pub symbol: String,
    pub date: NaiveDateTime,
    pub direction: Direction,
    pub entry: String,
    pub stop: String,
    pub target: String,
    pub risk_percent: f64,
    pub fee_percent: f64,
}

impl TradeInput {
    fn into_new_trade(self, account_id: AccountId) -> JournalResult<NewTrade> {
        let symbol = self.symbol.trim();
        if symbol.is_empty() {
            return Err(JournalError::Validation("Symbol cannot be empty".into()));
        }

        Ok(NewTrade {
            account_id,
            symbol: symbol.to_string(),
            date: self.date,
            direction: self.direction,
            entry: parse_price("entry price", &self.entry)?,
            stop: parse_price("stop loss", &self.stop)?,
            target: parse_price("take profit", &self.target)?,
            risk_percent: self.risk_percent,
            fee_percent: self.fee_percent,
        })
    }
}

fn parse_price(field: &str, text: &str) -> JournalResult<PriceInput> {
    PriceInput::parse(text)
        .ok_or_else(|| JournalError::Validation(format!("Invalid {}: '{}'", field, text.trim())))
}

/// Service for trade management
pub struct TradeService<'a> {
    storage: &'a Storage,
}

impl<'a> TradeService<'a> {
    /// Create a new trade service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn account_balance(&self, account_id: AccountId) -> JournalResult<f64> {
        self.storage
            .accounts
            .get(account_id)?
            .map(|a| a.balance)
            .ok_or_else(|| JournalError::account_not_found(account_id.to_string()))
    }

    fn require(&self, id: TradeId) -> JournalResult<Trade> {
        self.storage
            .trades
            .get(id)?
            .ok_or_else(|| JournalError::trade_not_found(id.to_string()))
    }

    /// Open a trade on an account
    pub fn open(
        &self,
        account_id: AccountId,
        input: TradeInput,
        entry_image: Option<InlineImage>,
    ) -> JournalResult<Trade> {
        let balance = self.account_balance(account_id)?;
        let details = input.into_new_trade(account_id)?;
        let sizing = details
            .sizing_input(balance)
            .compute()
            .map_err(|e| JournalError::Validation(e.to_string()))?;

        let mut trade = Trade::open(details, sizing);
        while self.storage.trades.get(trade.id)?.is_some() {
            trade.id = TradeId::new(trade.id.get() + 1);
        }
        if let Some(image) = entry_image {
            attach_image(&mut trade, ImageSlot::Entry, &image);
        }

        self.storage.trades.upsert(trade.clone())?;
        self.storage.trades.save()?;

        self.storage.log_create(
            EntityType::Trade,
            trade.id.to_string(),
            Some(trade.symbol.clone()),
            &trade,
        )?;
        info!(trade = %trade.uid, symbol = %trade.symbol, "Opened trade");

        Ok(trade)
    }

    /// Close an open trade at `price`
    pub fn close(
        &self,
        id: TradeId,
        price: f64,
        exit_image: Option<InlineImage>,
    ) -> JournalResult<Trade> {
        if !price.is_finite() || price <= 0.0 {
            return Err(JournalError::Validation(
                "Close price must be a positive number".into(),
            ));
        }

        let mut trade = self.require(id)?;
        if trade.is_closed() {
            return Err(JournalError::Validation(format!(
                "Trade {} is already closed",
                trade.id
            )));
        }

        let before = trade.clone();
        trade.close(price, Utc::now());
        if let Some(image) = exit_image {
            attach_image(&mut trade, ImageSlot::Exit, &image);
        }

        self.storage.trades.upsert(trade.clone())?;
        self.storage.trades.save()?;

        self.storage.log_update(
            EntityType::Trade,
            trade.id.to_string(),
            Some(trade.symbol.clone()),
            &before,
            &trade,
        )?;
        info!(trade = %trade.uid, pnl = trade.pnl(), "Closed trade");

        Ok(trade)
    }

    /// Re-enter a trade's details and recompute its sizing
    ///
    /// Identity, status and screenshots are kept.
    pub fn edit(&self, id: TradeId, input: TradeInput) -> JournalResult<Trade> {
        let mut trade = self.require(id)?;
        let balance = self.account_balance(trade.account_id)?;

        let details = input.into_new_trade(trade.account_id)?;
        let sizing = details
            .sizing_input(balance)
            .compute()
            .map_err(|e| JournalError::Validation(e.to_string()))?;

        let before = trade.clone();
        trade.apply_details(details, sizing);

        self.storage.trades.upsert(trade.clone())?;
        self.storage.trades.save()?;

        self.storage.log_update(
            EntityType::Trade,
            trade.id.to_string(),
            Some(trade.symbol.clone()),
            &before,
            &trade,
        )?;

        Ok(trade)
    }

    /// Delete a trade
    pub fn delete(&self, id: TradeId) -> JournalResult<Trade> {
        let trade = self
            .storage
            .trades
            .delete(id)?
            .ok_or_else(|| JournalError::trade_not_found(id.to_string()))?;
        self.storage.trades.save()?;

        self.storage.log_delete(
            EntityType::Trade,
            trade.id.to_string(),
            Some(trade.symbol.clone()),
            &trade,
        )?;
        debug!(trade = %trade.uid, "Deleted trade");

        Ok(trade)
    }

    /// Trades of an account, newest first
    pub fn list(&self, account_id: AccountId) -> JournalResult<Vec<Trade>> {
        self.storage.trades.get_by_account(account_id)
    }

    /// Look up a trade by numeric id or uid
    pub fn find(&self, identifier: &str) -> JournalResult<Option<Trade>> {
        let identifier = identifier.trim();
        if let Ok(id) = identifier.parse::<TradeId>() {
            if let Some(trade) = self.storage.trades.get(id)? {
                return Ok(Some(trade));
            }
        }
        self.storage
            .trades
            .get_by_uid(&TradeUid::from_string(identifier))
    }

    /// Look up a trade or fail with `NotFound`
    pub fn show(&self, identifier: &str) -> JournalResult<Trade> {
        self.find(identifier)?
            .ok_or_else(|| JournalError::trade_not_found(identifier))
    }
}

/// Store an image inline on a trade under its derived filename
pub fn attach_image(trade: &mut Trade, slot: ImageSlot, image: &InlineImage) {
    let name = slot.file_name(&trade.effective_uid(), image.extension());
    trade.set_image(slot, Some(image.to_data_uri()), Some(name));
}
