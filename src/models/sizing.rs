//! Position sizing
//!
//! Sizes a position so that hitting the stop loses `risk_percent` of the
//! account balance, fees included.

use std::fmt;

use super::trade::Direction;

/// Everything needed to size a position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingInput {
    pub balance: f64,
    pub direction: Direction,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub risk_percent: f64,
    pub fee_percent: f64,
}

/// Computed sizing and fee figures for a trade
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionSizing {
    pub total_risk_amount: f64,
    pub position_size: f64,
    pub position_value: f64,
    pub potential_profit: f64,
    pub net_profit: f64,
    pub risk_reward_ratio: f64,
    pub fee_entry: f64,
    pub fee_exit: f64,
    pub total_fee: f64,
}

impl SizingInput {
    /// Check prices and risk before sizing
    pub fn validate(&self) -> Result<(), SizingError> {
        for (field, value) in [
            ("entry price", self.entry),
            ("stop loss", self.stop),
            ("take profit", self.target),
            ("risk percent", self.risk_percent),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SizingError::NotPositive(field));
            }
        }

        if !self.fee_percent.is_finite() || self.fee_percent < 0.0 {
            return Err(SizingError::NegativeFee);
        }

        match self.direction {
            Direction::Long if self.stop >= self.entry => Err(SizingError::StopOnWrongSide {
                direction: self.direction,
            }),
            Direction::Short if self.stop <= self.entry => Err(SizingError::StopOnWrongSide {
                direction: self.direction,
            }),
            _ => Ok(()),
        }
    }

    /// Distance between entry and stop
    pub fn stop_distance(&self) -> f64 {
        (self.entry - self.stop).abs()
    }

    /// Distance between entry and target
    pub fn target_distance(&self) -> f64 {
        (self.target - self.entry).abs()
    }

    /// Size the position
    pub fn compute(&self) -> Result<PositionSizing, SizingError> {
        self.validate()?;

        let stop_distance = self.stop_distance();
        let target_distance = self.target_distance();

        let total_risk_amount = risk_amount(self.balance, self.risk_percent);
        let position_size =
            position_size(total_risk_amount, self.entry, stop_distance, self.fee_percent);
        let position_value = position_size * self.entry;
        let total_fee = position_value * self.fee_percent / 100.0;
        let potential_profit = position_size * target_distance;
        let risk_reward_ratio = ((target_distance / stop_distance) * 100.0).round() / 100.0;

        Ok(PositionSizing {
            total_risk_amount,
            position_size,
            position_value,
            potential_profit,
            net_profit: potential_profit - total_fee,
            risk_reward_ratio,
            fee_entry: total_fee / 2.0,
            fee_exit: total_fee / 2.0,
            total_fee,
        })
    }
}

/// Amount of balance put at risk
pub fn risk_amount(balance: f64, risk_percent: f64) -> f64 {
    balance * risk_percent / 100.0
}

/// Units that lose `risk_amount` at the stop, counting the fee per unit
pub fn position_size(risk_amount: f64, entry: f64, stop_distance: f64, fee_percent: f64) -> f64 {
    let fee_per_unit = entry * fee_percent / 100.0;
    let denominator = stop_distance + fee_per_unit;
    if denominator > 0.0 {
        risk_amount / denominator
    } else {
        0.0
    }
}

/// Reasons a position cannot be sized
#[derive(Debug, Clone, PartialEq)]
pub enum SizingError {
    NotPositive(&'static str),
    NegativeFee,
    StopOnWrongSide { direction: Direction },
}

impl fmt::Display for SizingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPositive(field) => write!(f, "{} must be a positive number", field),
            Self::NegativeFee => write!(f, "fee percent cannot be negative"),
            Self::StopOnWrongSide { direction } => match direction {
                Direction::Long => write!(f, "for a long, the stop loss must be below the entry"),
                Direction::Short => {
                    write!(f, "for a short, the stop loss must be above the entry")
                }
            },
        }
    }
}

impl std::error::Error for SizingError {}
