use crate::error::ConfigError;
use crate::settings::{BacktestSettings, DataSettings};
use chrono::NaiveDate;
use core_types::{CommissionType, Exchange, Frequency, PriceField, TradeAt};
use rust_decimal::Decimal;

/// The commission knob. Validated and carried, but not applied to cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commission {
    pub kind: CommissionType,
    pub amount: Decimal,
}

/// The validated, immutable parameters of one simulation run.
///
/// Built once from `BacktestSettings`; every field is checked at that
/// boundary so the simulator never re-validates.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    trade_at: TradeAt,
    fractional_shares: bool,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    reindex_allocation_matrix: bool,
    reindex_frequency: Frequency,
    calendar: Exchange,
    commission: Commission,
    starting_portfolio_value: Decimal,
}

impl SimulationConfig {
    pub fn trade_at(&self) -> TradeAt {
        self.trade_at
    }

    pub fn fractional_shares(&self) -> bool {
        self.fractional_shares
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn reindex_allocation_matrix(&self) -> bool {
        self.reindex_allocation_matrix
    }

    pub fn reindex_frequency(&self) -> Frequency {
        self.reindex_frequency
    }

    pub fn calendar(&self) -> Exchange {
        self.calendar
    }

    pub fn commission(&self) -> Commission {
        self.commission
    }

    pub fn starting_portfolio_value(&self) -> Decimal {
        self.starting_portfolio_value
    }
}

impl TryFrom<&BacktestSettings> for SimulationConfig {
    type Error = ConfigError;

    fn try_from(settings: &BacktestSettings) -> Result<Self, Self::Error> {
        let trade_at = settings.trade_at.parse::<TradeAt>()?;

        if settings.starting_portfolio_value < Decimal::ONE {
            return Err(ConfigError::ValidationError(format!(
                "starting_portfolio_value must be greater than or equal to 1, got {}",
                settings.starting_portfolio_value
            )));
        }

        let start_date = settings.start_date_or_default();
        if let Some(end_date) = settings.end_date {
            if end_date < start_date {
                return Err(ConfigError::ValidationError(format!(
                    "end_date {} precedes start_date {}",
                    end_date, start_date
                )));
            }
        }

        let commission = Commission {
            kind: settings.commission_type.parse::<CommissionType>()?,
            amount: settings.commission_amount,
        };
        if commission.amount.is_sign_negative() && !commission.amount.is_zero() {
            return Err(ConfigError::ValidationError(format!(
                "commission_amount must not be negative, got {}",
                commission.amount
            )));
        }

        Ok(Self {
            trade_at,
            fractional_shares: settings.fractional_shares,
            start_date,
            end_date: settings.end_date,
            reindex_allocation_matrix: settings.reindex_allocation_matrix,
            reindex_frequency: settings.reindex_date_freq.parse::<Frequency>()?,
            calendar: settings.calendar.parse::<Exchange>()?,
            commission,
            starting_portfolio_value: settings.starting_portfolio_value,
        })
    }
}

impl TryFrom<BacktestSettings> for SimulationConfig {
    type Error = ConfigError;

    fn try_from(settings: BacktestSettings) -> Result<Self, Self::Error> {
        Self::try_from(&settings)
    }
}

/// Validated settings for the remote price provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataConfig {
    pub price_field: PriceField,
    pub price_shift: usize,
}

impl TryFrom<&DataSettings> for DataConfig {
    type Error = ConfigError;

    fn try_from(settings: &DataSettings) -> Result<Self, Self::Error> {
        Ok(Self {
            price_field: settings.price_field.parse::<PriceField>()?,
            price_shift: settings.price_shift,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn settings() -> BacktestSettings {
        BacktestSettings {
            start_date: NaiveDate::from_ymd_opt(2023, 1, 3),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_validate() {
        let config = SimulationConfig::try_from(settings()).unwrap();
        assert_eq!(config.trade_at(), TradeAt::Open);
        assert!(!config.fractional_shares());
        assert_eq!(config.reindex_frequency(), Frequency::Daily);
        assert_eq!(config.calendar(), Exchange::Nyse);
        assert_eq!(config.end_date(), None);
        assert_eq!(config.starting_portfolio_value(), dec!(10000));
    }

    #[test]
    fn unknown_trade_at_is_rejected() {
        let err = SimulationConfig::try_from(BacktestSettings {
            trade_at: "midday".to_string(),
            ..settings()
        })
        .unwrap_err();
        assert!(err.to_string().contains("trade_at"));
    }

    #[test]
    fn close_is_accepted() {
        let config = SimulationConfig::try_from(BacktestSettings {
            trade_at: "close".to_string(),
            ..settings()
        })
        .unwrap();
        assert_eq!(config.trade_at(), TradeAt::Close);
    }

    #[test]
    fn starting_value_below_one_is_rejected() {
        for value in [dec!(0), dec!(0.99), dec!(-5)] {
            let result = SimulationConfig::try_from(BacktestSettings {
                starting_portfolio_value: value,
                ..settings()
            });
            assert!(matches!(result, Err(ConfigError::ValidationError(_))), "{}", value);
        }
        assert!(SimulationConfig::try_from(BacktestSettings {
            starting_portfolio_value: dec!(1),
            ..settings()
        })
        .is_ok());
    }

    #[test]
    fn end_before_start_is_rejected() {
        let result = SimulationConfig::try_from(BacktestSettings {
            end_date: NaiveDate::from_ymd_opt(2022, 12, 30),
            ..settings()
        });
        assert!(result.is_err());
    }

    #[test]
    fn bad_tokens_are_rejected() {
        assert!(SimulationConfig::try_from(BacktestSettings {
            reindex_date_freq: "5min".to_string(),
            ..settings()
        })
        .is_err());
        assert!(SimulationConfig::try_from(BacktestSettings {
            calendar: "LSE".to_string(),
            ..settings()
        })
        .is_err());
        assert!(SimulationConfig::try_from(BacktestSettings {
            commission_type: "bps".to_string(),
            ..settings()
        })
        .is_err());
    }

    #[test]
    fn data_settings_parse_price_field() {
        let data = DataConfig::try_from(&DataSettings {
            price_field: "adj_close".to_string(),
            price_shift: 1,
        })
        .unwrap();
        assert_eq!(data.price_field, PriceField::AdjClose);
        assert_eq!(data.price_shift, 1);
    }
}
