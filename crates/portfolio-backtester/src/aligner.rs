use crate::calendar::TradingCalendar;
use crate::error::PortfolioError;
use chrono::{Datelike, NaiveDate};
use configuration::SimulationConfig;
use core_types::{is_hold_row, AllocationMatrix, Frequency};

/// Builds the valuation timeline for a run.
///
/// Without reindexing the timeline is the allocation matrix's own dates inside
/// `[start, end]`. With reindexing it is every sampled session of the trading
/// calendar in that window, and allocation dates outside the sample turn into
/// nothing while sampled dates without an allocation turn into hold rows.
pub struct CalendarAligner<'a> {
    start: NaiveDate,
    end: Option<NaiveDate>,
    reindex: bool,
    frequency: Frequency,
    calendar: &'a dyn TradingCalendar,
}

impl<'a> CalendarAligner<'a> {
    pub fn new(
        start: NaiveDate,
        end: Option<NaiveDate>,
        reindex: bool,
        frequency: Frequency,
        calendar: &'a dyn TradingCalendar,
    ) -> Self {
        Self { start, end, reindex, frequency, calendar }
    }

    pub fn from_config(config: &SimulationConfig, calendar: &'a dyn TradingCalendar) -> Self {
        Self::new(
            config.start_date(),
            config.end_date(),
            config.reindex_allocation_matrix(),
            config.reindex_frequency(),
            calendar,
        )
    }

    /// Returns the allocation matrix conformed to the valuation timeline; its
    /// dates are the timeline. `last_price_date` stands in for an open end date.
    pub fn align(
        &self,
        allocation: &AllocationMatrix,
        last_price_date: Option<NaiveDate>,
    ) -> Result<AllocationMatrix, PortfolioError> {
        if let Some(end) = self.end {
            if end < self.start {
                return Err(PortfolioError::Configuration(format!(
                    "end_date {} precedes start_date {}",
                    end, self.start
                )));
            }
        }

        let clipped = allocation.clip(self.start, self.end);

        let timeline = if self.reindex {
            let end = self.end.or(last_price_date).ok_or_else(|| {
                PortfolioError::Configuration(
                    "cannot reindex without an end_date or any price data".to_string(),
                )
            })?;
            if end < self.start {
                return Err(PortfolioError::Configuration(format!(
                    "latest price date {} precedes start_date {}",
                    end, self.start
                )));
            }

            let sessions = self.calendar.sessions(self.start, end);
            if sessions.is_empty() {
                return Err(PortfolioError::Configuration(format!(
                    "the {} calendar has no sessions between {} and {}",
                    self.calendar.name(),
                    self.start,
                    end
                )));
            }
            let index = sample(&sessions, self.frequency);

            let dropped = clipped
                .iter()
                .filter(|(date, row)| !is_hold_row(row) && index.binary_search(date).is_err())
                .count();
            if dropped > 0 {
                tracing::warn!(
                    dropped,
                    "Rebalance dates fall outside the {} timeline and will be ignored",
                    self.calendar.name()
                );
            }

            clipped.reindex(index)
        } else {
            clipped
        };

        if timeline.is_empty() {
            return Err(PortfolioError::Configuration(format!(
                "no valuation dates between {} and {}",
                self.start,
                self.end.map_or_else(|| "the latest data".to_string(), |end| end.to_string())
            )));
        }

        tracing::debug!(
            dates = timeline.len(),
            first = ?timeline.first_date(),
            last = ?timeline.last_date(),
            "Valuation timeline aligned"
        );
        Ok(timeline)
    }
}

/// Picks the sessions that make up the timeline at `frequency`. Weekly and
/// monthly keep the last session of each period.
pub fn sample(sessions: &[NaiveDate], frequency: Frequency) -> Vec<NaiveDate> {
    let period = |date: &NaiveDate| -> (i32, u32) {
        match frequency {
            Frequency::Daily => (date.year(), date.ordinal()),
            Frequency::Weekly => {
                let week = date.iso_week();
                (week.year(), week.week())
            }
            Frequency::Monthly => (date.year(), date.month()),
        }
    };

    sessions
        .iter()
        .enumerate()
        .filter(|(i, date)| {
            sessions
                .get(i + 1)
                .is_none_or(|next| period(next) != period(*date))
        })
        .map(|(_, date)| *date)
        .collect()
}
