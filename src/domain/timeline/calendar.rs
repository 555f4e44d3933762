//! Calendar math behind bucket indices.
//!
//! Buckets are contiguous: index `i` of a granularity starts `i` periods after the
//! period containing the oldest known transaction.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::value_objects::{DatasetBounds, Granularity};

impl Granularity {
    /// Start of the period containing `date`.
    pub fn period_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Daily => date,
            Granularity::Weekly => {
                date - Days::new(u64::from(date.weekday().num_days_from_monday()))
            }
            Granularity::Monthly => date.with_day(1).unwrap_or(date),
            Granularity::Quarterly => {
                let first_month = (date.month0() / 3) * 3 + 1;
                NaiveDate::from_ymd_opt(date.year(), first_month, 1).unwrap_or(date)
            }
        }
    }

    /// Move a period start by `periods` (negative moves back).
    pub fn advance(&self, start: NaiveDate, periods: i64) -> Option<NaiveDate> {
        let magnitude = periods.unsigned_abs();
        match self {
            Granularity::Daily => shift_days(start, periods.signum(), magnitude),
            Granularity::Weekly => shift_days(start, periods.signum(), magnitude.checked_mul(7)?),
            Granularity::Monthly => shift_months(start, periods.signum(), magnitude),
            Granularity::Quarterly => shift_months(start, periods.signum(), magnitude.checked_mul(3)?),
        }
    }

    /// Whole periods from `from` to `to`, both taken as period starts.
    pub fn periods_between(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        let from = self.period_start(from);
        let to = self.period_start(to);
        match self {
            Granularity::Daily => (to - from).num_days(),
            Granularity::Weekly => (to - from).num_days() / 7,
            Granularity::Monthly => month_ordinal(to) - month_ordinal(from),
            Granularity::Quarterly => (month_ordinal(to) - month_ordinal(from)) / 3,
        }
    }

    /// Last day covered by the period starting at `start`.
    pub fn period_end(&self, start: NaiveDate) -> NaiveDate {
        self.advance(start, 1)
            .and_then(|next| next.pred_opt())
            .unwrap_or(start)
    }

    /// Default label used when the backend does not provide one.
    pub fn label(&self, start: NaiveDate) -> String {
        match self {
            Granularity::Daily => start.format("%Y-%m-%d").to_string(),
            Granularity::Weekly => {
                let week = start.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            Granularity::Monthly => start.format("%b %Y").to_string(),
            Granularity::Quarterly => format!("Q{} {}", start.month0() / 3 + 1, start.year()),
        }
    }
}

fn shift_days(start: NaiveDate, sign: i64, days: u64) -> Option<NaiveDate> {
    if sign < 0 {
        start.checked_sub_days(Days::new(days))
    } else {
        start.checked_add_days(Days::new(days))
    }
}

fn shift_months(start: NaiveDate, sign: i64, months: u64) -> Option<NaiveDate> {
    let months = Months::new(u32::try_from(months).ok()?);
    if sign < 0 {
        start.checked_sub_months(months)
    } else {
        start.checked_add_months(months)
    }
}

fn month_ordinal(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

/// Inclusive date range covered by one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRange {
    pub start: NaiveDate,
    /// Last day of the period, inclusive.
    pub end: NaiveDate,
}

impl PeriodRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `YYYY-MM-DD` pair as sent on the wire.
    pub fn to_query_dates(&self) -> (String, String) {
        (self.start.format("%Y-%m-%d").to_string(), self.end.format("%Y-%m-%d").to_string())
    }
}

/// Index <-> date mapping of one granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketCalendar {
    pub granularity: Granularity,
    pub origin: NaiveDate,
}

impl BucketCalendar {
    pub fn new(granularity: Granularity, origin: NaiveDate) -> Self {
        Self { granularity, origin: granularity.period_start(origin) }
    }

    pub fn period_start(&self, index: usize) -> Option<NaiveDate> {
        self.granularity.advance(self.origin, i64::try_from(index).ok()?)
    }

    pub fn period(&self, index: usize) -> Option<PeriodRange> {
        let start = self.period_start(index)?;
        Some(PeriodRange::new(start, self.granularity.period_end(start)))
    }

    /// Date range spanned by `width` buckets from `start_index`.
    pub fn span(&self, start_index: usize, width: usize) -> Option<PeriodRange> {
        let first = self.period(start_index)?;
        let last = self.period(start_index + width.max(1) - 1)?;
        Some(PeriodRange::new(first.start, last.end))
    }

    /// Bucket containing `date`; `None` before the origin.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        usize::try_from(self.granularity.periods_between(self.origin, date)).ok()
    }
}

impl DatasetBounds {
    /// Bounds spanning the periods of the oldest and newest known transaction.
    pub fn from_transaction_dates(
        granularity: Granularity,
        oldest: NaiveDate,
        newest: NaiveDate,
    ) -> Self {
        let (oldest, newest) = if oldest <= newest { (oldest, newest) } else { (newest, oldest) };
        let origin = granularity.period_start(oldest);
        let latest_index =
            usize::try_from(granularity.periods_between(origin, newest)).unwrap_or(0);
        Self {
            granularity,
            origin,
            earliest_index: 0,
            latest_index,
            total_buckets: latest_index + 1,
        }
    }

    /// A history holding a single period (no transactions yet).
    pub fn single(granularity: Granularity, today: NaiveDate) -> Self {
        Self::from_transaction_dates(granularity, today, today)
    }

    pub fn calendar(&self) -> BucketCalendar {
        BucketCalendar::new(self.granularity, self.origin)
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.earliest_index && index <= self.latest_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weeks_start_on_monday() {
        // 2024-11-15 is a Friday
        assert_eq!(Granularity::Weekly.period_start(date(2024, 11, 15)), date(2024, 11, 11));
        assert_eq!(Granularity::Weekly.period_start(date(2024, 11, 11)), date(2024, 11, 11));
        assert_eq!(Granularity::Weekly.period_end(date(2024, 11, 11)), date(2024, 11, 17));
    }

    #[test]
    fn quarter_boundaries() {
        assert_eq!(Granularity::Quarterly.period_start(date(2024, 8, 20)), date(2024, 7, 1));
        assert_eq!(Granularity::Quarterly.period_end(date(2024, 10, 1)), date(2024, 12, 31));
        assert_eq!(Granularity::Quarterly.label(date(2024, 10, 1)), "Q4 2024");
    }

    #[test]
    fn month_end_handles_february() {
        assert_eq!(Granularity::Monthly.period_end(date(2024, 2, 1)), date(2024, 2, 29));
        assert_eq!(Granularity::Monthly.period_end(date(2023, 2, 1)), date(2023, 2, 28));
    }

    #[test]
    fn periods_between_across_years() {
        assert_eq!(Granularity::Monthly.periods_between(date(2023, 11, 5), date(2024, 2, 1)), 3);
        assert_eq!(Granularity::Quarterly.periods_between(date(2023, 12, 31), date(2024, 1, 1)), 1);
        assert_eq!(Granularity::Daily.periods_between(date(2024, 2, 28), date(2024, 3, 1)), 2);
    }

    #[test]
    fn eighteen_months_of_history() {
        let bounds =
            DatasetBounds::from_transaction_dates(Granularity::Monthly, date(2023, 6, 14), date(2024, 11, 2));
        assert_eq!(bounds.origin, date(2023, 6, 1));
        assert_eq!(bounds.latest_index, 17);
        assert_eq!(bounds.total_buckets, 18);
    }

    #[test]
    fn calendar_round_trips_index() {
        let calendar = BucketCalendar::new(Granularity::Weekly, date(2024, 1, 3));
        let start = calendar.period_start(5).unwrap();
        assert_eq!(calendar.index_of(start), Some(5));
        assert_eq!(calendar.index_of(date(2023, 12, 1)), None);
    }
}
