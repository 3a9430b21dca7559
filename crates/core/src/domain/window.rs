use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::errors::QueryError;

/// Inclusive range of calendar days in the business timezone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, QueryError> {
        if start > end {
            return Err(QueryError::Validation(format!(
                "start date {start} must not be after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Window ending on `today` and reaching `days_back` days into the past.
    pub fn trailing(today: NaiveDate, days_back: u32) -> Self {
        let start = today - Duration::days(i64::from(days_back));
        Self { start, end: today }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, counting both ends.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Splits the window into consecutive, non-overlapping windows of at most
    /// `max_days` days each. `max_days` of zero is treated as one.
    pub fn chunks(&self, max_days: u32) -> Vec<DateWindow> {
        let step = Duration::days(i64::from(max_days.max(1)) - 1);
        let mut chunks = Vec::new();
        let mut cursor = self.start;

        while cursor <= self.end {
            let chunk_end = (cursor + step).min(self.end);
            chunks.push(DateWindow { start: cursor, end: chunk_end });
            match chunk_end.succ_opt() {
                Some(next) => cursor = next,
                None => break,
            }
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::DateWindow;
    use crate::errors::QueryError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn rejects_inverted_window() {
        let error = DateWindow::new(date(2024, 3, 2), date(2024, 3, 1)).expect_err("inverted");
        assert!(matches!(error, QueryError::Validation(_)));
    }

    #[test]
    fn single_day_window_is_one_chunk() {
        let window = DateWindow::new(date(2024, 3, 1), date(2024, 3, 1)).expect("window");
        assert_eq!(window.len_days(), 1);
        assert_eq!(window.chunks(30), vec![window]);
    }

    #[test]
    fn chunks_cover_window_without_overlap() {
        let window = DateWindow::new(date(2024, 1, 1), date(2024, 3, 15)).expect("window");
        let chunks = window.chunks(30);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].start(), date(2024, 1, 1));
        assert_eq!(chunks[0].end(), date(2024, 1, 30));
        assert_eq!(chunks[1].start(), date(2024, 1, 31));
        assert_eq!(chunks[2].end(), date(2024, 3, 15));

        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end().succ_opt(), Some(pair[1].start()));
        }
        assert!(chunks.iter().all(|chunk| chunk.len_days() <= 30));
        let covered: i64 = chunks.iter().map(DateWindow::len_days).sum();
        assert_eq!(covered, window.len_days());
    }

    #[test]
    fn trailing_window_counts_back_from_today() {
        let window = DateWindow::trailing(date(2024, 4, 10), 90);
        assert_eq!(window.start(), date(2024, 1, 11));
        assert_eq!(window.end(), date(2024, 4, 10));
    }
}
