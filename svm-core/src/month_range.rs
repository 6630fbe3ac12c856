use chrono::{Datelike, NaiveDate};
use std::mem::replace;
use svm_utils::dates::{add_months, first_of_month};

/// A month range iterator that yields the first day of each month from the
/// start month through the end month (inclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct MonthRange(pub NaiveDate, pub NaiveDate);

impl MonthRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        MonthRange(first_of_month(&start), first_of_month(&end))
    }
}

impl Iterator for MonthRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 <= self.1 {
            let next = add_months(&self.0, 1);
            Some(replace(&mut self.0, next))
        } else {
            None
        }
    }
}

/// Monthly time axis of `len` steps starting at the month of `start`.
pub fn monthly_axis(start: NaiveDate, len: usize) -> Vec<NaiveDate> {
    let start = first_of_month(&start);
    (0..len).map(|i| add_months(&start, i as u32)).collect()
}

/// Indices of `axis` whose calendar month equals `month` (1-12).
pub fn indices_of_month(axis: &[NaiveDate], month: u32) -> Vec<usize> {
    axis.iter()
        .enumerate()
        .filter(|(_, d)| d.month() == month)
        .map(|(i, _)| i)
        .collect()
}
