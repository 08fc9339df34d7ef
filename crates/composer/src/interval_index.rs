//! Start-sorted index over timed items with a windowed overlap query.
//!
//! Items are sorted by start only, so an item that starts before a window can
//! still overlap it. A query binary-searches the prefix of items starting
//! before the window end, then filters that prefix by `end > window.start`.
//! That is `O(log M + k)` for a prefix of `k` candidates, which is fine for
//! the handful of overlays a plan carries.

use autocut_plan_model::TimeSpan;

/// Immutable interval index.
#[derive(Debug, Clone)]
pub struct IntervalIndex<T> {
    items: Vec<(TimeSpan, T)>,
    starts: Vec<f64>,
}

impl<T> IntervalIndex<T> {
    /// Build the index. Items with equal starts keep their input order.
    pub fn build(mut items: Vec<(TimeSpan, T)>) -> Self {
        items.sort_by(|a, b| a.0.start.total_cmp(&b.0.start));
        let starts = items.iter().map(|(span, _)| span.start).collect();
        Self { items, starts }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every item with `start < window.end && end > window.start`, in start order.
    pub fn overlapping<'a>(
        &'a self,
        window: &TimeSpan,
    ) -> impl Iterator<Item = (&'a TimeSpan, &'a T)> + 'a {
        let window = *window;
        let prefix = self.starts.partition_point(|&start| start < window.end);
        self.items[..prefix]
            .iter()
            .filter(move |(span, _)| span.overlaps(&window))
            .map(|(span, item)| (span, item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: f64, end: f64) -> TimeSpan {
        TimeSpan::new(start, end).unwrap()
    }

    fn index() -> IntervalIndex<&'static str> {
        IntervalIndex::build(vec![
            (span(8.0, 9.0), "late"),
            (span(0.0, 20.0), "long"),
            (span(4.0, 7.0), "mid"),
            (span(4.0, 4.5), "mid-tie"),
        ])
    }

    fn labels(index: &IntervalIndex<&'static str>, a: f64, b: f64) -> Vec<&'static str> {
        index.overlapping(&span(a, b)).map(|(_, l)| *l).collect()
    }

    #[test]
    fn test_sorted_with_stable_ties() {
        assert_eq!(labels(&index(), 0.0, 100.0), vec!["long", "mid", "mid-tie", "late"]);
    }

    #[test]
    fn test_event_starting_before_window_is_found() {
        assert_eq!(labels(&index(), 5.0, 6.0), vec!["long", "mid"]);
    }

    #[test]
    fn test_window_end_is_exclusive() {
        assert_eq!(labels(&index(), 1.0, 4.0), vec!["long"]);
    }

    #[test]
    fn test_event_ending_at_window_start_excluded() {
        assert_eq!(labels(&index(), 9.0, 10.0), vec!["long"]);
        assert!(labels(&index(), 20.0, 30.0).is_empty());
    }

    #[test]
    fn test_empty_index() {
        let empty: IntervalIndex<()> = IntervalIndex::build(vec![]);
        assert!(empty.is_empty());
        assert_eq!(empty.overlapping(&span(0.0, 1.0)).count(), 0);
    }
}
