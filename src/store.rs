//! Classified results for one job, with filtering and pagination

use crate::types::result::ClassificationResult;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Selects which classified results a view shows
pub trait ResultPredicate {
    fn matches(&self, result: &ClassificationResult) -> bool;

    /// Both predicates must match
    fn and<P: ResultPredicate>(self, other: P) -> And<Self, P>
    where
        Self: Sized,
    {
        And(self, other)
    }
}

impl<F> ResultPredicate for F
where
    F: Fn(&ClassificationResult) -> bool,
{
    fn matches(&self, result: &ClassificationResult) -> bool {
        self(result)
    }
}

/// Conjunction of two predicates
#[derive(Debug, Clone, Copy)]
pub struct And<A, B>(A, B);

impl<A: ResultPredicate, B: ResultPredicate> ResultPredicate for And<A, B> {
    fn matches(&self, result: &ClassificationResult) -> bool {
        self.0.matches(result) && self.1.matches(result)
    }
}

/// Filter by classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeFilter {
    #[default]
    All,
    Fraud,
    Legitimate,
}

impl ResultPredicate for OutcomeFilter {
    fn matches(&self, result: &ClassificationResult) -> bool {
        match self {
            OutcomeFilter::All => true,
            OutcomeFilter::Fraud => result.is_fraud(),
            OutcomeFilter::Legitimate => !result.is_fraud(),
        }
    }
}

impl FromStr for OutcomeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(OutcomeFilter::All),
            "fraud" => Ok(OutcomeFilter::Fraud),
            "legitimate" | "normal" => Ok(OutcomeFilter::Legitimate),
            other => Err(format!("unknown outcome filter '{}'", other)),
        }
    }
}

/// One page of a filtered result listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub items: Vec<ClassificationResult>,
    /// 1-based index of this page after clamping
    pub page_index: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Slice a filtered listing into a 1-based page.
///
/// Out-of-range page indices are clamped to the first or last page and a zero
/// page size is treated as 1.
pub fn page(filtered: &[&ClassificationResult], page_index: usize, page_size: usize) -> Page {
    let page_size = page_size.max(1);
    let total_items = filtered.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let page_index = page_index.clamp(1, total_pages);

    let start = (page_index - 1) * page_size;
    let end = (start + page_size).min(total_items);

    Page {
        items: filtered[start..end].iter().map(|r| (*r).clone()).collect(),
        page_index,
        page_size,
        total_items,
        total_pages,
    }
}

/// Classified results of one job in arrival order
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultStore {
    results: Vec<ClassificationResult>,
}

impl ResultStore {
    pub fn new(results: Vec<ClassificationResult>) -> Self {
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[ClassificationResult] {
        &self.results
    }

    /// Results matching `predicate`, in arrival order
    pub fn filter<P: ResultPredicate + ?Sized>(&self, predicate: &P) -> Vec<&ClassificationResult> {
        self.results.iter().filter(|r| predicate.matches(r)).collect()
    }

    /// Filter then paginate
    pub fn filter_and_page<P: ResultPredicate + ?Sized>(
        &self,
        predicate: &P,
        page_index: usize,
        page_size: usize,
    ) -> Page {
        page(&self.filter(predicate), page_index, page_size)
    }
}

/// Presentation cursor over a store: current filter and page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCursor {
    filter: OutcomeFilter,
    page_index: usize,
    page_size: usize,
}

impl ResultCursor {
    pub fn new(page_size: usize) -> Self {
        Self {
            filter: OutcomeFilter::All,
            page_index: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn filter(&self) -> OutcomeFilter {
        self.filter
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Change the filter; always returns to the first page
    pub fn set_filter(&mut self, filter: OutcomeFilter) {
        self.filter = filter;
        self.page_index = 1;
    }

    /// Jump to a page, clamped to the listing
    pub fn go_to(&mut self, store: &ResultStore, page_index: usize) {
        self.page_index = self.current(store).total_pages.min(page_index).max(1);
    }

    pub fn next(&mut self, store: &ResultStore) {
        self.go_to(store, self.page_index + 1);
    }

    pub fn previous(&mut self, store: &ResultStore) {
        self.go_to(store, self.page_index.saturating_sub(1));
    }

    /// Page the cursor currently points at
    pub fn current(&self, store: &ResultStore) -> Page {
        store.filter_and_page(&self.filter, self.page_index, self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::result::RiskLevel;
    use crate::types::transaction::Transaction;

    /// Results with amounts 1..=n; every third one is flagged
    fn store(n: usize) -> ResultStore {
        ResultStore::new(
            (1..=n)
                .map(|i| {
                    let tx = Transaction::new(i as f64, i as f64).unwrap();
                    let is_fraud = i % 3 == 0;
                    ClassificationResult::new(tx, is_fraud, if is_fraud { 0.9 } else { 0.1 }, RiskLevel::Low)
                        .with_sequence(i)
                })
                .collect(),
        )
    }

    fn sequences(page: &Page) -> Vec<usize> {
        page.items.iter().map(|r| r.sequence()).collect()
    }

    #[test]
    fn test_outcome_filters() {
        let store = store(10);

        assert_eq!(store.filter(&OutcomeFilter::All).len(), 10);
        assert_eq!(
            store
                .filter(&OutcomeFilter::Fraud)
                .iter()
                .map(|r| r.sequence())
                .collect::<Vec<_>>(),
            vec![3, 6, 9]
        );
        assert_eq!(store.filter(&OutcomeFilter::Legitimate).len(), 7);
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!("fraud".parse::<OutcomeFilter>(), Ok(OutcomeFilter::Fraud));
        assert_eq!("Normal".parse::<OutcomeFilter>(), Ok(OutcomeFilter::Legitimate));
        assert_eq!(" all ".parse::<OutcomeFilter>(), Ok(OutcomeFilter::All));
        assert!("suspicious".parse::<OutcomeFilter>().is_err());
    }

    #[test]
    fn test_composed_predicates() {
        let store = store(30);
        let large = |r: &ClassificationResult| r.transaction().amount() > 20.0;

        let matched = store.filter(&OutcomeFilter::Fraud.and(large));

        assert_eq!(
            matched.iter().map(|r| r.sequence()).collect::<Vec<_>>(),
            vec![21, 24, 27, 30]
        );
    }

    #[test]
    fn test_pagination_is_one_based_and_clamps() {
        let store = store(25);

        let first = store.filter_and_page(&OutcomeFilter::All, 1, 10);
        assert_eq!(sequences(&first), (1..=10).collect::<Vec<_>>());
        assert_eq!(first.total_pages, 3);

        let last = store.filter_and_page(&OutcomeFilter::All, 3, 10);
        assert_eq!(sequences(&last), (21..=25).collect::<Vec<_>>());

        let past_end = store.filter_and_page(&OutcomeFilter::All, 99, 10);
        assert_eq!(past_end.page_index, 3);
        assert_eq!(sequences(&past_end), sequences(&last));

        let zero = store.filter_and_page(&OutcomeFilter::All, 0, 10);
        assert_eq!(zero.page_index, 1);
    }

    #[test]
    fn test_empty_listing_is_single_empty_page() {
        let store = store(2);

        let page = store.filter_and_page(&OutcomeFilter::Fraud, 5, 10);

        assert!(page.items.is_empty());
        assert_eq!(page.page_index, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_items, 0);
    }

    #[test]
    fn test_zero_page_size_treated_as_one() {
        let store = store(3);
        let page = store.filter_and_page(&OutcomeFilter::All, 2, 0);

        assert_eq!(page.page_size, 1);
        assert_eq!(sequences(&page), vec![2]);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let store = store(40);

        let a = store.filter_and_page(&OutcomeFilter::All, 1, 10);
        let b = store.filter_and_page(&OutcomeFilter::All, 1, 10);

        assert_eq!(a, b);
    }

    #[test]
    fn test_cursor_resets_on_filter_change() {
        let store = store(30);
        let mut cursor = ResultCursor::new(5);

        cursor.next(&store);
        cursor.next(&store);
        assert_eq!(cursor.page_index(), 3);

        cursor.set_filter(OutcomeFilter::Fraud);
        assert_eq!(cursor.page_index(), 1);
        assert_eq!(sequences(&cursor.current(&store)), vec![3, 6, 9, 12, 15]);

        cursor.next(&store);
        cursor.next(&store);
        assert_eq!(cursor.page_index(), 2);

        cursor.previous(&store);
        cursor.previous(&store);
        assert_eq!(cursor.page_index(), 1);
    }
}
