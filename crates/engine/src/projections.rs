//! Read projections over the ledger.
//!
//! Pure derivations, recomputed from the latest snapshot on every call.
//! Soft-deleted transactions never appear in any projection, whatever
//! their status does afterwards.

use chrono::{Local, NaiveDate};

use crate::{Transaction, TransactionKind, TransactionStatus};

/// Conjunctive history predicates; `None` means no constraint on that
/// dimension.
///
/// Date bounds are interpreted against the **local** calendar day of the
/// transaction's timestamp, inclusive on both ends.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoryFilter {
    pub status: Option<TransactionStatus>,
    pub kind: Option<TransactionKind>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl HistoryFilter {
    fn matches(&self, tx: &Transaction) -> bool {
        if let Some(status) = self.status {
            if tx.status != status {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if tx.kind != kind {
                return false;
            }
        }
        if self.from.is_some() || self.to.is_some() {
            let day = tx.timestamp.with_timezone(&Local).date_naive();
            if let Some(from) = self.from {
                if day < from {
                    return false;
                }
            }
            if let Some(to) = self.to {
                if day > to {
                    return false;
                }
            }
        }
        true
    }
}

/// One fixed-size chunk of the filtered history.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryPage {
    pub items: Vec<Transaction>,
    /// 1-based.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// All transactions not soft-deleted, in backing-list order.
pub fn active(transactions: &[Transaction]) -> Vec<Transaction> {
    transactions.iter().filter(|t| !t.deleted).cloned().collect()
}

/// The `n` most recent active transactions, newest first.
pub fn recent(transactions: &[Transaction], n: usize) -> Vec<Transaction> {
    let mut out = active(transactions);
    out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    out.truncate(n);
    out
}

/// Active transactions matching every supplied predicate, newest first.
pub fn filter_history(transactions: &[Transaction], filter: &HistoryFilter) -> Vec<Transaction> {
    let mut out: Vec<Transaction> = transactions
        .iter()
        .filter(|t| !t.deleted && filter.matches(t))
        .cloned()
        .collect();
    out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    out
}

/// Chunks an already-filtered history into a fixed-size page.
///
/// `page` is 1-based; a page past the end comes back empty rather than
/// erroring, since filters can shrink the set under the caller.
pub fn paginate(items: &[Transaction], page: usize, per_page: usize) -> HistoryPage {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);
    let start = (page - 1) * per_page;
    let slice = if start >= total_items {
        Vec::new()
    } else {
        items[start..(start + per_page).min(total_items)].to_vec()
    };
    HistoryPage {
        items: slice,
        page,
        total_pages,
        total_items,
    }
}

/// Count of active transactions still awaiting resolution.
pub fn pending_count(transactions: &[Transaction]) -> usize {
    transactions
        .iter()
        .filter(|t| !t.deleted && t.status == TransactionStatus::Pending)
        .count()
}

/// Stateful history browser for the presentation boundary.
///
/// Changing the filter or the page size resets to page 1, so a narrowed
/// result set is never viewed from a stale offset.
#[derive(Clone, Debug)]
pub struct HistoryView {
    filter: HistoryFilter,
    page: usize,
    per_page: usize,
}

impl HistoryView {
    pub fn new(per_page: usize) -> Self {
        Self {
            filter: HistoryFilter::default(),
            page: 1,
            per_page: per_page.max(1),
        }
    }

    pub fn filter(&self) -> &HistoryFilter {
        &self.filter
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_filter(&mut self, filter: HistoryFilter) {
        if filter != self.filter {
            self.filter = filter;
            self.page = 1;
        }
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn set_per_page(&mut self, per_page: usize) {
        let per_page = per_page.max(1);
        if per_page != self.per_page {
            self.per_page = per_page;
            self.page = 1;
        }
    }

    pub fn slice(&self, transactions: &[Transaction]) -> HistoryPage {
        let filtered = filter_history(transactions, &self.filter);
        paginate(&filtered, self.page, self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::Money;

    fn tx(
        id: &str,
        kind: TransactionKind,
        status: TransactionStatus,
        minutes_ago: i64,
    ) -> Transaction {
        let mut tx = Transaction::new(
            id.to_string(),
            "1".to_string(),
            kind,
            Money::new(1000),
            "Self".to_string(),
            "Money Added".to_string(),
            Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap() - Duration::minutes(minutes_ago),
        )
        .unwrap();
        tx.status = status;
        tx
    }

    fn sample() -> Vec<Transaction> {
        let mut deleted = tx("4", TransactionKind::Credit, TransactionStatus::Success, 5);
        deleted.deleted = true;
        vec![
            tx("1", TransactionKind::Credit, TransactionStatus::Success, 30),
            tx("2", TransactionKind::Debit, TransactionStatus::Failed, 20),
            tx("3", TransactionKind::Fee, TransactionStatus::Pending, 10),
            deleted,
        ]
    }

    #[test]
    fn active_excludes_deleted() {
        let txs = sample();
        let ids: Vec<_> = active(&txs).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn recent_sorts_newest_first_and_truncates() {
        let txs = sample();
        let ids: Vec<_> = recent(&txs, 2).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, ["3", "2"]);
    }

    #[test]
    fn filters_are_conjunctive() {
        let txs = sample();

        let by_status = filter_history(
            &txs,
            &HistoryFilter {
                status: Some(TransactionStatus::Failed),
                ..Default::default()
            },
        );
        let by_kind = filter_history(
            &txs,
            &HistoryFilter {
                kind: Some(TransactionKind::Debit),
                ..Default::default()
            },
        );
        let by_both = filter_history(
            &txs,
            &HistoryFilter {
                status: Some(TransactionStatus::Failed),
                kind: Some(TransactionKind::Debit),
                ..Default::default()
            },
        );

        // The conjunction equals the intersection of single-filter results.
        let intersection: Vec<_> = by_status
            .iter()
            .filter(|t| by_kind.iter().any(|k| k.id == t.id))
            .cloned()
            .collect();
        assert_eq!(by_both, intersection);
        assert_eq!(by_both.len(), 1);
        assert_eq!(by_both[0].id, "2");
    }

    #[test]
    fn date_bounds_are_inclusive_local_days() {
        let txs = sample();
        let days: Vec<_> = txs
            .iter()
            .map(|t| t.timestamp.with_timezone(&Local).date_naive())
            .collect();
        let first = *days.iter().min().unwrap();
        let last = *days.iter().max().unwrap();

        let in_range = filter_history(
            &txs,
            &HistoryFilter {
                from: Some(first),
                to: Some(last),
                ..Default::default()
            },
        );
        assert_eq!(in_range.len(), 3);

        let none = filter_history(
            &txs,
            &HistoryFilter {
                to: Some(first - Duration::days(1)),
                ..Default::default()
            },
        );
        assert!(none.is_empty());
    }

    #[test]
    fn paginate_chunks_fixed_size_pages() {
        let txs: Vec<Transaction> = (0..25)
            .map(|i| tx(&i.to_string(), TransactionKind::Credit, TransactionStatus::Success, i))
            .collect();

        let page = paginate(&txs, 3, 10);
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 25);

        let past_end = paginate(&txs, 9, 10);
        assert!(past_end.items.is_empty());
    }

    #[test]
    fn pending_count_ignores_deleted() {
        let mut txs = sample();
        assert_eq!(pending_count(&txs), 1);

        txs[2].deleted = true;
        assert_eq!(pending_count(&txs), 0);
    }

    #[test]
    fn view_resets_to_first_page_on_filter_change() {
        let mut view = HistoryView::new(10);
        view.set_page(3);
        assert_eq!(view.page(), 3);

        view.set_filter(HistoryFilter {
            status: Some(TransactionStatus::Pending),
            ..Default::default()
        });
        assert_eq!(view.page(), 1);

        view.set_page(2);
        view.set_per_page(5);
        assert_eq!(view.page(), 1);
    }
}
