//! Combines per-tracker results into one job-level status.

use super::types::{OutcomeStatus, TorrentStatus};

/// Fold one tracker result into the current job-level status.
///
/// Statuses other than `SUCCESS`, `FAILED` and `PARTIALLY_SUCCESSFUL` are
/// treated like no prior result.
pub fn aggregate(current: Option<&TorrentStatus>, result: OutcomeStatus) -> TorrentStatus {
    match (current, result) {
        (Some(TorrentStatus::PartiallySuccessful), _) => TorrentStatus::PartiallySuccessful,
        (Some(TorrentStatus::Success), OutcomeStatus::Failed)
        | (Some(TorrentStatus::Failed), OutcomeStatus::Success) => {
            TorrentStatus::PartiallySuccessful
        }
        (_, OutcomeStatus::Success) => TorrentStatus::Success,
        (_, OutcomeStatus::Failed) => TorrentStatus::Failed,
    }
}

/// Fold a sequence of results. `None` when there are none.
pub fn aggregate_all<I>(results: I) -> Option<TorrentStatus>
where
    I: IntoIterator<Item = OutcomeStatus>,
{
    results
        .into_iter()
        .fold(None, |acc, result| Some(aggregate(acc.as_ref(), result)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use OutcomeStatus::{Failed, Success};

    #[test]
    fn test_transition_table() {
        for start in [
            None,
            Some(TorrentStatus::Pending),
            Some(TorrentStatus::ReadyForProcessing),
        ] {
            assert_eq!(aggregate(start.as_ref(), Success), TorrentStatus::Success);
            assert_eq!(aggregate(start.as_ref(), Failed), TorrentStatus::Failed);
        }

        assert_eq!(
            aggregate(Some(&TorrentStatus::Success), Failed),
            TorrentStatus::PartiallySuccessful
        );
        assert_eq!(
            aggregate(Some(&TorrentStatus::Failed), Success),
            TorrentStatus::PartiallySuccessful
        );
        assert_eq!(
            aggregate(Some(&TorrentStatus::Success), Success),
            TorrentStatus::Success
        );
        assert_eq!(
            aggregate(Some(&TorrentStatus::Failed), Failed),
            TorrentStatus::Failed
        );
        for result in [Success, Failed] {
            assert_eq!(
                aggregate(Some(&TorrentStatus::PartiallySuccessful), result),
                TorrentStatus::PartiallySuccessful
            );
        }
    }

    fn permutations(items: &[OutcomeStatus]) -> Vec<Vec<OutcomeStatus>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let head = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, head);
                out.push(tail);
            }
        }
        out
    }

    #[test]
    fn test_fold_is_order_independent() {
        let multisets: [&[OutcomeStatus]; 6] = [
            &[Success],
            &[Success, Success, Success],
            &[Failed, Failed],
            &[Success, Failed],
            &[Success, Success, Failed, Failed],
            &[Failed, Success, Failed, Success, Success],
        ];

        for multiset in multisets {
            let expected = aggregate_all(multiset.iter().copied());
            for ordering in permutations(multiset) {
                assert_eq!(aggregate_all(ordering), expected, "multiset {:?}", multiset);
            }
        }
    }

    #[test]
    fn test_aggregate_all_empty() {
        assert_eq!(aggregate_all(Vec::new()), None);
    }
}
