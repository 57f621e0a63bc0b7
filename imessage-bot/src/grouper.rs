//! Message grouper: partitions one poll's records into logical turns.
//!
//! Single left-to-right pass. A record joins the current group when it has the same sender as
//! the record before it and arrived within the window; the window widens when either side of
//! the pair travelled over SMS, whose delivery is slower and burstier.

use std::time::Duration;

use relay_core::{MessageGroup, RawMessageRecord};
use tracing::info;

/// Maximum gap between consecutive records of one group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupingWindows {
    pub imessage: Duration,
    pub sms: Duration,
}

impl Default for GroupingWindows {
    fn default() -> Self {
        Self {
            imessage: Duration::from_secs(120),
            sms: Duration::from_secs(300),
        }
    }
}

impl GroupingWindows {
    /// Window for a pair of adjacent records.
    pub fn threshold(&self, previous: &RawMessageRecord, current: &RawMessageRecord) -> Duration {
        let is_sms = |r: &RawMessageRecord| r.service_kind().is_some_and(|s| s.is_sms());
        if is_sms(previous) || is_sms(current) {
            self.sms
        } else {
            self.imessage
        }
    }
}

/// Groups `records` (ascending by timestamp) into turns. Order is preserved.
pub fn group_messages(records: Vec<RawMessageRecord>, windows: &GroupingWindows) -> Vec<MessageGroup> {
    let total = records.len();
    let mut groups: Vec<MessageGroup> = Vec::new();
    let mut records = records.into_iter();
    let Some(first) = records.next() else {
        return groups;
    };

    let mut current = MessageGroup::new(first);
    for record in records {
        let previous = current.last();
        let delta = record.unix_seconds() - previous.unix_seconds();
        let window = windows.threshold(previous, &record).as_secs_f64();

        if record.sender == previous.sender && delta <= window {
            current.push(record);
        } else {
            groups.push(std::mem::replace(&mut current, MessageGroup::new(record)));
        }
    }
    groups.push(current);

    info!(
        record_count = total,
        group_count = groups.len(),
        "step: grouped messages"
    );
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    const NANOS: i64 = 1_000_000_000;

    fn rec(id: i64, sender: &str, secs: i64, service: &str) -> RawMessageRecord {
        let mut r = RawMessageRecord::text(id, sender, format!("m{}", id), secs * NANOS);
        r.service = Some(service.to_string());
        r
    }

    fn sizes(groups: &[MessageGroup]) -> Vec<usize> {
        groups.iter().map(MessageGroup::len).collect()
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_messages(Vec::new(), &GroupingWindows::default()).is_empty());
    }

    #[test]
    fn imessage_within_window_joins() {
        let groups = group_messages(
            vec![rec(1, "A", 0, "iMessage"), rec(2, "A", 30, "iMessage")],
            &GroupingWindows::default(),
        );
        assert_eq!(sizes(&groups), vec![2]);
    }

    #[test]
    fn imessage_past_window_splits() {
        let groups = group_messages(
            vec![rec(1, "A", 30, "iMessage"), rec(2, "A", 200, "iMessage")],
            &GroupingWindows::default(),
        );
        assert_eq!(sizes(&groups), vec![1, 1]);
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let groups = group_messages(
            vec![rec(1, "A", 0, "iMessage"), rec(2, "A", 120, "iMessage")],
            &GroupingWindows::default(),
        );
        assert_eq!(sizes(&groups), vec![2]);
    }

    #[test]
    fn sms_on_either_side_widens_window() {
        let windows = GroupingWindows::default();
        let groups = group_messages(
            vec![rec(1, "A", 0, "iMessage"), rec(2, "A", 250, "SMS")],
            &windows,
        );
        assert_eq!(sizes(&groups), vec![2]);

        let groups = group_messages(
            vec![rec(1, "A", 0, "SMS"), rec(2, "A", 301, "SMS")],
            &windows,
        );
        assert_eq!(sizes(&groups), vec![1, 1]);
    }

    #[test]
    fn sender_change_splits_and_order_is_kept() {
        let groups = group_messages(
            vec![
                rec(1, "A", 0, "iMessage"),
                rec(2, "B", 1, "iMessage"),
                rec(3, "B", 2, "iMessage"),
                rec(4, "A", 3, "iMessage"),
            ],
            &GroupingWindows::default(),
        );
        assert_eq!(sizes(&groups), vec![1, 2, 1]);
        let ids: Vec<i64> = groups
            .iter()
            .flat_map(|g| g.records().iter().map(|r| r.id))
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn gap_is_measured_against_previous_record() {
        // each step is 100s, total span 300s: still one chain
        let groups = group_messages(
            vec![
                rec(1, "A", 0, "iMessage"),
                rec(2, "A", 100, "iMessage"),
                rec(3, "A", 200, "iMessage"),
                rec(4, "A", 300, "iMessage"),
            ],
            &GroupingWindows::default(),
        );
        assert_eq!(sizes(&groups), vec![4]);
    }
}
