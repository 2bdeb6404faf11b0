use std::collections::BTreeMap;

use workbench_interfaces::EpochInfo;

/// Epoch records of one job, ordered by epoch index.
///
/// A record for an index already present replaces the old one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpochLog {
    records: BTreeMap<u32, EpochInfo>,
}

impl EpochLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record`, returning the one it replaced
    pub fn record(&mut self, record: EpochInfo) -> Option<EpochInfo> {
        self.records.insert(record.epoch, record)
    }

    /// Stores every record in arrival order
    pub fn merge<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = EpochInfo>,
    {
        for record in records {
            self.record(record);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn latest(&self) -> Option<&EpochInfo> {
        self.records.values().next_back()
    }

    pub fn get(&self, epoch: u32) -> Option<&EpochInfo> {
        self.records.get(&epoch)
    }

    pub fn to_vec(&self) -> Vec<EpochInfo> {
        self.records.values().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn epoch(index: u32, train_loss: f64) -> EpochInfo {
        EpochInfo {
            epoch: index,
            train_loss: Some(train_loss),
            val_loss: None,
            weights: None,
            val_predictions: None,
        }
    }

    #[test]
    fn test_out_of_order_arrivals_are_sorted() {
        let mut log = EpochLog::new();
        log.merge(vec![epoch(3, 0.3), epoch(1, 0.1), epoch(2, 0.2)]);

        let order: Vec<u32> = log.to_vec().iter().map(|e| e.epoch).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(log.latest().map(|e| e.epoch), Some(3));
    }

    #[test]
    fn test_latest_record_wins() {
        let mut log = EpochLog::new();
        log.record(epoch(1, 0.9));
        let replaced = log.record(epoch(1, 0.4));

        assert_eq!(replaced, Some(epoch(1, 0.9)));
        assert_eq!(log.len(), 1);
        assert_eq!(log.get(1), Some(&epoch(1, 0.4)));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let records = vec![epoch(1, 0.5), epoch(2, 0.4)];
        let mut once = EpochLog::new();
        once.merge(records.clone());
        let mut twice = once.clone();
        twice.merge(records);

        assert_eq!(once, twice);
    }
}
