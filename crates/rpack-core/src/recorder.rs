//! Append-only log of every handle operation, filterable for commit
//! (`spec.md` §4.4).
//!
//! Grounded on the teacher's append-only index/merkle idioms
//! (`apl-schema::merkle`): a flat, ordered record of events that a later
//! pass folds down, rather than a mutable aggregate updated in place.

use crate::hooks::AccessKind;
use crate::resolver::ResolverId;
use std::sync::Mutex;

/// One recorded handle operation.
#[derive(Debug, Clone)]
pub struct RecorderRecord {
    pub access_type: AccessKind,
    pub resolver_id: ResolverId,
    pub friendly_path: String,
    pub indirect_target_path: String,
}

/// Append-only log for a single run. Supports an optional filter predicate;
/// unfiltered recording keeps every op (`spec.md` §4.4).
#[derive(Default)]
pub struct Recorder {
    records: Mutex<Vec<RecorderRecord>>,
    filter: Option<Box<dyn Fn(&RecorderRecord) -> bool + Send + Sync>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a recorder that only keeps records matching `filter`.
    pub fn with_filter(filter: impl Fn(&RecorderRecord) -> bool + Send + Sync + 'static) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            filter: Some(Box::new(filter)),
        }
    }

    pub fn record(&self, record: RecorderRecord) {
        if self.filter.as_ref().is_none_or(|f| f(&record)) {
            self.records.lock().expect("recorder mutex poisoned").push(record);
        }
    }

    pub fn records(&self) -> Vec<RecorderRecord> {
        self.records.lock().expect("recorder mutex poisoned").clone()
    }

    /// The target write set: `(write, target)` records, deduplicated by
    /// `indirect_target_path`, first-seen order defines commit order, last
    /// write wins for content at staging time (`spec.md` §4.4, §5
    /// "Ordering").
    pub fn target_write_set(&self) -> Vec<String> {
        let records = self.records.lock().expect("recorder mutex poisoned");
        let mut order = Vec::new();
        let mut seen = std::collections::BTreeSet::new();
        for record in records.iter() {
            if record.access_type == AccessKind::Write
                && record.resolver_id == ResolverId::Target
                && seen.insert(record.indirect_target_path.clone())
            {
                order.push(record.indirect_target_path.clone());
            }
        }
        order
    }
}
