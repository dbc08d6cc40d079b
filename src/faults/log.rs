//! Bounded, deduplicating per-thread fault logs.
//!
//! One log per (instance, process) slot, backed by a fixed inline array.
//! A full log silently drops new distinct faults; that is backpressure
//! protecting exception-context memory, not an error. Faults beyond the cap
//! are still counted by the global tally.

use spin::Mutex;

use crate::faults::record::FaultRecord;
use crate::faults::{MAX_TEST_INSTANCES, MAX_TEST_PROCS};
use crate::whoami::{InstanceId, ProcId};

/// Hard bound on a single log's backing storage.
pub const MAX_FAULTS_PER_LOG: usize = 16;

/// Ordered record store for one logical test thread.
pub struct ThreadFaultLog {
    entries: [Option<FaultRecord>; MAX_FAULTS_PER_LOG],
    len: usize,
    cap: usize,
}

impl ThreadFaultLog {
    /// Create an empty log holding at most `cap` records, clamped to the
    /// backing-array bound.
    pub const fn new(cap: usize) -> Self {
        let cap = if cap < MAX_FAULTS_PER_LOG {
            cap
        } else {
            MAX_FAULTS_PER_LOG
        };
        Self {
            entries: [None; MAX_FAULTS_PER_LOG],
            len: 0,
            cap,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len >= self.cap
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Structural membership scan. The bound is small, a linear pass is fine.
    pub fn contains(&self, record: &FaultRecord) -> bool {
        self.iter().any(|e| e == record)
    }

    /// Append a record if the log is below capacity. Returns whether the
    /// append happened; a full log drops the record.
    pub fn append(&mut self, record: FaultRecord) -> bool {
        if self.len >= self.cap {
            return false;
        }
        self.entries[self.len] = Some(record);
        self.len += 1;
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &FaultRecord> {
        self.entries[..self.len].iter().flatten()
    }

    /// Drop all records, keeping the capacity. Between-run reset.
    pub fn clear(&mut self) {
        self.entries = [None; MAX_FAULTS_PER_LOG];
        self.len = 0;
    }
}

/// Per-(instance, process) grid of fault logs, created once at harness setup.
///
/// Each log is logically owned by its pair: with processes pinned to cores
/// for a test's duration the mutex is never contended. If a process migrates
/// mid-run, the lock makes the membership-check/append pair atomic.
pub struct FaultLogTable {
    logs: [[Mutex<ThreadFaultLog>; MAX_TEST_PROCS]; MAX_TEST_INSTANCES],
}

impl FaultLogTable {
    pub fn new(cap: usize) -> Self {
        Self {
            logs: core::array::from_fn(|_| {
                core::array::from_fn(|_| Mutex::new(ThreadFaultLog::new(cap)))
            }),
        }
    }

    /// Look up the log for a slot. Out-of-range ids resolve to `None` rather
    /// than trapping; callers on the fault path skip recording in that case.
    pub fn get(&self, instance: InstanceId, proc: ProcId) -> Option<&Mutex<ThreadFaultLog>> {
        self.logs.get(instance.0)?.get(proc.0)
    }

    /// Reset every log for the next run.
    pub fn clear(&self) {
        for row in &self.logs {
            for log in row {
                log.lock().clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faults::record::{FaultKind, SymbolId};

    fn record(n: u32) -> FaultRecord {
        FaultRecord {
            instr: SymbolId(n),
            data: Some(SymbolId(100 + n)),
            kind: FaultKind::DataAbort,
        }
    }

    #[test]
    fn append_and_contains() {
        let mut log = ThreadFaultLog::new(4);
        assert!(log.is_empty());
        assert!(log.append(record(1)));
        assert!(log.contains(&record(1)));
        assert!(!log.contains(&record(2)));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn records_differing_in_any_field_are_distinct() {
        let mut log = ThreadFaultLog::new(8);
        let base = record(1);
        log.append(base);

        assert!(!log.contains(&FaultRecord { data: None, ..base }));
        assert!(!log.contains(&FaultRecord {
            kind: FaultKind::UnknownInstruction,
            ..base
        }));
        assert!(!log.contains(&FaultRecord {
            instr: SymbolId(2),
            ..base
        }));
    }

    #[test]
    fn full_log_keeps_first_cap_records() {
        let mut log = ThreadFaultLog::new(3);
        for n in 0..10 {
            log.append(record(n));
        }
        assert_eq!(log.len(), 3);
        assert!(log.is_full());
        // The first three survive; later distinct records were dropped, not
        // substituted.
        for n in 0..3 {
            assert!(log.contains(&record(n)));
        }
        assert!(!log.contains(&record(3)));
    }

    #[test]
    fn append_at_capacity_reports_drop() {
        let mut log = ThreadFaultLog::new(1);
        assert!(log.append(record(0)));
        assert!(!log.append(record(1)));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn cap_clamped_to_backing_bound() {
        let log = ThreadFaultLog::new(1000);
        assert_eq!(log.capacity(), MAX_FAULTS_PER_LOG);
    }

    #[test]
    fn clear_resets_but_keeps_capacity() {
        let mut log = ThreadFaultLog::new(2);
        log.append(record(0));
        log.append(record(1));
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.capacity(), 2);
        assert!(log.append(record(2)));
    }

    #[test]
    fn table_slots_are_independent() {
        let table = FaultLogTable::new(4);
        table
            .get(InstanceId(0), ProcId(0))
            .unwrap()
            .lock()
            .append(record(1));

        assert_eq!(table.get(InstanceId(0), ProcId(1)).unwrap().lock().len(), 0);
        assert_eq!(table.get(InstanceId(1), ProcId(0)).unwrap().lock().len(), 0);
        assert_eq!(table.get(InstanceId(0), ProcId(0)).unwrap().lock().len(), 1);
    }

    #[test]
    fn table_rejects_out_of_range_slots() {
        let table = FaultLogTable::new(4);
        assert!(table.get(InstanceId(MAX_TEST_INSTANCES), ProcId(0)).is_none());
        assert!(table.get(InstanceId(0), ProcId(MAX_TEST_PROCS)).is_none());
    }
}
