// In crates/store/src/lib.rs

pub mod error;

pub use error::{Error, Result};

use chrono::Utc;
use events::{RiskEvent, RiskEventKind, TradeRecord};
use risk::RiskState;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

const EVENTS_FILE: &str = "events.jsonl";
const TRADES_FILE: &str = "trades.jsonl";
const SNAPSHOT_FILE: &str = "risk_state.json";
const SNAPSHOT_TMP_FILE: &str = "risk_state.json.tmp";

/// The compacted snapshot, paired with the sequence number of the last
/// event it already contains so replay can resume from the right point.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    last_seq: u64,
    state: RiskState,
}

/// Durable risk bookkeeping over three files in one data directory:
///
/// - `events.jsonl` — append-only risk-event log (audit + replay source),
/// - `trades.jsonl` — append-only trade log (accounting),
/// - `risk_state.json` — compacted snapshot, replaced atomically via a
///   write-temp-then-rename so a reader always sees a complete snapshot.
///
/// Event appends assign strictly increasing sequence numbers. The store does
/// no locking of its own; the engine serializes all mutating access.
#[derive(Debug)]
pub struct RiskStore {
    data_dir: PathBuf,
    /// Broker trading-day rollover offset, needed to replay daily counters.
    day_offset_hours: i32,
    next_seq: AtomicU64,
}

impl RiskStore {
    /// Opens (creating if needed) the data directory and positions the
    /// sequence counter after the last durable event.
    pub fn open(data_dir: impl Into<PathBuf>, day_offset_hours: i32) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        let last_seq = scan_events(&data_dir.join(EVENTS_FILE), |_| {})?;
        Ok(Self {
            data_dir,
            day_offset_hours,
            next_seq: AtomicU64::new(last_seq + 1),
        })
    }

    /// Appends one immutable record to the risk-event log. A failure here is
    /// fatal for the calling operation: the action it describes must be
    /// treated as not-yet-committed.
    pub fn append_event(&self, kind: RiskEventKind) -> Result<RiskEvent> {
        let event = RiskEvent {
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
            timestamp: Utc::now(),
            kind,
        };
        append_line(&self.data_dir.join(EVENTS_FILE), &event)?;
        Ok(event)
    }

    /// Appends one record to the trade log. Independent of the event log:
    /// trades serve accounting, events serve risk audit.
    pub fn record_trade(&self, record: &TradeRecord) -> Result<()> {
        append_line(&self.data_dir.join(TRADES_FILE), record)
    }

    /// Atomically replaces the snapshot. The state is written to a temp file,
    /// synced, then renamed over the old snapshot, so a crash mid-write can
    /// never leave a partial snapshot behind.
    pub fn save_snapshot(&self, state: &RiskState) -> Result<()> {
        let snapshot = Snapshot {
            last_seq: self.next_seq.load(Ordering::SeqCst).saturating_sub(1),
            state: state.clone(),
        };
        let tmp_path = self.data_dir.join(SNAPSHOT_TMP_FILE);
        let mut tmp = File::create(&tmp_path)?;
        serde_json::to_writer_pretty(&mut tmp, &snapshot).map_err(Error::Encode)?;
        tmp.sync_data()?;
        fs::rename(&tmp_path, self.data_dir.join(SNAPSHOT_FILE))?;
        Ok(())
    }

    /// Rebuilds the risk state: latest snapshot plus replay of any events
    /// appended after it. With no snapshot the full event log is replayed
    /// from an empty state.
    pub fn load_state(&self) -> Result<RiskState> {
        let snapshot_path = self.data_dir.join(SNAPSHOT_FILE);
        let (mut state, snapshot_seq) = match fs::read_to_string(&snapshot_path) {
            Ok(text) => {
                let snapshot: Snapshot =
                    serde_json::from_str(&text).map_err(Error::CorruptSnapshot)?;
                (snapshot.state, snapshot.last_seq)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => (RiskState::default(), 0),
            Err(err) => return Err(err.into()),
        };

        let day_offset = self.day_offset_hours;
        scan_events(&self.data_dir.join(EVENTS_FILE), |event| {
            if event.seq > snapshot_seq {
                state.apply_event(event, day_offset);
            }
        })?;
        Ok(state)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

/// Streams the event log through `visit`, returning the highest sequence
/// number seen. A torn final line (crash mid-append) is logged and ignored;
/// corruption anywhere else is an error, because silently skipping audit
/// records would falsify the replayed state.
fn scan_events(path: &Path, mut visit: impl FnMut(&RiskEvent)) -> Result<u64> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err.into()),
    };

    let lines: Vec<&str> = text.lines().collect();
    let mut last_seq = 0;
    for (index, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RiskEvent>(line) {
            Ok(event) => {
                last_seq = last_seq.max(event.seq);
                visit(&event);
            }
            Err(source) if index + 1 == lines.len() => {
                tracing::warn!(
                    path = %path.display(),
                    line = index + 1,
                    error = %source,
                    "Ignoring torn final line in event log."
                );
            }
            Err(source) => {
                return Err(Error::CorruptEventLog { line: index + 1, source });
            }
        }
    }
    Ok(last_seq)
}

fn append_line<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let mut line = serde_json::to_string(record).map_err(Error::Encode)?;
    line.push('\n');
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{Side, Symbol};
    use events::{StopTrigger, TradeVerdict};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    fn allowed_buy(symbol: &str) -> RiskEventKind {
        RiskEventKind::OrderAllowed {
            symbol: sym(symbol),
            side: Side::Buy,
            quantity: dec!(10),
            price: dec!(150),
            stop_loss: Some(dec!(142.5)),
            take_profit: Some(dec!(172.5)),
            realized_pnl: None,
        }
    }

    #[test]
    fn snapshot_round_trips_reachable_state() {
        let dir = tempdir().unwrap();
        let store = RiskStore::open(dir.path(), 0).unwrap();

        let mut state = RiskState::default();
        let event = store.append_event(allowed_buy("AAPL.US")).unwrap();
        state.apply_event(&event, 0);
        state.emergency_stopped = true;
        store.save_snapshot(&state).unwrap();

        // A fresh store over the same directory sees the identical state.
        let reopened = RiskStore::open(dir.path(), 0).unwrap();
        assert_eq!(reopened.load_state().unwrap(), state);
    }

    #[test]
    fn load_without_snapshot_replays_full_log() {
        let dir = tempdir().unwrap();
        let store = RiskStore::open(dir.path(), 0).unwrap();
        store.append_event(allowed_buy("AAPL.US")).unwrap();
        store
            .append_event(RiskEventKind::EmergencyStop { reason: "drill".into() })
            .unwrap();

        let state = store.load_state().unwrap();
        assert!(state.emergency_stopped);
        assert_eq!(state.daily_trade_count, 1);
        assert_eq!(state.tracked_positions[&sym("AAPL.US")].quantity, dec!(10));
    }

    #[test]
    fn events_after_the_snapshot_are_replayed_on_top() {
        let dir = tempdir().unwrap();
        let store = RiskStore::open(dir.path(), 0).unwrap();

        let mut state = RiskState::default();
        let event = store.append_event(allowed_buy("AAPL.US")).unwrap();
        state.apply_event(&event, 0);
        store.save_snapshot(&state).unwrap();

        // Trailing events beyond the snapshot.
        store
            .append_event(RiskEventKind::EmergencyStop { reason: "drill".into() })
            .unwrap();

        let loaded = store.load_state().unwrap();
        assert!(loaded.emergency_stopped);
        // The snapshot's own event must not be applied twice.
        assert_eq!(loaded.daily_trade_count, 1);
    }

    #[test]
    fn sequence_numbers_continue_across_reopen() {
        let dir = tempdir().unwrap();
        let store = RiskStore::open(dir.path(), 0).unwrap();
        let first = store.append_event(RiskEventKind::Resume).unwrap();
        assert_eq!(first.seq, 1);
        drop(store);

        let store = RiskStore::open(dir.path(), 0).unwrap();
        let second = store.append_event(RiskEventKind::Resume).unwrap();
        assert_eq!(second.seq, 2);
    }

    #[test]
    fn torn_final_line_is_ignored() {
        let dir = tempdir().unwrap();
        let store = RiskStore::open(dir.path(), 0).unwrap();
        store.append_event(allowed_buy("AAPL.US")).unwrap();

        // Simulate a crash mid-append.
        let mut file = OpenOptions::new()
            .append(true)
            .open(dir.path().join(EVENTS_FILE))
            .unwrap();
        file.write_all(b"{\"seq\":2,\"timest").unwrap();
        drop(file);

        let reopened = RiskStore::open(dir.path(), 0).unwrap();
        let state = reopened.load_state().unwrap();
        assert_eq!(state.daily_trade_count, 1);
        // The torn seq was never durable, so it is reused.
        let next = reopened.append_event(RiskEventKind::Resume).unwrap();
        assert_eq!(next.seq, 2);
    }

    #[test]
    fn corruption_before_the_final_line_is_fatal() {
        let dir = tempdir().unwrap();
        let store = RiskStore::open(dir.path(), 0).unwrap();
        store.append_event(allowed_buy("AAPL.US")).unwrap();

        let mut file = OpenOptions::new()
            .append(true)
            .open(dir.path().join(EVENTS_FILE))
            .unwrap();
        file.write_all(b"not json at all\n").unwrap();
        drop(file);
        store.append_event(RiskEventKind::Resume).unwrap();

        assert!(matches!(
            RiskStore::open(dir.path(), 0),
            Err(Error::CorruptEventLog { line: 2, .. })
        ));
    }

    #[test]
    fn stop_trigger_events_do_not_mutate_replayed_state() {
        let dir = tempdir().unwrap();
        let store = RiskStore::open(dir.path(), 0).unwrap();
        store.append_event(allowed_buy("AAPL.US")).unwrap();
        store
            .append_event(RiskEventKind::StopTriggered {
                symbol: sym("AAPL.US"),
                trigger: StopTrigger::StopLoss,
                quantity: dec!(10),
                price: dec!(140),
            })
            .unwrap();

        let state = store.load_state().unwrap();
        assert_eq!(state.daily_trade_count, 1);
        assert!(state.tracked_positions.contains_key(&sym("AAPL.US")));
    }

    #[test]
    fn trade_records_append_to_their_own_log() {
        let dir = tempdir().unwrap();
        let store = RiskStore::open(dir.path(), 0).unwrap();
        let record = TradeRecord {
            timestamp: Utc::now(),
            symbol: sym("AAPL.US"),
            side: Side::Buy,
            quantity: dec!(10),
            price: dec!(150),
            notional: dec!(1500),
            order_id: Some("ord-1".into()),
            verdict: TradeVerdict::Submitted,
            reason: String::new(),
        };
        store.record_trade(&record).unwrap();
        store.record_trade(&record).unwrap();

        let text = fs::read_to_string(dir.path().join(TRADES_FILE)).unwrap();
        assert_eq!(text.lines().count(), 2);
        let parsed: TradeRecord = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(parsed.symbol, sym("AAPL.US"));
        // The event log is untouched.
        assert!(!dir.path().join(EVENTS_FILE).exists());
    }
}
