//! Session controller
//!
//! Drives one full run: snapshot fetch, gap detection, concurrent repair.
//! Only the snapshot phase can fail the session; the repair phase degrades
//! to a partial result.

use crate::collection::PacketCollection;
use crate::config::ClientConfig;
use crate::connection::{Connector, TransportError};
use crate::gap_detector::GapDetector;
use crate::protocol::{Packet, Request};
use crate::reader::{ReadSummary, StreamReader};
use crate::recovery::{RepairReport, ResendCoordinator};
use crate::stats::SessionStats;
use std::io::Write;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Requesting,
    ReceivingSnapshot,
    DetectingGaps,
    RepairingGaps,
    Done,
    Failed,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("snapshot connection failed: {0}")]
    Connect(#[source] TransportError),

    #[error("snapshot request failed: {0}")]
    Request(#[source] TransportError),

    #[error("snapshot receive failed: {0}")]
    Receive(#[source] TransportError),
}

/// Result of a completed session
#[derive(Debug)]
pub struct SessionOutcome {
    /// Ordered by sequence
    pub packets: Vec<Packet>,
    /// Gaps found after the snapshot, ascending
    pub missing: Vec<u32>,
    pub report: RepairReport,
    pub stats: SessionStats,
}

pub struct Session<C> {
    connector: C,
    config: ClientConfig,
    state: SessionState,
}

impl<C: Connector> Session<C> {
    pub fn new(connector: C, config: ClientConfig) -> Self {
        Session {
            connector,
            config,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "session state");
        self.state = next;
    }

    fn fail(&mut self, error: SessionError) -> SessionError {
        self.transition(SessionState::Failed);
        error
    }

    /// Run the whole flow once
    pub fn run(&mut self) -> Result<SessionOutcome, SessionError> {
        let mut stats = SessionStats::new();
        stats.start();

        let snapshot = self.fetch_snapshot()?;
        stats.record_snapshot(
            snapshot.packets.len(),
            snapshot.bytes_read,
            snapshot.trailing_bytes,
        );
        info!(
            packets = snapshot.packets.len(),
            end = ?snapshot.end,
            "snapshot received"
        );

        self.transition(SessionState::DetectingGaps);
        let mut detector = GapDetector::new();
        detector.extend(snapshot.packets.iter().map(|p| p.sequence));
        let missing = detector.missing();
        stats.record_gaps(missing.len());
        info!(
            max_sequence = ?detector.max_sequence(),
            gaps = missing.len(),
            "gap detection finished"
        );

        let mut collection = PacketCollection::new();
        let duplicates = collection.extend_from(snapshot.packets);
        if duplicates > 0 {
            warn!(duplicates, "snapshot repeated sequence numbers; kept first copies");
        }
        stats.record_duplicates(duplicates);

        self.transition(SessionState::RepairingGaps);
        let report = ResendCoordinator::new(&self.connector, self.config.max_resend_workers)
            .repair(&missing, &mut collection, &mut stats);

        self.transition(SessionState::Done);
        stats.finish();

        Ok(SessionOutcome {
            packets: collection.into_sorted(),
            missing,
            report,
            stats,
        })
    }

    fn fetch_snapshot(&mut self) -> Result<ReadSummary, SessionError> {
        self.transition(SessionState::Connecting);
        let mut conn = match self.connector.connect() {
            Ok(conn) => conn,
            Err(e) => return Err(self.fail(SessionError::Connect(e))),
        };

        self.transition(SessionState::Requesting);
        let sent = conn
            .write_all(&Request::FetchAll.encode())
            .and_then(|_| conn.flush());
        if let Err(e) = sent {
            return Err(self.fail(SessionError::Request(TransportError::Send(e))));
        }

        self.transition(SessionState::ReceivingSnapshot);
        // The reader owns the connection and closes it when done
        StreamReader::new(conn)
            .drain()
            .map_err(|e| self.fail(SessionError::Receive(e)))
    }
}
