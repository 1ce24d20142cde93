//! Gap repair through targeted resends
//!
//! Each missing sequence gets its own connection and a single "fetch one"
//! request. A fixed pool of worker threads pulls sequences from a job queue
//! and reports every outcome back over a channel; the coordinator thread is
//! the only writer of the packet collection. A failed resend only loses its
//! own sequence.

use crate::collection::PacketCollection;
use crate::connection::{Connector, TransportError};
use crate::protocol::{Packet, ProtocolError, Request};
use crate::reader::StreamReader;
use crate::stats::SessionStats;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ResendError {
    #[error(transparent)]
    TargetOutOfRange(#[from] ProtocolError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("server sent no data")]
    NoData,

    #[error("server sent {received} packet(s) but not the requested sequence")]
    Mismatch { received: usize },
}

#[derive(Debug)]
pub struct ResendFailure {
    pub sequence: u32,
    pub error: ResendError,
}

/// Outcome of one repair phase
#[derive(Debug, Default)]
pub struct RepairReport {
    pub requested: usize,
    /// Ascending
    pub recovered: Vec<u32>,
    /// Ascending by sequence
    pub failures: Vec<ResendFailure>,
}

impl RepairReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failed sequences the resend request cannot encode, ascending
    pub fn unaddressable(&self) -> Vec<u32> {
        self.failures
            .iter()
            .filter(|f| matches!(f.error, ResendError::TargetOutOfRange(_)))
            .map(|f| f.sequence)
            .collect()
    }
}

struct ResendResult {
    sequence: u32,
    packets: Vec<Packet>,
    outcome: Result<(), ResendError>,
    latency: Duration,
}

pub struct ResendCoordinator<'a, C> {
    connector: &'a C,
    max_workers: usize,
}

impl<'a, C: Connector> ResendCoordinator<'a, C> {
    /// `max_workers` is clamped to at least 1
    pub fn new(connector: &'a C, max_workers: usize) -> Self {
        ResendCoordinator {
            connector,
            max_workers: max_workers.max(1),
        }
    }

    /// Request every sequence in `missing` and merge what comes back into
    /// `collection`. Never fails as a whole; unresolved sequences are listed
    /// in the report.
    pub fn repair(
        &self,
        missing: &[u32],
        collection: &mut PacketCollection,
        stats: &mut SessionStats,
    ) -> RepairReport {
        let mut report = RepairReport {
            requested: missing.len(),
            ..RepairReport::default()
        };
        if missing.is_empty() {
            return report;
        }

        let workers = self.max_workers.min(missing.len());
        info!(gaps = missing.len(), workers, "repairing gaps");

        let (job_tx, job_rx) = unbounded::<u32>();
        for &sequence in missing {
            // Receiver is alive in this scope
            let _ = job_tx.send(sequence);
        }
        drop(job_tx);

        let (result_tx, result_rx) = unbounded::<ResendResult>();

        thread::scope(|scope| {
            for _ in 0..workers {
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                let connector = self.connector;
                scope.spawn(move || resend_worker(connector, jobs, results));
            }
            // Workers hold the remaining senders; iteration ends when all exit
            drop(result_tx);

            for result in result_rx.iter() {
                let duplicates = collection.extend_from(result.packets);
                stats.record_duplicates(duplicates);
                stats.record_resend(result.outcome.is_ok(), result.latency);

                match result.outcome {
                    Ok(()) => report.recovered.push(result.sequence),
                    Err(error) => {
                        if !matches!(error, ResendError::TargetOutOfRange(_)) {
                            warn!(sequence = result.sequence, %error, "resend failed");
                        }
                        report.failures.push(ResendFailure {
                            sequence: result.sequence,
                            error,
                        });
                    }
                }
            }
        });

        report.recovered.sort_unstable();
        report.failures.sort_unstable_by_key(|f| f.sequence);

        let unaddressable = report.unaddressable();
        if let (Some(first), Some(last)) = (unaddressable.first(), unaddressable.last()) {
            warn!(
                count = unaddressable.len(),
                first,
                last,
                "resend targets beyond the addressable range"
            );
        }
        info!(
            recovered = report.recovered.len(),
            failed = report.failures.len(),
            "repair finished"
        );
        report
    }
}

fn resend_worker<C: Connector>(connector: &C, jobs: Receiver<u32>, results: Sender<ResendResult>) {
    for sequence in jobs.iter() {
        let started = Instant::now();
        let (packets, outcome) = match fetch_one(connector, sequence) {
            Ok(packets) => {
                let outcome = if packets.iter().any(|p| p.sequence == sequence) {
                    Ok(())
                } else {
                    Err(ResendError::Mismatch {
                        received: packets.len(),
                    })
                };
                (packets, outcome)
            }
            Err(error) => (Vec::new(), Err(error)),
        };

        let result = ResendResult {
            sequence,
            packets,
            outcome,
            latency: started.elapsed(),
        };
        if results.send(result).is_err() {
            break;
        }
    }
}

/// One connection, one request, one drained response. The connection is
/// dropped (closed) on every return path.
fn fetch_one<C: Connector>(connector: &C, sequence: u32) -> Result<Vec<Packet>, ResendError> {
    let request = Request::resend(sequence)?;

    debug!(sequence, "requesting resend");
    let mut conn = connector.connect()?;
    conn.write_all(&request.encode())
        .and_then(|_| conn.flush())
        .map_err(TransportError::Send)?;

    let summary = StreamReader::new(conn).drain()?;
    if summary.packets.is_empty() {
        return Err(ResendError::NoData);
    }
    Ok(summary.packets)
}
