//! Feed Client - snapshot fetch with gap repair
//!
//! Client for a fixed-width binary market-data feed. Features include:
//! - Two-byte request framing and 17-byte big-endian packet decoding
//! - Stream draining that treats peer close or read-idle silence as end of data
//! - Split-read reassembly through a per-connection frame buffer
//! - Sequence number gap detection over the received snapshot
//! - Concurrent targeted resends through a bounded worker pool
//! - JSON output of the repaired, sequence-ordered packet list

pub mod protocol;
pub mod decoder;
pub mod connection;
pub mod reader;
pub mod gap_detector;
pub mod collection;
pub mod recovery;
pub mod session;
pub mod stats;
pub mod config;
pub mod output;

pub use protocol::{CallType, Packet, ProtocolError, Request, MAX_RESEND_SEQUENCE, PACKET_SIZE, REQUEST_SIZE};
pub use decoder::{DecodeError, DecodeResult, Decoder};
pub use connection::{Connector, TcpConnector, TransportError};
pub use reader::{FrameBuffer, ReadSummary, StreamEnd, StreamReader};
pub use gap_detector::{missing_sequences, GapDetector};
pub use collection::PacketCollection;
pub use recovery::{RepairReport, ResendCoordinator, ResendError, ResendFailure};
pub use session::{Session, SessionError, SessionOutcome, SessionState};
pub use stats::{LatencyStats, SessionStats};
pub use config::ClientConfig;
pub use output::{write_json, write_records, OutputError, PacketRecord};
