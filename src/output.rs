//! JSON output of the final packet list
//!
//! One object per packet with every value rendered as a string:
//! `symbol`, `buySell`, `quantity`, `price`, `sequence`.

use crate::protocol::Packet;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketRecord {
    pub symbol: String,
    #[serde(rename = "buySell")]
    pub buy_sell: String,
    pub quantity: String,
    pub price: String,
    pub sequence: String,
}

impl From<&Packet> for PacketRecord {
    fn from(packet: &Packet) -> Self {
        PacketRecord {
            symbol: packet.symbol_str().into_owned(),
            buy_sell: packet.side_char().to_string(),
            quantity: packet.quantity.to_string(),
            price: packet.price.to_string(),
            sequence: packet.sequence.to_string(),
        }
    }
}

/// Pretty-printed JSON array to any writer
pub fn write_records<W: Write>(writer: W, packets: &[Packet]) -> Result<(), OutputError> {
    let records: Vec<PacketRecord> = packets.iter().map(PacketRecord::from).collect();
    serde_json::to_writer_pretty(writer, &records)?;
    Ok(())
}

/// Write the packet list to `path`, creating parent directories
pub fn write_json(path: &Path, packets: &[Packet]) -> Result<(), OutputError> {
    let io_err = |source: io::Error| OutputError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    write_records(&mut writer, packets)?;
    writer.flush().map_err(io_err)?;
    Ok(())
}
