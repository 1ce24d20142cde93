//! Accumulated packet set
//!
//! Duplicate policy is first write wins: once a sequence is present, later
//! packets carrying the same sequence are ignored.

use crate::protocol::Packet;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct PacketCollection {
    // Insertion order; not meaningful to callers
    packets: Vec<Packet>,
    index: HashMap<u32, usize>,
}

impl PacketCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a packet. Returns false if its sequence was already present.
    pub fn insert(&mut self, packet: Packet) -> bool {
        if self.index.contains_key(&packet.sequence) {
            return false;
        }
        self.index.insert(packet.sequence, self.packets.len());
        self.packets.push(packet);
        true
    }

    /// Insert many packets, returning how many were duplicates
    pub fn extend_from<I>(&mut self, packets: I) -> usize
    where
        I: IntoIterator<Item = Packet>,
    {
        packets
            .into_iter()
            .filter(|packet| !self.insert(*packet))
            .count()
    }

    pub fn get(&self, sequence: u32) -> Option<&Packet> {
        self.index.get(&sequence).map(|&i| &self.packets[i])
    }

    pub fn contains(&self, sequence: u32) -> bool {
        self.index.contains_key(&sequence)
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn sequences(&self) -> impl Iterator<Item = u32> + '_ {
        self.packets.iter().map(|p| p.sequence)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Packet> {
        self.packets.iter()
    }

    /// Final packets ordered by sequence
    pub fn into_sorted(self) -> Vec<Packet> {
        let mut packets = self.packets;
        packets.sort_unstable_by_key(|p| p.sequence);
        packets
    }
}
