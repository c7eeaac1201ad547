//! Wire format for the replicated auction view
//!
//! Frames are flat little-endian binary: u32 length prefixes and counts,
//! IEEE-754 f64 scalars, length-prefixed UTF-8 identifiers. Mappings are
//! written in ascending key order, so two equal states always produce
//! byte-identical frames. Decoding rejects truncation and any length
//! prefix that would run past the buffer; it never panics on hostile input.

use crate::error::Error;
use crate::types::{AgentId, Bid, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One agent's auction view as broadcast to its neighbors
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Message {
    /// Agent that produced this frame
    pub sender: AgentId,
    /// Sender's information time at send
    pub timestamp: f64,
    /// Sender's bundle, in claim order
    pub bundle: Vec<TaskId>,
    /// Sender's path, in execution order
    pub path: Vec<TaskId>,
    /// Best known bid per task (y)
    pub winning_bids: BTreeMap<TaskId, Bid>,
    /// Known winner per task (z)
    pub winners: BTreeMap<TaskId, AgentId>,
    /// Known information time per agent (s)
    pub timestamps: BTreeMap<AgentId, f64>,
}

impl Message {
    pub fn new(sender: AgentId, timestamp: f64) -> Self {
        Message {
            sender,
            timestamp,
            ..Message::default()
        }
    }

    /// Bid the sender knows for a task; unassigned if absent
    pub fn winning_bid(&self, task_id: &TaskId) -> Bid {
        self.winning_bids
            .get(task_id)
            .cloned()
            .unwrap_or_else(Bid::unassigned)
    }

    /// Winner the sender knows for a task; the no-agent sentinel if absent
    pub fn winner(&self, task_id: &TaskId) -> AgentId {
        self.winners
            .get(task_id)
            .cloned()
            .unwrap_or_else(AgentId::none)
    }

    /// Serialize to the canonical frame layout
    pub fn encode(&self) -> Vec<u8> {
        let mut w = FrameWriter::new();
        w.put_str(self.sender.as_str());
        w.put_f64(self.timestamp);

        w.put_u32(self.bundle.len() as u32);
        for id in &self.bundle {
            w.put_str(id.as_str());
        }

        w.put_u32(self.path.len() as u32);
        for id in &self.path {
            w.put_str(id.as_str());
        }

        w.put_u32(self.winning_bids.len() as u32);
        for (task_id, bid) in &self.winning_bids {
            w.put_str(task_id.as_str());
            w.put_str(bid.agent.as_str());
            w.put_f64(bid.score);
            w.put_f64(bid.timestamp);
        }

        w.put_u32(self.winners.len() as u32);
        for (task_id, agent_id) in &self.winners {
            w.put_str(task_id.as_str());
            w.put_str(agent_id.as_str());
        }

        w.put_u32(self.timestamps.len() as u32);
        for (agent_id, ts) in &self.timestamps {
            w.put_str(agent_id.as_str());
            w.put_f64(*ts);
        }

        w.into_bytes()
    }

    /// Parse a frame; any structural fault yields an error, not a panic
    pub fn decode(data: &[u8]) -> Result<Self, Error> {
        let mut r = FrameReader::new(data);

        let sender = AgentId::new(r.get_str()?);
        let timestamp = r.get_f64()?;

        let bundle_len = r.get_u32()? as usize;
        let mut bundle = Vec::new();
        for _ in 0..bundle_len {
            bundle.push(TaskId::new(r.get_str()?));
        }

        let path_len = r.get_u32()? as usize;
        let mut path = Vec::new();
        for _ in 0..path_len {
            path.push(TaskId::new(r.get_str()?));
        }

        let bids_len = r.get_u32()? as usize;
        let mut winning_bids = BTreeMap::new();
        for _ in 0..bids_len {
            let task_id = TaskId::new(r.get_str()?);
            let agent = AgentId::new(r.get_str()?);
            let score = r.get_f64()?;
            let ts = r.get_f64()?;
            winning_bids.insert(task_id, Bid::new(agent, score, ts));
        }

        let winners_len = r.get_u32()? as usize;
        let mut winners = BTreeMap::new();
        for _ in 0..winners_len {
            let task_id = TaskId::new(r.get_str()?);
            let agent_id = AgentId::new(r.get_str()?);
            winners.insert(task_id, agent_id);
        }

        let ts_len = r.get_u32()? as usize;
        let mut timestamps = BTreeMap::new();
        for _ in 0..ts_len {
            let agent_id = AgentId::new(r.get_str()?);
            let ts = r.get_f64()?;
            timestamps.insert(agent_id, ts);
        }

        Ok(Message {
            sender,
            timestamp,
            bundle,
            path,
            winning_bids,
            winners,
            timestamps,
        })
    }
}

struct FrameWriter {
    buf: Vec<u8>,
}

impl FrameWriter {
    fn new() -> Self {
        FrameWriter { buf: Vec::new() }
    }

    fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn put_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn put_str(&mut self, s: &str) {
        self.put_u32(s.len() as u32);
        self.buf.extend_from_slice(s.as_bytes());
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

struct FrameReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FrameReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        FrameReader { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        let end = self.pos.checked_add(n).ok_or(Error::TruncatedFrame)?;
        if end > self.data.len() {
            return Err(Error::TruncatedFrame);
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn get_u32(&mut self) -> Result<u32, Error> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn get_f64(&mut self) -> Result<f64, Error> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(f64::from_le_bytes(raw))
    }

    fn get_str(&mut self) -> Result<String, Error> {
        let len = self.get_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| Error::InvalidIdentifier)
    }
}
