//! Transport capability: how frames leave and reach an agent
//!
//! The engine never sees addresses or sockets, only opaque byte frames.
//! Hosts implement [`Transport`] over whatever medium they have; frames may
//! be lost, duplicated, or reordered and the protocol still converges.

use crate::types::AgentId;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

/// Byte-frame transport between an agent and its neighbors
pub trait Transport {
    /// Broadcast a frame to all neighbors; no ack, no ordering
    fn send(&mut self, frame: &[u8]);

    /// Every frame received since the previous call; empty is normal
    fn recv(&mut self) -> Vec<Vec<u8>>;
}

pub type SendFn = Box<dyn FnMut(&[u8])>;
pub type RecvFn = Box<dyn FnMut() -> Vec<Vec<u8>>>;

/// Adapts one or two closures into a [`Transport`]
///
/// Either side may be absent: a missing sender makes the communicate phase a
/// no-op, a missing receiver makes the consensus phase see no frames. The
/// two directions degrade independently.
#[derive(Default)]
pub struct ClosureTransport {
    send: Option<SendFn>,
    recv: Option<RecvFn>,
}

impl ClosureTransport {
    pub fn new(send: SendFn, recv: RecvFn) -> Self {
        ClosureTransport {
            send: Some(send),
            recv: Some(recv),
        }
    }

    /// Transmit-only endpoint
    pub fn sender_only(send: SendFn) -> Self {
        ClosureTransport {
            send: Some(send),
            recv: None,
        }
    }

    /// Receive-only endpoint
    pub fn receiver_only(recv: RecvFn) -> Self {
        ClosureTransport {
            send: None,
            recv: Some(recv),
        }
    }
}

impl Transport for ClosureTransport {
    fn send(&mut self, frame: &[u8]) {
        if let Some(f) = self.send.as_mut() {
            f(frame);
        }
    }

    fn recv(&mut self) -> Vec<Vec<u8>> {
        match self.recv.as_mut() {
            Some(f) => f(),
            None => Vec::new(),
        }
    }
}

/// Single-process broadcast router for simulations and tests
///
/// Each registered endpoint gets its own mailbox; a send from one endpoint
/// enqueues the frame into every other mailbox. The core runs on one thread,
/// so the hub shares state through plain `Rc<RefCell<..>>`.
#[derive(Debug, Clone, Default)]
pub struct MessageHub {
    inner: Rc<RefCell<HubInner>>,
}

#[derive(Debug, Default)]
struct HubInner {
    mailboxes: BTreeMap<AgentId, VecDeque<Vec<u8>>>,
}

impl MessageHub {
    pub fn new() -> Self {
        MessageHub::default()
    }

    /// Register an endpoint for `agent_id` and hand back its transport
    pub fn endpoint(&self, agent_id: impl Into<AgentId>) -> HubTransport {
        let agent_id = agent_id.into();
        self.inner
            .borrow_mut()
            .mailboxes
            .entry(agent_id.clone())
            .or_default();
        HubTransport {
            agent_id,
            inner: Rc::clone(&self.inner),
        }
    }

    /// Frames currently queued across all mailboxes
    pub fn pending(&self) -> usize {
        self.inner
            .borrow()
            .mailboxes
            .values()
            .map(|q| q.len())
            .sum()
    }
}

/// One agent's endpoint on a [`MessageHub`]
pub struct HubTransport {
    agent_id: AgentId,
    inner: Rc<RefCell<HubInner>>,
}

impl Transport for HubTransport {
    fn send(&mut self, frame: &[u8]) {
        let mut inner = self.inner.borrow_mut();
        for (id, mailbox) in inner.mailboxes.iter_mut() {
            if *id != self.agent_id {
                mailbox.push_back(frame.to_vec());
            }
        }
    }

    fn recv(&mut self) -> Vec<Vec<u8>> {
        let mut inner = self.inner.borrow_mut();
        match inner.mailboxes.get_mut(&self.agent_id) {
            Some(mailbox) => mailbox.drain(..).collect(),
            None => Vec::new(),
        }
    }
}
