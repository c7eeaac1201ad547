//! Conflict resolution over neighbor messages
//!
//! For every task either side knows about, the resolver decides to adopt the
//! neighbor's view (UPDATE), keep its own (LEAVE), or additionally drop the
//! task and its path successors (RESET) when the agent just lost it. The
//! fresher timestamp is the source of truth; ties fall back to the total bid
//! order, so any two agents seeing the same evidence reach the same state.

use crate::agent::AgentState;
use crate::auction_info;
use crate::message::Message;
use crate::types::TaskId;
use std::collections::BTreeSet;

/// Applies the per-task update/leave/reset rules to an agent's state
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsensusResolver;

impl ConsensusResolver {
    pub fn new() -> Self {
        ConsensusResolver
    }

    /// Process a batch of neighbor messages in arrival order
    pub fn resolve(&self, agent: &mut AgentState, messages: &[Message]) {
        for message in messages {
            self.process_message(agent, message);
        }
    }

    /// Apply one neighbor message: timestamps first, then per-task rules
    pub fn process_message(&self, agent: &mut AgentState, message: &Message) {
        if message.sender == *agent.id() {
            return;
        }

        self.propagate_timestamps(agent, message);

        let task_ids: BTreeSet<TaskId> = agent
            .winning_bids()
            .keys()
            .chain(message.winning_bids.keys())
            .cloned()
            .collect();

        for task_id in &task_ids {
            self.resolve_task(agent, message, task_id);
        }
    }

    /// Ratchet information times forward: the sender's own, then every
    /// entry the sender relays about third parties (multi-hop freshness).
    fn propagate_timestamps(&self, agent: &mut AgentState, message: &Message) {
        agent.observe_timestamp(message.sender.clone(), message.timestamp);
        for (agent_id, ts) in &message.timestamps {
            agent.observe_timestamp(agent_id.clone(), *ts);
        }
    }

    fn resolve_task(&self, agent: &mut AgentState, message: &Message, task_id: &TaskId) {
        let my_bid = agent.winning_bid(task_id);
        let my_winner = agent.winner(task_id);
        let their_bid = message.winning_bid(task_id);
        let their_winner = message.winner(task_id);

        let update = if their_winner.is_none() {
            // The sender reports no winner; whatever we have stands.
            false
        } else if my_winner.is_none() {
            // The sender knows a winner we do not.
            true
        } else if their_winner == my_winner {
            // Agreement on who; adopt only strictly fresher information.
            their_bid.timestamp > my_bid.timestamp
        } else if their_bid.timestamp > my_bid.timestamp {
            true
        } else if my_bid.timestamp > their_bid.timestamp {
            false
        } else {
            // Equal timestamps: fall back to the total bid order.
            their_bid.beats(&my_bid)
        };

        if !update {
            return;
        }

        let held = agent.bundle().contains(task_id);
        agent.update_winning_bid(task_id.clone(), their_bid);

        if held && agent.winner(task_id) != *agent.id() {
            let dropped = agent.release_from(task_id);
            if !dropped.is_empty() {
                auction_info!(
                    "agent {} lost task {} to {} and released {} task(s)",
                    agent.id(),
                    task_id,
                    agent.winner(task_id),
                    dropped.len()
                );
            }
        }
    }
}
