//! History reduction: choose the most recent messages that fit the budget.
//!
//! # Algorithm
//!
//! 1. Reserve tokens for the system prompt and the new message; if those
//!    alone exceed the budget the call fails with `TotalUsageExceeded`.
//! 2. Walk history newest to oldest, adding each message's cost to a
//!    running total while `running + reserved <= budget`.
//! 3. Stop at the first message that does not fit. Older messages are
//!    never considered again, even if they are small.
//! 4. Reverse the kept messages back into chronological order.
//!
//! Reduction is deterministic: identical inputs always retain the same
//! messages.

use promptwright_core::error::{CompileError, Result};
use promptwright_core::message::{Message, MessageId};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::token::{CharHeuristicEstimator, TokenEstimator};

/// Everything the reducer needs for one request.
pub struct ReductionInput<'a> {
    /// Conversation history, chronological.
    pub history: &'a [Message],
    pub system_prompt: &'a str,
    /// Prompt of the message being sent.
    pub new_prompt: &'a str,
    pub budget: usize,
    /// Set when regenerating the response of this message.
    pub retry_of: Option<&'a MessageId>,
}

/// The outcome of a reduction.
#[derive(Debug, Clone)]
pub struct Reduction {
    /// Kept history, chronological.
    pub retained: Vec<Message>,
    pub budget: usize,
    /// System prompt plus new message.
    pub reserved_tokens: usize,
    /// Tokens spent on retained history.
    pub history_tokens: usize,
    /// History messages left out for lack of budget.
    pub dropped: usize,
}

impl Reduction {
    pub fn total_tokens(&self) -> usize {
        self.reserved_tokens + self.history_tokens
    }
}

/// Selects the longest suffix of history that fits a token budget.
#[derive(Clone)]
pub struct HistoryReducer {
    estimator: Arc<dyn TokenEstimator>,
    per_message_overhead: usize,
}

impl HistoryReducer {
    pub fn new(estimator: Arc<dyn TokenEstimator>, per_message_overhead: usize) -> Self {
        Self {
            estimator,
            per_message_overhead,
        }
    }

    /// A reducer using [`CharHeuristicEstimator`].
    pub fn with_overhead(per_message_overhead: usize) -> Self {
        Self::new(Arc::new(CharHeuristicEstimator), per_message_overhead)
    }

    /// Cost of a standalone turn such as the system prompt or the new message.
    pub fn turn_cost(&self, text: &str) -> usize {
        self.estimator.estimate(text) + self.per_message_overhead
    }

    /// Cost of a history message: prompt, response and framing.
    pub fn message_cost(&self, message: &Message) -> usize {
        self.estimator.estimate(&message.prompt)
            + message
                .response
                .as_deref()
                .map_or(0, |r| self.estimator.estimate(r))
            + self.per_message_overhead
    }

    pub fn reduce(&self, input: &ReductionInput<'_>) -> Result<Reduction> {
        let system_tokens = self.turn_cost(input.system_prompt);
        let message_tokens = self.turn_cost(input.new_prompt);
        let reserved = system_tokens + message_tokens;

        if reserved > input.budget {
            return Err(CompileError::TotalUsageExceeded {
                system_tokens,
                message_tokens,
                budget: input.budget,
            });
        }

        let candidates = exclude_retried(input.history, input.retry_of);

        let mut running = 0;
        let mut retained = Vec::new();
        for message in candidates.iter().rev() {
            let cost = self.message_cost(message);
            if running + cost + reserved > input.budget {
                break;
            }
            running += cost;
            retained.push(message.clone());
        }
        retained.reverse();

        let reduction = Reduction {
            dropped: candidates.len() - retained.len(),
            retained,
            budget: input.budget,
            reserved_tokens: reserved,
            history_tokens: running,
        };

        debug!(
            budget = reduction.budget,
            reserved = reduction.reserved_tokens,
            history_tokens = reduction.history_tokens,
            retained = reduction.retained.len(),
            dropped = reduction.dropped,
            "History reduced"
        );

        Ok(reduction)
    }
}

impl Default for HistoryReducer {
    fn default() -> Self {
        Self::with_overhead(7)
    }
}

/// History minus the message being retried, if it is the last one.
fn exclude_retried<'a>(history: &'a [Message], retry_of: Option<&MessageId>) -> &'a [Message] {
    let Some(id) = retry_of else {
        return history;
    };
    match history.split_last() {
        Some((last, rest)) if &last.id == id => rest,
        Some((last, _)) => {
            warn!(
                retried = %id,
                last = %last.id,
                "Retry requested for a message that is not the last in history, nothing excluded"
            );
            history
        }
        None => history,
    }
}
