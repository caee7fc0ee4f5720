//! Conversation domain module.
//!
//! Conversations, messages, per-turn state snapshots, response modes and
//! the goals a user tracks through the agent.

mod conversation;
mod goal;
pub mod mode;
mod state;

pub use conversation::{Conversation, ConversationStatus, Message, MessageRole};
pub use goal::{
    apply_goal_extraction, find_target_goal, Goal, GoalAction, GoalChange, GoalExtraction,
    GoalStatus, GoalTarget,
};
pub use mode::ResponseMode;
pub use state::{ConversationState, MAX_EXTRACTIONS_PER_DOMAIN};
