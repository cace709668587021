//! Retrieval agent, dialogue agent, the loops that drive them, configuration and secrets.

pub mod agent;
pub mod channel;
pub mod config;
pub mod dialogue;
pub mod session;
pub mod vault;

pub use agent::{Agent, AgentError, AgentState};
pub use dialogue::DialogueAgent;
pub use session::{run_agent, run_dialogue};
