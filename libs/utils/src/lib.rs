pub mod user_agent;

pub use user_agent::{UserAgentGenerator, DEFAULT_USER_AGENT};
