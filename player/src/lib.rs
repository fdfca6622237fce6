pub mod config;
pub mod console;
pub mod errors;
pub mod session;
pub mod state;
pub mod traits;

pub use errors::PlayerError;
pub use session::{ContentId, PlayerSession, SessionOptions};
pub use state::{LoadPhase, QualityOptions, ResolvedStreams, SessionState};
pub use traits::{DanmakuRenderer, MediaPlayer, MergedMediaSource, PlaybackApi};
