use std::sync::Arc;

use bili_api::CommentRecord;
use serde::Serialize;

use crate::session::ContentId;

/// Label used when the server lists a quality without a description.
pub const UNKNOWN_QUALITY: &str = "未知清晰度";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl LoadPhase {
    pub fn is_settled(&self) -> bool {
        matches!(self, LoadPhase::Succeeded | LoadPhase::Failed)
    }
}

/// Quality code to label, in the order the server listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QualityOptions(Vec<(i32, String)>);

impl QualityOptions {
    /// Pairs `accept_quality` with `accept_description` by index.
    pub fn from_accept(qualities: &[i32], descriptions: &[String]) -> Self {
        let mut options = Self::default();
        for (index, quality) in qualities.iter().enumerate() {
            let label = descriptions
                .get(index)
                .map(String::as_str)
                .unwrap_or(UNKNOWN_QUALITY);
            options.insert(*quality, label);
        }
        options
    }

    /// A known code keeps its position and takes the new label.
    pub fn insert(&mut self, code: i32, label: &str) {
        match self.0.iter_mut().find(|(c, _)| *c == code) {
            Some(entry) => entry.1 = label.to_string(),
            None => self.0.push((code, label.to_string())),
        }
    }

    pub fn get(&self, code: i32) -> Option<&str> {
        self.0
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &str)> {
        self.0.iter().map(|(code, label)| (*code, label.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedStreams {
    pub quality_options: QualityOptions,
    /// Quality code of the default video stream
    pub quality: i32,
    pub video_uri: String,
    pub audio_uri: String,
}

/// Snapshot published to renderers.
///
/// Each attempt of [`crate::PlayerSession::resolve_session`] bumps
/// `attempt` and starts from a fresh state in [`LoadPhase::Loading`].
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub attempt: u64,
    pub content: Option<ContentId>,
    pub load_phase: LoadPhase,
    /// Only set in [`LoadPhase::Failed`]
    pub error_detail: Option<String>,
    pub resolved_streams: Option<ResolvedStreams>,
    pub comments: Arc<Vec<CommentRecord>>,
}

impl SessionState {
    pub(crate) fn loading(attempt: u64, content: ContentId) -> Self {
        Self {
            attempt,
            content: Some(content),
            load_phase: LoadPhase::Loading,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_options_follow_server_order() {
        let options = QualityOptions::from_accept(
            &[80, 64],
            &["1080P".to_string(), "720P".to_string()],
        );
        let pairs: Vec<(i32, &str)> = options.iter().collect();
        assert_eq!(pairs, vec![(80, "1080P"), (64, "720P")]);
        assert_eq!(options.get(64), Some("720P"));
        assert_eq!(options.get(16), None);
    }

    #[test]
    fn missing_description_gets_placeholder() {
        let options = QualityOptions::from_accept(&[120, 80, 64], &["4K".to_string()]);
        assert_eq!(options.len(), 3);
        assert_eq!(options.get(120), Some("4K"));
        assert_eq!(options.get(80), Some(UNKNOWN_QUALITY));
        assert_eq!(options.get(64), Some(UNKNOWN_QUALITY));
    }

    #[test]
    fn repeated_quality_keeps_first_position() {
        let options = QualityOptions::from_accept(
            &[80, 64, 80],
            &["a".to_string(), "b".to_string(), "c".to_string()],
        );
        let pairs: Vec<(i32, &str)> = options.iter().collect();
        assert_eq!(pairs, vec![(80, "c"), (64, "b")]);
    }

    #[test]
    fn settled_phases() {
        assert!(!LoadPhase::Idle.is_settled());
        assert!(!LoadPhase::Loading.is_settled());
        assert!(LoadPhase::Succeeded.is_settled());
        assert!(LoadPhase::Failed.is_settled());
    }
}
