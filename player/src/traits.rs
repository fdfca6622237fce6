use async_trait::async_trait;
use bili_api::{
    response::PlayUrlData, BiliApiError, BiliClient, CommentRecord, DanmakuResponse,
    PlayUrlRequest,
};

use utils::DEFAULT_USER_AGENT;

use crate::errors::PlayerError;

/// The two remote calls a session needs.
#[async_trait]
pub trait PlaybackApi: Send + Sync {
    async fn fetch_play_url(&self, request: &PlayUrlRequest) -> Result<PlayUrlData, BiliApiError>;

    async fn fetch_danmaku(&self, cid: i64) -> Result<DanmakuResponse, BiliApiError>;

    /// Headers the media engine must send when pulling stream data.
    fn media_headers(&self) -> Vec<(String, String)>;
}

#[async_trait]
impl PlaybackApi for BiliClient {
    async fn fetch_play_url(&self, request: &PlayUrlRequest) -> Result<PlayUrlData, BiliApiError> {
        self.get_video_play_url(request).await
    }

    async fn fetch_danmaku(&self, cid: i64) -> Result<DanmakuResponse, BiliApiError> {
        self.get_danmaku_xml(cid).await
    }

    /// The CDN checks the agent against the web player's, so a fixed one is
    /// sent regardless of the agent used for api requests.
    fn media_headers(&self) -> Vec<(String, String)> {
        vec![
            ("user-agent".to_string(), DEFAULT_USER_AGENT.to_string()),
            ("referer".to_string(), self.referer().to_string()),
        ]
    }
}

/// Separate video and audio elementary streams to be played as one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedMediaSource {
    pub video_uri: String,
    pub audio_uri: String,
    pub headers: Vec<(String, String)>,
}

#[async_trait]
pub trait MediaPlayer: Send + Sync {
    /// Replace the current source and start playback.
    async fn play(&self, source: MergedMediaSource) -> Result<(), PlayerError>;
}

#[async_trait]
pub trait DanmakuRenderer: Send + Sync {
    /// Replace the whole overlay with `comments`.
    async fn update_data(&self, comments: &[CommentRecord]);
}

#[cfg(test)]
mod tests {
    use bili_api::ClientConfig;

    use super::*;

    #[test]
    fn media_headers_look_like_the_web_player() {
        let client = BiliClient::new(ClientConfig {
            user_agent: Some("bv-test".to_string()),
            ..Default::default()
        })
        .unwrap();
        let headers = client.media_headers();
        assert!(headers.contains(&("user-agent".to_string(), DEFAULT_USER_AGENT.to_string())));
        assert!(headers.contains(&(
            "referer".to_string(),
            "https://www.bilibili.com".to_string()
        )));
    }
}
