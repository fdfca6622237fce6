//! Collaborators that print to the terminal instead of decoding media.

use std::sync::Mutex;

use async_trait::async_trait;
use bili_api::CommentRecord;

use crate::{
    errors::PlayerError,
    traits::{DanmakuRenderer, MediaPlayer, MergedMediaSource},
};

#[derive(Default)]
pub struct ConsolePlayer {
    current: Mutex<Option<MergedMediaSource>>,
}

impl ConsolePlayer {
    pub fn current(&self) -> Option<MergedMediaSource> {
        self.current.lock().ok().and_then(|c| c.clone())
    }
}

#[async_trait]
impl MediaPlayer for ConsolePlayer {
    async fn play(&self, source: MergedMediaSource) -> Result<(), PlayerError> {
        log::info!("Play video {} with audio {}", source.video_uri, source.audio_uri);
        let mut current = self.current.lock().map_err(|e| PlayerError::MediaPlayerError {
            err: e.to_string(),
        })?;
        *current = Some(source);
        Ok(())
    }
}

pub struct ConsoleDanmakuRenderer {
    preview: usize,
    count: Mutex<usize>,
}

impl ConsoleDanmakuRenderer {
    /// Prints the first `preview` comments of each update.
    pub fn new(preview: usize) -> Self {
        Self {
            preview,
            count: Mutex::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.count.lock().map(|c| *c).unwrap_or_default()
    }
}

pub fn format_comment(comment: &CommentRecord) -> String {
    let [r, g, b] = comment.rgb();
    let millis = comment.time_offset_millis;
    format!(
        "{:02}:{:02}.{:03} {:?} {} #{r:02x}{g:02x}{b:02x} {}",
        millis / 60_000,
        millis / 1000 % 60,
        millis % 1000,
        comment.display_mode,
        comment.font_size,
        comment.text
    )
}

#[async_trait]
impl DanmakuRenderer for ConsoleDanmakuRenderer {
    async fn update_data(&self, comments: &[CommentRecord]) {
        if let Ok(mut count) = self.count.lock() {
            *count = comments.len();
        }
        for comment in comments.iter().take(self.preview) {
            println!("{}", format_comment(comment));
        }
    }
}

#[cfg(test)]
mod tests {
    use bili_api::DisplayMode;

    use super::*;

    #[test]
    fn comment_line() {
        let comment = CommentRecord {
            id: 1,
            time_offset_millis: 83_250,
            text: "hello".to_string(),
            display_mode: DisplayMode::FixedTop,
            font_size: 25,
            color: 0xFF8000,
        };
        assert_eq!(format_comment(&comment), "01:23.250 FixedTop 25 #ff8000 hello");
    }

    #[tokio::test]
    async fn renderer_counts_comments() {
        let renderer = ConsoleDanmakuRenderer::new(0);
        assert_eq!(renderer.count(), 0);
        let comment = CommentRecord {
            id: 1,
            time_offset_millis: 0,
            text: "a".to_string(),
            display_mode: DisplayMode::Scrolling,
            font_size: 25,
            color: 0xFFFFFF,
        };
        renderer.update_data(&[comment.clone(), comment]).await;
        assert_eq!(renderer.count(), 2);
        renderer.update_data(&[]).await;
        assert_eq!(renderer.count(), 0);
    }

    #[tokio::test]
    async fn player_keeps_last_source() {
        let player = ConsolePlayer::default();
        assert!(player.current().is_none());
        let source = MergedMediaSource {
            video_uri: "v".to_string(),
            audio_uri: "a".to_string(),
            headers: vec![],
        };
        player.play(source.clone()).await.unwrap();
        assert_eq!(player.current(), Some(source));
    }
}
