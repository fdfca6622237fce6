use std::{
    fmt::Display,
    sync::{
        atomic::{self, AtomicU64},
        Arc,
    },
};

use bili_api::{response::PlayUrlData, PlayUrlRequest};
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    errors::PlayerError,
    state::{LoadPhase, QualityOptions, ResolvedStreams, SessionState},
    traits::{DanmakuRenderer, MediaPlayer, MergedMediaSource, PlaybackApi},
};

/// A video page: `avid` identifies the archive, `cid` the page within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentId {
    pub avid: i64,
    pub cid: i64,
}

impl Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "av{}/cid{}", self.avid, self.cid)
    }
}

/// Stream selection sent with every playurl request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub qn: i32,
    pub fnval: i32,
    pub fnver: i32,
    pub fourk: i32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            qn: 80,
            fnval: 4048,
            fnver: 0,
            fourk: 0,
        }
    }
}

impl SessionOptions {
    fn request(&self, content: ContentId) -> PlayUrlRequest {
        PlayUrlRequest {
            qn: Some(self.qn),
            fnval: Some(self.fnval),
            fnver: Some(self.fnver),
            fourk: Some(self.fourk),
            ..PlayUrlRequest::new(content.avid, content.cid)
        }
    }
}

struct Attempt {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Resolves the streams and danmaku of a video page and publishes the
/// result to whoever renders it.
///
/// Only one attempt is in flight at a time. Starting a new one cancels the
/// previous attempt, whose pending writes are then dropped.
pub struct PlayerSession {
    api: Arc<dyn PlaybackApi>,
    player: Arc<dyn MediaPlayer>,
    renderer: Arc<dyn DanmakuRenderer>,
    options: SessionOptions,
    state: Arc<watch::Sender<SessionState>>,
    generation: Arc<AtomicU64>,
    task: Mutex<Option<Attempt>>,
}

impl PlayerSession {
    pub fn new(
        api: Arc<dyn PlaybackApi>,
        player: Arc<dyn MediaPlayer>,
        renderer: Arc<dyn DanmakuRenderer>,
        options: SessionOptions,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            api,
            player,
            renderer,
            options,
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            task: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Start resolving `content` in the background.
    ///
    /// Returns once the state is in [`LoadPhase::Loading`]; follow progress
    /// through [`PlayerSession::subscribe`].
    pub async fn resolve_session(&self, content: ContentId) {
        let mut task = self.task.lock().await;
        if let Some(previous) = task.take() {
            previous.token.cancel();
            previous.handle.abort();
        }

        let attempt = self.generation.fetch_add(1, atomic::Ordering::SeqCst) + 1;
        self.state.send_replace(SessionState::loading(attempt, content));
        log::info!("[{content}]Resolve session, attempt {attempt}");

        let token = CancellationToken::new();
        let worker = Worker {
            api: self.api.clone(),
            player: self.player.clone(),
            renderer: self.renderer.clone(),
            state: self.state.clone(),
            generation: self.generation.clone(),
            request: self.options.request(content),
            content,
            attempt,
            token: token.clone(),
        };
        let handle = tokio::spawn(worker.run());
        *task = Some(Attempt { token, handle });
    }

    /// Stop the attempt in flight. The state is left as it was.
    pub async fn cancel(&self) {
        let attempt = self.task.lock().await.take();
        if let Some(attempt) = attempt {
            attempt.token.cancel();
            attempt.handle.abort();
            let _ = attempt.handle.await;
        }
    }

    /// Wait for the attempt in flight to run to completion, danmaku
    /// loading included, and return the final state.
    pub async fn join(&self) -> SessionState {
        let attempt = self.task.lock().await.take();
        if let Some(attempt) = attempt {
            if let Err(e) = attempt.handle.await {
                log::warn!("Session task ended abnormally: {}", e);
            }
        }
        self.state()
    }

    /// Wait until the current attempt reaches a terminal phase.
    ///
    /// Never returns for an attempt that was cancelled before settling.
    pub async fn wait_settled(&self) -> SessionState {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(|s| s.load_phase.is_settled()).await;
        match settled {
            Ok(state) => state.clone(),
            // the sender lives as long as self
            Err(_) => self.state(),
        }
    }
}

impl Drop for PlayerSession {
    fn drop(&mut self) {
        if let Some(attempt) = self.task.get_mut().take() {
            attempt.token.cancel();
            attempt.handle.abort();
        }
    }
}

struct Worker {
    api: Arc<dyn PlaybackApi>,
    player: Arc<dyn MediaPlayer>,
    renderer: Arc<dyn DanmakuRenderer>,
    state: Arc<watch::Sender<SessionState>>,
    generation: Arc<AtomicU64>,
    request: PlayUrlRequest,
    content: ContentId,
    attempt: u64,
    token: CancellationToken,
}

impl Worker {
    fn is_current(&self) -> bool {
        !self.token.is_cancelled()
            && self.generation.load(atomic::Ordering::SeqCst) == self.attempt
    }

    /// Apply `update` unless this attempt has been superseded or cancelled.
    /// The check runs under the channel lock, so a newer attempt's reset is
    /// never overwritten.
    fn publish(&self, update: impl FnOnce(&mut SessionState)) -> bool {
        self.state.send_if_modified(|state| {
            if !self.is_current() || state.attempt != self.attempt {
                return false;
            }
            update(state);
            true
        })
    }

    async fn run(self) {
        tokio::select! {
            _ = self.token.cancelled() => {
                log::info!("[{}]Attempt {} cancelled", self.content, self.attempt);
            }
            _ = self.resolve() => {}
        }
    }

    async fn resolve(&self) {
        // the overlay still shows the previous attempt's danmaku
        if self.is_current() {
            self.renderer.update_data(&[]).await;
        }

        if let Err(e) = self.start_playback().await {
            log::error!("[{}]Load play url failed: {}", self.content, e);
            let detail = e.detail();
            self.publish(|state| {
                state.load_phase = LoadPhase::Failed;
                state.error_detail = Some(detail);
            });
            return;
        }

        if !self.publish(|state| state.load_phase = LoadPhase::Succeeded) {
            return;
        }
        log::info!("[{}]Load play url success", self.content);

        // danmaku are optional, playback has already started
        if let Err(e) = self.load_danmaku().await {
            log::warn!("[{}]Load danmaku failed: {}", self.content, e);
        }
    }

    async fn start_playback(&self) -> Result<(), PlayerError> {
        let data = self.api.fetch_play_url(&self.request).await?;
        let streams = resolve_streams(&data)?;
        log::info!(
            "[{}]Available quality: {:?}",
            self.content,
            streams.quality_options
        );

        let source = MergedMediaSource {
            video_uri: streams.video_uri.clone(),
            audio_uri: streams.audio_uri.clone(),
            headers: self.api.media_headers(),
        };
        if !self.publish(|state| state.resolved_streams = Some(streams)) || !self.is_current() {
            return Ok(());
        }
        self.player.play(source).await
    }

    async fn load_danmaku(&self) -> Result<(), PlayerError> {
        let resp = self.api.fetch_danmaku(self.content.cid).await?;
        let comments = Arc::new(resp.comments());
        if resp.skipped > 0 {
            log::warn!(
                "[{}]Skipped {} malformed danmaku",
                self.content,
                resp.skipped
            );
        }

        let published = comments.clone();
        if !self.publish(|state| state.comments = published) || !self.is_current() {
            return Ok(());
        }
        self.renderer.update_data(&comments).await;
        log::info!("[{}]Load danmaku success: {}", self.content, comments.len());
        Ok(())
    }
}

/// Pick the default streams out of a playurl response.
pub fn resolve_streams(data: &PlayUrlData) -> Result<ResolvedStreams, PlayerError> {
    let quality_options =
        QualityOptions::from_accept(&data.accept_quality, &data.accept_description);
    if quality_options.is_empty() {
        return Err(PlayerError::NoStreamAvailable {
            reason: "no accepted quality".to_string(),
        });
    }

    let dash = data.dash.as_ref().ok_or_else(|| PlayerError::NoStreamAvailable {
        reason: "dash is missing".to_string(),
    })?;
    let video = dash
        .video
        .first()
        .filter(|v| !v.base_url.is_empty())
        .ok_or_else(|| PlayerError::NoStreamAvailable {
            reason: "no video stream".to_string(),
        })?;
    let audio = dash
        .audio
        .as_ref()
        .and_then(|audio| audio.first())
        .filter(|a| !a.base_url.is_empty())
        .ok_or_else(|| PlayerError::NoStreamAvailable {
            reason: "no audio stream".to_string(),
        })?;

    Ok(ResolvedStreams {
        quality_options,
        quality: video.id,
        video_uri: video.base_url.clone(),
        audio_uri: audio.base_url.clone(),
    })
}
