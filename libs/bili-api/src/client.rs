use std::time::Duration;

use serde::de::DeserializeOwned;
use utils::UserAgentGenerator;

use crate::danmaku::{decode_danmaku_xml, DanmakuResponse};
use crate::http_client::ApiClient;
use crate::response::{
    BiliResponse, LiveDanmuHistory, LiveDanmuInfo, LiveRoomPlayInfo, PlayUrlData, PopularVideos,
    VideoInfo,
};
use crate::BiliApiError;

pub const API_BASE: &str = "https://api.bilibili.com";
pub const LIVE_BASE: &str = "https://api.live.bilibili.com";
/// Stream urls are only served to requests coming from the web player.
pub const WEB_REFERER: &str = "https://www.bilibili.com";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: String,
    pub live_base: String,
    /// A random desktop agent is generated when unset
    pub user_agent: Option<String>,
    pub cookies: Option<String>,
    pub referer: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: API_BASE.to_string(),
            live_base: LIVE_BASE.to_string(),
            user_agent: None,
            cookies: None,
            referer: WEB_REFERER.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoId {
    Aid(i64),
    Bvid(String),
}

/// Parameters of `/x/player/playurl`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayUrlRequest {
    pub avid: Option<i64>,
    pub bvid: Option<String>,
    pub cid: i64,
    pub qn: Option<i32>,
    pub fnval: Option<i32>,
    pub fnver: Option<i32>,
    pub fourk: Option<i32>,
    pub session: Option<String>,
    pub otype: String,
    pub r#type: String,
    pub platform: String,
}

impl PlayUrlRequest {
    /// fnval 4048 asks for every dash variant (hdr, 4k, dolby, 8k, av1).
    pub fn new(avid: i64, cid: i64) -> Self {
        Self {
            avid: Some(avid),
            bvid: None,
            cid,
            qn: Some(80),
            fnval: Some(4048),
            fnver: Some(0),
            fourk: Some(0),
            session: None,
            otype: "json".to_string(),
            r#type: String::new(),
            platform: "oc".to_string(),
        }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(avid) = self.avid {
            query.push(("avid", avid.to_string()));
        }
        if let Some(bvid) = &self.bvid {
            query.push(("bvid", bvid.clone()));
        }
        query.push(("cid", self.cid.to_string()));
        let optional = [
            ("qn", self.qn),
            ("fnval", self.fnval),
            ("fnver", self.fnver),
            ("fourk", self.fourk),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                query.push((key, value.to_string()));
            }
        }
        if let Some(session) = &self.session {
            query.push(("session", session.clone()));
        }
        query.push(("otype", self.otype.clone()));
        query.push(("type", self.r#type.clone()));
        query.push(("platform", self.platform.clone()));
        query
    }
}

/// Client for the bilibili web api.
///
/// Build one per process and share it; there is no global instance.
pub struct BiliClient {
    client: ApiClient,
    api_base: String,
    live_base: String,
    referer: String,
}

impl BiliClient {
    pub fn new(config: ClientConfig) -> Result<Self, BiliApiError> {
        let user_agent = config
            .user_agent
            .filter(|ua| !ua.is_empty())
            .unwrap_or_else(|| UserAgentGenerator::new().generate());
        let client = ApiClient::new(&user_agent, config.cookies.as_deref(), config.timeout)?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            live_base: config.live_base.trim_end_matches('/').to_string(),
            referer: config.referer,
        })
    }

    pub fn user_agent(&self) -> &str {
        self.client.user_agent()
    }

    pub fn referer(&self) -> &str {
        &self.referer
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        referer: Option<&str>,
    ) -> Result<T, BiliApiError> {
        let body = self.client.get(url, query, referer).await?.bytes().await?;
        let resp: BiliResponse<T> = serde_json::from_slice(&body)?;
        if resp.code != 0 {
            log::error!("Request {url} failed with code {}: {}", resp.code, resp.message);
        }
        resp.into_data()
    }

    /// Popular videos, page `pn` of size `ps`.
    pub async fn get_popular_videos(&self, pn: u32, ps: u32) -> Result<PopularVideos, BiliApiError> {
        self.get_json(
            &format!("{}/x/web-interface/popular", self.api_base),
            &[("pn", pn.to_string()), ("ps", ps.to_string())],
            None,
        )
        .await
    }

    pub async fn get_video_info(&self, id: &VideoId) -> Result<VideoInfo, BiliApiError> {
        let query = match id {
            VideoId::Aid(aid) => [("aid", aid.to_string())],
            VideoId::Bvid(bvid) => [("bvid", bvid.clone())],
        };
        self.get_json(
            &format!("{}/x/web-interface/view", self.api_base),
            &query,
            None,
        )
        .await
    }

    /// Resolve the dash streams of one video page.
    pub async fn get_video_play_url(
        &self,
        request: &PlayUrlRequest,
    ) -> Result<PlayUrlData, BiliApiError> {
        log::debug!("Get play url: {request:?}");
        self.get_json(
            &format!("{}/x/player/playurl", self.api_base),
            &request.query(),
            Some(self.referer.as_str()),
        )
        .await
    }

    /// Fetch and decode the danmaku document of video page `cid`.
    pub async fn get_danmaku_xml(&self, cid: i64) -> Result<DanmakuResponse, BiliApiError> {
        let body = self
            .client
            .get(
                &format!("{}/x/v1/dm/list.so", self.api_base),
                &[("oid", cid.to_string())],
                Some(self.referer.as_str()),
            )
            .await?
            .bytes()
            .await?;
        decode_danmaku_xml(&body)
    }

    /// Connection token and websocket hosts of live room `room_id`.
    pub async fn get_live_danmu_info(&self, room_id: i64) -> Result<LiveDanmuInfo, BiliApiError> {
        self.get_json(
            &format!("{}/xlive/web-room/v1/index/getDanmuInfo", self.live_base),
            &[("id", room_id.to_string())],
            None,
        )
        .await
    }

    pub async fn get_live_room_play_info(
        &self,
        room_id: i64,
    ) -> Result<LiveRoomPlayInfo, BiliApiError> {
        self.get_json(
            &format!("{}/xlive/web-room/v1/index/getRoomPlayInfo", self.live_base),
            &[("room_id", room_id.to_string())],
            None,
        )
        .await
    }

    pub async fn get_live_danmu_history(
        &self,
        room_id: i64,
    ) -> Result<LiveDanmuHistory, BiliApiError> {
        self.get_json(
            &format!("{}/xlive/web-room/v1/dM/gethistory", self.live_base),
            &[("roomid", room_id.to_string())],
            None,
        )
        .await
    }
}
