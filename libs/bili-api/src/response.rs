use serde::{Deserialize, Serialize};

use crate::BiliApiError;

/// Common JSON envelope of the web api.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BiliResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub ttl: i64,
    pub data: Option<T>,
}

impl<T> BiliResponse<T> {
    /// Unwrap the payload, turning a non-zero `code` into an api error.
    pub fn into_data(self) -> Result<T, BiliApiError> {
        if self.code != 0 {
            return Err(BiliApiError::ApiError {
                code: self.code,
                message: self.message,
            });
        }
        self.data
            .ok_or_else(|| BiliApiError::invalid_response("missing data"))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct PlayUrlData {
    pub quality: i32,
    pub format: String,
    pub timelength: i64,
    pub accept_quality: Vec<i32>,
    pub accept_description: Vec<String>,
    pub dash: Option<Dash>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Dash {
    pub duration: i64,
    pub video: Vec<DashItem>,
    // null for silent videos
    pub audio: Option<Vec<DashItem>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DashItem {
    /// Quality code this stream belongs to
    pub id: i32,
    pub base_url: String,
    pub backup_url: Option<Vec<String>>,
    pub bandwidth: i64,
    pub mime_type: String,
    pub codecs: String,
    pub width: i32,
    pub height: i32,
    pub frame_rate: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct PopularVideos {
    pub list: Vec<VideoInfo>,
    pub no_more: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct VideoInfo {
    pub bvid: String,
    pub aid: i64,
    pub cid: i64,
    pub videos: i32,
    pub tid: i32,
    pub tname: String,
    pub title: String,
    pub desc: String,
    pub pic: String,
    pub pubdate: i64,
    // seconds, sum of all pages
    pub duration: i64,
    pub owner: Owner,
    pub stat: VideoStat,
    pub pages: Option<Vec<VideoPage>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Owner {
    pub mid: i64,
    pub name: String,
    pub face: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct VideoStat {
    pub view: i64,
    pub danmaku: i64,
    pub reply: i64,
    pub favorite: i64,
    pub coin: i64,
    pub share: i64,
    pub like: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct VideoPage {
    pub cid: i64,
    pub page: i32,
    pub part: String,
    pub duration: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct LiveDanmuInfo {
    pub group: String,
    pub business_id: i64,
    pub refresh_row_factor: f64,
    pub refresh_rate: i64,
    pub max_delay: i64,
    pub token: String,
    pub host_list: Vec<DanmuHost>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DanmuHost {
    pub host: String,
    pub port: u16,
    pub wss_port: u16,
    pub ws_port: u16,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct LiveRoomPlayInfo {
    pub room_id: i64,
    pub short_id: i64,
    pub uid: i64,
    pub is_hidden: bool,
    pub is_locked: bool,
    pub is_portrait: bool,
    // 0 offline, 1 live, 2 round playing
    pub live_status: u8,
    pub live_time: i64,
    pub playurl_info: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct LiveDanmuHistory {
    pub admin: Vec<LiveHistoryMessage>,
    pub room: Vec<LiveHistoryMessage>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct LiveHistoryMessage {
    pub text: String,
    pub nickname: String,
    pub uid: i64,
    /// "2022-08-01 12:00:00", Asia/Shanghai
    pub timeline: String,
    pub isadmin: i32,
    pub vip: i32,
    pub svip: i32,
}
