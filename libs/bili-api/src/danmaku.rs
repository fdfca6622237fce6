mod comment;
mod packed;

pub use comment::{CommentRecord, DisplayMode};
pub use packed::{DanmakuData, REQUIRED_FIELDS};

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use serde::Serialize;

use crate::BiliApiError;

/// Decoded `/x/v1/dm/list.so` document.
///
/// ```xml
/// <i>
///   <chatserver>chat.bilibili.com</chatserver>
///   <chatid>123</chatid>
///   <maxlimit>1500</maxlimit>
///   <state>0</state>
///   <real_name>0</real_name>
///   <source>k-v</source>
///   <d p="12.34,1,25,16777215,1660000000,0,8e1f5a6b,1122334455667788,10">text</d>
/// </i>
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct DanmakuResponse {
    pub chat_server: String,
    pub chat_id: i64,
    pub max_limit: i64,
    pub state: i32,
    pub real_name: i32,
    pub source: String,
    /// Records in document order
    pub data: Vec<DanmakuData>,
    /// Number of `<d>` elements dropped because their `p` attribute was malformed
    pub skipped: usize,
}

impl DanmakuResponse {
    pub fn comments(&self) -> Vec<CommentRecord> {
        self.data.iter().map(CommentRecord::from).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetaField {
    ChatServer,
    ChatId,
    MaxLimit,
    State,
    RealName,
    Source,
}

impl MetaField {
    const ALL: [MetaField; 6] = [
        MetaField::ChatServer,
        MetaField::ChatId,
        MetaField::MaxLimit,
        MetaField::State,
        MetaField::RealName,
        MetaField::Source,
    ];

    fn tag(self) -> &'static str {
        match self {
            MetaField::ChatServer => "chatserver",
            MetaField::ChatId => "chatid",
            MetaField::MaxLimit => "maxlimit",
            MetaField::State => "state",
            MetaField::RealName => "real_name",
            MetaField::Source => "source",
        }
    }

    fn from_tag(tag: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.tag().as_bytes() == tag)
    }
}

enum Capture {
    Meta(MetaField),
    /// `p` attribute, `None` when the element has none
    Danmaku(Option<String>),
}

#[derive(Default)]
struct Collector {
    meta: [Option<String>; 6],
    data: Vec<DanmakuData>,
    seen: usize,
    skipped: usize,
}

impl Collector {
    fn finish(&mut self, capture: Capture, text: String) {
        match capture {
            Capture::Meta(field) => {
                let slot = &mut self.meta[field as usize];
                // the first occurrence wins, like getElementsByTagName(..).item(0)
                if slot.is_none() {
                    *slot = Some(text);
                }
            }
            Capture::Danmaku(p) => {
                let index = self.seen;
                self.seen += 1;
                let parsed = p
                    .ok_or_else(|| "missing p attribute".to_string())
                    .and_then(|p| DanmakuData::from_packed(&p, &text));
                match parsed {
                    Ok(data) => self.data.push(data),
                    Err(err) => {
                        log::warn!("{}", BiliApiError::InvalidRecord { index, err });
                        self.skipped += 1;
                    }
                }
            }
        }
    }

    fn text(&self, field: MetaField) -> Result<&str, BiliApiError> {
        self.meta[field as usize]
            .as_deref()
            .ok_or_else(|| BiliApiError::invalid_response(format!("missing <{}>", field.tag())))
    }

    fn number<T: std::str::FromStr>(&self, field: MetaField) -> Result<T, BiliApiError> {
        let raw = self.text(field)?;
        raw.trim().parse().map_err(|_| {
            BiliApiError::invalid_response(format!("<{}> is not a number: {raw:?}", field.tag()))
        })
    }

    fn into_response(self) -> Result<DanmakuResponse, BiliApiError> {
        Ok(DanmakuResponse {
            chat_server: self.text(MetaField::ChatServer)?.trim().to_string(),
            chat_id: self.number(MetaField::ChatId)?,
            max_limit: self.number(MetaField::MaxLimit)?,
            state: self.number(MetaField::State)?,
            real_name: self.number(MetaField::RealName)?,
            source: self.text(MetaField::Source)?.trim().to_string(),
            data: self.data,
            skipped: self.skipped,
        })
    }
}

fn capture_for(e: &BytesStart) -> Result<Option<Capture>, BiliApiError> {
    let name = e.name();
    if name.as_ref() == b"d" {
        let p = match e
            .try_get_attribute("p")
            .map_err(BiliApiError::invalid_response)?
        {
            Some(attr) => Some(attr.unescape_value()?.into_owned()),
            None => None,
        };
        return Ok(Some(Capture::Danmaku(p)));
    }
    Ok(MetaField::from_tag(name.as_ref()).map(Capture::Meta))
}

/// Decode a danmaku XML document.
///
/// Markup errors and missing metadata fail the whole document. A `<d>`
/// element whose packed attribute cannot be parsed is logged and skipped.
pub fn decode_danmaku_xml(payload: &[u8]) -> Result<DanmakuResponse, BiliApiError> {
    let mut reader = Reader::from_reader(payload);
    let mut buf = Vec::new();
    let mut collector = Collector::default();
    // element being captured and the depth it was opened at
    let mut open: Option<(Capture, usize)> = None;
    let mut text = String::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                depth += 1;
                if open.is_none() {
                    if let Some(capture) = capture_for(&e)? {
                        open = Some((capture, depth));
                        text.clear();
                    }
                }
            }
            Event::Empty(e) => {
                if open.is_none() {
                    if let Some(capture) = capture_for(&e)? {
                        collector.finish(capture, String::new());
                    }
                }
            }
            Event::Text(e) => {
                if open.is_some() {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if open.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                if matches!(open, Some((_, d)) if d == depth) {
                    if let Some((capture, _)) = open.take() {
                        collector.finish(capture, std::mem::take(&mut text));
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if depth != 0 {
        return Err(BiliApiError::invalid_response("unexpected end of document"));
    }

    let response = collector.into_response()?;
    log::debug!(
        "Decoded {} danmaku for chat {}, skipped {}",
        response.data.len(),
        response.chat_id,
        response.skipped
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<i>
  <chatserver>chat.bilibili.com</chatserver>
  <chatid>279786</chatid>
  <maxlimit>1500</maxlimit>
  <state>0</state>
  <real_name>0</real_name>
  <source>k-v</source>
  <d p="12.34,1,25,16777215,1660000000,0,8e1f5a6b,1001,10">第一</d>
  <d p="3.5,4,18,16711680,1660000001,0,aa00bb11,1002,5">top &amp; center</d>
  <d p="0.2,5,36,65280,1660000002,1,cc00dd22,1003">bottom</d>
  <d p="7.0,7,25,255,1660000003,2,ee00ff33,1004,1"><![CDATA[[0,0,"1-1",4.5,"adv"]]]></d>
</i>"#;

    #[test]
    fn decode_document() {
        let resp = decode_danmaku_xml(DOCUMENT.as_bytes()).unwrap();
        assert_eq!(resp.chat_server, "chat.bilibili.com");
        assert_eq!(resp.chat_id, 279786);
        assert_eq!(resp.max_limit, 1500);
        assert_eq!(resp.state, 0);
        assert_eq!(resp.real_name, 0);
        assert_eq!(resp.source, "k-v");
        assert_eq!(resp.skipped, 0);

        let ids: Vec<i64> = resp.data.iter().map(|d| d.dmid).collect();
        assert_eq!(ids, vec![1001, 1002, 1003, 1004]);
        assert_eq!(resp.data[1].text, "top & center");
        assert_eq!(resp.data[3].text, r#"[0,0,"1-1",4.5,"adv"]"#);
    }

    #[test]
    fn comments_keep_document_order() {
        let comments = decode_danmaku_xml(DOCUMENT.as_bytes()).unwrap().comments();
        assert_eq!(comments.len(), 4);
        assert_eq!(comments[0].text, "第一");
        assert_eq!(comments[0].time_offset_millis, 12340);
        assert_eq!(comments[0].display_mode, DisplayMode::Scrolling);
        assert_eq!(comments[1].display_mode, DisplayMode::FixedTop);
        assert_eq!(comments[1].color, 0xFF0000);
        assert_eq!(comments[2].display_mode, DisplayMode::FixedBottom);
        assert_eq!(comments[2].font_size, 36);
        assert_eq!(comments[3].display_mode, DisplayMode::Scrolling);
    }

    #[test]
    fn malformed_record_is_skipped() {
        let doc = r#"<i><chatserver>c</chatserver><chatid>1</chatid><maxlimit>10</maxlimit>
            <state>0</state><real_name>0</real_name><source>k-v</source>
            <d p="1.0,1,25,0,0,0,h,11">ok</d>
            <d p="oops">broken</d>
            <d>no attribute</d>
            <d p="2.0,1,25,0,0,0,h,12"/>
            </i>"#;
        let resp = decode_danmaku_xml(doc.as_bytes()).unwrap();
        assert_eq!(resp.skipped, 2);
        assert_eq!(resp.data.len(), 2);
        assert_eq!(resp.data[0].dmid, 11);
        assert_eq!(resp.data[1].dmid, 12);
        assert_eq!(resp.data[1].text, "");
    }

    #[test]
    fn missing_metadata_is_structural() {
        let doc = r#"<i><chatserver>c</chatserver><chatid>1</chatid><maxlimit>10</maxlimit>
            <state>0</state><source>k-v</source></i>"#;
        let err = decode_danmaku_xml(doc.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Structural);
        assert!(err.to_string().contains("real_name"));
    }

    #[test]
    fn non_numeric_metadata_is_structural() {
        let doc = r#"<i><chatserver>c</chatserver><chatid>abc</chatid><maxlimit>10</maxlimit>
            <state>0</state><real_name>0</real_name><source>k-v</source></i>"#;
        let err = decode_danmaku_xml(doc.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Structural);
    }

    #[test]
    fn broken_markup_is_structural() {
        let truncated = &DOCUMENT[..DOCUMENT.len() - 10];
        let err = decode_danmaku_xml(truncated.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Structural);

        let mismatched = r#"<i><chatserver>c</chatid></i>"#;
        let err = decode_danmaku_xml(mismatched.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Structural);

        let err = decode_danmaku_xml(b"").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Structural);
    }
}
