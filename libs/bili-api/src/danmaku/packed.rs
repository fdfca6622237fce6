use std::{fmt::Display, str::FromStr};

use serde::Serialize;

/// Number of positional fields every `p` attribute must carry, up to the
/// danmaku id. The trailing weight field was added later and is optional.
pub const REQUIRED_FIELDS: usize = 8;

/// One `<d>` element as served by `/x/v1/dm/list.so`.
///
/// `p="12.34,1,25,16777215,1660000000,0,8e1f5a6b,1122334455667788,10"`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DanmakuData {
    /// Position in the video, seconds
    pub time: f64,
    pub mode: i32,
    pub size: i32,
    /// Decimal RGB
    pub color: u32,
    /// Unix seconds the comment was sent
    pub timestamp: i64,
    // 0 normal, 1 subtitle, 2 special
    pub pool: i32,
    /// crc32 of the sender mid
    pub mid_hash: String,
    pub dmid: i64,
    pub weight: Option<i32>,
    pub text: String,
}

impl DanmakuData {
    pub fn from_packed(p: &str, text: &str) -> Result<Self, String> {
        let fields: Vec<&str> = p.split(',').collect();
        if fields.len() < REQUIRED_FIELDS {
            return Err(format!(
                "expected {REQUIRED_FIELDS} fields, got {} in {p:?}",
                fields.len()
            ));
        }

        let time: f64 = parse_field(&fields, 0, "time")?;
        if !time.is_finite() || time < 0.0 {
            return Err(format!("time out of range: {time}"));
        }
        let size: i32 = parse_field(&fields, 2, "size")?;
        if size <= 0 {
            return Err(format!("font size must be positive: {size}"));
        }

        Ok(Self {
            time,
            mode: parse_field(&fields, 1, "mode")?,
            size,
            color: parse_field(&fields, 3, "color")?,
            timestamp: parse_field(&fields, 4, "timestamp")?,
            pool: parse_field(&fields, 5, "pool")?,
            mid_hash: fields[6].to_string(),
            dmid: parse_field(&fields, 7, "dmid")?,
            weight: fields.get(8).and_then(|w| w.trim().parse().ok()),
            text: text.to_string(),
        })
    }
}

fn parse_field<T>(fields: &[&str], index: usize, name: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = fields
        .get(index)
        .ok_or_else(|| format!("{name} is missing"))?;
    raw.trim()
        .parse()
        .map_err(|e| format!("{name} {raw:?} is invalid: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_record() {
        let data = DanmakuData::from_packed(
            "12.34,1,25,16777215,1660000000,0,8e1f5a6b,1122334455667788,10",
            "前方高能",
        )
        .unwrap();
        assert_eq!(data.time, 12.34);
        assert_eq!(data.mode, 1);
        assert_eq!(data.size, 25);
        assert_eq!(data.color, 16777215);
        assert_eq!(data.timestamp, 1660000000);
        assert_eq!(data.pool, 0);
        assert_eq!(data.mid_hash, "8e1f5a6b");
        assert_eq!(data.dmid, 1122334455667788);
        assert_eq!(data.weight, Some(10));
        assert_eq!(data.text, "前方高能");
    }

    #[test]
    fn weight_is_optional() {
        let data =
            DanmakuData::from_packed("0.5,4,18,255,1312863760,0,eff85771,42759017", "").unwrap();
        assert_eq!(data.weight, None);
        assert_eq!(data.dmid, 42759017);
    }

    #[test]
    fn reject_short_record() {
        let err = DanmakuData::from_packed("1.0,1,25", "x").unwrap_err();
        assert!(err.contains("expected 8 fields"));
    }

    #[test]
    fn reject_bad_fields() {
        assert!(DanmakuData::from_packed("abc,1,25,0,0,0,h,1", "x").is_err());
        assert!(DanmakuData::from_packed("-1.5,1,25,0,0,0,h,1", "x").is_err());
        assert!(DanmakuData::from_packed("1.5,1,0,0,0,0,h,1", "x").is_err());
        assert!(DanmakuData::from_packed("1.5,1,25,-3,0,0,h,1", "x").is_err());
        assert!(DanmakuData::from_packed("1.5,1,25,0,0,0,h,", "x").is_err());
    }
}
