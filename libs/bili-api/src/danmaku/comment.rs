use serde::Serialize;

use super::DanmakuData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisplayMode {
    Scrolling,
    FixedTop,
    FixedBottom,
}

impl DisplayMode {
    /// Maps the `mode` field of a packed record. Reverse, advanced and code
    /// danmaku have no dedicated lane and fall back to scrolling.
    pub fn from_code(code: i32) -> Self {
        match code {
            4 => DisplayMode::FixedTop,
            5 => DisplayMode::FixedBottom,
            _ => DisplayMode::Scrolling,
        }
    }
}

/// A danmaku ready to be handed to an overlay renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    pub id: i64,
    pub time_offset_millis: u64,
    pub text: String,
    pub display_mode: DisplayMode,
    pub font_size: u32,
    /// 0xRRGGBB
    pub color: u32,
}

impl CommentRecord {
    pub fn rgb(&self) -> [u8; 3] {
        [
            (self.color >> 16) as u8,
            (self.color >> 8) as u8,
            self.color as u8,
        ]
    }
}

impl From<&DanmakuData> for CommentRecord {
    fn from(data: &DanmakuData) -> Self {
        Self {
            id: data.dmid,
            time_offset_millis: (data.time * 1000.0).round() as u64,
            text: data.text.clone(),
            display_mode: DisplayMode::from_code(data.mode),
            font_size: data.size.unsigned_abs(),
            color: data.color & 0xFF_FFFF,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(time: f64, mode: i32, color: u32) -> DanmakuData {
        DanmakuData {
            time,
            mode,
            size: 25,
            color,
            timestamp: 0,
            pool: 0,
            mid_hash: "0".to_string(),
            dmid: 7,
            weight: None,
            text: "hi".to_string(),
        }
    }

    #[test]
    fn display_mode_mapping() {
        assert_eq!(DisplayMode::from_code(4), DisplayMode::FixedTop);
        assert_eq!(DisplayMode::from_code(5), DisplayMode::FixedBottom);
        for code in [0, 1, 2, 3, 6, 7, 8, 9, -1] {
            assert_eq!(DisplayMode::from_code(code), DisplayMode::Scrolling);
        }
    }

    #[test]
    fn fractional_seconds_are_rounded() {
        assert_eq!(CommentRecord::from(&data(12.34, 1, 0)).time_offset_millis, 12340);
        assert_eq!(CommentRecord::from(&data(0.0005, 1, 0)).time_offset_millis, 1);
        assert_eq!(CommentRecord::from(&data(3.0, 1, 0)).time_offset_millis, 3000);
        assert_eq!(CommentRecord::from(&data(1.2344, 1, 0)).time_offset_millis, 1234);
    }

    #[test]
    fn color_is_masked_to_rgb() {
        let record = CommentRecord::from(&data(1.0, 1, 0xFF12_3456));
        assert_eq!(record.color, 0x12_3456);
        assert_eq!(record.rgb(), [0x12, 0x34, 0x56]);
    }
}
