// ==========================================
// 학습 플랜 엔진 - 时间区间值对象
// ==========================================
// 内部表示: 当日分钟数 (0..=1440)
// 外部表示: 补零的 "HH:mm"
// 区间语义: 半开区间 [start, end)，不变式 start < end
// 不处理跨午夜，多日区间由调用方拆分
// ==========================================

use crate::error::{PlannerError, PlannerResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 一天的分钟数（允许 "24:00" 作为当日结束）
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// 解析 "HH:mm" 为当日分钟数
///
/// 时、分都必须是两位 ASCII 数字
pub fn parse_minutes(value: &str) -> PlannerResult<u32> {
    let invalid = || PlannerError::InvalidTimeFormat(value.to_string());
    let (h, m) = value.trim().split_once(':').ok_or_else(invalid)?;

    let hours = two_digits(h).ok_or_else(invalid)?;
    let minutes = two_digits(m).ok_or_else(invalid)?;
    if minutes >= 60 {
        return Err(invalid());
    }

    let total = hours * 60 + minutes;
    if total > MINUTES_PER_DAY {
        return Err(invalid());
    }
    Ok(total)
}

fn two_digits(part: &str) -> Option<u32> {
    let bytes = part.as_bytes();
    if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(u32::from(bytes[0] - b'0') * 10 + u32::from(bytes[1] - b'0'))
}

/// 分钟数格式化为 "HH:mm"
pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

// ==========================================
// TimeRange - 当日时间区间
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "TimeRangeDto", into = "TimeRangeDto")]
pub struct TimeRange {
    start: u32,
    end: u32,
}

impl TimeRange {
    /// 由分钟数构造
    ///
    /// # 返回
    /// - Err(InvalidTimeRange): start >= end 或超出当日范围
    pub fn new(start: u32, end: u32) -> PlannerResult<Self> {
        Self::from_minutes(start, end).ok_or_else(|| PlannerError::InvalidTimeRange {
            start: format_minutes(start),
            end: format_minutes(end),
        })
    }

    /// 由分钟数构造，不满足不变式时返回 None
    pub fn from_minutes(start: u32, end: u32) -> Option<Self> {
        if start < end && end <= MINUTES_PER_DAY {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// 由 "HH:mm" 字符串构造
    pub fn parse(start: &str, end: &str) -> PlannerResult<Self> {
        let s = parse_minutes(start)?;
        let e = parse_minutes(end)?;
        Self::from_minutes(s, e).ok_or_else(|| PlannerError::InvalidTimeRange {
            start: start.to_string(),
            end: end.to_string(),
        })
    }

    /// 将可能越界的窗口裁剪到当日 [0, 1440]
    ///
    /// 用于学院日程前后的通勤窗口，裁剪后为空返回 None
    pub fn clamp_to_day(start: i64, end: i64) -> Option<Self> {
        let s = start.clamp(0, MINUTES_PER_DAY as i64) as u32;
        let e = end.clamp(0, MINUTES_PER_DAY as i64) as u32;
        Self::from_minutes(s, e)
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// 区间时长（分钟）
    pub fn minutes(&self) -> u32 {
        self.end - self.start
    }

    pub fn start_str(&self) -> String {
        format_minutes(self.start)
    }

    pub fn end_str(&self) -> String {
        format_minutes(self.end)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.start_str(), self.end_str())
    }
}

/// 序列化中间结构: {"start": "HH:mm", "end": "HH:mm"}
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TimeRangeDto {
    start: String,
    end: String,
}

impl TryFrom<TimeRangeDto> for TimeRange {
    type Error = PlannerError;

    fn try_from(dto: TimeRangeDto) -> Result<Self, Self::Error> {
        TimeRange::parse(&dto.start, &dto.end)
    }
}

impl From<TimeRange> for TimeRangeDto {
    fn from(range: TimeRange) -> Self {
        TimeRangeDto {
            start: range.start_str(),
            end: range.end_str(),
        }
    }
}
