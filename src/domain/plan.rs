// ==========================================
// 학습 플랜 엔진 - 计划明细领域模型
// ==========================================
// 职责: 分配器产出的时间段 / 每日计划 / 期末未排分量
// 红线: 同一内容的时间段按时间排序后，总时长等于其生成时的估算时长
// ==========================================

use crate::domain::content::ContentAllocation;
use crate::domain::time_range::TimeRange;
use crate::domain::types::{ContentType, DayType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// PlanTimeSegment - 时间段
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTimeSegment {
    // ===== 来源分配单元 =====
    pub content_id: String,
    pub content_type: ContentType,
    pub subject_category: Option<String>,
    pub start_range: u32,
    pub end_range: u32,

    // ===== 落位 =====
    pub range: TimeRange,

    // ===== 标志 =====
    pub is_partial: bool,   // 后续还有剩余
    pub is_continued: bool, // 延续之前的时间段

    // ===== 时长 =====
    /// 本次排程的工作时长（复习日均分后可能小于原估算）
    pub estimated_minutes: u32,
    /// 原始估算时长（展示用）
    pub original_estimated_minutes: u32,
}

impl PlanTimeSegment {
    pub fn new(
        allocation: &ContentAllocation,
        range: TimeRange,
        is_partial: bool,
        is_continued: bool,
        estimated_minutes: u32,
        original_estimated_minutes: u32,
    ) -> Self {
        Self {
            content_id: allocation.content_id.clone(),
            content_type: allocation.content_type,
            subject_category: allocation.subject_category.clone(),
            start_range: allocation.start_range,
            end_range: allocation.end_range,
            range,
            is_partial,
            is_continued,
            estimated_minutes,
            original_estimated_minutes,
        }
    }

    pub fn minutes(&self) -> u32 {
        self.range.minutes()
    }

    /// 是否因复习日均分而缩短
    pub fn is_equalized(&self) -> bool {
        self.estimated_minutes < self.original_estimated_minutes
    }
}

// ==========================================
// DailyPlan - 单日计划
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPlan {
    pub date: NaiveDate,
    pub day_type: DayType,
    pub segments: Vec<PlanTimeSegment>,
}

impl DailyPlan {
    pub fn total_minutes(&self) -> u32 {
        self.segments.iter().map(|s| s.minutes()).sum()
    }
}

// ==========================================
// UnscheduledContent - 期末仍未排入的分量
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnscheduledContent {
    pub content_id: String,
    pub remaining_minutes: u32,
    /// 最后一次尝试排入的日期
    pub last_attempted: Option<NaiveDate>,
}
