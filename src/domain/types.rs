// ==========================================
// 학습 플랜 엔진 - 领域类型定义
// ==========================================
// 序列化格式: snake_case (与存储的 daily_schedule 一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 日类型 (Day Type)
// ==========================================
// 学习日/复习日可排课，其余三类为排除日
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    StudyDay,        // 학습일
    ReviewDay,       // 복습일
    ExcludedHoliday, // 지정휴일
    Vacation,        // 휴가
    PersonalLeave,   // 개인일정
}

impl DayType {
    /// 是否为学习日或复习日
    pub fn is_schedulable(&self) -> bool {
        matches!(self, DayType::StudyDay | DayType::ReviewDay)
    }

    pub fn is_excluded(&self) -> bool {
        !self.is_schedulable()
    }

    /// 从字符串解析日类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "study_day" => Some(DayType::StudyDay),
            "review_day" => Some(DayType::ReviewDay),
            "excluded_holiday" => Some(DayType::ExcludedHoliday),
            "vacation" => Some(DayType::Vacation),
            "personal_leave" => Some(DayType::PersonalLeave),
            _ => None,
        }
    }

    /// 转换为存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            DayType::StudyDay => "study_day",
            DayType::ReviewDay => "review_day",
            DayType::ExcludedHoliday => "excluded_holiday",
            DayType::Vacation => "vacation",
            DayType::PersonalLeave => "personal_leave",
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 时间槽类型 (Time Slot Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlotType {
    Study,     // 학습시간
    Lunch,     // 점심시간
    Academy,   // 학원일정
    Travel,    // 이동시간
    FreeStudy, // 자율학습
}

impl TimeSlotType {
    /// 可用于放置学习内容的槽位
    pub fn is_study_type(&self) -> bool {
        matches!(self, TimeSlotType::Study | TimeSlotType::FreeStudy)
    }
}

impl fmt::Display for TimeSlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeSlotType::Study => write!(f, "study"),
            TimeSlotType::Lunch => write!(f, "lunch"),
            TimeSlotType::Academy => write!(f, "academy"),
            TimeSlotType::Travel => write!(f, "travel"),
            TimeSlotType::FreeStudy => write!(f, "free_study"),
        }
    }
}

// ==========================================
// 排除日类型 (Exclusion Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionType {
    Vacation, // 휴가
    Personal, // 개인사정
    Holiday,  // 휴일지정
    Other,    // 기타
}

impl ExclusionType {
    /// 映射到日类型
    ///
    /// vacation/personal 有专属日类型，holiday/other 统一归为 excluded_holiday
    pub fn day_type(&self) -> DayType {
        match self {
            ExclusionType::Vacation => DayType::Vacation,
            ExclusionType::Personal => DayType::PersonalLeave,
            ExclusionType::Holiday | ExclusionType::Other => DayType::ExcludedHoliday,
        }
    }
}

impl fmt::Display for ExclusionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionType::Vacation => write!(f, "vacation"),
            ExclusionType::Personal => write!(f, "personal"),
            ExclusionType::Holiday => write!(f, "holiday"),
            ExclusionType::Other => write!(f, "other"),
        }
    }
}

// ==========================================
// 内容类型 (Content Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Book,    // 교재 (页)
    Lecture, // 강의 (讲)
    Custom,  // 커스텀
}

impl ContentType {
    /// 分量单位（用于展示）
    pub fn range_unit(&self) -> &'static str {
        match self {
            ContentType::Book => "p",
            ContentType::Lecture => "강",
            ContentType::Custom => "분",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Book => write!(f, "book"),
            ContentType::Lecture => write!(f, "lecture"),
            ContentType::Custom => write!(f, "custom"),
        }
    }
}

// ==========================================
// 约束处理方式 (Constraint Handling)
// ==========================================
// strict: 排除科目命中即阻断; advisory: 仅提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintHandling {
    Strict,
    #[default]
    Advisory,
}

impl fmt::Display for ConstraintHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintHandling::Strict => write!(f, "strict"),
            ConstraintHandling::Advisory => write!(f, "advisory"),
        }
    }
}

// ==========================================
// 再分配策略 (Redistribute Strategy)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedistributeStrategy {
    Discard,     // 丢弃剩余分量
    SameSubject, // 分摊到同科目类别的其他内容
    AllContents, // 分摊到所有其他内容
    ToAdhoc,     // 转为独立的临时任务
}

impl fmt::Display for RedistributeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedistributeStrategy::Discard => write!(f, "discard"),
            RedistributeStrategy::SameSubject => write!(f, "same_subject"),
            RedistributeStrategy::AllContents => write!(f, "all_contents"),
            RedistributeStrategy::ToAdhoc => write!(f, "to_adhoc"),
        }
    }
}

// ==========================================
// 校验问题类型 (Validation Issue Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationIssueKind {
    Excluded,            // 命中排除科目
    RequiredShortfall,   // 必修科目数量不足
    MissingPrerequisite, // 缺少先修内容
    OrderViolation,      // 先修内容顺序晚于依赖内容
    ConstraintConfig,    // 约束配置本身有问题
}

impl fmt::Display for ValidationIssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssueKind::Excluded => write!(f, "excluded"),
            ValidationIssueKind::RequiredShortfall => write!(f, "required_shortfall"),
            ValidationIssueKind::MissingPrerequisite => write!(f, "missing_prerequisite"),
            ValidationIssueKind::OrderViolation => write!(f, "order_violation"),
            ValidationIssueKind::ConstraintConfig => write!(f, "constraint_config"),
        }
    }
}

// ==========================================
// 日程来源 (Schedule Source)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleSource {
    Cached,   // 复用已存储的快照
    Computed, // 重新计算
}

impl fmt::Display for ScheduleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleSource::Cached => write!(f, "cached"),
            ScheduleSource::Computed => write!(f, "computed"),
        }
    }
}
