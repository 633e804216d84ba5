// ==========================================
// 학습 플랜 엔진 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 口径: 只有真正的阻断条件才返回 Err
//       提示类条件一律放入 warnings
// ==========================================

use chrono::NaiveDate;
use thiserror::Error;

/// 引擎错误类型
/// 所有错误信息必须包含显式原因（可定位到具体输入）
#[derive(Error, Debug)]
pub enum PlannerError {
    // ==========================================
    // 配置错误（缺失/格式错误的输入）
    // ==========================================
    #[error("无效的计划期间: start={start}, end={end}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },

    #[error("无效的时间格式: {0} (期望 HH:mm)")]
    InvalidTimeFormat(String),

    #[error("无效的时间区间: start={start}, end={end} (要求 start < end)")]
    InvalidTimeRange { start: String, end: String },

    #[error("缺少周时间块配置 (block set 为空)")]
    MissingBlockSet,

    #[error("无效的时间块: {0}")]
    InvalidBlock(String),

    #[error("无效的学院日程: {0}")]
    InvalidAcademySchedule(String),

    #[error("无效的引擎配置: {0}")]
    InvalidConfig(String),

    #[error("无效的先修依赖: {0}")]
    InvalidDependency(String),

    // ==========================================
    // 阻断型约束违反
    // ==========================================
    /// strict 模式下命中排除科目，必须阻止落库
    #[error("排除科目约束违反: subject={subject}, contents={content_ids:?}")]
    BlockingConstraintViolation {
        subject: String,
        content_ids: Vec<String>,
    },
}

/// Result 类型别名
pub type PlannerResult<T> = Result<T, PlannerError>;
