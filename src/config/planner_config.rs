use crate::domain::schedule::DEFAULT_TRAVEL_MINUTES;
use crate::domain::time_range::TimeRange;
use crate::error::{PlannerError, PlannerResult};
use serde::{Deserialize, Serialize};

/// 引擎配置（显式贯穿每次调用，不使用模块级常量）
///
/// 存储位置：config_kv（scope_id='global'，key='planner_config'）或逐项覆写
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// 学习速度与复习日折扣
    #[serde(default)]
    pub pace: PaceConfig,

    /// 学习日/复习日节奏
    #[serde(default)]
    pub cadence: CadencePolicy,

    /// 午餐时间（None 表示不扣除）
    #[serde(default = "default_lunch_time")]
    pub lunch_time: Option<TimeRange>,

    /// 学院日程单程通勤默认值（分钟）
    #[serde(default = "default_travel_minutes")]
    pub default_travel_minutes: u32,

    /// 自习时段
    #[serde(default)]
    pub self_study: SelfStudyConfig,

    /// 单日装箱模式
    #[serde(default)]
    pub packing_mode: PackingMode,

    /// 再分配时的分摊方式
    #[serde(default)]
    pub distribution_mode: DistributionMode,

    /// 当日未排完的分量是否顺延到下一个可排日
    #[serde(default = "default_true")]
    pub carry_over_unplaced: bool,
}

/// 学习速度配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaceConfig {
    /// 教材：每小时页数
    #[serde(default = "default_pages_per_hour")]
    pub pages_per_hour: f64,

    /// 讲座：每小时讲数（无时长数据时使用）
    #[serde(default = "default_episodes_per_hour")]
    pub episodes_per_hour: f64,

    /// 复习日时长折扣（0~1）
    #[serde(default = "default_review_day_factor")]
    pub review_day_factor: f64,

    /// 无法推导时长时的固定兜底（分钟）
    #[serde(default = "default_fallback_duration_minutes")]
    pub fallback_duration_minutes: u32,
}

/// 学习日/复习日节奏
///
/// Cycle：非排除日依次编号，每 study_days + review_days 天为一个周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CadencePolicy {
    #[default]
    AllStudy,
    Cycle { study_days: u32, review_days: u32 },
}

/// 自习时段配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelfStudyConfig {
    /// 学习日/复习日追加的自习时段
    #[serde(default)]
    pub study_day_hours: Option<TimeRange>,

    /// 指定休息日保留的自习时段
    #[serde(default)]
    pub holiday_hours: Option<TimeRange>,
}

/// 单日装箱模式
///
/// - Proportional：每个内容按各自估算时长装箱
/// - Equalized：复习日估算总和超出可用时间时，改为均分可用时间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackingMode {
    Proportional,
    #[default]
    Equalized,
}

/// 再分配分摊方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMode {
    /// 均分（余数给排在前面的接收方）
    #[default]
    Even,
    /// 按接收方现有分量比例（最大余数法）
    Proportional,
}

fn default_pages_per_hour() -> f64 {
    10.0
}

fn default_episodes_per_hour() -> f64 {
    1.0
}

fn default_review_day_factor() -> f64 {
    0.5
}

fn default_fallback_duration_minutes() -> u32 {
    60
}

fn default_lunch_time() -> Option<TimeRange> {
    TimeRange::from_minutes(12 * 60, 13 * 60)
}

fn default_travel_minutes() -> u32 {
    DEFAULT_TRAVEL_MINUTES
}

fn default_true() -> bool {
    true
}

impl Default for PaceConfig {
    fn default() -> Self {
        Self {
            pages_per_hour: default_pages_per_hour(),
            episodes_per_hour: default_episodes_per_hour(),
            review_day_factor: default_review_day_factor(),
            fallback_duration_minutes: default_fallback_duration_minutes(),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            pace: PaceConfig::default(),
            cadence: CadencePolicy::default(),
            lunch_time: default_lunch_time(),
            default_travel_minutes: default_travel_minutes(),
            self_study: SelfStudyConfig::default(),
            packing_mode: PackingMode::default(),
            distribution_mode: DistributionMode::default(),
            carry_over_unplaced: true,
        }
    }
}

impl PlannerConfig {
    /// 校验配置有效性
    ///
    /// # 验证规则
    /// 1. 速度必须为有限正数
    /// 2. 复习日折扣在 (0, 1] 内
    /// 3. Cycle 节奏的学习日数 > 0
    pub fn validate(&self) -> PlannerResult<()> {
        let pace = &self.pace;
        if !pace.pages_per_hour.is_finite() || pace.pages_per_hour <= 0.0 {
            return Err(PlannerError::InvalidConfig(format!(
                "pages_per_hour 必须为正数: {}",
                pace.pages_per_hour
            )));
        }
        if !pace.episodes_per_hour.is_finite() || pace.episodes_per_hour <= 0.0 {
            return Err(PlannerError::InvalidConfig(format!(
                "episodes_per_hour 必须为正数: {}",
                pace.episodes_per_hour
            )));
        }
        if !pace.review_day_factor.is_finite()
            || pace.review_day_factor <= 0.0
            || pace.review_day_factor > 1.0
        {
            return Err(PlannerError::InvalidConfig(format!(
                "review_day_factor 超出有效范围 (0, 1]: {}",
                pace.review_day_factor
            )));
        }
        if let CadencePolicy::Cycle { study_days, .. } = self.cadence {
            if study_days == 0 {
                return Err(PlannerError::InvalidConfig(
                    "cycle 节奏的 study_days 必须大于 0".to_string(),
                ));
            }
        }
        Ok(())
    }
}
