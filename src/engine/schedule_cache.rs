// ==========================================
// 학습 플랜 엔진 - 日程快照复用
// ==========================================
// 职责: 判断已存储的 DayEntry 序列是否可复用
//       可复用 → 直接聚合汇总；否则 → 重新计算
// 红线: 快照无效永远不是错误，静默回退到重新计算
// 红线: 复用与重新计算的输出必须一致
// ==========================================

use crate::config::planner_config::PlannerConfig;
use crate::domain::schedule::{DayEntry, PlanPeriod, ScheduleSummary};
use crate::domain::types::ScheduleSource;
use crate::engine::availability::{AvailabilityCalculator, AvailabilityInput};
use crate::error::PlannerResult;
use chrono::NaiveDate;
use std::fmt;
use tracing::{debug, info, instrument};

// ==========================================
// CacheInvalidReason - 快照失效原因
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheInvalidReason {
    /// 无快照
    Missing,
    /// 空序列
    Empty,
    /// 反序列化失败（缺少 date / day_type 等）
    Malformed(String),
    /// 学习日/复习日没有任何槽位
    MissingSlots { date: NaiveDate },
    /// 首尾日期与请求期间不一致
    PeriodMismatch {
        first: NaiveDate,
        last: NaiveDate,
    },
    /// 日期未严格递增（乱序或重复）
    NotStrictlyIncreasing { date: NaiveDate },
}

impl fmt::Display for CacheInvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheInvalidReason::Missing => write!(f, "无快照"),
            CacheInvalidReason::Empty => write!(f, "快照为空"),
            CacheInvalidReason::Malformed(e) => write!(f, "快照格式错误: {}", e),
            CacheInvalidReason::MissingSlots { date } => {
                write!(f, "{} 为学习日/复习日但没有槽位", date)
            }
            CacheInvalidReason::PeriodMismatch { first, last } => {
                write!(f, "快照期间 {}~{} 与请求期间不一致", first, last)
            }
            CacheInvalidReason::NotStrictlyIncreasing { date } => {
                write!(f, "{} 处日期乱序或重复", date)
            }
        }
    }
}

/// 复用/计算后的日程
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledSchedule {
    pub days: Vec<DayEntry>,
    pub summary: ScheduleSummary,
    pub source: ScheduleSource,
    /// 仅重新计算时可能产生（例如重复排除日）
    pub warnings: Vec<String>,
    /// 回退到重新计算的原因
    pub invalid_reason: Option<CacheInvalidReason>,
}

// ==========================================
// ScheduleCacheReconciler
// ==========================================
pub struct ScheduleCacheReconciler {
    calculator: AvailabilityCalculator,
}

impl ScheduleCacheReconciler {
    pub fn new() -> Self {
        Self {
            calculator: AvailabilityCalculator::new(),
        }
    }

    /// 复用快照或重新计算
    ///
    /// # 参数
    /// - `cached`: 已存储的 DayEntry[] JSON
    /// - `input`: 本次请求的期间/时间块/排除日/学院日程
    ///
    /// # 返回
    /// - Err: 仅当输入本身无效（与重新计算时一致）
    #[instrument(skip(self, cached, input, config), fields(
        has_cache = cached.is_some(),
        period_start = %input.period.start,
        period_end = %input.period.end
    ))]
    pub fn reconcile(
        &self,
        cached: Option<&str>,
        input: &AvailabilityInput,
        config: &PlannerConfig,
    ) -> PlannerResult<ReconciledSchedule> {
        // 无效输入不能因为命中快照而被放过
        self.calculator.validate_input(input)?;

        match self.load(cached, &input.period) {
            Ok(days) => {
                let summary =
                    ScheduleSummary::from_days(&days, input.period, config.default_travel_minutes);
                info!(days = days.len(), "复用日程快照");
                Ok(ReconciledSchedule {
                    days,
                    summary,
                    source: ScheduleSource::Cached,
                    warnings: Vec::new(),
                    invalid_reason: None,
                })
            }
            Err(reason) => {
                info!(reason = %reason, "日程快照不可用，重新计算");
                let computed = self.calculator.calculate(input, config)?;
                Ok(ReconciledSchedule {
                    days: computed.days,
                    summary: computed.summary,
                    source: ScheduleSource::Computed,
                    warnings: computed.warnings,
                    invalid_reason: Some(reason),
                })
            }
        }
    }

    /// 解析并校验快照
    pub fn load(
        &self,
        cached: Option<&str>,
        period: &PlanPeriod,
    ) -> Result<Vec<DayEntry>, CacheInvalidReason> {
        let raw = cached.ok_or(CacheInvalidReason::Missing)?;
        let days: Vec<DayEntry> = serde_json::from_str(raw)
            .map_err(|e| CacheInvalidReason::Malformed(e.to_string()))?;
        self.check(&days, period)?;
        Ok(days)
    }

    /// 快照有效性
    ///
    /// # 验证规则
    /// 1. 非空
    /// 2. 学习日/复习日至少有一个槽位
    /// 3. 日期严格递增
    /// 4. 首尾日期等于请求期间
    pub fn check(&self, days: &[DayEntry], period: &PlanPeriod) -> Result<(), CacheInvalidReason> {
        let (Some(first), Some(last)) = (days.first(), days.last()) else {
            return Err(CacheInvalidReason::Empty);
        };

        for day in days {
            if day.day_type.is_schedulable() && day.time_slots.is_empty() {
                return Err(CacheInvalidReason::MissingSlots { date: day.date });
            }
        }

        for pair in days.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(CacheInvalidReason::NotStrictlyIncreasing { date: pair[1].date });
            }
        }

        if first.date != period.start || last.date != period.end {
            return Err(CacheInvalidReason::PeriodMismatch {
                first: first.date,
                last: last.date,
            });
        }

        debug!(days = days.len(), "日程快照校验通过");
        Ok(())
    }
}

impl Default for ScheduleCacheReconciler {
    fn default() -> Self {
        Self::new()
    }
}
