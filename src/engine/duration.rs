// ==========================================
// 학습 플랜 엔진 - 内容时长推导引擎
// ==========================================
// 职责: 内容分量与学习时长推导
// 分层回退: 自有记录 → 关联主目录记录 → 配置速度 → 固定兜底
// 红线: 复习日时长按 review_day_factor 折算（兜底时长同样折算）
// 红线: 时长向上取整到分钟
// ==========================================

use crate::config::planner_config::PaceConfig;
use crate::domain::content::{ContentAllocation, ContentCatalog};
use crate::domain::types::{ContentType, DayType};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// 时长/分量的来源（诊断用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationSource {
    OwnRecord,    // 自有记录
    MasterRecord, // 主目录记录
    PaceDefault,  // 配置速度
    Fallback,     // 固定兜底
}

impl fmt::Display for DurationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationSource::OwnRecord => write!(f, "own_record"),
            DurationSource::MasterRecord => write!(f, "master_record"),
            DurationSource::PaceDefault => write!(f, "pace_default"),
            DurationSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// 分配单元的时长估算
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationEstimate {
    /// 分量（页/讲/分钟）
    pub volume: u32,
    /// 学习日时长（分钟）
    pub base_minutes: u32,
    /// 按日类型折算后的时长（分钟）
    pub minutes: u32,
    pub source: DurationSource,
}

/// 分量上限校验结果
#[derive(Debug, Clone, PartialEq)]
pub struct ClampOutcome {
    pub allocation: ContentAllocation,
    pub total_volume: Option<u32>,
    pub warning: Option<String>,
}

// ==========================================
// ContentDurationResolver - 内容时长推导
// ==========================================
pub struct ContentDurationResolver {
    // 无状态引擎，速度配置通过参数传入
}

impl ContentDurationResolver {
    pub fn new() -> Self {
        Self {}
    }

    /// 推导内容总分量
    ///
    /// # 返回
    /// - Some((总分量, 来源))
    /// - None: 自有记录与主目录记录均无分量
    pub fn resolve_total_volume(
        &self,
        content_type: ContentType,
        content_id: &str,
        catalog: &ContentCatalog,
    ) -> Option<(u32, DurationSource)> {
        match content_type {
            ContentType::Book => {
                let record = catalog.books.get(content_id)?;
                record
                    .total_pages
                    .map(|v| (v, DurationSource::OwnRecord))
                    .or_else(|| {
                        catalog
                            .master_book_of(record)
                            .and_then(|m| m.total_pages)
                            .map(|v| (v, DurationSource::MasterRecord))
                    })
            }
            ContentType::Lecture => {
                let record = catalog.lectures.get(content_id)?;
                record
                    .total_episodes
                    .map(|v| (v, DurationSource::OwnRecord))
                    .or_else(|| {
                        catalog
                            .master_lecture_of(record)
                            .and_then(|m| m.total_episodes)
                            .map(|v| (v, DurationSource::MasterRecord))
                    })
            }
            ContentType::Custom => catalog
                .customs
                .get(content_id)
                .and_then(|c| c.total_minutes)
                .map(|v| (v, DurationSource::OwnRecord)),
        }
    }

    /// 分配范围超出总分量时裁剪 end_range
    pub fn clamp_to_total(
        &self,
        allocation: &ContentAllocation,
        catalog: &ContentCatalog,
    ) -> ClampOutcome {
        let total = self
            .resolve_total_volume(allocation.content_type, &allocation.content_id, catalog)
            .map(|(v, _)| v);

        let mut clamped = allocation.clone();
        let mut warning = None;
        if let Some(total) = total {
            // 教材页码从 1 开始时 end_range 可取 total + 1
            let limit = match allocation.content_type {
                ContentType::Book | ContentType::Lecture if allocation.start_range >= 1 => total + 1,
                _ => total,
            }
            .saturating_add(allocation.redistributed_volume);
            if allocation.end_range > limit {
                warn!(
                    content_id = %allocation.content_id,
                    end_range = allocation.end_range,
                    total_volume = total,
                    "分配范围超出总分量，已裁剪"
                );
                clamped.end_range = limit;
                warning = Some(format!(
                    "{}: 종료 범위 {}{}가 전체 분량 {}{}을 초과하여 조정되었습니다.",
                    allocation.content_id,
                    allocation.end_range,
                    allocation.content_type.range_unit(),
                    total,
                    allocation.content_type.range_unit()
                ));
            }
        }

        ClampOutcome {
            allocation: clamped,
            total_volume: total,
            warning,
        }
    }

    /// 估算分配单元的学习时长
    ///
    /// # 规则
    /// - 教材: 分量 ÷ pages_per_hour
    /// - 讲座: 每讲时长 × 讲数；否则主目录总时长 ÷ 讲数；否则 episodes_per_hour
    /// - 自定义: 记录中的总时长；否则固定兜底
    /// - 复习日: × review_day_factor
    pub fn estimate(
        &self,
        allocation: &ContentAllocation,
        catalog: &ContentCatalog,
        day_type: DayType,
        pace: &PaceConfig,
    ) -> DurationEstimate {
        let volume = allocation.volume();
        if volume == 0 {
            return DurationEstimate {
                volume,
                base_minutes: 0,
                minutes: 0,
                source: DurationSource::PaceDefault,
            };
        }

        let (raw_minutes, source) = self.base_minutes(allocation, volume, catalog, pace);
        let factor = if day_type == DayType::ReviewDay {
            pace.review_day_factor
        } else {
            1.0
        };

        let estimate = DurationEstimate {
            volume,
            base_minutes: raw_minutes.ceil() as u32,
            minutes: (raw_minutes * factor).ceil() as u32,
            source,
        };

        debug!(
            content_id = %allocation.content_id,
            volume,
            minutes = estimate.minutes,
            source = %source,
            day_type = %day_type,
            "时长估算"
        );
        estimate
    }

    fn base_minutes(
        &self,
        allocation: &ContentAllocation,
        volume: u32,
        catalog: &ContentCatalog,
        pace: &PaceConfig,
    ) -> (f64, DurationSource) {
        let fallback = (
            pace.fallback_duration_minutes as f64,
            DurationSource::Fallback,
        );

        match allocation.content_type {
            ContentType::Book => {
                if pace.pages_per_hour > 0.0 {
                    (volume as f64 / pace.pages_per_hour * 60.0, DurationSource::PaceDefault)
                } else {
                    fallback
                }
            }
            ContentType::Lecture => {
                let record = catalog.lectures.get(&allocation.content_id);

                if let Some(per_episode) = record
                    .and_then(|r| r.episode_duration_minutes)
                    .filter(|m| *m > 0)
                {
                    return (per_episode as f64 * volume as f64, DurationSource::OwnRecord);
                }

                if let Some(master) = record.and_then(|r| catalog.master_lecture_of(r)) {
                    if let Some(total_minutes) = master.total_duration_minutes.filter(|m| *m > 0) {
                        let episodes = master.total_episodes.filter(|e| *e > 0).unwrap_or(volume);
                        let per_episode = total_minutes as f64 / episodes as f64;
                        return (per_episode * volume as f64, DurationSource::MasterRecord);
                    }
                }

                if pace.episodes_per_hour > 0.0 {
                    (volume as f64 / pace.episodes_per_hour * 60.0, DurationSource::PaceDefault)
                } else {
                    fallback
                }
            }
            ContentType::Custom => match catalog
                .customs
                .get(&allocation.content_id)
                .and_then(|c| c.total_minutes)
                .filter(|m| *m > 0)
            {
                Some(total) => (total as f64, DurationSource::OwnRecord),
                None => fallback,
            },
        }
    }
}

impl Default for ContentDurationResolver {
    fn default() -> Self {
        Self::new()
    }
}
