// ==========================================
// 학습 플랜 엔진 - 可用时间计算引擎
// ==========================================
// 职责: 期间 + 周时间块 + 排除日 + 学院日程 → 每日分类与可用时间
// 输入: AvailabilityInput + PlannerConfig（节奏/午餐/自习/通勤）
// 输出: DayEntry[] + ScheduleSummary + 提示
// ==========================================
// 红线: 期间内每个日期都必须产出一条 DayEntry，不得静默省略
// 红线: 期间外的排除日忽略，不报错
// 红线: 时间轴上学习槽位之和 == available_ranges 时长
// ==========================================

use crate::config::planner_config::{CadencePolicy, PlannerConfig};
use crate::domain::schedule::{
    AcademySchedule, DayEntry, Exclusion, PlanPeriod, ScheduleSummary, TimeSlot, WeeklyBlock,
};
use crate::domain::time_range::TimeRange;
use crate::domain::types::{DayType, TimeSlotType};
use crate::engine::time_algebra::{calculate_hours, calculate_minutes, intersect, merge, subtract_all};
use crate::error::{PlannerError, PlannerResult};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// 无可用时间时的备注
pub const NOTE_UNAVAILABLE: &str = "학습 불가";

// ==========================================
// 输入 / 输出
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityInput {
    pub period: PlanPeriod,
    pub blocks: Vec<WeeklyBlock>,
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
    #[serde(default)]
    pub academy_schedules: Vec<AcademySchedule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityResult {
    pub days: Vec<DayEntry>,
    pub summary: ScheduleSummary,
    /// 提示（例如重复排除日），不影响结果
    pub warnings: Vec<String>,
}

// ==========================================
// AvailabilityCalculator - 可用时间计算引擎
// ==========================================
pub struct AvailabilityCalculator {
    // 无状态引擎，配置通过参数传入
}

impl AvailabilityCalculator {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算期间内每日的分类与可用时间
    ///
    /// # 步骤
    /// 1. 校验期间/时间块/学院日程
    /// 2. 排除日索引（重复日期首条生效）
    /// 3. 按节奏分类学习日/复习日
    /// 4. 逐日生成时间轴与可用区间
    ///
    /// # 返回
    /// - Err: 期间或时间块配置无效
    #[instrument(skip(self, input, config), fields(
        period_start = %input.period.start,
        period_end = %input.period.end,
        blocks_count = input.blocks.len(),
        exclusions_count = input.exclusions.len()
    ))]
    pub fn calculate(
        &self,
        input: &AvailabilityInput,
        config: &PlannerConfig,
    ) -> PlannerResult<AvailabilityResult> {
        self.validate_input(input)?;

        let mut warnings = Vec::new();
        let exclusion_index = index_exclusions(&input.period, &input.exclusions, &mut warnings);
        let dates = input.period.dates();
        let classification = classify_days(&dates, &exclusion_index, config.cadence);

        let mut days = Vec::with_capacity(dates.len());
        for (date, (day_type, week_number)) in dates.iter().zip(classification) {
            let exclusion = exclusion_index.get(date).cloned();
            let entry = self.build_day(
                *date,
                day_type,
                week_number,
                exclusion,
                input,
                config,
                &mut warnings,
            );
            days.push(entry);
        }

        let summary =
            ScheduleSummary::from_days(&days, input.period, config.default_travel_minutes);

        info!(
            total_days = summary.total_days,
            study_days = summary.total_study_days,
            review_days = summary.total_review_days,
            study_hours = summary.total_study_hours,
            warnings = warnings.len(),
            "可用时间计算完成"
        );

        Ok(AvailabilityResult {
            days,
            summary,
            warnings,
        })
    }

    // ==========================================
    // 输入校验
    // ==========================================

    /// 校验输入
    ///
    /// # 验证规则
    /// 1. start <= end
    /// 2. 时间块不能为空，day_of_week 在 0..=6
    /// 3. 学院日程 day_of_week 在 0..=6
    pub fn validate_input(&self, input: &AvailabilityInput) -> PlannerResult<()> {
        if input.period.start > input.period.end {
            return Err(PlannerError::InvalidPeriod {
                start: input.period.start,
                end: input.period.end,
            });
        }

        if input.blocks.is_empty() {
            return Err(PlannerError::MissingBlockSet);
        }

        for block in &input.blocks {
            if block.day_of_week > 6 {
                return Err(PlannerError::InvalidBlock(format!(
                    "day_of_week={} 超出范围 0..=6 ({})",
                    block.day_of_week, block.range
                )));
            }
        }

        for academy in &input.academy_schedules {
            if academy.day_of_week > 6 {
                return Err(PlannerError::InvalidAcademySchedule(format!(
                    "day_of_week={} 超出范围 0..=6 ({})",
                    academy.day_of_week,
                    academy.label()
                )));
            }
        }

        Ok(())
    }

    // ==========================================
    // 单日计算
    // ==========================================

    fn build_day(
        &self,
        date: NaiveDate,
        day_type: DayType,
        week_number: Option<u32>,
        exclusion: Option<Exclusion>,
        input: &AvailabilityInput,
        config: &PlannerConfig,
        warnings: &mut Vec<String>,
    ) -> DayEntry {
        let weekday = date.weekday().num_days_from_sunday();
        let academies: Vec<AcademySchedule> = input
            .academy_schedules
            .iter()
            .filter(|a| a.day_of_week == weekday)
            .cloned()
            .collect();

        let (available_ranges, time_slots) = match day_type {
            DayType::StudyDay | DayType::ReviewDay => {
                let blocks = merge(
                    &input
                        .blocks
                        .iter()
                        .filter(|b| b.day_of_week == weekday)
                        .map(|b| b.range)
                        .collect::<Vec<_>>(),
                );
                self.schedulable_day(&blocks, &academies, config)
            }
            DayType::ExcludedHoliday => match config.self_study.holiday_hours {
                Some(hours) => (
                    vec![hours],
                    vec![TimeSlot::new(TimeSlotType::FreeStudy, hours)],
                ),
                None => (Vec::new(), Vec::new()),
            },
            DayType::Vacation | DayType::PersonalLeave => (Vec::new(), Vec::new()),
        };

        warnings.extend(timeline_mismatch(date, &time_slots, &available_ranges));

        let note = if available_ranges.is_empty() {
            NOTE_UNAVAILABLE.to_string()
        } else {
            available_ranges
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };

        debug!(
            date = %date,
            day_type = %day_type,
            slots = time_slots.len(),
            note = %note,
            "单日日程生成"
        );

        DayEntry {
            date,
            day_type,
            study_hours: calculate_hours(&available_ranges),
            available_ranges,
            time_slots,
            note,
            academy_schedules: academies,
            exclusion,
            week_number,
        }
    }

    /// 学习日/复习日：时间块 - 午餐 - 学院(含往返通勤)，外加自习时段
    fn schedulable_day(
        &self,
        blocks: &[TimeRange],
        academies: &[AcademySchedule],
        config: &PlannerConfig,
    ) -> (Vec<TimeRange>, Vec<TimeSlot>) {
        // 无时间块：零时长、无槽位
        if blocks.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let mut obstacles: Vec<TimeRange> = Vec::new();
        if let Some(lunch) = config.lunch_time {
            obstacles.push(lunch);
        }
        for academy in academies {
            let travel = academy.travel_or(config.default_travel_minutes) as i64;
            let start = academy.range.start() as i64;
            let end = academy.range.end() as i64;
            obstacles.extend(TimeRange::clamp_to_day(start - travel, end + travel));
        }

        let mut time_slots: Vec<TimeSlot> = Vec::new();
        for block in blocks {
            time_slots.extend(build_block_timeline(block, config.lunch_time, academies, config));
        }
        let study_ranges = subtract_all(blocks, &obstacles);

        // 自习：不与时间块和学院日程重叠的部分
        let mut free_ranges = Vec::new();
        if let Some(self_study) = config.self_study.study_day_hours {
            let mut occupied = blocks.to_vec();
            occupied.extend(obstacles.iter().filter(|o| Some(**o) != config.lunch_time));
            free_ranges = subtract_all(&[self_study], &occupied);
            time_slots.extend(
                free_ranges
                    .iter()
                    .map(|r| TimeSlot::new(TimeSlotType::FreeStudy, *r)),
            );
        }

        time_slots.sort_by_key(|s| (s.range.start(), s.range.end()));

        let mut available = study_ranges;
        available.extend(free_ranges);
        (merge(&available), time_slots)
    }
}

impl Default for AvailabilityCalculator {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 期间内排除日索引，重复日期首条生效并记录提示
/// 时间轴学习槽位与可用区间时长不一致时返回提示
fn timeline_mismatch(
    date: NaiveDate,
    time_slots: &[TimeSlot],
    available_ranges: &[TimeRange],
) -> Option<String> {
    let slot_minutes: u32 = time_slots
        .iter()
        .filter(|s| s.slot_type.is_study_type())
        .map(|s| s.range.minutes())
        .sum();
    let range_minutes = calculate_minutes(available_ranges);
    if slot_minutes == range_minutes {
        return None;
    }

    warn!(date = %date, slot_minutes, range_minutes, "时间轴与可用区间时长不一致");
    Some(format!(
        "{}: 타임라인 학습 시간({}분)과 가용 시간({}분)이 일치하지 않습니다.",
        date, slot_minutes, range_minutes
    ))
}

fn index_exclusions(
    period: &PlanPeriod,
    exclusions: &[Exclusion],
    warnings: &mut Vec<String>,
) -> HashMap<NaiveDate, Exclusion> {
    let mut index: HashMap<NaiveDate, Exclusion> = HashMap::new();
    for exclusion in exclusions {
        if !period.contains(exclusion.exclusion_date) {
            debug!(date = %exclusion.exclusion_date, "排除日不在期间内，忽略");
            continue;
        }
        if index.contains_key(&exclusion.exclusion_date) {
            warn!(date = %exclusion.exclusion_date, "重复的排除日，保留首条");
            warnings.push(format!(
                "{}: 중복된 제외일이 있습니다.",
                exclusion.exclusion_date
            ));
            continue;
        }
        index.insert(exclusion.exclusion_date, exclusion.clone());
    }
    index
}

/// 按节奏分类
///
/// Cycle: 非排除日依次编号，周期内位置 < study_days 为学习日，否则复习日；
/// 排除日沿用当前周期编号
fn classify_days(
    dates: &[NaiveDate],
    exclusions: &HashMap<NaiveDate, Exclusion>,
    cadence: CadencePolicy,
) -> Vec<(DayType, Option<u32>)> {
    let mut position: u32 = 0;
    let mut current_week: u32 = 1;

    dates
        .iter()
        .map(|date| {
            if let Some(exclusion) = exclusions.get(date) {
                let week = match cadence {
                    CadencePolicy::AllStudy => None,
                    CadencePolicy::Cycle { .. } => Some(current_week),
                };
                return (exclusion.exclusion_type.day_type(), week);
            }

            match cadence {
                CadencePolicy::AllStudy => (DayType::StudyDay, None),
                CadencePolicy::Cycle {
                    study_days,
                    review_days,
                } => {
                    let cycle_len = (study_days + review_days).max(1);
                    current_week = position / cycle_len + 1;
                    let day_type = if position % cycle_len < study_days {
                        DayType::StudyDay
                    } else {
                        DayType::ReviewDay
                    };
                    position += 1;
                    (day_type, Some(current_week))
                }
            }
        })
        .collect()
}

/// 单个时间块的时间轴
///
/// 午餐、学院日程及其前后通勤按时间排布（裁剪到时间块内），空隙为学习槽位
fn build_block_timeline(
    block: &TimeRange,
    lunch: Option<TimeRange>,
    academies: &[AcademySchedule],
    config: &PlannerConfig,
) -> Vec<TimeSlot> {
    let mut segments: Vec<TimeSlot> = Vec::new();

    if let Some(lunch_range) = lunch.and_then(|l| intersect(block, &l)) {
        segments.push(TimeSlot::new(TimeSlotType::Lunch, lunch_range));
    }

    for academy in academies {
        let travel = academy.travel_or(config.default_travel_minutes) as i64;
        let start = academy.range.start() as i64;
        let end = academy.range.end() as i64;

        let before = TimeRange::clamp_to_day(start - travel, start);
        let after = TimeRange::clamp_to_day(end, end + travel);

        if let Some(r) = before.and_then(|t| intersect(block, &t)) {
            segments.push(TimeSlot::new(TimeSlotType::Travel, r));
        }
        if let Some(r) = intersect(block, &academy.range) {
            segments.push(TimeSlot {
                slot_type: TimeSlotType::Academy,
                range: r,
                label: Some(academy.label()),
            });
        }
        if let Some(r) = after.and_then(|t| intersect(block, &t)) {
            segments.push(TimeSlot::new(TimeSlotType::Travel, r));
        }
    }

    segments.sort_by_key(|s| (s.range.start(), s.range.end()));

    // 相同类型+标签且相接/重叠的片段合并
    let mut merged: Vec<TimeSlot> = Vec::with_capacity(segments.len());
    for segment in segments {
        if let Some(last) = merged.last_mut() {
            if last.slot_type == segment.slot_type
                && last.label == segment.label
                && last.range.end() >= segment.range.start()
            {
                if let Some(joined) = TimeRange::from_minutes(
                    last.range.start(),
                    last.range.end().max(segment.range.end()),
                ) {
                    last.range = joined;
                }
                continue;
            }
        }
        merged.push(segment);
    }

    let mut slots = Vec::with_capacity(merged.len() * 2 + 1);
    let mut cursor = block.start();
    for segment in merged {
        if let Some(gap) = TimeRange::from_minutes(cursor, segment.range.start()) {
            slots.push(TimeSlot::new(TimeSlotType::Study, gap));
        }
        cursor = cursor.max(segment.range.end());
        slots.push(segment);
    }
    if let Some(tail) = TimeRange::from_minutes(cursor, block.end()) {
        slots.push(TimeSlot::new(TimeSlotType::Study, tail));
    }
    slots
}
