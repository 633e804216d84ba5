// ==========================================
// 학습 플랜 엔진 - 引擎编排器
// ==========================================
// 用途: 协调日程、校验、时长估算、装箱与再分配的执行顺序
// 红线: 单次调用纯计算，不做任何 I/O
// 红线: 只有阻断条件返回 Err，提示统一进入 warnings
// ==========================================

use crate::config::planner_config::PlannerConfig;
use crate::domain::constraint::{ContentDependency, SubjectConstraints, ValidationResult};
use crate::domain::content::{ContentAllocation, ContentCatalog, DeletedContent, PlanContent};
use crate::domain::plan::{DailyPlan, PlanTimeSegment, UnscheduledContent};
use crate::domain::schedule::{
    AcademySchedule, DayEntry, Exclusion, PlanPeriod, ScheduleSummary, WeeklyBlock,
};
use crate::domain::types::{DayType, ScheduleSource};
use crate::engine::allocator::{ContentSlotAllocator, PackingItem};
use crate::engine::availability::AvailabilityInput;
use crate::engine::constraint::SubjectConstraintValidator;
use crate::engine::dependency::DependencyValidator;
use crate::engine::duration::ContentDurationResolver;
use crate::engine::redistribution::{
    RedistributeOptions, RedistributionEngine, RedistributionResult,
};
use crate::engine::schedule_cache::ScheduleCacheReconciler;
use crate::error::PlannerResult;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

// ==========================================
// PlanGenerationRequest - 生成请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanGenerationRequest {
    pub period: PlanPeriod,
    pub blocks: Vec<WeeklyBlock>,
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
    #[serde(default)]
    pub academy_schedules: Vec<AcademySchedule>,
    /// 计划内容清单（为空时由分配单元推导）
    #[serde(default)]
    pub contents: Vec<PlanContent>,
    pub allocations: Vec<ContentAllocation>,
    #[serde(default)]
    pub catalog: ContentCatalog,
    #[serde(default)]
    pub constraints: SubjectConstraints,
    #[serde(default)]
    pub dependencies: Vec<ContentDependency>,
}

impl PlanGenerationRequest {
    pub fn availability_input(&self) -> AvailabilityInput {
        AvailabilityInput {
            period: self.period,
            blocks: self.blocks.clone(),
            exclusions: self.exclusions.clone(),
            academy_schedules: self.academy_schedules.clone(),
        }
    }

    /// 校验用内容清单
    ///
    /// 未显式给出时按分配单元首次出现的顺序推导（display_order 从 1 开始）
    pub fn plan_contents(&self) -> Vec<PlanContent> {
        if !self.contents.is_empty() {
            return self.contents.clone();
        }

        let mut contents: Vec<PlanContent> = Vec::new();
        for allocation in &self.allocations {
            if contents.iter().any(|c| c.content_id == allocation.content_id) {
                continue;
            }
            contents.push(PlanContent {
                content_id: allocation.content_id.clone(),
                content_type: allocation.content_type,
                title: None,
                subject: allocation.subject.clone(),
                subject_category: allocation.subject_category.clone(),
                display_order: contents.len() as u32 + 1,
            });
        }
        contents
    }
}

// ==========================================
// PlanGenerationResult - 生成结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanGenerationResult {
    /// 持久化后供下次复用
    pub daily_schedule: Vec<DayEntry>,
    pub summary: ScheduleSummary,
    pub daily_plans: Vec<DailyPlan>,
    pub warnings: Vec<String>,
    pub validation: ValidationResult,
    pub schedule_source: ScheduleSource,
    /// 期末仍未排入的分量
    pub unscheduled: Vec<UnscheduledContent>,
}

/// 删除内容后的重新生成结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRemovalResult {
    pub redistribution: RedistributionResult,
    /// 应用再分配后的请求
    pub request_allocations: Vec<ContentAllocation>,
    pub plan: PlanGenerationResult,
}

/// 顺延中的剩余项
struct CarriedItem {
    item: PackingItem,
    last_attempted: NaiveDate,
}

/// 逐日装箱输出
struct PackingOutcome {
    daily_plans: Vec<DailyPlan>,
    unscheduled: Vec<UnscheduledContent>,
    warnings: Vec<String>,
}

// ==========================================
// PlanGenerator - 计划生成编排器
// ==========================================
pub struct PlanGenerator {
    reconciler: ScheduleCacheReconciler,
    constraint_validator: SubjectConstraintValidator,
    dependency_validator: DependencyValidator,
    resolver: ContentDurationResolver,
    allocator: ContentSlotAllocator,
    redistribution: RedistributionEngine,
}

impl PlanGenerator {
    pub fn new() -> Self {
        Self {
            reconciler: ScheduleCacheReconciler::new(),
            constraint_validator: SubjectConstraintValidator::new(),
            dependency_validator: DependencyValidator::new(),
            resolver: ContentDurationResolver::new(),
            allocator: ContentSlotAllocator::new(),
            redistribution: RedistributionEngine::new(),
        }
    }

    /// 执行完整生成流程
    ///
    /// # 参数
    /// - `request`: 期间/时间块/排除日/学院日程 + 内容与约束
    /// - `cached`: 已存储的日程快照（DayEntry[] JSON）
    /// - `config`: 引擎配置
    ///
    /// # 返回
    /// - Err: 配置错误或 strict 排除科目命中
    #[instrument(skip(self, request, cached, config), fields(
        period_start = %request.period.start,
        period_end = %request.period.end,
        allocations_count = request.allocations.len()
    ))]
    pub fn generate(
        &self,
        request: &PlanGenerationRequest,
        cached: Option<&str>,
        config: &PlannerConfig,
    ) -> PlannerResult<PlanGenerationResult> {
        info!("开始生成学习计划");

        // ==========================================
        // 步骤1: 配置校验 + 日程（复用快照或重新计算）
        // ==========================================
        config.validate()?;
        let schedule = self
            .reconciler
            .reconcile(cached, &request.availability_input(), config)?;
        let mut warnings = schedule.warnings.clone();

        // ==========================================
        // 步骤2: 科目约束（strict 命中即阻断）
        // ==========================================
        let contents = request.plan_contents();
        let mut validation = self
            .constraint_validator
            .validate(&contents, &request.constraints);
        self.constraint_validator.ensure_not_blocked(&validation)?;

        // ==========================================
        // 步骤3: 先修依赖（仅提示）
        // ==========================================
        let content_ids: Vec<String> = contents.iter().map(|c| c.content_id.clone()).collect();
        let edges = self
            .dependency_validator
            .relevant_dependencies(&content_ids, &request.dependencies);
        validation.merge(self.dependency_validator.validate(&contents, &edges));

        // ==========================================
        // 步骤4: 分配范围裁剪
        // ==========================================
        let mut allocations = Vec::with_capacity(request.allocations.len());
        for allocation in &request.allocations {
            let outcome = self.resolver.clamp_to_total(allocation, &request.catalog);
            warnings.extend(outcome.warning);
            if outcome.allocation.volume() == 0 {
                debug!(content_id = %allocation.content_id, "分量为 0，跳过");
                continue;
            }
            allocations.push(outcome.allocation);
        }

        // ==========================================
        // 步骤5: 逐日装箱
        // ==========================================
        let packing = self.pack_days(&schedule.days, &allocations, &request.catalog, config);
        warnings.extend(packing.warnings);

        info!(
            source = %schedule.source,
            plan_days = packing.daily_plans.len(),
            unscheduled = packing.unscheduled.len(),
            warnings = warnings.len(),
            validation_warnings = validation.warnings.len(),
            "学习计划生成完成"
        );

        Ok(PlanGenerationResult {
            daily_schedule: schedule.days,
            summary: schedule.summary,
            daily_plans: packing.daily_plans,
            warnings,
            validation,
            schedule_source: schedule.source,
            unscheduled: packing.unscheduled,
        })
    }

    /// 删除内容并重新生成
    ///
    /// 再分配结果应用到分配单元后重新装箱；to_adhoc 产出的临时任务不进入日程
    #[instrument(skip(self, request, deleted, cached, config), fields(
        content_id = %deleted.content_id,
        strategy = %options.strategy
    ))]
    pub fn remove_content(
        &self,
        request: &PlanGenerationRequest,
        deleted: &DeletedContent,
        options: &RedistributeOptions,
        cached: Option<&str>,
        config: &PlannerConfig,
    ) -> PlannerResult<ContentRemovalResult> {
        let redistribution = self.redistribution.redistribute(
            deleted,
            &request.allocations,
            options,
            config.distribution_mode,
        );

        let mut updated = request.clone();
        updated.allocations =
            self.redistribution
                .apply(&request.allocations, &deleted.content_id, &redistribution);
        updated.contents.retain(|c| c.content_id != deleted.content_id);

        let plan = self.generate(&updated, cached, config)?;
        Ok(ContentRemovalResult {
            redistribution,
            request_allocations: updated.allocations,
            plan,
        })
    }

    // ==========================================
    // 逐日装箱
    // ==========================================

    /// 学习日: 分配范围按学习日均分，当日放不下的部分顺延到下一个学习日
    /// 复习日: 复习本周期内已学习的范围（乘复习系数）
    fn pack_days(
        &self,
        days: &[DayEntry],
        allocations: &[ContentAllocation],
        catalog: &ContentCatalog,
        config: &PlannerConfig,
    ) -> PackingOutcome {
        let mut outcome = PackingOutcome {
            daily_plans: Vec::new(),
            unscheduled: Vec::new(),
            warnings: Vec::new(),
        };

        let study_day_count = days
            .iter()
            .filter(|d| d.day_type == DayType::StudyDay)
            .count();
        if study_day_count == 0 {
            if !allocations.is_empty() {
                warn!(allocations = allocations.len(), "期间内没有学习日");
                outcome
                    .warnings
                    .push("기간 내 학습일이 없어 콘텐츠를 배치할 수 없습니다.".to_string());
            }
            for allocation in allocations {
                let estimate = self.resolver.estimate(
                    allocation,
                    catalog,
                    DayType::StudyDay,
                    &config.pace,
                );
                record_unscheduled(
                    &mut outcome.unscheduled,
                    &allocation.content_id,
                    estimate.minutes,
                    None,
                );
            }
            return outcome;
        }

        let pieces: Vec<Vec<Option<ContentAllocation>>> = allocations
            .iter()
            .map(|a| divide_range(a, study_day_count))
            .collect();

        let mut carried: Vec<CarriedItem> = Vec::new();
        let mut studied: Vec<ContentAllocation> = Vec::new();
        let mut study_index = 0usize;

        for day in days {
            match day.day_type {
                DayType::StudyDay => {
                    let mut items: Vec<PackingItem> = carried.drain(..).map(|c| c.item).collect();
                    for content_pieces in &pieces {
                        let Some(piece) = &content_pieces[study_index] else {
                            continue;
                        };
                        let estimate =
                            self.resolver
                                .estimate(piece, catalog, day.day_type, &config.pace);
                        items.push(PackingItem::new(piece.clone(), estimate.minutes));
                    }
                    study_index += 1;

                    let result = self.allocator.allocate(
                        items,
                        &day.study_slots(),
                        day.day_type,
                        config.packing_mode,
                    );
                    record_studied(&mut studied, allocations, &result.segments);

                    for remainder in result.unplaced {
                        if config.carry_over_unplaced {
                            carried.push(CarriedItem {
                                item: PackingItem {
                                    estimated_minutes: remainder.remaining_minutes,
                                    original_estimated_minutes: remainder
                                        .original_estimated_minutes,
                                    continued: remainder.continued,
                                    allocation: remainder.allocation,
                                },
                                last_attempted: day.date,
                            });
                        } else {
                            record_unscheduled(
                                &mut outcome.unscheduled,
                                &remainder.allocation.content_id,
                                remainder.remaining_minutes,
                                Some(day.date),
                            );
                        }
                    }

                    outcome.daily_plans.push(DailyPlan {
                        date: day.date,
                        day_type: day.day_type,
                        segments: result.segments,
                    });
                }
                DayType::ReviewDay => {
                    let items: Vec<PackingItem> = std::mem::take(&mut studied)
                        .into_iter()
                        .map(|allocation| {
                            let estimate = self.resolver.estimate(
                                &allocation,
                                catalog,
                                day.day_type,
                                &config.pace,
                            );
                            PackingItem::new(allocation, estimate.minutes)
                        })
                        .collect();

                    let result = self.allocator.allocate(
                        items,
                        &day.study_slots(),
                        day.day_type,
                        config.packing_mode,
                    );
                    if !result.unplaced.is_empty() {
                        let minutes: u32 =
                            result.unplaced.iter().map(|u| u.remaining_minutes).sum();
                        warn!(date = %day.date, minutes, "复习时间不足");
                        outcome.warnings.push(format!(
                            "{}: 복습 시간이 부족하여 {}분이 배치되지 않았습니다.",
                            day.date, minutes
                        ));
                    }

                    outcome.daily_plans.push(DailyPlan {
                        date: day.date,
                        day_type: day.day_type,
                        segments: result.segments,
                    });
                }
                DayType::ExcludedHoliday | DayType::Vacation | DayType::PersonalLeave => {}
            }
        }

        for c in carried {
            record_unscheduled(
                &mut outcome.unscheduled,
                &c.item.allocation.content_id,
                c.item.estimated_minutes,
                Some(c.last_attempted),
            );
        }

        if !outcome.unscheduled.is_empty() {
            let minutes: u32 = outcome
                .unscheduled
                .iter()
                .map(|u| u.remaining_minutes)
                .sum();
            warn!(
                contents = outcome.unscheduled.len(),
                minutes, "期末仍有未排入的分量"
            );
            outcome.warnings.push(format!(
                "기간 내 배치하지 못한 학습 분량이 있습니다 (콘텐츠 {}개, {}분).",
                outcome.unscheduled.len(),
                minutes
            ));
        }

        outcome
    }
}

impl Default for PlanGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// 将分配范围按天数均分（前 remainder 天各多 1 个单位），分量为 0 的天为 None
fn divide_range(allocation: &ContentAllocation, parts: usize) -> Vec<Option<ContentAllocation>> {
    let n = parts.max(1) as u32;
    let volume = allocation.volume();
    let base = volume / n;
    let remainder = volume % n;

    let mut cursor = allocation.start_range;
    (0..n)
        .map(|i| {
            let size = base + u32::from(i < remainder);
            if size == 0 {
                return None;
            }
            let mut piece = allocation.clone();
            piece.start_range = cursor;
            piece.end_range = cursor + size;
            cursor += size;
            Some(piece)
        })
        .collect()
}

/// 记录本周期内已学习的范围（按内容合并为最小起点~最大终点）
fn record_studied(
    studied: &mut Vec<ContentAllocation>,
    allocations: &[ContentAllocation],
    segments: &[PlanTimeSegment],
) {
    for segment in segments {
        if let Some(existing) = studied
            .iter_mut()
            .find(|a| a.content_id == segment.content_id)
        {
            existing.start_range = existing.start_range.min(segment.start_range);
            existing.end_range = existing.end_range.max(segment.end_range);
            continue;
        }

        let Some(template) = allocations
            .iter()
            .find(|a| a.content_id == segment.content_id)
        else {
            continue;
        };
        let mut reviewed = template.clone();
        reviewed.start_range = segment.start_range;
        reviewed.end_range = segment.end_range;
        studied.push(reviewed);
    }
}

/// 按内容累加未排入分钟数
fn record_unscheduled(
    unscheduled: &mut Vec<UnscheduledContent>,
    content_id: &str,
    minutes: u32,
    attempted: Option<NaiveDate>,
) {
    if minutes == 0 {
        return;
    }
    match unscheduled.iter_mut().find(|u| u.content_id == content_id) {
        Some(existing) => {
            existing.remaining_minutes += minutes;
            existing.last_attempted = existing.last_attempted.max(attempted);
        }
        None => unscheduled.push(UnscheduledContent {
            content_id: content_id.to_string(),
            remaining_minutes: minutes,
            last_attempted: attempted,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::planner_config::CadencePolicy;
    use crate::domain::time_range::TimeRange;
    use crate::domain::types::ContentType;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn book(id: &str, start: u32, end: u32) -> ContentAllocation {
        ContentAllocation {
            content_type: ContentType::Book,
            content_id: id.to_string(),
            subject: None,
            subject_category: Some("국어".to_string()),
            start_range: start,
            end_range: end,
            ordering_hint: None,
            redistributed_volume: 0,
        }
    }

    fn request(allocations: Vec<ContentAllocation>) -> PlanGenerationRequest {
        PlanGenerationRequest {
            period: PlanPeriod::new(d(6), d(12)),
            blocks: (0..=6)
                .map(|dow| WeeklyBlock {
                    day_of_week: dow,
                    range: TimeRange::parse("09:00", "11:00").unwrap(),
                })
                .collect(),
            exclusions: Vec::new(),
            academy_schedules: Vec::new(),
            contents: Vec::new(),
            allocations,
            catalog: ContentCatalog::new(),
            constraints: SubjectConstraints::default(),
            dependencies: Vec::new(),
        }
    }

    fn minutes_of(result: &PlanGenerationResult, content_id: &str) -> u32 {
        result
            .daily_plans
            .iter()
            .filter(|p| p.day_type == DayType::StudyDay)
            .flat_map(|p| p.segments.iter())
            .filter(|s| s.content_id == content_id)
            .map(|s| s.minutes())
            .sum()
    }

    #[test]
    fn test_divide_range_conserves_volume() {
        let pieces = divide_range(&book("A", 1, 11), 4);
        let sizes: Vec<u32> = pieces
            .iter()
            .map(|p| p.as_ref().map(|a| a.volume()).unwrap_or(0))
            .collect();
        assert_eq!(sizes, vec![3, 3, 2, 2]);
        assert_eq!(pieces[0].as_ref().unwrap().start_range, 1);
        assert_eq!(pieces[3].as_ref().unwrap().end_range, 11);

        let sparse = divide_range(&book("A", 0, 2), 4);
        assert!(sparse[2].is_none() && sparse[3].is_none());
    }

    #[test]
    fn test_all_study_days_place_everything() {
        let generator = PlanGenerator::new();
        // 70 页 / 7 天 = 每天 10 页 = 60 分钟
        let result = generator
            .generate(&request(vec![book("A", 0, 70)]), None, &PlannerConfig::default())
            .unwrap();
        assert_eq!(result.daily_plans.len(), 7);
        assert_eq!(minutes_of(&result, "A"), 420);
        assert!(result.unscheduled.is_empty());
        assert_eq!(result.schedule_source, ScheduleSource::Computed);
    }

    #[test]
    fn test_carry_over_then_unscheduled() {
        let generator = PlanGenerator::new();
        // 每天 180 分钟估算，只有 120 分钟槽位
        let result = generator
            .generate(&request(vec![book("A", 0, 210)]), None, &PlannerConfig::default())
            .unwrap();
        assert_eq!(minutes_of(&result, "A"), 7 * 120);
        assert_eq!(result.unscheduled.len(), 1);
        assert_eq!(result.unscheduled[0].remaining_minutes, 7 * 180 - 7 * 120);
        assert_eq!(result.unscheduled[0].last_attempted, Some(d(12)));

        // 第二天开头是顺延部分，标记为延续
        let day2 = &result.daily_plans[1];
        assert!(day2.segments[0].is_continued);
    }

    #[test]
    fn test_without_carry_over_remainders_recorded_daily() {
        let generator = PlanGenerator::new();
        let config = PlannerConfig {
            carry_over_unplaced: false,
            ..PlannerConfig::default()
        };
        let result = generator
            .generate(&request(vec![book("A", 0, 210)]), None, &config)
            .unwrap();
        assert_eq!(result.unscheduled[0].remaining_minutes, 7 * 60);
        let day2 = &result.daily_plans[1];
        assert!(!day2.segments[0].is_continued);
    }

    #[test]
    fn test_review_day_reviews_cycle_content() {
        let generator = PlanGenerator::new();
        let config = PlannerConfig {
            cadence: CadencePolicy::Cycle {
                study_days: 6,
                review_days: 1,
            },
            ..PlannerConfig::default()
        };
        let result = generator
            .generate(&request(vec![book("A", 0, 60)]), None, &config)
            .unwrap();
        let review = result
            .daily_plans
            .iter()
            .find(|p| p.day_type == DayType::ReviewDay)
            .unwrap();
        // 60 页 × 6 分钟 × 0.5 = 180 > 120 → 均分为 120
        assert_eq!(review.segments.len(), 1);
        assert_eq!(review.segments[0].start_range, 0);
        assert_eq!(review.segments[0].end_range, 60);
        assert_eq!(review.segments[0].estimated_minutes, 120);
        assert_eq!(review.segments[0].original_estimated_minutes, 180);
        assert!(result.unscheduled.is_empty());
    }

    #[test]
    fn test_plan_contents_derived_from_allocations() {
        let req = request(vec![book("A", 0, 10), book("B", 0, 10), book("A", 10, 20)]);
        let contents = req.plan_contents();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[1].content_id, "B");
        assert_eq!(contents[1].display_order, 2);
    }
}
