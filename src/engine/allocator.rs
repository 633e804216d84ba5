// ==========================================
// 학습 플랜 엔진 - 内容装箱引擎
// ==========================================
// 职责: 将待排内容按时长装入当日学习槽位
// 输入: 已估算时长的待排内容 + 当日学习槽位 + 装箱模式
// 输出: PlanTimeSegment[]（按开始时间排序）+ 未排完的剩余
// ==========================================
// 红线: 贪心单遍，不回溯、不为更优装填而重排
// 红线: 同一内容的时间段时长之和 == 其工作时长（均分后可能小于原估算）
// 红线: 零分量/空槽位 → 零时间段，不报错
// ==========================================

use crate::config::planner_config::PackingMode;
use crate::domain::content::ContentAllocation;
use crate::domain::plan::PlanTimeSegment;
use crate::domain::time_range::TimeRange;
use crate::domain::types::DayType;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// 待装箱内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackingItem {
    pub allocation: ContentAllocation,
    /// 当日估算时长（已按日类型折算）
    pub estimated_minutes: u32,
    /// 原始估算时长（展示用）
    pub original_estimated_minutes: u32,
    /// 是否延续前一日未排完的分量
    #[serde(default)]
    pub continued: bool,
}

impl PackingItem {
    pub fn new(allocation: ContentAllocation, estimated_minutes: u32) -> Self {
        Self {
            allocation,
            estimated_minutes,
            original_estimated_minutes: estimated_minutes,
            continued: false,
        }
    }
}

/// 当日未排完的剩余
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnplacedRemainder {
    pub allocation: ContentAllocation,
    pub remaining_minutes: u32,
    pub original_estimated_minutes: u32,
    /// 当日已排入分钟数
    pub placed_minutes: u32,
    /// 该内容此前已有时间段（顺延后仍标记为延续）
    pub continued: bool,
}

/// 装箱结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub segments: Vec<PlanTimeSegment>,
    pub unplaced: Vec<UnplacedRemainder>,
    /// 是否触发了复习日均分
    pub equalized: bool,
}

/// 装箱过程中的单项状态
struct WorkItem {
    item: PackingItem,
    working_minutes: u32,
    remaining: u32,
    placed_any: bool,
}

// ==========================================
// ContentSlotAllocator - 内容装箱引擎
// ==========================================
pub struct ContentSlotAllocator {
    // 无状态引擎，不需要注入依赖
}

impl ContentSlotAllocator {
    pub fn new() -> Self {
        Self {}
    }

    /// 按排序提示稳定排序（无提示者排在最后）
    pub fn sort_items(&self, items: &mut [PackingItem]) {
        items.sort_by_key(|i| match i.allocation.ordering_hint {
            Some(hint) => (0u8, hint),
            None => (1u8, 0),
        });
    }

    /// 复习日均分预处理
    ///
    /// 复习日估算总和超过可用时间时，每项工作时长改为 可用时间 ÷ 项数，
    /// 余数分钟依次分给排在前面的项
    ///
    /// # 返回
    /// (每项工作时长, 是否均分)
    pub fn working_durations(
        &self,
        items: &[PackingItem],
        available_minutes: u32,
        day_type: DayType,
        mode: PackingMode,
    ) -> (Vec<u32>, bool) {
        let estimates: Vec<u32> = items.iter().map(|i| i.estimated_minutes).collect();
        let total: u32 = estimates.iter().sum();
        let active = estimates.iter().filter(|m| **m > 0).count() as u32;

        let should_equalize = mode == PackingMode::Equalized
            && day_type == DayType::ReviewDay
            && active > 0
            && available_minutes > 0
            && total > available_minutes;
        if !should_equalize {
            return (estimates, false);
        }

        let share = available_minutes / active;
        let mut extra = available_minutes % active;
        let durations = estimates
            .iter()
            .map(|m| {
                if *m == 0 {
                    return 0;
                }
                if extra > 0 {
                    extra -= 1;
                    share + 1
                } else {
                    share
                }
            })
            .collect();

        debug!(
            total_estimated = total,
            available_minutes,
            share,
            items = active,
            "复习日估算超出可用时间，改为均分"
        );
        (durations, true)
    }

    /// 单日装箱
    ///
    /// # 参数
    /// - `items`: 待排内容（会按排序提示稳定排序）
    /// - `slots`: 当日学习槽位
    /// - `day_type`: 日类型（决定是否触发均分）
    /// - `mode`: 装箱模式
    #[instrument(skip(self, items, slots), fields(
        items_count = items.len(),
        slots_count = slots.len(),
        day_type = %day_type
    ))]
    pub fn allocate(
        &self,
        items: Vec<PackingItem>,
        slots: &[TimeRange],
        day_type: DayType,
        mode: PackingMode,
    ) -> AllocationResult {
        let mut items = items;
        self.sort_items(&mut items);

        let mut slots: Vec<TimeRange> = slots.to_vec();
        slots.sort_by_key(|s| s.start());
        let available: u32 = slots.iter().map(|s| s.minutes()).sum();

        let (durations, equalized) = self.working_durations(&items, available, day_type, mode);

        let mut work: Vec<WorkItem> = items
            .into_iter()
            .zip(durations)
            .map(|(item, working_minutes)| WorkItem {
                item,
                working_minutes,
                remaining: working_minutes,
                placed_any: false,
            })
            .collect();

        let mut segments = Vec::new();
        let mut cursor_item = 0usize;

        for slot in &slots {
            let mut slot_pos = slot.start();
            while slot_pos < slot.end() && cursor_item < work.len() {
                let w = &mut work[cursor_item];
                if w.remaining == 0 {
                    cursor_item += 1;
                    continue;
                }

                let take = w.remaining.min(slot.end() - slot_pos);
                let Some(range) = TimeRange::from_minutes(slot_pos, slot_pos + take) else {
                    break;
                };
                w.remaining -= take;

                segments.push(PlanTimeSegment::new(
                    &w.item.allocation,
                    range,
                    w.remaining > 0,
                    w.placed_any || w.item.continued,
                    w.working_minutes,
                    w.item.original_estimated_minutes,
                ));
                w.placed_any = true;
                slot_pos += take;

                if w.remaining == 0 {
                    cursor_item += 1;
                }
            }
        }

        segments.sort_by_key(|s| s.range.start());

        let unplaced: Vec<UnplacedRemainder> = work
            .into_iter()
            .filter(|w| w.remaining > 0)
            .map(|w| UnplacedRemainder {
                placed_minutes: w.working_minutes - w.remaining,
                continued: w.placed_any || w.item.continued,
                remaining_minutes: w.remaining,
                original_estimated_minutes: w.item.original_estimated_minutes,
                allocation: w.item.allocation,
            })
            .collect();

        debug!(
            segments = segments.len(),
            unplaced = unplaced.len(),
            equalized,
            "装箱完成"
        );

        AllocationResult {
            segments,
            unplaced,
            equalized,
        }
    }
}

impl Default for ContentSlotAllocator {
    fn default() -> Self {
        Self::new()
    }
}
