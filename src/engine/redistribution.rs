// ==========================================
// 학습 플랜 엔진 - 删除内容分量再分配引擎
// ==========================================
// 职责: 删除内容时按策略处理其未完成分量
// 策略: discard / same_subject / all_contents / to_adhoc
// 红线: same_subject / all_contents / to_adhoc 分量守恒
// 红线: 分摊策略无接收方时回退为 to_adhoc
// ==========================================

use crate::config::planner_config::DistributionMode;
use crate::domain::content::{AdHocTask, ContentAllocation, DeletedContent};
use crate::domain::types::RedistributeStrategy;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// 删除时的再分配选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedistributeOptions {
    pub strategy: RedistributeStrategy,
    /// true: 只分配未完成部分（总量 - 已完成）；false: 分配总量
    #[serde(default = "default_only_remaining")]
    pub only_remaining: bool,
}

fn default_only_remaining() -> bool {
    true
}

/// 接收方增量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientIncrease {
    pub content_id: String,
    pub added_volume: u32,
}

/// 再分配结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedistributionResult {
    /// 实际执行的策略（可能因无接收方回退为 to_adhoc）
    pub strategy_applied: RedistributeStrategy,
    /// 待处理分量
    pub volume: u32,
    pub discarded_volume: u32,
    pub increases: Vec<RecipientIncrease>,
    pub adhoc_task: Option<AdHocTask>,
}

impl RedistributionResult {
    fn noop(strategy: RedistributeStrategy) -> Self {
        Self {
            strategy_applied: strategy,
            volume: 0,
            discarded_volume: 0,
            increases: Vec::new(),
            adhoc_task: None,
        }
    }

    /// 接收方增量之和
    pub fn redistributed_volume(&self) -> u32 {
        self.increases.iter().map(|i| i.added_volume).sum()
    }
}

/// 接收方（按内容聚合）
struct Recipient {
    content_id: String,
    volume: u32,
}

// ==========================================
// RedistributionEngine - 再分配引擎
// ==========================================
pub struct RedistributionEngine {
    // 无状态引擎
}

impl RedistributionEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算删除内容的再分配方案
    ///
    /// # 参数
    /// - `deleted`: 被删除内容的分量信息
    /// - `pending`: 计划中的待排分配（含被删除内容本身时会被跳过）
    /// - `options`: 策略 + onlyRemaining
    /// - `mode`: 分摊方式
    #[instrument(skip(self, deleted, pending), fields(
        content_id = %deleted.content_id,
        strategy = %options.strategy,
        pending_count = pending.len()
    ))]
    pub fn redistribute(
        &self,
        deleted: &DeletedContent,
        pending: &[ContentAllocation],
        options: &RedistributeOptions,
        mode: DistributionMode,
    ) -> RedistributionResult {
        let volume = if options.only_remaining {
            deleted.remaining_volume()
        } else {
            deleted.total_volume
        };

        if volume == 0 {
            info!("无未完成分量，跳过再分配");
            return RedistributionResult::noop(options.strategy);
        }

        let recipients = match options.strategy {
            RedistributeStrategy::Discard => {
                info!(volume, "丢弃未完成分量");
                return RedistributionResult {
                    strategy_applied: RedistributeStrategy::Discard,
                    volume,
                    discarded_volume: volume,
                    increases: Vec::new(),
                    adhoc_task: None,
                };
            }
            RedistributeStrategy::ToAdhoc => {
                return self.to_adhoc(deleted, volume);
            }
            RedistributeStrategy::SameSubject => {
                let category = deleted.subject_category.as_deref().map(normalize);
                collect_recipients(pending, &deleted.content_id, |a| {
                    category.is_some()
                        && a.subject_category.as_deref().map(normalize) == category
                })
            }
            RedistributeStrategy::AllContents => {
                collect_recipients(pending, &deleted.content_id, |_| true)
            }
        };

        if recipients.is_empty() {
            warn!(volume, "没有可接收的内容，回退为临时任务");
            return self.to_adhoc(deleted, volume);
        }

        let shares = match mode {
            DistributionMode::Even => split_even(volume, recipients.len()),
            DistributionMode::Proportional => {
                let weights: Vec<u32> = recipients.iter().map(|r| r.volume).collect();
                split_proportional(volume, &weights)
            }
        };

        let increases: Vec<RecipientIncrease> = recipients
            .into_iter()
            .zip(shares)
            .filter(|(_, share)| *share > 0)
            .map(|(r, share)| RecipientIncrease {
                content_id: r.content_id,
                added_volume: share,
            })
            .collect();

        info!(volume, recipients = increases.len(), "未完成分量已分摊");
        RedistributionResult {
            strategy_applied: options.strategy,
            volume,
            discarded_volume: 0,
            increases,
            adhoc_task: None,
        }
    }

    /// 应用再分配结果到分配列表
    ///
    /// 移除被删除内容的分配，并把增量加到每个接收方最后一条分配的 end_range 上
    /// 增量同时记入 redistributed_volume，重新生成时不会被目录总分量裁掉
    pub fn apply(
        &self,
        allocations: &[ContentAllocation],
        deleted_content_id: &str,
        result: &RedistributionResult,
    ) -> Vec<ContentAllocation> {
        let mut updated: Vec<ContentAllocation> = allocations
            .iter()
            .filter(|a| a.content_id != deleted_content_id)
            .cloned()
            .collect();

        for increase in &result.increases {
            if let Some(target) = updated
                .iter_mut()
                .rev()
                .find(|a| a.content_id == increase.content_id)
            {
                target.end_range = target.end_range.saturating_add(increase.added_volume);
                target.redistributed_volume = target
                    .redistributed_volume
                    .saturating_add(increase.added_volume);
            }
        }
        updated
    }

    fn to_adhoc(&self, deleted: &DeletedContent, volume: u32) -> RedistributionResult {
        let task = AdHocTask {
            id: Uuid::new_v4().to_string(),
            title: format!(
                "미완료 분량 ({} {})",
                volume,
                deleted.content_type.range_unit()
            ),
            description: format!("삭제된 콘텐츠 {}의 미완료 분량", deleted.content_id),
            source_content_id: deleted.content_id.clone(),
            content_type: deleted.content_type,
            subject_category: deleted.subject_category.clone(),
            volume,
        };
        info!(task_id = %task.id, volume, "未完成分量转为临时任务");

        RedistributionResult {
            strategy_applied: RedistributeStrategy::ToAdhoc,
            volume,
            discarded_volume: 0,
            increases: Vec::new(),
            adhoc_task: Some(task),
        }
    }
}

impl Default for RedistributionEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// 按内容聚合接收方（保持首次出现顺序）
fn collect_recipients<F>(pending: &[ContentAllocation], deleted_id: &str, eligible: F) -> Vec<Recipient>
where
    F: Fn(&ContentAllocation) -> bool,
{
    let mut recipients: Vec<Recipient> = Vec::new();
    for allocation in pending {
        if allocation.content_id == deleted_id || !eligible(allocation) {
            continue;
        }
        match recipients
            .iter_mut()
            .find(|r| r.content_id == allocation.content_id)
        {
            Some(r) => r.volume += allocation.volume(),
            None => recipients.push(Recipient {
                content_id: allocation.content_id.clone(),
                volume: allocation.volume(),
            }),
        }
    }
    recipients
}

/// 均分：基础份额 + 前 remainder 个各多 1
fn split_even(volume: u32, count: usize) -> Vec<u32> {
    if count == 0 {
        return Vec::new();
    }
    let n = count as u32;
    let base = volume / n;
    let remainder = (volume % n) as usize;
    (0..count)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// 按权重比例，最大余数法取整（余数相同按顺序）
fn split_proportional(volume: u32, weights: &[u32]) -> Vec<u32> {
    let total: u64 = weights.iter().map(|w| *w as u64).sum();
    if total == 0 {
        return split_even(volume, weights.len());
    }

    let mut shares: Vec<u32> = Vec::with_capacity(weights.len());
    let mut remainders: Vec<(u64, usize)> = Vec::with_capacity(weights.len());
    for (i, w) in weights.iter().enumerate() {
        let numerator = volume as u64 * *w as u64;
        shares.push((numerator / total) as u32);
        remainders.push((numerator % total, i));
    }

    let assigned: u32 = shares.iter().sum();
    let mut leftover = volume - assigned;
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for (_, i) in remainders {
        if leftover == 0 {
            break;
        }
        shares[i] += 1;
        leftover -= 1;
    }
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ContentType;

    fn alloc(id: &str, category: &str, start: u32, end: u32) -> ContentAllocation {
        ContentAllocation {
            content_type: ContentType::Book,
            content_id: id.to_string(),
            subject: None,
            subject_category: Some(category.to_string()),
            start_range: start,
            end_range: end,
            ordering_hint: None,
            redistributed_volume: 0,
        }
    }

    fn deleted(total: u32, completed: u32) -> DeletedContent {
        DeletedContent {
            content_id: "D".to_string(),
            content_type: ContentType::Book,
            subject_category: Some("수학".to_string()),
            total_volume: total,
            completed_volume: completed,
        }
    }

    fn options(strategy: RedistributeStrategy) -> RedistributeOptions {
        RedistributeOptions {
            strategy,
            only_remaining: true,
        }
    }

    #[test]
    fn test_same_subject_even_conserves_volume() {
        let engine = RedistributionEngine::new();
        let pending = vec![
            alloc("D", "수학", 1, 51),
            alloc("M1", "수학", 1, 21),
            alloc("K1", "국어", 1, 31),
            alloc("M2", "수학", 1, 11),
            alloc("M3", "수학", 1, 11),
        ];
        let result = engine.redistribute(
            &deleted(50, 10),
            &pending,
            &options(RedistributeStrategy::SameSubject),
            DistributionMode::Even,
        );
        assert_eq!(result.volume, 40);
        assert_eq!(result.redistributed_volume(), 40);
        let adds: Vec<(String, u32)> = result
            .increases
            .iter()
            .map(|i| (i.content_id.clone(), i.added_volume))
            .collect();
        assert_eq!(
            adds,
            vec![("M1".to_string(), 14), ("M2".to_string(), 13), ("M3".to_string(), 13)]
        );
    }

    #[test]
    fn test_all_contents_proportional_conserves_volume() {
        let engine = RedistributionEngine::new();
        let pending = vec![alloc("A", "국어", 0, 10), alloc("B", "수학", 0, 20), alloc("C", "영어", 0, 30)];
        let result = engine.redistribute(
            &deleted(7, 0),
            &pending,
            &options(RedistributeStrategy::AllContents),
            DistributionMode::Proportional,
        );
        assert_eq!(result.redistributed_volume(), 7);
        // 7 × 1/6, 2/6, 3/6 = 1.17, 2.33, 3.5 → 1, 2, 4
        let adds: Vec<u32> = result.increases.iter().map(|i| i.added_volume).collect();
        assert_eq!(adds, vec![1, 2, 4]);
    }

    #[test]
    fn test_discard_zeroes_volume() {
        let engine = RedistributionEngine::new();
        let result = engine.redistribute(
            &deleted(30, 5),
            &[alloc("A", "수학", 0, 10)],
            &options(RedistributeStrategy::Discard),
            DistributionMode::Even,
        );
        assert_eq!(result.discarded_volume, 25);
        assert_eq!(result.redistributed_volume(), 0);
        assert!(result.adhoc_task.is_none());
    }

    #[test]
    fn test_to_adhoc_and_fallback() {
        let engine = RedistributionEngine::new();
        let result = engine.redistribute(
            &deleted(30, 0),
            &[],
            &options(RedistributeStrategy::ToAdhoc),
            DistributionMode::Even,
        );
        let task = result.adhoc_task.unwrap();
        assert_eq!(task.title, "미완료 분량 (30 p)");
        assert_eq!(task.volume, 30);
        assert!(Uuid::parse_str(&task.id).is_ok());

        // 同科目无接收方 → 回退
        let result = engine.redistribute(
            &deleted(30, 0),
            &[alloc("K", "국어", 0, 10)],
            &options(RedistributeStrategy::SameSubject),
            DistributionMode::Even,
        );
        assert_eq!(result.strategy_applied, RedistributeStrategy::ToAdhoc);
        assert_eq!(result.adhoc_task.unwrap().volume, 30);
    }

    #[test]
    fn test_only_remaining_flag_and_noop() {
        let engine = RedistributionEngine::new();
        let pending = vec![alloc("A", "수학", 0, 10)];
        let all = RedistributeOptions {
            strategy: RedistributeStrategy::AllContents,
            only_remaining: false,
        };
        let result = engine.redistribute(&deleted(30, 20), &pending, &all, DistributionMode::Even);
        assert_eq!(result.redistributed_volume(), 30);

        let result = engine.redistribute(
            &deleted(30, 30),
            &pending,
            &options(RedistributeStrategy::AllContents),
            DistributionMode::Even,
        );
        assert_eq!(result.volume, 0);
        assert!(result.increases.is_empty());
    }

    #[test]
    fn test_apply_extends_latest_allocation() {
        let engine = RedistributionEngine::new();
        let pending = vec![
            alloc("A", "수학", 1, 11),
            alloc("D", "수학", 1, 31),
            alloc("A", "수학", 11, 21),
        ];
        let result = RedistributionResult {
            strategy_applied: RedistributeStrategy::SameSubject,
            volume: 5,
            discarded_volume: 0,
            increases: vec![RecipientIncrease {
                content_id: "A".to_string(),
                added_volume: 5,
            }],
            adhoc_task: None,
        };
        let updated = engine.apply(&pending, "D", &result);
        assert_eq!(updated.len(), 2);
        assert_eq!(updated[0].end_range, 11);
        assert_eq!(updated[1].end_range, 26);
        assert_eq!(updated[0].redistributed_volume, 0);
        assert_eq!(updated[1].redistributed_volume, 5);
    }

    #[test]
    fn test_options_serde_camel_case() {
        let opts: RedistributeOptions =
            serde_json::from_str(r#"{"strategy":"same_subject","onlyRemaining":false}"#).unwrap();
        assert_eq!(opts.strategy, RedistributeStrategy::SameSubject);
        assert!(!opts.only_remaining);
    }
}
