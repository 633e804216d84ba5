// ==========================================
// 删除内容 + 再分配 集成测试
// ==========================================
// 测试目标: 再分配分量守恒，重新装箱后计划反映新的分配
// 覆盖范围: same_subject / all_contents / to_adhoc / discard / 回退
// ==========================================

mod helpers;

use helpers::test_data_builder::{date, AllocationBuilder, RequestBuilder};
use study_plan_engine::config::{DistributionMode, PlannerConfig};
use study_plan_engine::domain::{BookRecord, ContentCatalog};
use study_plan_engine::engine::{
    PlanGenerationRequest, PlanGenerationResult, PlanGenerator, RedistributeOptions,
};
use study_plan_engine::{ContentType, DeletedContent, RedistributeStrategy};

// ==========================================
// 测试辅助函数
// ==========================================

fn request() -> PlanGenerationRequest {
    RequestBuilder::new(date(2025, 1, 6), date(2025, 1, 10))
        .weekday_blocks("09:00", "18:00")
        .allocation(AllocationBuilder::book("A").range(0, 60).category("수학").build())
        .allocation(AllocationBuilder::book("B").range(0, 30).category("수학").build())
        .allocation(AllocationBuilder::book("C").range(0, 40).category("국어").build())
        .build()
}

fn deleted_a(completed: u32) -> DeletedContent {
    DeletedContent {
        content_id: "A".to_string(),
        content_type: ContentType::Book,
        subject_category: Some("수학".to_string()),
        total_volume: 60,
        completed_volume: completed,
    }
}

fn options(strategy: RedistributeStrategy) -> RedistributeOptions {
    RedistributeOptions {
        strategy,
        only_remaining: true,
    }
}

fn end_range_of(allocations: &[study_plan_engine::ContentAllocation], id: &str) -> Option<u32> {
    allocations
        .iter()
        .find(|a| a.content_id == id)
        .map(|a| a.end_range)
}

fn minutes_of(plan: &PlanGenerationResult, id: &str) -> u32 {
    plan.daily_plans
        .iter()
        .flat_map(|p| p.segments.iter())
        .filter(|s| s.content_id == id)
        .map(|s| s.minutes())
        .sum()
}

/// 目录中登记了总页数的请求（页码从 1 开始）
fn bounded_request() -> PlanGenerationRequest {
    let book = |pages| BookRecord {
        total_pages: Some(pages),
        master_content_id: None,
    };
    RequestBuilder::new(date(2025, 1, 6), date(2025, 1, 10))
        .weekday_blocks("09:00", "18:00")
        .allocation(AllocationBuilder::book("A").range(1, 61).category("수학").build())
        .allocation(AllocationBuilder::book("B").range(1, 31).category("수학").build())
        .allocation(AllocationBuilder::book("C").range(1, 41).category("국어").build())
        .catalog(
            ContentCatalog::new()
                .with_book("A", book(60))
                .with_book("B", book(30))
                .with_book("C", book(40)),
        )
        .build()
}

// ==========================================
// 测试用例
// ==========================================

#[test]
fn test_same_subject_moves_remaining_volume_and_regenerates() {
    let generator = PlanGenerator::new();
    let result = generator
        .remove_content(
            &request(),
            &deleted_a(20),
            &options(RedistributeStrategy::SameSubject),
            None,
            &PlannerConfig::default(),
        )
        .unwrap();

    assert_eq!(result.redistribution.volume, 40);
    assert_eq!(result.redistribution.redistributed_volume(), 40);
    assert_eq!(end_range_of(&result.request_allocations, "A"), None);
    assert_eq!(end_range_of(&result.request_allocations, "B"), Some(70));
    assert_eq!(end_range_of(&result.request_allocations, "C"), Some(40));

    let segments: Vec<_> = result
        .plan
        .daily_plans
        .iter()
        .flat_map(|p| p.segments.iter())
        .collect();
    assert!(segments.iter().all(|s| s.content_id != "A"));
    // B: 70 页 → 420 分钟
    let b_minutes: u32 = segments
        .iter()
        .filter(|s| s.content_id == "B")
        .map(|s| s.minutes())
        .sum();
    assert_eq!(b_minutes, 420);
}

#[test]
fn test_all_contents_proportional_split() {
    let config = PlannerConfig {
        distribution_mode: DistributionMode::Proportional,
        ..PlannerConfig::default()
    };
    let result = PlanGenerator::new()
        .remove_content(
            &request(),
            &deleted_a(20),
            &options(RedistributeStrategy::AllContents),
            None,
            &config,
        )
        .unwrap();

    // 40 × 30/70 = 17.14 → 17；40 × 40/70 = 22.86 → 23
    assert_eq!(end_range_of(&result.request_allocations, "B"), Some(47));
    assert_eq!(end_range_of(&result.request_allocations, "C"), Some(63));
    assert_eq!(result.redistribution.redistributed_volume(), 40);
}

#[test]
fn test_to_adhoc_keeps_task_outside_schedule() {
    let result = PlanGenerator::new()
        .remove_content(
            &request(),
            &deleted_a(0),
            &options(RedistributeStrategy::ToAdhoc),
            None,
            &PlannerConfig::default(),
        )
        .unwrap();

    let task = result.redistribution.adhoc_task.as_ref().unwrap();
    assert_eq!(task.volume, 60);
    assert_eq!(task.title, "미완료 분량 (60 p)");
    assert_eq!(task.source_content_id, "A");
    assert_eq!(end_range_of(&result.request_allocations, "B"), Some(30));
    assert!(result
        .plan
        .daily_plans
        .iter()
        .flat_map(|p| p.segments.iter())
        .all(|s| s.content_id != task.id));
}

#[test]
fn test_discard_and_fallback() {
    let generator = PlanGenerator::new();
    let config = PlannerConfig::default();

    let discarded = generator
        .remove_content(
            &request(),
            &deleted_a(10),
            &options(RedistributeStrategy::Discard),
            None,
            &config,
        )
        .unwrap();
    assert_eq!(discarded.redistribution.discarded_volume, 50);
    assert_eq!(discarded.redistribution.redistributed_volume(), 0);
    assert_eq!(discarded.request_allocations.len(), 2);

    // 英语没有其他内容 → 回退为临时任务
    let mut english = deleted_a(0);
    english.subject_category = Some("영어".to_string());
    let fallback = generator
        .remove_content(
            &request(),
            &english,
            &options(RedistributeStrategy::SameSubject),
            None,
            &config,
        )
        .unwrap();
    assert_eq!(
        fallback.redistribution.strategy_applied,
        RedistributeStrategy::ToAdhoc
    );
    assert_eq!(fallback.redistribution.adhoc_task.unwrap().volume, 60);
}

#[test]
fn test_lecture_adhoc_title_uses_episode_unit() {
    let deleted = DeletedContent {
        content_id: "L1".to_string(),
        content_type: ContentType::Lecture,
        subject_category: None,
        total_volume: 12,
        completed_volume: 4,
    };
    let result = PlanGenerator::new()
        .remove_content(
            &request(),
            &deleted,
            &options(RedistributeStrategy::ToAdhoc),
            None,
            &PlannerConfig::default(),
        )
        .unwrap();
    assert_eq!(
        result.redistribution.adhoc_task.unwrap().title,
        "미완료 분량 (8 강)"
    );
}

#[test]
fn test_redistributed_volume_survives_catalog_total() {
    let generator = PlanGenerator::new();
    let config = PlannerConfig::default();
    let before = generator.generate(&bounded_request(), None, &config).unwrap();
    assert_eq!(minutes_of(&before, "B"), 180);

    let result = generator
        .remove_content(
            &bounded_request(),
            &deleted_a(20),
            &options(RedistributeStrategy::SameSubject),
            None,
            &config,
        )
        .unwrap();

    assert_eq!(result.redistribution.redistributed_volume(), 40);
    assert_eq!(end_range_of(&result.request_allocations, "B"), Some(71));
    // 30 + 40 页 → 420 分钟，没有被目录总页数裁掉
    assert_eq!(minutes_of(&result.plan, "B"), 420);
    assert_eq!(minutes_of(&result.plan, "C"), minutes_of(&before, "C"));
    assert!(result.plan.unscheduled.is_empty());
    assert!(result.plan.warnings.iter().all(|w| !w.contains("초과")));
}

#[test]
fn test_proportional_increase_reaches_plan_minutes() {
    let generator = PlanGenerator::new();
    let config = PlannerConfig {
        distribution_mode: DistributionMode::Proportional,
        ..PlannerConfig::default()
    };
    let before = generator.generate(&bounded_request(), None, &config).unwrap();
    let result = generator
        .remove_content(
            &bounded_request(),
            &deleted_a(20),
            &options(RedistributeStrategy::AllContents),
            None,
            &config,
        )
        .unwrap();

    // 每页 6 分钟：B +17 页，C +23 页
    let added_b = minutes_of(&result.plan, "B") - minutes_of(&before, "B");
    let added_c = minutes_of(&result.plan, "C") - minutes_of(&before, "C");
    assert_eq!(added_b, 17 * 6);
    assert_eq!(added_c, 23 * 6);
    assert_eq!(added_b + added_c, result.redistribution.redistributed_volume() * 6);
}
