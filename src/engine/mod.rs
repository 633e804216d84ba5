// ==========================================
// 학습 플랜 엔진 - 引擎层
// ==========================================
// 职责: 实现排程规则，不拼 SQL、不做 I/O
// 红线: 提示类结果必须带原因（warnings / ValidationIssue.message）
// ==========================================

pub mod allocator;
pub mod availability;
pub mod constraint;
pub mod dependency;
pub mod duration;
pub mod orchestrator;
pub mod redistribution;
pub mod schedule_cache;
pub mod time_algebra;

// 重导出核心引擎
pub use allocator::{AllocationResult, ContentSlotAllocator, PackingItem, UnplacedRemainder};
pub use availability::{AvailabilityCalculator, AvailabilityInput, AvailabilityResult};
pub use constraint::SubjectConstraintValidator;
pub use dependency::DependencyValidator;
pub use duration::{ClampOutcome, ContentDurationResolver, DurationEstimate, DurationSource};
pub use orchestrator::{
    ContentRemovalResult, PlanGenerationRequest, PlanGenerationResult, PlanGenerator,
};
pub use redistribution::{
    RecipientIncrease, RedistributeOptions, RedistributionEngine, RedistributionResult,
};
pub use schedule_cache::{CacheInvalidReason, ReconciledSchedule, ScheduleCacheReconciler};
