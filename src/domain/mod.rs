// ==========================================
// 학습 플랜 엔진 - 领域模型层
// ==========================================
// 职责: 定义领域实体、值对象、枚举
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod constraint;
pub mod content;
pub mod plan;
pub mod schedule;
pub mod time_range;
pub mod types;

// 重导出核心类型
pub use constraint::{
    ContentDependency, RequiredSubject, SubjectConstraints, ValidationIssue, ValidationResult,
};
pub use content::{
    AdHocTask, BookRecord, ContentAllocation, ContentCatalog, CustomContentRecord,
    DeletedContent, LectureRecord, MasterBook, MasterLecture, PlanContent,
};
pub use plan::{DailyPlan, PlanTimeSegment, UnscheduledContent};
pub use schedule::{
    AcademyGroup, AcademySchedule, AcademyStatistics, DayEntry, Exclusion, ExclusionDayCounts,
    PlanPeriod, ScheduleSummary, TimeSlot, WeeklyBlock,
};
pub use time_range::TimeRange;
pub use types::{
    ConstraintHandling, ContentType, DayType, ExclusionType, RedistributeStrategy,
    ScheduleSource, TimeSlotType, ValidationIssueKind,
};
