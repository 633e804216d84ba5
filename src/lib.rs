// ==========================================
// 학습 플랜 엔진 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 学习计划排程引擎（可用时间 / 内容装箱 / 约束校验）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 日程快照
pub mod repository;

// 引擎层 - 排程规则
pub mod engine;

// 配置层 - 引擎配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 引擎错误类型
pub mod error;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ConstraintHandling, ContentType, DayType, ExclusionType, RedistributeStrategy,
    ScheduleSource, TimeSlotType, ValidationIssueKind,
};

// 领域实体
pub use domain::{
    ContentAllocation, DailyPlan, DayEntry, DeletedContent, PlanPeriod, PlanTimeSegment,
    ScheduleSummary, TimeRange,
};

// 引擎
pub use engine::{
    AvailabilityCalculator, ContentDurationResolver, ContentSlotAllocator, DependencyValidator,
    PlanGenerationRequest, PlanGenerationResult, PlanGenerator, RedistributionEngine,
    ScheduleCacheReconciler, SubjectConstraintValidator,
};

// 配置
pub use config::{ConfigManager, PlannerConfig};

// 错误
pub use error::{PlannerError, PlannerResult};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "학습 플랜 엔진";
