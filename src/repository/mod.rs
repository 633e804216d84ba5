// ==========================================
// 학습 플랜 엔진 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 日程快照的持久化，屏蔽数据库细节
// 约束: 所有查询使用参数化
// ==========================================

pub mod error;
pub mod schedule_snapshot_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use schedule_snapshot_repo::{DailyScheduleSnapshotRepository, ScheduleSnapshot};
