// ==========================================
// 학습 플랜 엔진 - 日程快照仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 口径: schedule_json 原样存取，有效性由缓存校验器判定
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::schedule::{DayEntry, PlanPeriod};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// 已存储的日程快照
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSnapshot {
    pub plan_group_id: String,
    pub period: PlanPeriod,
    /// DayEntry[] 的 JSON（可能已损坏，交由校验器判定）
    pub schedule_json: String,
    pub updated_at: String,
}

// ==========================================
// DailyScheduleSnapshotRepository
// ==========================================
/// 职责: 管理 daily_schedule_snapshot 表的读写
pub struct DailyScheduleSnapshotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DailyScheduleSnapshotRepository {
    /// 创建仓储实例并确保表存在
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_schema()?;
        Ok(repo)
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 建表（幂等）
    pub fn ensure_schema(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS daily_schedule_snapshot (
                plan_group_id TEXT PRIMARY KEY,
                period_start TEXT NOT NULL,
                period_end TEXT NOT NULL,
                schedule_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// 保存（覆盖）计划组的日程快照
    pub fn save(
        &self,
        plan_group_id: &str,
        period: PlanPeriod,
        days: &[DayEntry],
    ) -> RepositoryResult<()> {
        let schedule_json = serde_json::to_string(days).map_err(|e| {
            RepositoryError::FieldValueError {
                field: "schedule_json".to_string(),
                message: e.to_string(),
            }
        })?;
        self.save_raw(plan_group_id, period, &schedule_json)
    }

    /// 保存原始 JSON
    pub fn save_raw(
        &self,
        plan_group_id: &str,
        period: PlanPeriod,
        schedule_json: &str,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO daily_schedule_snapshot (
                plan_group_id, period_start, period_end, schedule_json, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(plan_group_id) DO UPDATE SET
                period_start = ?2,
                period_end = ?3,
                schedule_json = ?4,
                updated_at = ?5
            "#,
            params![
                plan_group_id,
                period.start.to_string(),
                period.end.to_string(),
                schedule_json,
                Utc::now().to_rfc3339(),
            ],
        )?;
        tracing::debug!(plan_group_id, "日程快照已保存");
        Ok(())
    }

    /// 按计划组查询
    ///
    /// # 返回
    /// - Ok(Some): 找到快照
    /// - Ok(None): 未找到
    pub fn find(&self, plan_group_id: &str) -> RepositoryResult<Option<ScheduleSnapshot>> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                r#"
                SELECT plan_group_id, period_start, period_end, schedule_json, updated_at
                FROM daily_schedule_snapshot
                WHERE plan_group_id = ?1
                "#,
                params![plan_group_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((plan_group_id, start, end, schedule_json, updated_at)) = row else {
            return Ok(None);
        };

        Ok(Some(ScheduleSnapshot {
            plan_group_id,
            period: PlanPeriod::new(parse_date("period_start", &start)?, parse_date("period_end", &end)?),
            schedule_json,
            updated_at,
        }))
    }

    /// 删除计划组的快照，返回是否删除了记录
    pub fn delete(&self, plan_group_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM daily_schedule_snapshot WHERE plan_group_id = ?1",
            params![plan_group_id],
        )?;
        Ok(affected > 0)
    }
}

fn parse_date(field: &str, value: &str) -> RepositoryResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| RepositoryError::FieldValueError {
        field: field.to_string(),
        message: format!("{}: {}", value, e),
    })
}
