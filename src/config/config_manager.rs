// ==========================================
// 학습 플랜 엔진 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 口径: 未配置 → 默认值；格式错误 → 告警后回退默认值
// ==========================================

use crate::config::planner_config::{
    CadencePolicy, DistributionMode, PackingMode, PlannerConfig,
};
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::time_range::TimeRange;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let manager = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        manager.ensure_schema()?;
        Ok(manager)
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 会对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }
        let manager = Self { conn };
        manager.ensure_schema()?;
        Ok(manager)
    }

    /// 建表（幂等）
    pub fn ensure_schema(&self) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config_kv (
                scope_id TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (scope_id, key)
            );",
        )?;
        Ok(())
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, scope: &ConfigScope, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.lock()?;
        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![scope.scope_id(), key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        self.get_config_value(&ConfigScope::Global, key)
    }

    /// 写入配置值（UPSERT）
    pub fn set_config_value(&self, scope: &ConfigScope, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3",
            params![scope.scope_id(), key, value],
        )?;
        Ok(())
    }

    /// 获取某作用域全部配置的快照（JSON）
    pub fn get_config_snapshot(&self, scope: &ConfigScope) -> RepositoryResult<String> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let rows = stmt.query_map(params![scope.scope_id()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        serde_json::to_string(&config_map)
            .map_err(|e| RepositoryError::InternalError(format!("配置快照序列化失败: {}", e)))
    }

    // ===== 引擎配置 =====

    /// 加载引擎配置
    ///
    /// # 解析顺序
    /// 1. 默认值
    /// 2. 作用域为 PlanGroup 时先读 global，再由计划组覆写
    /// 3. 每层先应用 JSON 整体配置（planner_config），再应用逐项覆写
    pub fn load_planner_config(&self, scope: &ConfigScope) -> RepositoryResult<PlannerConfig> {
        let mut config = PlannerConfig::default();
        self.apply_scope(&mut config, &ConfigScope::Global)?;
        if !matches!(scope, ConfigScope::Global) {
            self.apply_scope(&mut config, scope)?;
        }

        if let Err(e) = config.validate() {
            tracing::warn!(scope = %scope.scope_id(), error = %e, "引擎配置校验失败，使用默认配置");
            return Ok(PlannerConfig::default());
        }
        Ok(config)
    }

    fn apply_scope(&self, config: &mut PlannerConfig, scope: &ConfigScope) -> RepositoryResult<()> {
        if let Some(raw) = self.get_config_value(scope, config_keys::PLANNER_CONFIG)? {
            match serde_json::from_str::<PlannerConfig>(&raw) {
                Ok(profile) => *config = profile,
                Err(e) => tracing::warn!(
                    config_key = config_keys::PLANNER_CONFIG,
                    error = %e,
                    "引擎配置 JSON 格式错误，忽略"
                ),
            }
        }

        self.override_parsed(scope, config_keys::PAGES_PER_HOUR, &mut config.pace.pages_per_hour)?;
        self.override_parsed(scope, config_keys::EPISODES_PER_HOUR, &mut config.pace.episodes_per_hour)?;
        self.override_parsed(scope, config_keys::REVIEW_DAY_FACTOR, &mut config.pace.review_day_factor)?;
        self.override_parsed(
            scope,
            config_keys::FALLBACK_DURATION_MINUTES,
            &mut config.pace.fallback_duration_minutes,
        )?;
        self.override_parsed(scope, config_keys::DEFAULT_TRAVEL_MINUTES, &mut config.default_travel_minutes)?;
        self.override_parsed(scope, config_keys::CARRY_OVER_UNPLACED, &mut config.carry_over_unplaced)?;

        if let Some(value) = self.get_config_value(scope, config_keys::LUNCH_TIME)? {
            match parse_optional_range(&value) {
                Some(lunch) => config.lunch_time = lunch,
                None => warn_malformed(config_keys::LUNCH_TIME, &value),
            }
        }

        if let Some(value) = self.get_config_value(scope, config_keys::STUDY_REVIEW_CYCLE)? {
            match parse_cycle(&value) {
                Some(cadence) => config.cadence = cadence,
                None => warn_malformed(config_keys::STUDY_REVIEW_CYCLE, &value),
            }
        }

        if let Some(value) = self.get_config_value(scope, config_keys::PACKING_MODE)? {
            match value.trim().to_lowercase().as_str() {
                "equalized" => config.packing_mode = PackingMode::Equalized,
                "proportional" => config.packing_mode = PackingMode::Proportional,
                _ => warn_malformed(config_keys::PACKING_MODE, &value),
            }
        }

        if let Some(value) = self.get_config_value(scope, config_keys::DISTRIBUTION_MODE)? {
            match value.trim().to_lowercase().as_str() {
                "even" => config.distribution_mode = DistributionMode::Even,
                "proportional" => config.distribution_mode = DistributionMode::Proportional,
                _ => warn_malformed(config_keys::DISTRIBUTION_MODE, &value),
            }
        }

        Ok(())
    }

    /// 逐项覆写：存在且可解析时替换，否则保持原值
    fn override_parsed<T: FromStr>(
        &self,
        scope: &ConfigScope,
        key: &str,
        target: &mut T,
    ) -> RepositoryResult<()> {
        if let Some(value) = self.get_config_value(scope, key)? {
            match value.trim().parse::<T>() {
                Ok(parsed) => *target = parsed,
                Err(_) => warn_malformed(key, &value),
            }
        }
        Ok(())
    }
}

fn warn_malformed(key: &str, raw_value: &str) {
    tracing::warn!(
        config_key = key,
        raw_value = %raw_value,
        "配置格式错误，使用默认值"
    );
}

/// "12:00-13:00" → Some(Some(range))；"none"/"" → Some(None)
fn parse_optional_range(value: &str) -> Option<Option<TimeRange>> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Some(None);
    }
    let (start, end) = trimmed.split_once(['-', '~'])?;
    TimeRange::parse(start, end).ok().map(Some)
}

/// "6+1" → Cycle{6,1}；"all" → AllStudy
fn parse_cycle(value: &str) -> Option<CadencePolicy> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("all") {
        return Some(CadencePolicy::AllStudy);
    }
    let (study, review) = trimmed.split_once('+')?;
    let study_days = study.trim().parse().ok()?;
    let review_days = review.trim().parse().ok()?;
    if study_days == 0 {
        return None;
    }
    Some(CadencePolicy::Cycle {
        study_days,
        review_days,
    })
}

// ==========================================
// ConfigScope - 配置作用域
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigScope {
    Global,                             // 全局
    PlanGroup { plan_group_id: String }, // 计划组
}

impl ConfigScope {
    pub fn scope_id(&self) -> String {
        match self {
            ConfigScope::Global => "global".to_string(),
            ConfigScope::PlanGroup { plan_group_id } => format!("plan_group/{}", plan_group_id),
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // JSON 整体配置
    pub const PLANNER_CONFIG: &str = "planner_config";

    // 学习速度
    pub const PAGES_PER_HOUR: &str = "pages_per_hour";
    pub const EPISODES_PER_HOUR: &str = "episodes_per_hour";
    pub const REVIEW_DAY_FACTOR: &str = "review_day_factor";
    pub const FALLBACK_DURATION_MINUTES: &str = "fallback_duration_minutes";

    // 时间轴
    pub const LUNCH_TIME: &str = "lunch_time"; // "12:00-13:00" 或 "none"
    pub const DEFAULT_TRAVEL_MINUTES: &str = "default_travel_minutes";

    // 节奏
    pub const STUDY_REVIEW_CYCLE: &str = "study_review_cycle"; // "6+1" 或 "all"

    // 装箱 / 再分配
    pub const PACKING_MODE: &str = "packing_mode";
    pub const DISTRIBUTION_MODE: &str = "distribution_mode";
    pub const CARRY_OVER_UNPLACED: &str = "carry_over_unplaced";
}
