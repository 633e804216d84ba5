// ==========================================
// 학습 플랜 엔진 - 配置层
// ==========================================
// 职责: 引擎配置定义与加载,支持 global / 计划组两级覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod planner_config;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager, ConfigScope};
pub use planner_config::{
    CadencePolicy, DistributionMode, PaceConfig, PackingMode, PlannerConfig, SelfStudyConfig,
};
