// ==========================================
// 학습 플랜 엔진 - 命令行入口
// ==========================================
// 用法: study-plan-engine <request.json> [db_path] [plan_group_id]
// 输出: PlanGenerationResult JSON (stdout)，日志走 stderr
// ==========================================

use anyhow::{Context, Result};
use std::path::PathBuf;
use study_plan_engine::config::{ConfigManager, ConfigScope};
use study_plan_engine::repository::DailyScheduleSnapshotRepository;
use study_plan_engine::{logging, PlanGenerationRequest, PlanGenerator};

/// 默认数据库路径
///
/// 优先 STUDY_PLAN_ENGINE_DB_PATH，其次用户数据目录，最后当前目录
fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("STUDY_PLAN_ENGINE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./study_plan_engine.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("study-plan-engine");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("study_plan_engine.db");
        }
    }
    path.to_string_lossy().to_string()
}

fn main() -> Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let request_path = args
        .next()
        .context("用法: study-plan-engine <request.json> [db_path] [plan_group_id]")?;
    let db_path = args.next().unwrap_or_else(get_default_db_path);
    let plan_group_id = args.next().unwrap_or_else(|| "default".to_string());

    tracing::info!("==================================================");
    tracing::info!("{} v{}", study_plan_engine::APP_NAME, study_plan_engine::VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    let raw = std::fs::read_to_string(&request_path)
        .with_context(|| format!("读取请求文件失败: {}", request_path))?;
    let request: PlanGenerationRequest =
        serde_json::from_str(&raw).context("解析 PlanGenerationRequest 失败")?;

    let config_manager = ConfigManager::new(&db_path).context("打开配置存储失败")?;
    let config = config_manager
        .load_planner_config(&ConfigScope::PlanGroup {
            plan_group_id: plan_group_id.clone(),
        })
        .context("加载引擎配置失败")?;

    let snapshots = DailyScheduleSnapshotRepository::new(&db_path).context("打开日程快照存储失败")?;
    let cached = snapshots
        .find(&plan_group_id)?
        .map(|snapshot| snapshot.schedule_json);

    let generator = PlanGenerator::new();
    let result = generator.generate(&request, cached.as_deref(), &config)?;

    snapshots.save(&plan_group_id, request.period, &result.daily_schedule)?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
