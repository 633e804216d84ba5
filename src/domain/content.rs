// ==========================================
// 학습 플랜 엔진 - 内容领域模型
// ==========================================
// 职责: 内容分配单元 / 内容目录（自有记录 + 主目录记录）/ 临时任务
// 红线: 只描述数据，不含时长推导逻辑（见 engine::duration）
// ==========================================

use crate::domain::types::ContentType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// ContentAllocation - 待排分配单元
// ==========================================
/// 例: 教材第 1~50 页
/// 分量 = end_range - start_range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAllocation {
    pub content_type: ContentType,
    pub content_id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub subject_category: Option<String>,
    pub start_range: u32,
    pub end_range: u32,
    /// 排序提示（小者优先，None 排在最后）
    #[serde(default)]
    pub ordering_hint: Option<u32>,
    /// 由删除内容转入的分量（已计入 end_range，不受目录总分量限制）
    #[serde(default)]
    pub redistributed_volume: u32,
}

impl ContentAllocation {
    /// 分配分量（页/讲/分钟）
    pub fn volume(&self) -> u32 {
        self.end_range.saturating_sub(self.start_range)
    }
}

// ==========================================
// PlanContent - 计划内容清单项（供校验器使用）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanContent {
    pub content_id: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub subject_category: Option<String>,
    /// 显示顺序（先修校验使用）
    pub display_order: u32,
}

impl PlanContent {
    /// 用于提示信息的名称
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.content_id)
    }
}

// ==========================================
// 内容目录记录
// ==========================================

/// 学生自有教材
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BookRecord {
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub master_content_id: Option<String>,
}

/// 学生自有讲座
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LectureRecord {
    #[serde(default)]
    pub total_episodes: Option<u32>,
    /// 每讲时长（分钟），直接给出时优先使用
    #[serde(default)]
    pub episode_duration_minutes: Option<u32>,
    #[serde(default)]
    pub master_content_id: Option<String>,
}

/// 自定义内容（直接携带总时长）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomContentRecord {
    #[serde(default)]
    pub total_minutes: Option<u32>,
}

/// 主目录教材
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MasterBook {
    #[serde(default)]
    pub total_pages: Option<u32>,
}

/// 主目录讲座
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MasterLecture {
    #[serde(default)]
    pub total_episodes: Option<u32>,
    #[serde(default)]
    pub total_duration_minutes: Option<u32>,
}

// ==========================================
// ContentCatalog - 内容目录快照
// ==========================================
/// 由内容管理存储提供的只读快照（key = content_id / master id）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentCatalog {
    #[serde(default)]
    pub books: HashMap<String, BookRecord>,
    #[serde(default)]
    pub lectures: HashMap<String, LectureRecord>,
    #[serde(default)]
    pub customs: HashMap<String, CustomContentRecord>,
    #[serde(default)]
    pub master_books: HashMap<String, MasterBook>,
    #[serde(default)]
    pub master_lectures: HashMap<String, MasterLecture>,
}

impl ContentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_book(mut self, content_id: &str, record: BookRecord) -> Self {
        self.books.insert(content_id.to_string(), record);
        self
    }

    pub fn with_lecture(mut self, content_id: &str, record: LectureRecord) -> Self {
        self.lectures.insert(content_id.to_string(), record);
        self
    }

    pub fn with_custom(mut self, content_id: &str, record: CustomContentRecord) -> Self {
        self.customs.insert(content_id.to_string(), record);
        self
    }

    pub fn with_master_book(mut self, master_id: &str, record: MasterBook) -> Self {
        self.master_books.insert(master_id.to_string(), record);
        self
    }

    pub fn with_master_lecture(mut self, master_id: &str, record: MasterLecture) -> Self {
        self.master_lectures.insert(master_id.to_string(), record);
        self
    }

    /// 教材关联的主目录记录
    pub fn master_book_of(&self, record: &BookRecord) -> Option<&MasterBook> {
        record
            .master_content_id
            .as_ref()
            .and_then(|id| self.master_books.get(id))
    }

    /// 讲座关联的主目录记录
    pub fn master_lecture_of(&self, record: &LectureRecord) -> Option<&MasterLecture> {
        record
            .master_content_id
            .as_ref()
            .and_then(|id| self.master_lectures.get(id))
    }
}

// ==========================================
// 删除内容 / 临时任务
// ==========================================

/// 被删除内容的分量信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedContent {
    pub content_id: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub subject_category: Option<String>,
    /// 计划总分量
    pub total_volume: u32,
    /// 已完成分量
    #[serde(default)]
    pub completed_volume: u32,
}

impl DeletedContent {
    /// 未完成分量
    pub fn remaining_volume(&self) -> u32 {
        self.total_volume.saturating_sub(self.completed_volume)
    }
}

/// 独立于日程的临时任务（to_adhoc 策略产出）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdHocTask {
    pub id: String,
    pub title: String,
    pub description: String,
    pub source_content_id: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub subject_category: Option<String>,
    pub volume: u32,
}
