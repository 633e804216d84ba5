// ==========================================
// 학습 플랜 엔진 - 约束与校验结果模型
// ==========================================
// 红线: 必修科目不足永远只是提示，即使 strict 模式
// 红线: 先修依赖只做顺序检查，不做环检测/自动重排
// ==========================================

use crate::domain::types::{ConstraintHandling, ValidationIssueKind};
use serde::{Deserialize, Serialize};

// ==========================================
// SubjectConstraints - 科目约束（只读输入）
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubjectConstraints {
    #[serde(default)]
    pub required_subjects: Vec<RequiredSubject>,
    #[serde(default)]
    pub excluded_subjects: Vec<String>,
    #[serde(default)]
    pub constraint_handling: ConstraintHandling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredSubject {
    pub subject_category: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub min_count: u32,
}

// ==========================================
// ContentDependency - 先修依赖边
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDependency {
    pub prerequisite_content_id: String,
    pub dependent_content_id: String,
}

impl ContentDependency {
    pub fn new(prerequisite: &str, dependent: &str) -> Self {
        Self {
            prerequisite_content_id: prerequisite.to_string(),
            dependent_content_id: dependent.to_string(),
        }
    }
}

// ==========================================
// ValidationIssue / ValidationResult
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: ValidationIssueKind,
    pub message: String,
    /// 涉及的内容（order_violation 时依次为先修、依赖）
    #[serde(default)]
    pub content_ids: Vec<String>,
    #[serde(default)]
    pub subject: Option<String>,
    /// 必修科目缺口数量
    #[serde(default)]
    pub shortfall: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn push_error(&mut self, issue: ValidationIssue) {
        self.is_valid = false;
        self.errors.push(issue);
    }

    pub fn push_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// 合并另一份结果（任一无效则无效）
    pub fn merge(&mut self, other: ValidationResult) {
        self.is_valid &= other.is_valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::valid()
    }
}
