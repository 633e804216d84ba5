// ==========================================
// 학습 플랜 엔진 - 科目约束校验引擎
// ==========================================
// 红线: 排除科目命中 → strict 阻断 / advisory 提示
// 红线: 必修科目不足永远只是提示，即使 strict 模式
// ==========================================

use crate::domain::constraint::{SubjectConstraints, ValidationIssue, ValidationResult};
use crate::domain::content::PlanContent;
use crate::domain::types::{ConstraintHandling, ValidationIssueKind};
use crate::error::{PlannerError, PlannerResult};
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

// ==========================================
// SubjectConstraintValidator - 科目约束校验
// ==========================================
pub struct SubjectConstraintValidator {
    // 无状态,约束通过参数传入
}

impl SubjectConstraintValidator {
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 配置验证
    // ==========================================

    /// 检查约束配置本身
    ///
    /// 配置问题只作提示，不阻断生成
    ///
    /// # 验证规则
    /// 1. 空的排除科目名 / 空的必修科目类别 → 忽略该条目
    /// 2. min_count == 0 → 视为无要求，不提示
    /// 3. 同一科目既必修又排除 → 提示
    pub fn validate_config(&self, constraints: &SubjectConstraints) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let excluded: HashSet<String> = constraints
            .excluded_subjects
            .iter()
            .map(|s| normalize(s))
            .collect();

        if excluded.contains("") {
            issues.push(config_issue("빈 제외 과목 이름은 무시됩니다.".to_string(), None));
        }

        for required in &constraints.required_subjects {
            let category = normalize(&required.subject_category);
            if category.is_empty() {
                issues.push(config_issue(
                    "과목 분류가 비어 있는 필수 과목은 무시됩니다.".to_string(),
                    None,
                ));
                continue;
            }
            if required.min_count > 0 && excluded.contains(&category) {
                issues.push(config_issue(
                    format!(
                        "'{}' 과목이 필수 과목과 제외 과목에 동시에 지정되어 있습니다.",
                        required.subject_category
                    ),
                    Some(required.subject_category.clone()),
                ));
            }
        }

        if !issues.is_empty() {
            warn!(issues = issues.len(), "科目约束配置存在问题");
        }
        issues
    }

    // ==========================================
    // 核心校验
    // ==========================================

    /// 校验计划内容清单
    ///
    /// # 返回
    /// - is_valid=false: strict 模式下存在排除科目命中
    /// - warnings: 配置问题 + advisory 下的排除命中 + 所有必修不足
    #[instrument(skip(self, contents, constraints), fields(
        contents_count = contents.len(),
        handling = %constraints.constraint_handling
    ))]
    pub fn validate(
        &self,
        contents: &[PlanContent],
        constraints: &SubjectConstraints,
    ) -> ValidationResult {
        let mut result = ValidationResult::valid();

        for issue in self.validate_config(constraints) {
            result.push_warning(issue);
        }
        self.check_excluded(contents, constraints, &mut result);
        self.check_required(contents, constraints, &mut result);

        debug!(
            is_valid = result.is_valid,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "科目约束校验完成"
        );
        result
    }

    /// 阻断检查：存在 error 时返回 BlockingConstraintViolation
    pub fn ensure_not_blocked(&self, result: &ValidationResult) -> PlannerResult<()> {
        let Some(first) = result.errors.first() else {
            return Ok(());
        };

        let subject = first.subject.clone().unwrap_or_default();
        let content_ids: Vec<String> = result
            .errors
            .iter()
            .filter(|e| e.subject.as_deref() == Some(subject.as_str()))
            .flat_map(|e| e.content_ids.iter().cloned())
            .collect();

        warn!(subject = %subject, contents = ?content_ids, "排除科目约束阻断");
        Err(PlannerError::BlockingConstraintViolation {
            subject,
            content_ids,
        })
    }

    /// 排除科目：科目类别或科目名大小写不敏感匹配
    fn check_excluded(
        &self,
        contents: &[PlanContent],
        constraints: &SubjectConstraints,
        result: &mut ValidationResult,
    ) {
        for content in contents {
            let Some(excluded) = constraints
                .excluded_subjects
                .iter()
                .find(|ex| matches_subject(content, ex))
            else {
                continue;
            };

            let issue = ValidationIssue {
                kind: ValidationIssueKind::Excluded,
                message: format!(
                    "제외 과목 '{}'에 해당하는 콘텐츠가 포함되어 있습니다: {}",
                    excluded,
                    content.display_name()
                ),
                content_ids: vec![content.content_id.clone()],
                subject: Some(excluded.clone()),
                shortfall: None,
            };

            match constraints.constraint_handling {
                ConstraintHandling::Strict => result.push_error(issue),
                ConstraintHandling::Advisory => result.push_warning(issue),
            }
        }
    }

    /// 必修科目：不足数量只作提示
    fn check_required(
        &self,
        contents: &[PlanContent],
        constraints: &SubjectConstraints,
        result: &mut ValidationResult,
    ) {
        for required in &constraints.required_subjects {
            let category = normalize(&required.subject_category);
            if category.is_empty() {
                continue;
            }
            let subject = required.subject.as_deref().map(normalize);

            let count = contents
                .iter()
                .filter(|c| {
                    let category_match =
                        c.subject_category.as_deref().map(normalize).as_deref() == Some(category.as_str());
                    let subject_match = match &subject {
                        Some(s) => c.subject.as_deref().map(normalize).as_deref() == Some(s.as_str()),
                        None => true,
                    };
                    category_match && subject_match
                })
                .count() as u32;

            if count >= required.min_count {
                continue;
            }

            let shortfall = required.min_count - count;
            let label = match &required.subject {
                Some(s) => format!("{} - {}", required.subject_category, s),
                None => required.subject_category.clone(),
            };
            result.push_warning(ValidationIssue {
                kind: ValidationIssueKind::RequiredShortfall,
                message: format!(
                    "필수 과목 '{}' 콘텐츠가 부족합니다 (필요 {}개, 현재 {}개)",
                    label, required.min_count, count
                ),
                content_ids: Vec::new(),
                subject: Some(label),
                shortfall: Some(shortfall),
            });
        }
    }
}

impl Default for SubjectConstraintValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn config_issue(message: String, subject: Option<String>) -> ValidationIssue {
    ValidationIssue {
        kind: ValidationIssueKind::ConstraintConfig,
        message,
        content_ids: Vec::new(),
        subject,
        shortfall: None,
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn matches_subject(content: &PlanContent, excluded: &str) -> bool {
    let target = normalize(excluded);
    if target.is_empty() {
        return false;
    }
    [content.subject_category.as_deref(), content.subject.as_deref()]
        .into_iter()
        .flatten()
        .any(|v| normalize(v) == target)
}
