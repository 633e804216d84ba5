// ==========================================
// 학습 플랜 엔진 - 先修依赖校验引擎
// ==========================================
// 红线: 所有结果只作提示，不阻断、不自动重排
// 红线: 不做环检测
// ==========================================
// 职责: 检查先修内容是否排在依赖内容之前
// 输入: 带显示顺序的内容清单 + 依赖边
// 输出: ValidationResult (仅 warnings)
// ==========================================

use crate::domain::constraint::{ContentDependency, ValidationIssue, ValidationResult};
use crate::domain::content::PlanContent;
use crate::domain::types::ValidationIssueKind;
use crate::error::{PlannerError, PlannerResult};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

// ==========================================
// DependencyValidator - 先修依赖校验
// ==========================================
pub struct DependencyValidator {
    // 无状态引擎
}

impl DependencyValidator {
    pub fn new() -> Self {
        Self {}
    }

    /// 校验先修顺序
    ///
    /// # 规则
    /// - 先修缺失 + 依赖存在 → missing_prerequisite
    /// - 二者都存在且 先修顺序 >= 依赖顺序 → order_violation
    #[instrument(skip(self, contents, dependencies), fields(
        contents_count = contents.len(),
        dependencies_count = dependencies.len()
    ))]
    pub fn validate(
        &self,
        contents: &[PlanContent],
        dependencies: &[ContentDependency],
    ) -> ValidationResult {
        let mut result = ValidationResult::valid();
        let by_id: HashMap<&str, &PlanContent> = contents
            .iter()
            .map(|c| (c.content_id.as_str(), c))
            .collect();

        for edge in dependencies {
            let prerequisite = by_id.get(edge.prerequisite_content_id.as_str());
            let dependent = by_id.get(edge.dependent_content_id.as_str());

            match (prerequisite, dependent) {
                (None, Some(dep)) => result.push_warning(ValidationIssue {
                    kind: ValidationIssueKind::MissingPrerequisite,
                    message: format!(
                        "'{}'의 선수 콘텐츠({})가 플랜에 포함되어 있지 않습니다.",
                        dep.display_name(),
                        edge.prerequisite_content_id
                    ),
                    content_ids: vec![
                        edge.prerequisite_content_id.clone(),
                        edge.dependent_content_id.clone(),
                    ],
                    subject: None,
                    shortfall: None,
                }),
                (Some(pre), Some(dep)) if pre.display_order >= dep.display_order => {
                    result.push_warning(ValidationIssue {
                        kind: ValidationIssueKind::OrderViolation,
                        message: format!(
                            "선수 콘텐츠 '{}'(순서 {})가 '{}'(순서 {})보다 뒤에 배치되어 있습니다.",
                            pre.display_name(),
                            pre.display_order,
                            dep.display_name(),
                            dep.display_order
                        ),
                        content_ids: vec![pre.content_id.clone(), dep.content_id.clone()],
                        subject: None,
                        shortfall: None,
                    })
                }
                _ => {}
            }
        }

        debug!(warnings = result.warnings.len(), "先修依赖校验完成");
        result
    }

    /// 新增依赖边的合法性
    ///
    /// # 返回
    /// - Err(InvalidDependency): 自依赖 / 已存在反向边 / 重复边
    pub fn validate_new_dependency(
        &self,
        edge: &ContentDependency,
        existing: &[ContentDependency],
    ) -> PlannerResult<()> {
        if edge.prerequisite_content_id == edge.dependent_content_id {
            return Err(PlannerError::InvalidDependency(format!(
                "内容不能依赖自身: {}",
                edge.prerequisite_content_id
            )));
        }

        for e in existing {
            if e == edge {
                return Err(PlannerError::InvalidDependency(format!(
                    "依赖已存在: {} → {}",
                    edge.prerequisite_content_id, edge.dependent_content_id
                )));
            }
            if e.prerequisite_content_id == edge.dependent_content_id
                && e.dependent_content_id == edge.prerequisite_content_id
            {
                return Err(PlannerError::InvalidDependency(format!(
                    "已存在反向依赖: {} → {}",
                    e.prerequisite_content_id, e.dependent_content_id
                )));
            }
        }
        Ok(())
    }

    /// 与计划内容相关的依赖边（任一端在计划内）
    pub fn relevant_dependencies(
        &self,
        content_ids: &[String],
        edges: &[ContentDependency],
    ) -> Vec<ContentDependency> {
        let ids: HashSet<&str> = content_ids.iter().map(|s| s.as_str()).collect();
        edges
            .iter()
            .filter(|e| {
                ids.contains(e.prerequisite_content_id.as_str())
                    || ids.contains(e.dependent_content_id.as_str())
            })
            .cloned()
            .collect()
    }
}

impl Default for DependencyValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ContentType;

    fn content(id: &str, order: u32) -> PlanContent {
        PlanContent {
            content_id: id.to_string(),
            content_type: ContentType::Lecture,
            title: None,
            subject: None,
            subject_category: None,
            display_order: order,
        }
    }

    #[test]
    fn test_order_violation_names_both() {
        let validator = DependencyValidator::new();
        let result = validator.validate(
            &[content("A", 3), content("B", 1)],
            &[ContentDependency::new("A", "B")],
        );
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        let issue = &result.warnings[0];
        assert_eq!(issue.kind, ValidationIssueKind::OrderViolation);
        assert_eq!(issue.content_ids, vec!["A".to_string(), "B".to_string()]);
        assert!(issue.message.contains('A') && issue.message.contains('B'));
    }

    #[test]
    fn test_equal_order_is_violation() {
        let validator = DependencyValidator::new();
        let result = validator.validate(
            &[content("A", 2), content("B", 2)],
            &[ContentDependency::new("A", "B")],
        );
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_missing_prerequisite_and_ignored_cases() {
        let validator = DependencyValidator::new();
        let result = validator.validate(
            &[content("B", 1), content("C", 2)],
            &[
                ContentDependency::new("A", "B"), // 先修缺失
                ContentDependency::new("C", "D"), // 依赖不在计划内，忽略
                ContentDependency::new("B", "C"), // 顺序正确
            ],
        );
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, ValidationIssueKind::MissingPrerequisite);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_validate_new_dependency() {
        let validator = DependencyValidator::new();
        let existing = vec![ContentDependency::new("A", "B")];
        assert!(validator
            .validate_new_dependency(&ContentDependency::new("A", "A"), &existing)
            .is_err());
        assert!(validator
            .validate_new_dependency(&ContentDependency::new("B", "A"), &existing)
            .is_err());
        assert!(validator
            .validate_new_dependency(&ContentDependency::new("A", "B"), &existing)
            .is_err());
        assert!(validator
            .validate_new_dependency(&ContentDependency::new("B", "C"), &existing)
            .is_ok());
    }

    #[test]
    fn test_relevant_dependencies() {
        let validator = DependencyValidator::new();
        let edges = vec![
            ContentDependency::new("A", "B"),
            ContentDependency::new("X", "Y"),
            ContentDependency::new("Y", "C"),
        ];
        let relevant = validator.relevant_dependencies(&["B".to_string(), "C".to_string()], &edges);
        assert_eq!(relevant.len(), 2);
    }
}
