// ==========================================
// 학습 플랜 엔진 - 科目约束校验引擎
// ==========================================
// 红线: 排除科目命中 → strict 阻断 / advisory 提示
// 红线: 必修科目不足永远只是提示，即使 strict 模式
// ==========================================
// 职责: 必修/排除科目校验
// 输入: 计划内容清单 + SubjectConstraints
// 输出: ValidationResult (errors[] / warnings[])
// ==========================================

mod core;


pub use self::core::SubjectConstraintValidator;
