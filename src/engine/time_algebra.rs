// ==========================================
// 학습 플랜 엔진 - 时间区间代数
// ==========================================
// 职责: 纯函数区间运算（重叠/相减/合并/求交/时长）
// 红线: 半开区间 [start, end)，无副作用
// 红线: 时长求和不去重，可能重叠时调用方先 merge
// ==========================================

use crate::domain::time_range::TimeRange;

/// 半开区间是否相交（首尾相接不算重叠）
pub fn overlap(a: &TimeRange, b: &TimeRange) -> bool {
    a.start() < b.end() && b.start() < a.end()
}

/// base 减去 exclude
///
/// # 返回
/// - 不重叠: [base]
/// - 完全覆盖: []
/// - 部分重叠: 1 或 2 段
pub fn subtract(base: &TimeRange, exclude: &TimeRange) -> Vec<TimeRange> {
    if !overlap(base, exclude) {
        return vec![*base];
    }

    let mut result = Vec::with_capacity(2);
    if let Some(left) = TimeRange::from_minutes(base.start(), exclude.start()) {
        result.push(left);
    }
    if let Some(right) = TimeRange::from_minutes(exclude.end(), base.end()) {
        result.push(right);
    }
    result
}

/// 合并区间：按开始时间排序，next.start <= current.end 时合并
pub fn merge(ranges: &[TimeRange]) -> Vec<TimeRange> {
    let mut sorted: Vec<TimeRange> = ranges.to_vec();
    sorted.sort_by_key(|r| (r.start(), r.end()));

    let mut merged: Vec<TimeRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(current) if range.start() <= current.end() => {
                if range.end() > current.end() {
                    // start < range.end 恒成立
                    if let Some(joined) = TimeRange::from_minutes(current.start(), range.end()) {
                        *current = joined;
                    }
                }
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// 求交，无交集返回 None
pub fn intersect(a: &TimeRange, b: &TimeRange) -> Option<TimeRange> {
    TimeRange::from_minutes(a.start().max(b.start()), a.end().min(b.end()))
}

/// 各区间时长之和（分钟）
pub fn calculate_minutes(ranges: &[TimeRange]) -> u32 {
    ranges.iter().map(|r| r.minutes()).sum()
}

/// 各区间时长之和（小时）
pub fn calculate_hours(ranges: &[TimeRange]) -> f64 {
    calculate_minutes(ranges) as f64 / 60.0
}

/// 依次减去所有 exclude 后合并
pub fn subtract_multiple(base: &TimeRange, excludes: &[TimeRange]) -> Vec<TimeRange> {
    let mut remaining = vec![*base];
    for exclude in excludes {
        remaining = remaining
            .iter()
            .flat_map(|r| subtract(r, exclude))
            .collect();
        if remaining.is_empty() {
            break;
        }
    }
    merge(&remaining)
}

/// 多个基础区间减去同一组 exclude
pub fn subtract_all(bases: &[TimeRange], excludes: &[TimeRange]) -> Vec<TimeRange> {
    let pieces: Vec<TimeRange> = bases
        .iter()
        .flat_map(|base| subtract_multiple(base, excludes))
        .collect();
    merge(&pieces)
}
