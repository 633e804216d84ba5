// ==========================================
// 학습 플랜 엔진 - 日程领域模型
// ==========================================
// 职责: 计划期间 / 周时间块 / 排除日 / 学院日程 / 每日条目 / 汇总
// 红线: DayEntry 生成后不可变，ScheduleSummary 只能由 DayEntry 派生
// ==========================================

use crate::domain::time_range::TimeRange;
use crate::domain::types::{DayType, ExclusionType, TimeSlotType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// 学院日程未填写通勤时间时的默认值（分钟，单程）
pub const DEFAULT_TRAVEL_MINUTES: u32 = 60;

// ==========================================
// PlanPeriod - 计划期间（含首尾）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PlanPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// 期间内所有日期（start > end 时为空）
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.start
            .iter_days()
            .take_while(|d| *d <= self.end)
            .collect()
    }
}

// ==========================================
// WeeklyBlock - 周时间块
// ==========================================
/// day_of_week: 0=周日, 1=周一, ..., 6=周六
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyBlock {
    pub day_of_week: u32,
    pub range: TimeRange,
}

// ==========================================
// Exclusion - 排除日
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub exclusion_date: NaiveDate,
    pub exclusion_type: ExclusionType,
    #[serde(default)]
    pub reason: Option<String>,
}

// ==========================================
// AcademySchedule - 学院日程（含往返通勤）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademySchedule {
    pub day_of_week: u32,
    pub range: TimeRange,
    #[serde(default)]
    pub academy_name: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    /// 单程通勤时间（分钟），None 时使用配置默认值
    #[serde(default)]
    pub travel_minutes: Option<u32>,
}

impl AcademySchedule {
    /// 时间轴上的显示标签: "学院名-科目"
    pub fn label(&self) -> String {
        let name = self.academy_name.as_deref().unwrap_or("학원");
        match self.subject.as_deref() {
            Some(subject) if !subject.is_empty() => format!("{}-{}", name, subject),
            _ => name.to_string(),
        }
    }

    pub fn travel_or(&self, default_travel_minutes: u32) -> u32 {
        self.travel_minutes.unwrap_or(default_travel_minutes)
    }
}

// ==========================================
// TimeSlot - 时间轴槽位
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    #[serde(rename = "type")]
    pub slot_type: TimeSlotType,
    pub range: TimeRange,
    #[serde(default)]
    pub label: Option<String>,
}

impl TimeSlot {
    pub fn new(slot_type: TimeSlotType, range: TimeRange) -> Self {
        Self {
            slot_type,
            range,
            label: None,
        }
    }
}

// ==========================================
// DayEntry - 单日日程条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayEntry {
    pub date: NaiveDate,
    pub day_type: DayType,
    /// 可学习时长（小时），含自习
    pub study_hours: f64,
    /// 可学习时间段（已合并）
    #[serde(default)]
    pub available_ranges: Vec<TimeRange>,
    /// 按时间顺序的时间轴
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub academy_schedules: Vec<AcademySchedule>,
    #[serde(default)]
    pub exclusion: Option<Exclusion>,
    /// 周期编号（Cycle 节奏下有效）
    #[serde(default)]
    pub week_number: Option<u32>,
}

impl DayEntry {
    /// 可放置内容的槽位（学习 + 自习），按开始时间排序
    pub fn study_slots(&self) -> Vec<TimeRange> {
        let mut slots: Vec<TimeRange> = self
            .time_slots
            .iter()
            .filter(|s| s.slot_type.is_study_type())
            .map(|s| s.range)
            .collect();
        slots.sort_by_key(|r| r.start());
        slots
    }

    /// 可放置分钟数
    pub fn study_minutes(&self) -> u32 {
        self.study_slots().iter().map(|r| r.minutes()).sum()
    }

    fn slot_minutes_of(&self, slot_type: TimeSlotType) -> u32 {
        self.time_slots
            .iter()
            .filter(|s| s.slot_type == slot_type)
            .map(|s| s.range.minutes())
            .sum()
    }
}

// ==========================================
// ScheduleSummary - 日程汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExclusionDayCounts {
    pub vacation: u32,
    pub personal: u32,
    pub holiday: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademyGroup {
    pub academy_name: String,
    pub subject: String,
    pub days_of_week: Vec<u32>,
    pub range: TimeRange,
    pub travel_minutes: u32,
    pub total_count: u32,
    pub total_academy_hours: f64,
    pub total_travel_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AcademyStatistics {
    pub total_academy_schedules: u32,
    pub unique_academies: u32,
    pub total_academy_hours: f64,
    /// 往返通勤总时长
    pub total_travel_hours: f64,
    /// 每次学院日程的平均往返通勤（分钟）
    pub average_travel_minutes: f64,
    pub academy_groups: Vec<AcademyGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total_days: u32,
    pub total_study_days: u32,
    pub total_review_days: u32,
    pub total_study_hours: f64,
    pub study_hours_on_study_days: f64,
    pub study_hours_on_review_days: f64,
    pub total_self_study_hours: f64,
    pub exclusion_days: ExclusionDayCounts,
    pub academy_statistics: AcademyStatistics,
    pub period: PlanPeriod,
}

/// 学院分组累加器
struct AcademyGroupAcc {
    academy_name: String,
    subject: String,
    days_of_week: BTreeSet<u32>,
    range: TimeRange,
    travel_minutes: u32,
    count: u32,
    academy_minutes: u32,
    travel_minutes_total: u32,
}

impl ScheduleSummary {
    /// 由 DayEntry 序列聚合汇总
    ///
    /// 新计算与缓存复用共用此函数，保证两条路径的汇总逐字段一致
    pub fn from_days(
        days: &[DayEntry],
        period: PlanPeriod,
        default_travel_minutes: u32,
    ) -> Self {
        let mut total_study_days = 0;
        let mut total_review_days = 0;
        let mut total_study_hours = 0.0;
        let mut study_hours_on_study_days = 0.0;
        let mut study_hours_on_review_days = 0.0;
        let mut self_study_minutes: u32 = 0;
        let mut exclusion_days = ExclusionDayCounts::default();

        let mut total_academy_schedules = 0;
        let mut academy_minutes_total: u32 = 0;
        let mut travel_minutes_total: u32 = 0;
        let mut groups: Vec<AcademyGroupAcc> = Vec::new();
        let mut group_index: HashMap<(String, String), usize> = HashMap::new();

        for day in days {
            match day.day_type {
                DayType::StudyDay => {
                    total_study_days += 1;
                    study_hours_on_study_days += day.study_hours;
                }
                DayType::ReviewDay => {
                    total_review_days += 1;
                    study_hours_on_review_days += day.study_hours;
                }
                DayType::Vacation => exclusion_days.vacation += 1,
                DayType::PersonalLeave => exclusion_days.personal += 1,
                DayType::ExcludedHoliday => exclusion_days.holiday += 1,
            }
            total_study_hours += day.study_hours;
            self_study_minutes += day.slot_minutes_of(TimeSlotType::FreeStudy);

            for academy in &day.academy_schedules {
                let minutes = academy.range.minutes();
                let travel = academy.travel_or(default_travel_minutes);
                total_academy_schedules += 1;
                academy_minutes_total += minutes;
                travel_minutes_total += travel * 2;

                let key = (
                    academy.academy_name.clone().unwrap_or_default(),
                    academy.subject.clone().unwrap_or_default(),
                );
                let idx = *group_index.entry(key).or_insert_with(|| {
                    groups.push(AcademyGroupAcc {
                        academy_name: academy
                            .academy_name
                            .clone()
                            .unwrap_or_else(|| "학원".to_string()),
                        subject: academy.subject.clone().unwrap_or_default(),
                        days_of_week: BTreeSet::new(),
                        range: academy.range,
                        travel_minutes: travel,
                        count: 0,
                        academy_minutes: 0,
                        travel_minutes_total: 0,
                    });
                    groups.len() - 1
                });
                let group = &mut groups[idx];
                group.days_of_week.insert(academy.day_of_week);
                group.count += 1;
                group.academy_minutes += minutes;
                group.travel_minutes_total += travel * 2;
            }
        }

        let academy_groups: Vec<AcademyGroup> = groups
            .into_iter()
            .map(|g| AcademyGroup {
                academy_name: g.academy_name,
                subject: g.subject,
                days_of_week: g.days_of_week.into_iter().collect(),
                range: g.range,
                travel_minutes: g.travel_minutes,
                total_count: g.count,
                total_academy_hours: g.academy_minutes as f64 / 60.0,
                total_travel_hours: g.travel_minutes_total as f64 / 60.0,
            })
            .collect();

        let average_travel_minutes = if total_academy_schedules > 0 {
            travel_minutes_total as f64 / total_academy_schedules as f64
        } else {
            0.0
        };

        ScheduleSummary {
            total_days: days.len() as u32,
            total_study_days,
            total_review_days,
            total_study_hours,
            study_hours_on_study_days,
            study_hours_on_review_days,
            total_self_study_hours: self_study_minutes as f64 / 60.0,
            exclusion_days,
            academy_statistics: AcademyStatistics {
                total_academy_schedules,
                unique_academies: academy_groups.len() as u32,
                total_academy_hours: academy_minutes_total as f64 / 60.0,
                total_travel_hours: travel_minutes_total as f64 / 60.0,
                average_travel_minutes,
                academy_groups,
            },
            period,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_period_dates_inclusive() {
        let period = PlanPeriod::new(d(2025, 1, 30), d(2025, 2, 2));
        let dates = period.dates();
        assert_eq!(dates.len(), 4);
        assert_eq!(dates[0], d(2025, 1, 30));
        assert_eq!(dates[3], d(2025, 2, 2));
        assert!(PlanPeriod::new(d(2025, 2, 2), d(2025, 2, 1)).dates().is_empty());
    }

    #[test]
    fn test_academy_label() {
        let range = TimeRange::parse("15:00", "17:00").unwrap();
        let mut academy = AcademySchedule {
            day_of_week: 1,
            range,
            academy_name: Some("대치학원".to_string()),
            subject: Some("수학".to_string()),
            travel_minutes: None,
        };
        assert_eq!(academy.label(), "대치학원-수학");
        academy.subject = None;
        assert_eq!(academy.label(), "대치학원");
        academy.academy_name = None;
        assert_eq!(academy.label(), "학원");
    }

    #[test]
    fn test_summary_counts_academy_round_trip() {
        let range = TimeRange::parse("15:00", "17:00").unwrap();
        let academy = AcademySchedule {
            day_of_week: 1,
            range,
            academy_name: Some("A".to_string()),
            subject: Some("영어".to_string()),
            travel_minutes: Some(30),
        };
        let day = DayEntry {
            date: d(2025, 1, 6),
            day_type: DayType::StudyDay,
            study_hours: 2.0,
            available_ranges: vec![],
            time_slots: vec![],
            note: String::new(),
            academy_schedules: vec![academy.clone(), academy],
            exclusion: None,
            week_number: None,
        };
        let summary =
            ScheduleSummary::from_days(&[day], PlanPeriod::new(d(2025, 1, 6), d(2025, 1, 6)), 60);
        let stats = &summary.academy_statistics;
        assert_eq!(stats.total_academy_schedules, 2);
        assert_eq!(stats.unique_academies, 1);
        assert_eq!(stats.total_academy_hours, 4.0);
        assert_eq!(stats.total_travel_hours, 2.0); // 2 次 × 30 分 × 往返
        assert_eq!(stats.average_travel_minutes, 60.0);
        assert_eq!(stats.academy_groups[0].total_count, 2);
    }
}
