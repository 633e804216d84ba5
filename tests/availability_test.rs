// ==========================================
// AvailabilityCalculator 集成测试
// ==========================================
// 测试目标: 验证日分类、时间轴与可用时间
// 覆盖范围: 排除日映射、学院通勤、学习/复习周期、配置错误
// ==========================================

mod helpers;

use helpers::test_data_builder::{date, range, RequestBuilder};
use study_plan_engine::config::{CadencePolicy, PlannerConfig};
use study_plan_engine::engine::AvailabilityCalculator;
use study_plan_engine::{DayType, ExclusionType, PlannerError, TimeSlotType};

// ==========================================
// 测试用例
// ==========================================

#[test]
fn test_weekday_blocks_with_weekend_holidays() {
    // 2025-01-01 为周三，01-04/05 为周末
    let request = RequestBuilder::new(date(2025, 1, 1), date(2025, 1, 7))
        .weekday_blocks("09:00", "12:00")
        .exclusion(date(2025, 1, 4), ExclusionType::Holiday)
        .exclusion(date(2025, 1, 5), ExclusionType::Holiday)
        .build();

    let result = AvailabilityCalculator::new()
        .calculate(&request.availability_input(), &PlannerConfig::default())
        .unwrap();

    assert_eq!(result.days.len(), 7);
    let study: Vec<_> = result
        .days
        .iter()
        .filter(|d| d.day_type == DayType::StudyDay)
        .collect();
    assert_eq!(study.len(), 5);
    for day in &study {
        assert_eq!(day.time_slots.len(), 1);
        assert_eq!(day.time_slots[0].slot_type, TimeSlotType::Study);
        assert_eq!(day.time_slots[0].range.minutes(), 180);
        assert_eq!(day.note, "09:00~12:00");
    }

    let holidays: Vec<_> = result
        .days
        .iter()
        .filter(|d| d.day_type == DayType::ExcludedHoliday)
        .collect();
    assert_eq!(holidays.len(), 2);
    assert!(holidays.iter().all(|d| d.time_slots.is_empty()));
    assert!(holidays.iter().all(|d| d.study_hours == 0.0));

    assert_eq!(result.summary.total_study_days, 5);
    assert_eq!(result.summary.total_review_days, 0);
    assert_eq!(result.summary.exclusion_days.holiday, 2);
    assert_eq!(result.summary.total_study_hours, 15.0);
}

#[test]
fn test_academy_travel_and_lunch_timeline() {
    // 2025-01-06 为周一
    let request = RequestBuilder::new(date(2025, 1, 6), date(2025, 1, 6))
        .block(1, "09:00", "18:00")
        .academy(1, "14:00", "16:00", "수학학원", "수학", Some(30))
        .build();

    let result = AvailabilityCalculator::new()
        .calculate(&request.availability_input(), &PlannerConfig::default())
        .unwrap();
    let day = &result.days[0];

    let types: Vec<TimeSlotType> = day.time_slots.iter().map(|s| s.slot_type).collect();
    assert_eq!(
        types,
        vec![
            TimeSlotType::Study,
            TimeSlotType::Lunch,
            TimeSlotType::Study,
            TimeSlotType::Travel,
            TimeSlotType::Academy,
            TimeSlotType::Travel,
            TimeSlotType::Study,
        ]
    );
    assert_eq!(day.time_slots[4].label.as_deref(), Some("수학학원-수학"));
    assert_eq!(
        day.available_ranges,
        vec![
            range("09:00", "12:00"),
            range("13:00", "13:30"),
            range("16:30", "18:00")
        ]
    );
    assert_eq!(day.study_hours, 5.0);

    let stats = &result.summary.academy_statistics;
    assert_eq!(stats.total_academy_schedules, 1);
    assert_eq!(stats.unique_academies, 1);
    assert_eq!(stats.total_academy_hours, 2.0);
    assert_eq!(stats.total_travel_hours, 1.0);
    assert_eq!(stats.average_travel_minutes, 60.0);
}

#[test]
fn test_cycle_cadence_skips_excluded_days() {
    let request = RequestBuilder::new(date(2025, 1, 6), date(2025, 1, 19))
        .daily_blocks("09:00", "12:00")
        .exclusion(date(2025, 1, 8), ExclusionType::Vacation)
        .build();
    let config = PlannerConfig {
        cadence: CadencePolicy::Cycle {
            study_days: 6,
            review_days: 1,
        },
        ..PlannerConfig::default()
    };

    let result = AvailabilityCalculator::new()
        .calculate(&request.availability_input(), &config)
        .unwrap();
    let day = |d: u32| {
        result
            .days
            .iter()
            .find(|e| e.date == date(2025, 1, d))
            .unwrap()
    };

    assert_eq!(day(8).day_type, DayType::Vacation);
    assert_eq!(day(8).week_number, Some(1));
    assert_eq!(day(12).day_type, DayType::StudyDay);
    assert_eq!(day(13).day_type, DayType::ReviewDay);
    assert_eq!(day(13).week_number, Some(1));
    assert_eq!(day(14).week_number, Some(2));

    assert_eq!(result.summary.total_review_days, 1);
    assert_eq!(result.summary.total_study_days, 12);
    assert_eq!(result.summary.exclusion_days.vacation, 1);
}

#[test]
fn test_weekday_without_blocks_still_present() {
    let request = RequestBuilder::new(date(2025, 1, 4), date(2025, 1, 6))
        .weekday_blocks("09:00", "12:00")
        .exclusion(date(2025, 3, 1), ExclusionType::Holiday)
        .build();

    let result = AvailabilityCalculator::new()
        .calculate(&request.availability_input(), &PlannerConfig::default())
        .unwrap();

    // 周六/周日无时间块：仍为学习日，但零时长、无槽位
    assert_eq!(result.days.len(), 3);
    assert_eq!(result.days[0].day_type, DayType::StudyDay);
    assert!(result.days[0].time_slots.is_empty());
    assert_eq!(result.days[0].note, "학습 불가");
    assert_eq!(result.summary.exclusion_days.holiday, 0);
}

#[test]
fn test_configuration_errors() {
    let calculator = AvailabilityCalculator::new();
    let config = PlannerConfig::default();

    let reversed = RequestBuilder::new(date(2025, 1, 7), date(2025, 1, 1))
        .weekday_blocks("09:00", "12:00")
        .build();
    assert!(matches!(
        calculator.calculate(&reversed.availability_input(), &config),
        Err(PlannerError::InvalidPeriod { .. })
    ));

    let no_blocks = RequestBuilder::new(date(2025, 1, 1), date(2025, 1, 7)).build();
    assert!(matches!(
        calculator.calculate(&no_blocks.availability_input(), &config),
        Err(PlannerError::MissingBlockSet)
    ));

    let bad_block = RequestBuilder::new(date(2025, 1, 1), date(2025, 1, 7))
        .block(7, "09:00", "12:00")
        .build();
    assert!(matches!(
        calculator.calculate(&bad_block.availability_input(), &config),
        Err(PlannerError::InvalidBlock(_))
    ));
}
