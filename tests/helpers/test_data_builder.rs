// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::NaiveDate;
use study_plan_engine::domain::{
    AcademySchedule, ContentAllocation, ContentCatalog, ContentDependency, Exclusion,
    PlanContent, PlanPeriod, RequiredSubject, SubjectConstraints, TimeRange, WeeklyBlock,
};
use study_plan_engine::engine::PlanGenerationRequest;
use study_plan_engine::{ConstraintHandling, ContentType, ExclusionType};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn range(start: &str, end: &str) -> TimeRange {
    TimeRange::parse(start, end).unwrap()
}

// ==========================================
// PlanGenerationRequest 构建器
// ==========================================

pub struct RequestBuilder {
    request: PlanGenerationRequest,
}

impl RequestBuilder {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            request: PlanGenerationRequest {
                period: PlanPeriod::new(start, end),
                blocks: Vec::new(),
                exclusions: Vec::new(),
                academy_schedules: Vec::new(),
                contents: Vec::new(),
                allocations: Vec::new(),
                catalog: ContentCatalog::new(),
                constraints: SubjectConstraints::default(),
                dependencies: Vec::new(),
            },
        }
    }

    /// day_of_week: 0=周日 ... 6=周六
    pub fn block(mut self, day_of_week: u32, start: &str, end: &str) -> Self {
        self.request.blocks.push(WeeklyBlock {
            day_of_week,
            range: range(start, end),
        });
        self
    }

    /// 周一~周五相同时间块
    pub fn weekday_blocks(mut self, start: &str, end: &str) -> Self {
        for day_of_week in 1..=5 {
            self = self.block(day_of_week, start, end);
        }
        self
    }

    /// 每天相同时间块
    pub fn daily_blocks(mut self, start: &str, end: &str) -> Self {
        for day_of_week in 0..=6 {
            self = self.block(day_of_week, start, end);
        }
        self
    }

    pub fn exclusion(mut self, exclusion_date: NaiveDate, exclusion_type: ExclusionType) -> Self {
        self.request.exclusions.push(Exclusion {
            exclusion_date,
            exclusion_type,
            reason: None,
        });
        self
    }

    pub fn academy(
        mut self,
        day_of_week: u32,
        start: &str,
        end: &str,
        name: &str,
        subject: &str,
        travel_minutes: Option<u32>,
    ) -> Self {
        self.request.academy_schedules.push(AcademySchedule {
            day_of_week,
            range: range(start, end),
            academy_name: Some(name.to_string()),
            subject: Some(subject.to_string()),
            travel_minutes,
        });
        self
    }

    pub fn allocation(mut self, allocation: ContentAllocation) -> Self {
        self.request.allocations.push(allocation);
        self
    }

    pub fn content(mut self, content_id: &str, category: &str, display_order: u32) -> Self {
        self.request.contents.push(PlanContent {
            content_id: content_id.to_string(),
            content_type: ContentType::Book,
            title: None,
            subject: None,
            subject_category: Some(category.to_string()),
            display_order,
        });
        self
    }

    pub fn excluded_subjects(mut self, subjects: &[&str], handling: ConstraintHandling) -> Self {
        self.request.constraints.excluded_subjects =
            subjects.iter().map(|s| s.to_string()).collect();
        self.request.constraints.constraint_handling = handling;
        self
    }

    pub fn required_subject(mut self, category: &str, min_count: u32) -> Self {
        self.request.constraints.required_subjects.push(RequiredSubject {
            subject_category: category.to_string(),
            subject: None,
            min_count,
        });
        self
    }

    pub fn dependency(mut self, prerequisite: &str, dependent: &str) -> Self {
        self.request
            .dependencies
            .push(ContentDependency::new(prerequisite, dependent));
        self
    }

    pub fn catalog(mut self, catalog: ContentCatalog) -> Self {
        self.request.catalog = catalog;
        self
    }

    pub fn build(self) -> PlanGenerationRequest {
        self.request
    }
}

// ==========================================
// ContentAllocation 构建器
// ==========================================

pub struct AllocationBuilder {
    allocation: ContentAllocation,
}

impl AllocationBuilder {
    pub fn book(content_id: &str) -> Self {
        Self::of(ContentType::Book, content_id)
    }

    pub fn lecture(content_id: &str) -> Self {
        Self::of(ContentType::Lecture, content_id)
    }

    fn of(content_type: ContentType, content_id: &str) -> Self {
        Self {
            allocation: ContentAllocation {
                content_type,
                content_id: content_id.to_string(),
                subject: None,
                subject_category: None,
                start_range: 0,
                end_range: 0,
                ordering_hint: None,
                redistributed_volume: 0,
            },
        }
    }

    pub fn range(mut self, start: u32, end: u32) -> Self {
        self.allocation.start_range = start;
        self.allocation.end_range = end;
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.allocation.subject_category = Some(category.to_string());
        self
    }

    pub fn hint(mut self, hint: u32) -> Self {
        self.allocation.ordering_hint = Some(hint);
        self
    }

    pub fn build(self) -> ContentAllocation {
        self.allocation
    }
}
