//! Workforce input and schedule audit tests

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use shiftplan_core::audit::{audit, ViolationKind};
use shiftplan_core::quality::ScheduleQuality;
use shiftplan_core::{
    Assignment, AssignmentSource, DayType, DemandLookup, GenerationError, Horizon, LaborRules,
    Schedule, Shift, Workforce,
};

const INPUT: &str = r#"{
  "categories": [
    { "id": 1, "name": "regular", "hourly_rate": "10.5" },
    { "id": 2, "hourly_rate": "14" }
  ],
  "employees": [
    {
      "id": 7,
      "name": "Ada",
      "category_id": 1,
      "off_day_preferences": { "Sat": 1, "Wednesday": 3 },
      "shift_preferences": [2, 1, 3],
      "work_center_preferences": [10, 11],
      "delta": 4.0
    },
    { "id": 8, "category_id": 2, "work_center_preferences": [11] }
  ],
  "work_centers": [
    {
      "id": 10,
      "demand": {
        "weekday": { "1": [1, 1, 0], "2": [0, 0, 1] },
        "weekend": { "1": [1, 0, 0] }
      }
    },
    { "id": 11, "name": "Packing", "demand": { "weekday": { "1": [0, 1] } } }
  ]
}"#;

fn workforce() -> Workforce {
    serde_json::from_str(INPUT).unwrap()
}

fn monday_to_sunday() -> Horizon {
    Horizon::new(
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 12).unwrap(),
    )
    .unwrap()
}

#[test]
fn parses_wire_format() {
    let workforce = workforce();
    assert!(workforce.validate().is_ok());
    assert_eq!(workforce.tiers(), vec![1, 2]);

    let ada = workforce.employee(7).unwrap();
    assert_eq!(ada.target_workload, 4.0);
    assert_eq!(ada.off_day_rank(chrono::Weekday::Sat), Some(1));
    assert_eq!(ada.off_day_rank(chrono::Weekday::Wed), Some(3));
    assert!(ada.accepts(11));

    assert_eq!(workforce.category(1).unwrap().hourly_rate, dec!(10.5));
    assert_eq!(workforce.category(2).unwrap().name, "");
    assert_eq!(
        workforce.work_center(10).unwrap().demand.required(DayType::Weekday, 2, 3),
        Some(1)
    );
}

#[test]
fn demand_gaps_name_the_missing_level() {
    let gaps = workforce().demand_gaps();

    // work center 10: weekend tier 2 (3 slots)
    let center_10: Vec<_> = gaps.iter().filter(|g| g.work_center == 10).collect();
    assert_eq!(center_10.len(), 3);
    assert!(center_10
        .iter()
        .all(|g| g.day_type == DayType::Weekend && g.lookup == DemandLookup::MissingTier));

    // work center 11: slot 3 of weekday tier 1, weekday tier 2, all of weekend
    let center_11: Vec<_> = gaps.iter().filter(|g| g.work_center == 11).collect();
    assert_eq!(center_11.len(), 1 + 3 + 6);
    assert!(center_11
        .iter()
        .any(|g| g.tier == 1 && g.slot == 3 && g.lookup == DemandLookup::MissingSlot));
    assert_eq!(
        center_11
            .iter()
            .filter(|g| g.lookup == DemandLookup::MissingDayType)
            .count(),
        6
    );
}

#[test]
fn duplicate_employee_is_invalid() {
    let mut workforce = workforce();
    let copy = workforce.employees[0].clone();
    workforce.employees.push(copy);

    let err = workforce.validate().unwrap_err();
    assert!(matches!(err, GenerationError::InvalidInput(ref msg) if msg.contains("employee id 7")));
}

/// Employee 8 works Monday .. Saturday at work center 11, slot 2
fn six_day_run() -> Schedule {
    let horizon = monday_to_sunday();
    let assignments = (0..6)
        .map(|day| Assignment {
            shift: Shift::for_slot(&horizon, day, 2, 8, 11),
            tier: 2,
            day,
            slot: 2,
            source: AssignmentSource::Heuristic,
        })
        .collect();
    Schedule {
        start_date: horizon.start,
        end_date: horizon.end,
        assignments,
        total_cost: dec!(672),
        tiers: vec![],
        diagnostics: vec![],
    }
}

#[test]
fn audit_flags_overworked_employee() {
    let schedule = six_day_run();
    let violations = audit(&schedule, &workforce(), &LaborRules::default());

    assert!(violations.iter().all(|v| v.employee_id == 8));
    assert_eq!(
        violations
            .iter()
            .filter(|v| v.kind == ViolationKind::BackToBack)
            .count(),
        5
    );
    assert!(violations
        .iter()
        .any(|v| matches!(v.kind, ViolationKind::WeeklyCap { shifts: 6, cap: 5 })));
    assert!(violations
        .iter()
        .any(|v| matches!(v.kind, ViolationKind::ConsecutiveDays { .. })));
    assert!(violations
        .iter()
        .any(|v| matches!(v.kind, ViolationKind::WeekendOffQuota { free: 1, required: 2 })));
}

#[test]
fn relaxed_rules_accept_same_run() {
    let rules = LaborRules {
        max_shifts_per_week: 6,
        max_consecutive_days: 6,
        weekend_days_off: 1,
        forbid_back_to_back: false,
    };
    assert!(audit(&six_day_run(), &workforce(), &rules).is_empty());
}

#[test]
fn quality_tracks_workload_against_target() {
    let quality = ScheduleQuality::evaluate(&six_day_run(), &workforce());

    let ada = quality.workload.iter().find(|w| w.employee_id == 7).unwrap();
    assert_eq!(ada.assigned, 0);
    assert_eq!(ada.deviation, -4.0);

    let other = quality.workload.iter().find(|w| w.employee_id == 8).unwrap();
    assert_eq!(other.assigned, 6);
}
