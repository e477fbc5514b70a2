use std::sync::Arc;

use attendance_core::attendance::{clock_in, clock_out};
use attendance_core::validation::{validate_against, RegistrationForm};
use attendance_core::{
    Action, AttendanceFilter, AttendanceStatus, ClockPolicy, FixedClock, Person, Store,
};
use chrono::{NaiveDate, NaiveDateTime};

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 10, 7)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn store_at(now: NaiveDateTime) -> Store {
    Store::seeded(Arc::new(FixedClock(now)))
}

fn fourth_person() -> Person {
    RegistrationForm {
        id: "2001".into(),
        name: "Alan Turing".into(),
        email: "alan@example.com".into(),
        department: "Computer Science".into(),
    }
    .into_person(101, at(8, 0, 0))
}

#[test]
fn test_register_then_delete_restores_roster() {
    let mut store = store_at(at(8, 0, 0));
    let form = RegistrationForm {
        id: "2001".into(),
        name: "Alan Turing".into(),
        ..Default::default()
    };
    assert!(validate_against(&form, &store.snapshot().persons).is_empty());

    let s = store.apply(Action::AddPerson(fourth_person()));
    assert_eq!(s.statistics.total_persons, 4);
    assert_eq!(s.persons.len(), 4);

    let s = store.apply(Action::DeletePerson { id: "2001".into() });
    assert_eq!(s.statistics.total_persons, 3);
    assert_eq!(s.persons.len(), 3);
}

#[test]
fn test_person_counter_tracks_actions_not_roster() {
    let mut store = store_at(at(8, 0, 0));
    store.apply(Action::AddPerson(fourth_person()));
    store.apply(Action::DeletePerson { id: "2001".into() });
    store.apply(Action::DeletePerson { id: "2001".into() });
    let s = store.apply(Action::DeletePerson { id: "does-not-exist".into() });

    // 3 seeded + 1 add - 3 deletes, only one of which matched.
    assert_eq!(s.statistics.total_persons, 1);
    assert_eq!(s.persons.len(), 3);
}

#[test]
fn test_lecture_day() {
    let policy = ClockPolicy::default();
    let mut store = store_at(at(9, 0, 0));
    store.apply(Action::StartAttendanceSession {
        lecture_duration: "01:00:00".into(),
    });

    for id in ["1001", "1002"] {
        let action = clock_in(&store.snapshot(), id, Some(85), at(9, 2, 0), &policy).unwrap();
        store.apply(action);
    }
    let s = store.snapshot();
    assert_eq!(s.statistics.total_clock_ins, 2);
    assert_eq!(s.statistics.present_today, 2);

    let full = clock_out(&s, "1001", at(10, 1, 0), &policy).unwrap();
    store.apply(full);
    let short = clock_out(&store.snapshot(), "1002", at(9, 30, 0), &policy).unwrap();
    let s = store.apply(short);

    let mcr = AttendanceFilter {
        status: Some(AttendanceStatus::Mcr),
        ..Default::default()
    };
    let hits = mcr.apply(&s.attendance_records);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].person_id, "1002");
    assert_eq!(hits[0].duration.unwrap().to_string(), "00:28:00");

    // Updates leave the counters where the clock-ins put them.
    assert_eq!(s.statistics.total_clock_outs, 0);
    assert_eq!(s.statistics.present_today, 2);

    let s = store.apply(Action::EndAttendanceSession);
    assert!(!s.current_session.is_active);
    assert!(s.current_session.started_at.is_none());
}
