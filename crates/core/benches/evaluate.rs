use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use sched_core::{EvalOptions, Evaluator};
use types::{ConstraintSettings, Day, Room, ScheduledSession, Subject, TimeSlot};

fn week(sessions: usize) -> Vec<ScheduledSession> {
    let slots = TimeSlot::defaults();
    (0..sessions)
        .map(|i| ScheduledSession {
            subject: format!("s{}", i % 7).as_str().into(),
            teacher: format!("t{}", i % 11).as_str().into(),
            group: format!("g{}", i % 13).as_str().into(),
            group_size: Some(25),
            day: Day::WEEK[i % Day::WEEK.len()],
            start_time: slots[i % slots.len()].start.clone(),
            end_time: slots[i % slots.len()].end.clone(),
            room: format!("r{}", i % 9).as_str().into(),
        })
        .collect()
}

fn bench_evaluate(c: &mut Criterion) {
    let rooms: Vec<Room> = (0..9)
        .map(|i| Room {
            id: format!("r{i}").as_str().into(),
            capacity: 20 + i * 5,
            equipment: vec![],
        })
        .collect();
    let settings = ConstraintSettings {
        subjects: (0..7)
            .map(|i| Subject {
                id: format!("s{i}").as_str().into(),
                hours_per_week: Some(3.0),
            })
            .collect(),
        ..Default::default()
    }
    .with_defaults();
    let evaluator = Evaluator::new(&rooms, EvalOptions::from(&settings)).unwrap();

    for n in [50usize, 200] {
        let schedule = week(n);
        c.bench_function(&format!("score/{n}"), |b| {
            b.iter(|| evaluator.score(black_box(&schedule)).unwrap())
        });
    }
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
