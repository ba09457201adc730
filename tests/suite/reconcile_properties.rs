//! Randomized edit sequences checked against a simple model of the course set.

use std::collections::{BTreeMap, BTreeSet};

use transcript_engine::{
    CourseField, CourseRecord, FilterSpec, ReconcileError, Reconciler, SortSpec, replay,
};

use crate::common::{codes, open_engine, record};

const CODES: [&str; 8] = [
    "CS101", "MA101", "PH101", "HI101", "EC101", "BI201", "CH201", "LI301",
];
const GRADES: [&str; 8] = ["A", "A-", "B+", "B", "C", "F", "W", "S"];
const LANGS: [&str; 2] = ["EN", "TR"];

/// Small deterministic generator so failures reproduce from the seed.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        let len = u64::try_from(items.len()).unwrap();
        items[usize::try_from(self.next() % len).unwrap()]
    }

    fn credit(&mut self) -> i64 {
        i64::try_from(self.next() % 7).unwrap() + 1
    }
}

fn by_code(records: &[CourseRecord]) -> BTreeMap<String, CourseRecord> {
    records
        .iter()
        .map(|record| (record.code().to_string(), record.clone()))
        .collect()
}

fn visible(engine: &Reconciler, record: &CourseRecord) -> bool {
    engine.filters().iter().all(|filter| filter.matches(record))
}

fn random_filter(rng: &mut Lcg) -> FilterSpec {
    if rng.next() % 2 == 0 {
        FilterSpec::parse(CourseField::Language, [rng.pick(&LANGS)]).unwrap()
    } else {
        let low = rng.credit();
        let credits = [low.to_string(), (low % 7 + 1).to_string(), "3".to_string()];
        FilterSpec::parse(CourseField::Credit, credits.iter().map(String::as_str)).unwrap()
    }
}

fn assert_consistent(engine: &Reconciler, model: &BTreeMap<String, CourseRecord>, step: usize) {
    let working = engine.working();

    let unique: BTreeSet<&str> = codes(working).into_iter().collect();
    assert_eq!(unique.len(), working.len(), "duplicate code at step {step}");

    let log = engine.log();
    for added in &log.added {
        assert!(
            !log.is_subtracted(added.code()),
            "{} both added and subtracted at step {step}",
            added.code()
        );
    }
    for entry in &log.subtracted {
        assert!(
            !unique.contains(entry.code.as_str()),
            "subtracted {} still listed at step {step}",
            entry.code
        );
    }

    let replayed = replay(engine.baseline(), log, engine.sort_spec(), engine.filters());
    assert_eq!(working, replayed.as_slice(), "working list is not the replay at step {step}");

    let unfiltered = replay(engine.baseline(), log, engine.sort_spec(), &[]);
    assert_eq!(&by_code(&unfiltered), model, "course set diverged at step {step}");
    let expected_visible: BTreeMap<String, CourseRecord> = model
        .iter()
        .filter(|(_, record)| visible(engine, record))
        .map(|(code, record)| (code.clone(), record.clone()))
        .collect();
    assert_eq!(by_code(working), expected_visible, "visible set diverged at step {step}");
}

fn run_sequence(seed: u64, steps: usize) {
    let mut rng = Lcg(seed);
    let mut engine = open_engine();
    let mut model = by_code(engine.working());

    for step in 0..steps {
        let code = rng.pick(&CODES);
        let shown = model
            .get(code)
            .is_some_and(|record| visible(&engine, record));
        match rng.next() % 7 {
            0 => {
                let candidate = record(code, rng.pick(&LANGS), rng.credit(), rng.pick(&GRADES));
                let result = engine.add(candidate.clone()).map(<[_]>::len);
                if model.contains_key(code) {
                    assert!(matches!(result, Err(ReconcileError::DuplicateKey { .. })));
                } else {
                    assert!(result.is_ok(), "add {code} failed at step {step}");
                    model.insert(code.to_string(), candidate);
                }
            }
            1 => {
                let result = engine.remove(code).map(<[_]>::len);
                if shown {
                    assert!(result.is_ok(), "remove {code} failed at step {step}");
                    model.remove(code);
                } else {
                    assert!(matches!(result, Err(ReconcileError::NotFound { .. })));
                }
            }
            2 => {
                let candidate = record(code, rng.pick(&LANGS), rng.credit(), rng.pick(&GRADES));
                let result = engine.update(candidate.clone()).map(<[_]>::len);
                if shown {
                    assert!(result.is_ok(), "update {code} failed at step {step}");
                    model.insert(code.to_string(), candidate);
                } else {
                    assert!(matches!(result, Err(ReconcileError::NotFound { .. })));
                }
            }
            3 => {
                engine.sort_column(rng.pick(&CourseField::ALL));
            }
            4 => {
                let filter = random_filter(&mut rng);
                engine.push_filter(filter);
            }
            5 => {
                engine.clear_filters();
            }
            _ => {
                let before = engine.working().to_vec();
                let rebuilt = engine.rebuild().to_vec();
                assert_eq!(before, rebuilt, "rebuild changed the list at step {step}");
                assert_eq!(engine.rebuild(), rebuilt.as_slice(), "rebuild is not idempotent");
            }
        }
        assert_consistent(&engine, &model, step);
    }
}

#[test]
fn random_edit_sequences_match_the_model() {
    for seed in [1, 7, 42, 1_234, 99_991] {
        run_sequence(seed, 200);
    }
}

#[test]
fn rebuild_after_edits_equals_replay_in_order() {
    let mut engine = open_engine();
    engine.set_sort(SortSpec::descending(CourseField::Credit));
    engine.remove("MA101").unwrap();
    engine.add(record("BI201", "EN", 5, "B")).unwrap();
    engine.update(record("CS101", "EN", 3, "C")).unwrap();

    let expected = replay(
        engine.baseline(),
        engine.log(),
        engine.sort_spec(),
        engine.filters(),
    );
    assert_eq!(engine.rebuild(), expected.as_slice());
    assert_eq!(
        codes(engine.working()),
        ["BI201", "PH101", "CS101", "EC101", "HI101"]
    );
}
