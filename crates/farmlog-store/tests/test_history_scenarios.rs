//! End-to-end recording against a scratch data directory.
//!
//! Exercises: Session → RosterStore → Recorder → Histories → reopen

use farmlog_logic::{ActivityDetails, ActivityFamily, BonusFloor, Character, Snapshot, Timestamp};
use farmlog_store::{AppConfig, DataDir, RecordError, Roster, Session, Submission};

// ── Helpers ────────────────────────────────────────────────────────────

const APP_DATA: &str = r#"{
    "activities": ["Chaos Dungeon (AoR)", "Chaos Dungeon (Infinite)", "Guardian Raid"],
    "bosses": {"B1": 100, "B2": 600, "B3": 1100},
    "dungeons": {"T1": 100, "T2": 600, "T3": 1100},
    "specs": ["Bard", "Berserker"]
}"#;

fn session(dir: &tempfile::TempDir) -> Session {
    std::fs::write(dir.path().join("appdata.json"), APP_DATA).unwrap();
    Session::open(dir.path()).unwrap()
}

fn with_characters(dir: &tempfile::TempDir) -> Session {
    let mut s = session(dir);
    s.roster.add(Character::new("High", "Bard", 1100)).unwrap();
    s.roster.add(Character::new("Low", "Berserker", 500)).unwrap();
    s
}

fn at() -> Timestamp {
    Timestamp::parse("2024-06-14-22:05:31").unwrap()
}

fn aor_snapshot(red: i64, blue: i64) -> Snapshot {
    Snapshot::from([
        ("red", red),
        ("blue", blue),
        ("leapstones", 0),
        ("greater_leapstones", 0),
        ("shards", 0),
    ])
}

fn grind_snapshot(orbs: i64) -> Snapshot {
    Snapshot::from([
        ("currency_orbs", orbs),
        ("currency_shards", 0),
        ("red", 0),
        ("blue", 0),
    ])
}

fn raid_snapshot(red: i64) -> Snapshot {
    Snapshot::from([
        ("red", red),
        ("blue", 0),
        ("leapstones", 0),
        ("greater_leapstones", 0),
    ])
}

fn raid(character: &str, boss: &str) -> Submission {
    Submission {
        character: character.into(),
        details: ActivityDetails::GuardianRaid {
            boss: boss.into(),
            rested: true,
            first_time: false,
        },
        snapshots: vec![raid_snapshot(0), raid_snapshot(3)],
    }
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn at_level_submission_is_recorded_at_level() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = with_characters(&dir);
    let accepted = s.recorder().submit_at(raid("High", "B3"), at()).unwrap();
    assert!(accepted.verdict.eligible);
    assert!(accepted.verdict.is_max_tier);
    assert!(accepted.records[0].at_level);
    assert!(accepted.notice.is_none());
}

#[test]
fn over_leveled_submission_carries_notice() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = with_characters(&dir);
    let accepted = s.recorder().submit_at(raid("High", "B1"), at()).unwrap();
    assert!(!accepted.records[0].at_level);
    let notice = accepted.notice.expect("over-leveled notice");
    assert_eq!(notice.max_eligible_tier.as_deref(), Some("B3"));
    assert_eq!(
        notice.message,
        "Overleveled: B1 (100) is below the highest available for High (1100)"
    );
    assert_eq!(s.histories.read_all(ActivityFamily::GuardianRaid).len(), 1);
}

#[test]
fn ineligible_submission_leaves_ledger_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = with_characters(&dir);
    s.recorder().submit_at(raid("High", "B3"), at()).unwrap();
    let before = s.histories.read_all(ActivityFamily::GuardianRaid).len();

    let err = s.recorder().submit_at(raid("Low", "B3"), at()).unwrap_err();
    match err {
        RecordError::IneligibleTier { message, verdict } => {
            assert!(!verdict.eligible);
            assert_eq!(message, "Low (500) ilvl is too low for B3 (1100)");
        }
        other => panic!("expected IneligibleTier, got {other:?}"),
    }
    assert_eq!(s.histories.read_all(ActivityFamily::GuardianRaid).len(), before);

    let reopened = Session::open(dir.path()).unwrap();
    assert_eq!(reopened.histories.read_all(ActivityFamily::GuardianRaid).len(), before);
}

#[test]
fn single_segment_run_appends_one_record() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = with_characters(&dir);
    let submission = Submission {
        character: "High".into(),
        details: ActivityDetails::ChaosAuraOfResonance {
            dungeon: "T3".into(),
            rested: false,
            bonus_floor: BonusFloor::Boss,
        },
        snapshots: vec![aor_snapshot(10, 5), aor_snapshot(18, 5)],
    };
    s.recorder().submit_at(submission, at()).unwrap();

    let ledger = s.histories.read_all(ActivityFamily::ChaosAuraOfResonance);
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].gains.get("red"), Some(8));
    assert_eq!(ledger[0].gains.get("blue"), Some(0));

    let text = std::fs::read_to_string(DataDir::new(dir.path()).history(ActivityFamily::ChaosAuraOfResonance)).unwrap();
    assert_eq!(
        text,
        "timestamp,character,ilvl,dungeon,at_level,rested,bonus_floor,red,blue,leapstones,greater_leapstones,shards\n\
         2024-06-14-22:05:31,High,1100,T3,True,False,Boss,8,0,0,0,0\n"
    );
}

#[test]
fn three_checkpoint_run_appends_one_record_per_floor() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = with_characters(&dir);
    let submission = Submission {
        character: "High".into(),
        details: ActivityDetails::ChaosInfiniteGrind {
            dungeon: "T3".into(),
            bonus_floor: false,
        },
        snapshots: vec![grind_snapshot(0), grind_snapshot(5), grind_snapshot(5)],
    };
    let accepted = s.recorder().submit_at(submission, at()).unwrap();
    assert_eq!(accepted.records.len(), 2);

    let ledger = s.histories.read_all(ActivityFamily::ChaosInfiniteGrind);
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[0].floor, Some(1));
    assert_eq!(ledger[0].gains.get("currency_orbs"), Some(5));
    assert_eq!(ledger[1].floor, Some(2));
    assert_eq!(ledger[1].gains.get("currency_orbs"), Some(0));
}

#[test]
fn appends_keep_prior_entries_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut s = with_characters(&dir);
        s.recorder().submit_at(raid("High", "B3"), at()).unwrap();
        s.recorder().submit_at(raid("High", "B2"), at()).unwrap();
    }
    let mut s = Session::open(dir.path()).unwrap();
    let prior = s.histories.read_all(ActivityFamily::GuardianRaid).to_vec();
    assert_eq!(prior.len(), 2);

    s.recorder().submit_at(raid("Low", "B1"), at()).unwrap();
    s.recorder().submit_at(raid("High", "B3"), at()).unwrap();

    let ledger = s.histories.read_all(ActivityFamily::GuardianRaid);
    assert_eq!(&ledger[..2], &prior[..]);
    let tail: Vec<_> = ledger[2..].iter().map(|r| (r.character.as_str(), r.details.dimension())).collect();
    assert_eq!(tail, [("Low", "B1"), ("High", "B3")]);
}

#[test]
fn roster_edits_do_not_rewrite_history() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = with_characters(&dir);
    s.recorder().submit_at(raid("High", "B3"), at()).unwrap();
    s.roster.update_ilvl("High", 1460).unwrap();
    s.roster.delete("Low").unwrap();

    let reopened = Session::open(dir.path()).unwrap();
    assert_eq!(reopened.histories.read_all(ActivityFamily::GuardianRaid)[0].ilvl, 1100);
    assert_eq!(reopened.roster.list().len(), 1);
}

#[test]
fn config_maps_activity_names_to_families() {
    let config = AppConfig::from_json(APP_DATA).unwrap();
    assert_eq!(
        config.family("Chaos Dungeon (Infinite)").unwrap(),
        ActivityFamily::ChaosInfiniteGrind
    );
}
