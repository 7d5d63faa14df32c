//! farmlog Headless Harness
//!
//! Validates the shipped application data and runs the recording pipeline
//! against a scratch data directory. No UI, nothing outside the temp dir is
//! written.
//!
//! Usage:
//!   cargo run -p farmlog-simtest
//!   cargo run -p farmlog-simtest -- --verbose
//!   cargo run -p farmlog-simtest -- path/to/data   (also load an existing data root)

use std::path::PathBuf;

use farmlog_logic::{
    compute_deltas, resolve, ActivityDetails, ActivityFamily, BonusFloor, Character, Snapshot,
    Standing,
};
use farmlog_store::{AppConfig, DataDir, RecordError, Roster, Session, Submission};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ── Application data (the same file the recorder ships with) ────────────
const APP_DATA_JSON: &str = include_str!("../../../data/appdata.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let data_root = std::env::args()
        .skip(1)
        .find(|a| !a.starts_with("--"))
        .map(PathBuf::from);
    println!("=== farmlog Harness ===\n");

    let mut results = Vec::new();

    let config = match AppConfig::from_json(APP_DATA_JSON) {
        Ok(c) => c,
        Err(e) => {
            println!("  ✗ app_data_parse: {}", e);
            std::process::exit(1);
        }
    };

    // 1. Application data
    results.extend(validate_app_data(&config, verbose));

    // 2. Tier resolver sweep
    results.extend(validate_resolver(&config, verbose));

    // 3. Delta engine sweep
    results.extend(validate_deltas(verbose));

    // 4. Pipeline on a scratch directory
    results.extend(validate_pipeline(&config, verbose));

    // 5. Existing data root, if given
    if let Some(root) = data_root {
        results.extend(validate_data_root(root, verbose));
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Application data ─────────────────────────────────────────────────

fn validate_app_data(config: &AppConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Application Data ---");
    let mut results = Vec::new();

    for family in ActivityFamily::ALL {
        let name = config.activity_name(family);
        results.push(check(
            &format!("activity_{}", family.ledger_name()),
            !name.is_empty(),
            format!("{} → {}", name, family),
        ));
    }

    for (label, table) in [("dungeons", &config.dungeons), ("bosses", &config.bosses)] {
        let first = table.iter().next().map(|t| t.required_ilvl).unwrap_or(0);
        let last = table.iter().last().map(|t| t.required_ilvl).unwrap_or(0);
        results.push(check(
            &format!("{}_table", label),
            !table.is_empty(),
            format!("{} tiers, ilvl {}..={}", table.len(), first, last),
        ));
    }

    results.push(check(
        "specs_present",
        config.specs.len() > 1,
        format!("{} specs", config.specs.len()),
    ));

    if verbose {
        for t in config.dungeons.iter() {
            println!("    dungeon {:<16} {}", t.name, t.required_ilvl);
        }
    }
    results
}

// ── 2. Tier resolver ────────────────────────────────────────────────────

fn validate_resolver(config: &AppConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Tier Resolver ---");
    let mut results = Vec::new();

    for (label, table) in [("dungeons", &config.dungeons), ("bosses", &config.bosses)] {
        let mut bad = Vec::new();
        let mut counts = [0usize; 3];
        for ilvl in (0..=1500).step_by(5) {
            let expected = table.iter().filter(|t| t.required_ilvl <= ilvl).last().map(|t| t.name.clone());
            for tier in table.names() {
                let v = match resolve(ilvl, table, tier) {
                    Ok(v) => v,
                    Err(e) => {
                        bad.push(format!("{tier}@{ilvl}: {e}"));
                        continue;
                    }
                };
                if v.max_eligible_tier != expected || v.eligible != (ilvl >= v.required_ilvl) {
                    bad.push(format!("{tier}@{ilvl}"));
                }
                counts[match v.standing() {
                    Standing::AtLevel => 0,
                    Standing::OverLeveled => 1,
                    Standing::UnderLeveled => 2,
                }] += 1;
            }
        }
        results.push(check(
            &format!("resolver_{}_sweep", label),
            bad.is_empty(),
            if bad.is_empty() {
                format!(
                    "at level {}, over-leveled {}, blocked {}",
                    counts[0], counts[1], counts[2]
                )
            } else {
                format!("{} mismatches, first: {}", bad.len(), bad[0])
            },
        ));
    }

    // Exactly one at-level tier for any ilvl at or above the lowest requirement
    let lowest = config.dungeons.iter().next().map(|t| t.required_ilvl).unwrap_or(0);
    let single_max = (lowest..=1500).step_by(15).all(|ilvl| {
        config
            .dungeons
            .names()
            .filter(|t| resolve(ilvl, &config.dungeons, t).map(|v| v.is_max_tier).unwrap_or(false))
            .count()
            == 1
    });
    results.push(check(
        "resolver_single_max_tier",
        single_max,
        "one at-level dungeon per reachable ilvl",
    ));

    if verbose {
        let top = config.dungeons.iter().last().map(|t| t.name.as_str()).unwrap_or("");
        if let Ok(v) = resolve(1100, &config.dungeons, top) {
            println!("    1100 vs {}: {:?}", top, v.standing());
        }
    }
    results
}

// ── 3. Delta engine ─────────────────────────────────────────────────────

fn validate_deltas(verbose: bool) -> Vec<TestResult> {
    println!("--- Delta Engine ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut mismatches = 0;
    let mut negatives = 0;
    let runs = 500;

    for _ in 0..runs {
        let family = ActivityFamily::ALL[rng.gen_range(0..ActivityFamily::ALL.len())];
        let cats = family.categories();
        let n = if family.is_multi_segment() { rng.gen_range(2..6) } else { 2 };
        let snaps: Vec<Snapshot> = (0..n)
            .map(|_| cats.iter().map(|c| (*c, rng.gen_range(0..2000i64))).collect())
            .collect();
        let segs = match compute_deltas(&snaps, cats) {
            Ok(s) => s,
            Err(_) => {
                mismatches += 1;
                continue;
            }
        };
        if segs.len() != n - 1 {
            mismatches += 1;
        }
        for (i, seg) in segs.iter().enumerate() {
            for c in cats {
                let expected = snaps[i + 1].get(c).unwrap_or(0) - snaps[i].get(c).unwrap_or(0);
                if seg.get(c) != Some(expected) {
                    mismatches += 1;
                }
            }
            negatives += seg.negative_categories().len();
        }
    }

    results.push(check(
        "deltas_random_runs",
        mismatches == 0,
        format!("{} runs, {} mismatches, {} negative gains kept", runs, mismatches, negatives),
    ));

    let short = compute_deltas(&[Snapshot::from([("red", 1)])], &["red"]);
    results.push(check(
        "deltas_need_two_snapshots",
        short.is_err(),
        "single snapshot rejected",
    ));

    let missing = compute_deltas(&[Snapshot::from([("red", 1)]), Snapshot::new()], &["red"]);
    results.push(check(
        "deltas_missing_category",
        missing.is_err(),
        "missing count reported",
    ));

    if verbose {
        println!("    negative gains seen: {}", negatives);
    }
    results
}

// ── 4. Pipeline ─────────────────────────────────────────────────────────

fn zeroed(family: ActivityFamily, bump: i64) -> Snapshot {
    family.categories().iter().map(|c| (*c, bump)).collect()
}

fn validate_pipeline(config: &AppConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Recording Pipeline ---");
    let mut results = Vec::new();

    let scratch = match tempfile::tempdir() {
        Ok(d) => d,
        Err(e) => {
            results.push(check("pipeline_scratch_dir", false, e.to_string()));
            return results;
        }
    };
    let mut session = match Session::with_config(DataDir::new(scratch.path()), config.clone()) {
        Ok(s) => s,
        Err(e) => {
            results.push(check("pipeline_open", false, e.to_string()));
            return results;
        }
    };

    let top = config.dungeons.iter().last().map(|t| t.name.clone()).unwrap_or_default();
    let bottom = config.dungeons.iter().next().map(|t| t.name.clone()).unwrap_or_default();
    let spec = config.specs.first().cloned().unwrap_or_default();

    let added = session.roster.add(Character::new("Harness Main", spec.clone(), 1500)).is_ok()
        && session.roster.add(Character::new("Harness Alt", spec, 0)).is_ok();
    results.push(check(
        "pipeline_roster",
        added && session.roster.list().len() == 2,
        format!("{} characters", session.roster.list().len()),
    ));

    // At level on the top dungeon
    let aor = Submission {
        character: "Harness Main".into(),
        details: ActivityDetails::ChaosAuraOfResonance {
            dungeon: top.clone(),
            rested: true,
            bonus_floor: BonusFloor::Treasure,
        },
        snapshots: vec![
            zeroed(ActivityFamily::ChaosAuraOfResonance, 0),
            zeroed(ActivityFamily::ChaosAuraOfResonance, 7),
        ],
    };
    let outcome = session.recorder().submit(aor);
    results.push(check(
        "pipeline_at_level",
        matches!(&outcome, Ok(a) if a.records.len() == 1 && a.records[0].at_level && a.notice.is_none()),
        format!("{:?}", outcome.as_ref().map(|a| a.records.len())),
    ));

    // Over-leveled grind, three floors
    let grind = Submission {
        character: "Harness Main".into(),
        details: ActivityDetails::ChaosInfiniteGrind {
            dungeon: bottom.clone(),
            bonus_floor: false,
        },
        snapshots: (0..4)
            .map(|f| zeroed(ActivityFamily::ChaosInfiniteGrind, f * 3))
            .collect(),
    };
    let outcome = session.recorder().submit(grind);
    let floors: Vec<_> = outcome
        .as_ref()
        .map(|a| a.records.iter().filter_map(|r| r.floor).collect())
        .unwrap_or_default();
    results.push(check(
        "pipeline_grind_floors",
        floors == [1, 2, 3],
        format!("floors {:?}", floors),
    ));
    results.push(check(
        "pipeline_over_leveled_notice",
        matches!(&outcome, Ok(a) if a.notice.is_some() && a.records.iter().all(|r| !r.at_level)),
        outcome
            .as_ref()
            .ok()
            .and_then(|a| a.notice.as_ref())
            .map(|n| n.message.clone())
            .unwrap_or_else(|| "no notice".into()),
    ));

    // Blocked: under-leveled alt
    let before = session.histories.read_all(ActivityFamily::ChaosAuraOfResonance).len();
    let blocked = session.recorder().submit(Submission {
        character: "Harness Alt".into(),
        details: ActivityDetails::ChaosAuraOfResonance {
            dungeon: top,
            rested: false,
            bonus_floor: BonusFloor::None,
        },
        snapshots: vec![
            zeroed(ActivityFamily::ChaosAuraOfResonance, 0),
            zeroed(ActivityFamily::ChaosAuraOfResonance, 1),
        ],
    });
    let after = session.histories.read_all(ActivityFamily::ChaosAuraOfResonance).len();
    results.push(check(
        "pipeline_blocked",
        matches!(blocked, Err(RecordError::IneligibleTier { .. })) && before == after,
        format!("ledger {} → {}", before, after),
    ));

    // Reload from disk
    match Session::with_config(DataDir::new(scratch.path()), config.clone()) {
        Ok(reloaded) => {
            let same = ActivityFamily::ALL
                .iter()
                .all(|f| reloaded.histories.read_all(*f) == session.histories.read_all(*f));
            results.push(check(
                "pipeline_reload",
                same,
                format!(
                    "{} / {} / {} records",
                    reloaded.histories.read_all(ActivityFamily::ChaosAuraOfResonance).len(),
                    reloaded.histories.read_all(ActivityFamily::ChaosInfiniteGrind).len(),
                    reloaded.histories.read_all(ActivityFamily::GuardianRaid).len()
                ),
            ));
        }
        Err(e) => results.push(check("pipeline_reload", false, e.to_string())),
    }

    if verbose {
        println!("    scratch dir: {}", scratch.path().display());
    }
    results
}

// ── 5. Existing data root ───────────────────────────────────────────────

fn validate_data_root(root: PathBuf, verbose: bool) -> Vec<TestResult> {
    println!("--- Data Root ---");
    let mut results = Vec::new();

    match Session::open(&root) {
        Ok(session) => {
            results.push(check(
                "data_root_open",
                true,
                format!("{} characters", session.roster.list().len()),
            ));
            for family in ActivityFamily::ALL {
                let records = session.histories.read_all(family);
                let unknown = records
                    .iter()
                    .filter(|r| session.config.tiers(family).get(r.details.dimension()).is_none())
                    .count();
                results.push(check(
                    &format!("data_root_{}", family.ledger_name()),
                    unknown == 0,
                    format!("{} records, {} with unknown tier", records.len(), unknown),
                ));
                if verbose {
                    for r in records.iter().rev().take(3) {
                        println!("    {} {} {} {:?}", r.timestamp, r.character, r.details.dimension(), r.floor);
                    }
                }
            }
        }
        Err(e) => results.push(check("data_root_open", false, format!("{}: {}", root.display(), e))),
    }
    results
}
