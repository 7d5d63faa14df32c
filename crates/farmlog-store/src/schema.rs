//! Ledger column schemas and record flattening.
//!
//! This is the only place where an [`ActivityRecord`] becomes a flat row.
//! Column layout per family:
//!
//! ```text
//! cd_aor  timestamp,character,ilvl,dungeon,at_level,rested,bonus_floor,<categories>
//! cd_ig   timestamp,character,ilvl,dungeon,at_level,bonus_floor,floor,<categories>
//! gr      timestamp,character,ilvl,boss,at_level,rested,first_time,<categories>
//! ```

use farmlog_logic::{ActivityDetails, ActivityFamily, ActivityRecord, DeltaSegment, Timestamp};

use crate::error::{StoreError, StoreResult};
use crate::table::{Columns, Row};

/// Bonus-flag columns, in order, for a family.
fn flag_columns(family: ActivityFamily) -> &'static [&'static str] {
    match family {
        ActivityFamily::ChaosAuraOfResonance => &["rested", "bonus_floor"],
        ActivityFamily::ChaosInfiniteGrind => &["bonus_floor"],
        ActivityFamily::GuardianRaid => &["rested", "first_time"],
    }
}

/// Full ledger header for a family.
pub fn ledger_header(family: ActivityFamily) -> Vec<&'static str> {
    let mut header = vec![
        "timestamp",
        "character",
        "ilvl",
        family.dimension_column(),
        "at_level",
    ];
    header.extend_from_slice(flag_columns(family));
    if family.is_multi_segment() {
        header.push("floor");
    }
    header.extend_from_slice(family.categories());
    header
}

pub fn format_bool(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

pub fn parse_bool(s: &str) -> Result<bool, String> {
    if s.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if s.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(format!("expected True or False, found '{s}'"))
    }
}

/// Flatten a record into its family's column order.
pub fn record_to_row(record: &ActivityRecord) -> StoreResult<Vec<String>> {
    let family = record.details.family();
    let mismatch = |message: String| StoreError::SchemaMismatch { family, message };

    let mut row = vec![
        record.timestamp.to_string(),
        record.character.clone(),
        record.ilvl.to_string(),
        record.details.dimension().to_string(),
        format_bool(record.at_level),
    ];
    match &record.details {
        ActivityDetails::ChaosAuraOfResonance {
            rested,
            bonus_floor,
            ..
        } => {
            row.push(format_bool(*rested));
            row.push(bonus_floor.to_string());
        }
        ActivityDetails::ChaosInfiniteGrind { bonus_floor, .. } => {
            row.push(format_bool(*bonus_floor));
        }
        ActivityDetails::GuardianRaid {
            rested, first_time, ..
        } => {
            row.push(format_bool(*rested));
            row.push(format_bool(*first_time));
        }
    }
    match (family.is_multi_segment(), record.floor) {
        (true, Some(floor)) => row.push(floor.to_string()),
        (true, None) => return Err(mismatch("multi-segment record has no floor".into())),
        (false, Some(floor)) => {
            return Err(mismatch(format!("single-segment record has floor {floor}")))
        }
        (false, None) => {}
    }
    for category in family.categories() {
        let gain = record
            .gains
            .get(category)
            .ok_or_else(|| mismatch(format!("no gain for '{category}'")))?;
        row.push(gain.to_string());
    }
    if record.gains.len() != family.categories().len() {
        return Err(mismatch(format!(
            "expected {} categories, record has {}",
            family.categories().len(),
            record.gains.len()
        )));
    }
    Ok(row)
}

/// Rebuild a record from one ledger row. Errors carry a plain message; the
/// caller attaches the file and line.
pub fn record_from_row(
    family: ActivityFamily,
    columns: &Columns,
    row: &Row,
) -> Result<ActivityRecord, String> {
    let field = |name: &str| columns.get(row, name);
    let flag = |name: &str| parse_bool(field(name)).map_err(|e| format!("{name}: {e}"));
    let number = |name: &str| {
        field(name)
            .parse::<i64>()
            .map_err(|e| format!("{name}: '{}' {e}", field(name)))
    };

    let timestamp =
        Timestamp::parse(field("timestamp")).map_err(|e| format!("timestamp: {e}"))?;
    let ilvl = u32::try_from(number("ilvl")?).map_err(|e| format!("ilvl: {e}"))?;
    let dimension = field(family.dimension_column()).to_string();

    let details = match family {
        ActivityFamily::ChaosAuraOfResonance => ActivityDetails::ChaosAuraOfResonance {
            dungeon: dimension,
            rested: flag("rested")?,
            bonus_floor: field("bonus_floor").parse()?,
        },
        ActivityFamily::ChaosInfiniteGrind => ActivityDetails::ChaosInfiniteGrind {
            dungeon: dimension,
            bonus_floor: flag("bonus_floor")?,
        },
        ActivityFamily::GuardianRaid => ActivityDetails::GuardianRaid {
            boss: dimension,
            rested: flag("rested")?,
            first_time: flag("first_time")?,
        },
    };

    let floor = if family.is_multi_segment() {
        Some(u32::try_from(number("floor")?).map_err(|e| format!("floor: {e}"))?)
    } else {
        None
    };

    let gains = family
        .categories()
        .iter()
        .map(|c| number(*c).map(|v| (*c, v)))
        .collect::<Result<DeltaSegment, String>>()?;

    Ok(ActivityRecord {
        timestamp,
        character: field("character").to_string(),
        ilvl,
        details,
        at_level: flag("at_level")?,
        floor,
        gains,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table;
    use farmlog_logic::BonusFloor;
    use std::path::Path;

    fn record(details: ActivityDetails, floor: Option<u32>) -> ActivityRecord {
        let family = details.family();
        ActivityRecord {
            timestamp: Timestamp::parse("2024-02-11-09:30:00").unwrap(),
            character: "Aerin".into(),
            ilvl: 1340,
            details,
            at_level: false,
            floor,
            gains: family
                .categories()
                .iter()
                .enumerate()
                .map(|(i, c)| (*c, i as i64 - 1))
                .collect(),
        }
    }

    fn read_back(rec: &ActivityRecord) -> ActivityRecord {
        let family = rec.details.family();
        let header = ledger_header(family);
        let text = table::render(&header, &[record_to_row(rec).unwrap()]);
        let t = table::parse(&text).unwrap().unwrap();
        let cols = Columns::resolve(&t, &header, Path::new("x.csv")).unwrap();
        record_from_row(family, &cols, &t.rows[0]).unwrap()
    }

    #[test]
    fn test_headers() {
        assert_eq!(
            ledger_header(ActivityFamily::ChaosAuraOfResonance).join(","),
            "timestamp,character,ilvl,dungeon,at_level,rested,bonus_floor,red,blue,leapstones,greater_leapstones,shards"
        );
        assert_eq!(
            ledger_header(ActivityFamily::ChaosInfiniteGrind).join(","),
            "timestamp,character,ilvl,dungeon,at_level,bonus_floor,floor,currency_orbs,currency_shards,red,blue"
        );
        assert_eq!(
            ledger_header(ActivityFamily::GuardianRaid).join(","),
            "timestamp,character,ilvl,boss,at_level,rested,first_time,red,blue,leapstones,greater_leapstones"
        );
    }

    #[test]
    fn test_row_layout() {
        let rec = record(
            ActivityDetails::GuardianRaid {
                boss: "Sonavel".into(),
                rested: true,
                first_time: false,
            },
            None,
        );
        assert_eq!(
            record_to_row(&rec).unwrap().join(","),
            "2024-02-11-09:30:00,Aerin,1340,Sonavel,False,True,False,-1,0,1,2"
        );
    }

    #[test]
    fn test_each_family_reads_back() {
        let cases = [
            record(
                ActivityDetails::ChaosAuraOfResonance {
                    dungeon: "Reverie II".into(),
                    rested: true,
                    bonus_floor: BonusFloor::Treasure,
                },
                None,
            ),
            record(
                ActivityDetails::ChaosInfiniteGrind {
                    dungeon: "Reverie, Upper".into(),
                    bonus_floor: true,
                },
                Some(3),
            ),
            record(
                ActivityDetails::GuardianRaid {
                    boss: "Hanumatan".into(),
                    rested: false,
                    first_time: true,
                },
                None,
            ),
        ];
        for rec in &cases {
            assert_eq!(&read_back(rec), rec);
        }
    }

    #[test]
    fn test_floor_must_match_family() {
        let grind = record(
            ActivityDetails::ChaosInfiniteGrind {
                dungeon: "D".into(),
                bonus_floor: false,
            },
            None,
        );
        assert!(matches!(record_to_row(&grind), Err(StoreError::SchemaMismatch { .. })));

        let raid = record(
            ActivityDetails::GuardianRaid {
                boss: "B".into(),
                rested: false,
                first_time: false,
            },
            Some(1),
        );
        assert!(matches!(record_to_row(&raid), Err(StoreError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_gains_must_cover_categories() {
        let mut rec = record(
            ActivityDetails::GuardianRaid {
                boss: "B".into(),
                rested: false,
                first_time: false,
            },
            None,
        );
        rec.gains = [("x", 5)].into_iter().collect();
        assert!(matches!(record_to_row(&rec), Err(StoreError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_bool_parsing_accepts_either_case() {
        assert_eq!(parse_bool("True"), Ok(true));
        assert_eq!(parse_bool("false"), Ok(false));
        assert!(parse_bool("1").is_err());
    }
}
