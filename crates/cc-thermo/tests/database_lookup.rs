use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use cc_thermo::{ThermoDatabase, ThermoError};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

const DB: &str = "\
SOLUTION_MASTER_SPECIES
    -isotope [44Ca] permil 0.0212076 # SRM915a
    -isotope [44Ca] permil 0.0212080 # overridden below the first

PHASES
Gypsum
    CaSO4:2H2O = Ca+2 + SO4-2 + 2 H2O
    log_k -4.58  # comment after value
    delta_h -0.109 kcal

NAMED_EXPRESSIONS
Log_alpha_44Ca_Calcite/Ca+2
    -ln_alpha1000 -1.5
#
Log_alpha_44Ca_Aragonite/Ca+2
    -add_logk Log_alpha_44Ca_Calcite/Ca+2 1.0
    -ln_alpha1000 -0.5

Log_alpha_44Ca_Loop/Ca+2
    -add_logk Log_alpha_44Ca_Loop/Ca+2 1.0
";

fn write_db() -> PathBuf {
    let dir = unique_temp_dir("cc_thermo_db");
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    let path = dir.join("test.dat");
    fs::write(&path, DB).expect("failed to write database");
    path
}

#[test]
fn reads_database_from_disk() {
    let path = write_db();
    let mut db = ThermoDatabase::open(&path).expect("failed to open database");
    assert_eq!(db.source(), path.as_path());

    let k = db
        .get_k_values(&["CaSO4:2H2O"], 298.15)
        .expect("gypsum lookup failed");
    assert_eq!(k.log_k, Some(-4.58));
    assert_eq!(k.delta_h, Some(-0.109));
    assert_eq!(k.gamma, None);
    assert_eq!(k.analytic_value, None);
}

#[test]
fn calcium_isotope_alpha_chain() {
    let mut db = ThermoDatabase::open(write_db()).expect("failed to open database");
    let calcite = db.get_1000lnalpha("44Ca", "Calcite/Ca+2", 283.15).unwrap();
    let aragonite = db.get_1000lnalpha("44Ca", "Aragonite/Ca+2", 283.15).unwrap();
    assert!((calcite + 1.5).abs() < 1e-12);
    assert!((aragonite + 2.0).abs() < 1e-12);

    let alpha = db.get_alpha("44Ca", "Aragonite/Ca+2", 283.15).unwrap();
    assert!((alpha - (-0.002f64).exp()).abs() < 1e-12);
}

#[test]
fn last_isotope_standard_wins() {
    let db = ThermoDatabase::open(write_db()).expect("failed to open database");
    assert_eq!(db.get_iso_stnd("44Ca").unwrap(), 0.0212080);
}

#[test]
fn self_reference_is_rejected() {
    let mut db = ThermoDatabase::open(write_db()).expect("failed to open database");
    let err = db.get_1000lnalpha("44Ca", "Loop/Ca+2", 298.15).unwrap_err();
    assert!(matches!(err, ThermoError::IndirectionTooDeep { .. }));
}

#[test]
fn missing_file_reports_path() {
    let path = unique_temp_dir("cc_thermo_missing").join("nope.dat");
    let err = ThermoDatabase::open(&path).unwrap_err();
    assert!(matches!(err, ThermoError::Io { .. }));
    assert!(err.to_string().contains("nope.dat"));
}
