//! End-to-end runs over light-curve files on disk.

use lc_period::core::{AnalysisResult, ResultLog};
use lc_period::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::{tempdir, NamedTempFile};

/// Several observations per night on irregularly spaced nights, with noise
/// and a couple of wild points.
fn write_light_curve(path: &Path, period: f64, nights: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut file = fs::File::create(path).unwrap();
    writeln!(file, "# MJD mag merr").unwrap();

    let mut night = 53400.0;
    for k in 0..nights {
        night += rng.gen_range(1..4) as f64;
        let visits = rng.gen_range(2..5);
        for v in 0..visits {
            let t = night + 0.15 + 0.05 * v as f64;
            let mut mag = 16.5 + 0.25 * (TAU * t / period).sin() + rng.gen_range(-0.02..0.02);
            if k == nights / 3 && v == 0 {
                mag += 2.5;
            }
            writeln!(file, "{:.6} {:.4} {:.3}", t, mag, rng.gen_range(0.02..0.05)).unwrap();
        }
    }
}

fn quick_config() -> AnalysisConfig {
    AnalysisConfig::default().with_oversampling(10.0)
}

#[test]
fn recovers_period_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("CRTS_J000001.dat");
    let period = 6.3;
    write_light_curve(&path, period, 70, 7);

    let result = analyze_path(&path, &quick_config()).unwrap();

    assert_eq!(result.source, "CRTS_J000001.dat");
    assert!(result.total_count > result.retained_count);
    assert_eq!(result.periodogram_count, 70);
    assert!(
        (result.best_period - period).abs() < 0.05,
        "expected {}, got {}",
        period,
        result.best_period
    );
    assert!(result.significance > 3.0);
    assert!(result.aov_peak.false_alarm_probability < 0.01);
}

#[test]
fn flag_and_prune_agree_on_counts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("star.dat");
    write_light_curve(&path, 5.9, 60, 11);

    let pruned = analyze_path(&path, &quick_config()).unwrap();
    let flagged = analyze_path(
        &path,
        &quick_config().with_outlier_policy(OutlierPolicy::Flag),
    )
    .unwrap();

    assert_eq!(pruned.total_count, flagged.total_count);
    assert_eq!(pruned.retained_count, flagged.retained_count);
    assert_eq!(pruned.best_period, flagged.best_period);
}

#[test]
fn results_append_to_log() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("periods.txt");

    for (name, period) in [("a.dat", 7.1), ("b.dat", 9.5)] {
        let path = dir.path().join(name);
        write_light_curve(&path, period, 50, 3);
        let result = analyze_path(&path, &quick_config()).unwrap();
        ResultLog::append(&log, &result).unwrap();
    }

    let contents = fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("a.dat "));
    assert!(lines[1].starts_with("b.dat "));
    assert_eq!(lines[1].split_whitespace().count(), 5);
}

#[test]
fn short_row_is_a_format_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "53001.10 17.20 0.05").unwrap();
    writeln!(file, "53002.10 17.31").unwrap();
    writeln!(file, "53003.10 17.12 0.05").unwrap();
    file.flush().unwrap();

    let err = analyze_path(file.path(), &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, PeriodError::Format { line: 2, .. }));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = analyze_path(dir.path().join("absent.dat"), &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, PeriodError::Io(_)));
}

#[test]
fn single_night_is_insufficient() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("one_night.dat");
    let rows: String = (0..12)
        .map(|i| format!("53010.{:02} {:.3} 0.04\n", 10 + i * 5, 17.0 + 0.01 * i as f64))
        .collect();
    fs::write(&path, rows).unwrap();

    let err = analyze_path(&path, &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, PeriodError::InsufficientData { .. }));
}

#[test]
fn record_reflects_result_fields() {
    let result = AnalysisResult {
        source: "x.dat".to_string(),
        total_count: 10,
        retained_count: 9,
        periodogram_count: 8,
        best_period: 1.5,
        best_frequency: 1.0 / 1.5,
        significance: 4.0,
        aov_peak: lc_period::periodogram::AovPeak {
            frequency: 1.0 / 1.5,
            statistic: 12.0,
            false_alarm_probability: 0.001,
        },
        grid_len: 40,
    };
    assert_eq!(result.to_record(), "x.dat 10 9 1.5 4");
}

#[test]
fn shared_time_stamp_is_insufficient() {
    let obs = ObservationSet::new(vec![5.0; 5], vec![17.0, 17.2, 16.9, 17.1, 17.0], vec![0.05; 5])
        .unwrap();
    let err = lc_period::analyze("stacked", obs, &AnalysisConfig::default()).unwrap_err();
    assert_eq!(err, PeriodError::InsufficientData { needed: 3, got: 1 });
}

#[test]
fn constant_light_curve_is_degenerate() {
    let times: Vec<f64> = (0..40).map(|k| 53000.3 + k as f64 * 1.7).collect();
    let obs = ObservationSet::new(times, vec![17.0; 40], vec![0.05; 40]).unwrap();

    let err = lc_period::analyze("flat", obs, &quick_config()).unwrap_err();
    assert!(matches!(err, PeriodError::DegenerateSignal(_)));
}
