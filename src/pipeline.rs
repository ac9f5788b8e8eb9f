use tracing::{debug, info, warn};

use crate::emit;
use crate::error::{BatchError, Result};
use crate::job::{build_job, GdalJob};
use crate::label::ClassLabel;
use crate::loader;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowMode {
    /// Raster paths are the fields of the first CSV record.
    FirstRecord,
    /// Every CSV record contributes raster paths.
    AllRecords,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub rasters: usize,
    pub jobs: usize,
    pub skipped: Vec<String>,
}

/// One job per raster, in input order.
///
/// Rasters without a two-token label fail the batch unless
/// `settings.skip_unlabeled` is set, in which case they are reported back.
pub fn build_batch(
    rasters: &[String],
    settings: &Settings,
) -> Result<(Vec<GdalJob>, Vec<String>)> {
    let mut jobs = Vec::with_capacity(rasters.len());
    let mut skipped = Vec::new();

    for raster in rasters {
        let label = match ClassLabel::from_path(raster) {
            Ok(label) => label,
            Err(e @ BatchError::InsufficientLabel { .. }) if settings.skip_unlabeled => {
                warn!("skipping: {}", e);
                skipped.push(raster.clone());
                continue;
            }
            Err(e) => return Err(e),
        };
        debug!(raster = %raster, class = %label.class, value = %label.value, "job");
        jobs.push(build_job(raster, &label, settings));
    }

    Ok((jobs, skipped))
}

/// Load rasters, build the batch and write it to `settings.output_json`.
pub fn run(settings: &Settings, mode: RowMode) -> Result<BatchSummary> {
    let rasters = match mode {
        RowMode::FirstRecord => loader::load_paths(&settings.input_csv)?,
        RowMode::AllRecords => loader::load_all_paths(&settings.input_csv)?,
    };
    info!("Loaded {} raster path(s) from {:?}", rasters.len(), settings.input_csv);

    let (jobs, skipped) = build_batch(&rasters, settings)?;
    emit::write_json(&jobs, &settings.output_json)?;
    info!("Wrote {} job(s) to {:?}", jobs.len(), settings.output_json);

    Ok(BatchSummary {
        rasters: rasters.len(),
        jobs: jobs.len(),
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn settings_in(dir: &Path, csv: &str) -> Settings {
        let input = dir.join("input_rasters.csv");
        std::fs::write(&input, csv).unwrap();
        Settings {
            input_csv: input,
            output_json: dir.join("output2.json"),
            ..Settings::default()
        }
    }

    fn read_output(settings: &Settings) -> serde_json::Value {
        let text = std::fs::read_to_string(&settings.output_json).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn outputs_follow_csv_order() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path(), "data/Depth____0.0.asc,data/Velocity____1.5.asc\n");

        let summary = run(&settings, RowMode::FirstRecord).unwrap();
        assert_eq!(summary.rasters, 2);
        assert_eq!(summary.jobs, 2);

        let value = read_output(&settings);
        let jobs = value.as_array().unwrap();
        assert_eq!(jobs.len(), 2);
        let out0 = jobs[0]["OUTPUTS"]["OUTPUT"].as_str().unwrap();
        let out1 = jobs[1]["OUTPUTS"]["OUTPUT"].as_str().unwrap();
        assert!(out0.contains("Depth_0.0"));
        assert!(out1.contains("Velocity_1.5"));
    }

    #[test]
    fn emitted_objects_have_exact_keys() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path(), "data/Depth____0.0.asc\n");
        run(&settings, RowMode::FirstRecord).unwrap();

        let value = read_output(&settings);
        let job = value[0].as_object().unwrap();
        let mut top: Vec<_> = job.keys().map(String::as_str).collect();
        top.sort();
        assert_eq!(top, vec!["OUTPUTS", "PARAMETERS"]);

        let mut params: Vec<_> = job["PARAMETERS"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        params.sort();
        assert_eq!(
            params,
            vec!["COLUMN_PREFIX", "INPUT", "INPUT_RASTER", "RASTER_BAND", "STATISTICS"]
        );
    }

    #[test]
    fn decimal_values_get_separate_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path(), "h/Depth____0.0.asc,h/Depth____0.5.asc\n");
        run(&settings, RowMode::FirstRecord).unwrap();

        let value = read_output(&settings);
        let out0 = value[0]["OUTPUTS"]["OUTPUT"].as_str().unwrap();
        let out1 = value[1]["OUTPUTS"]["OUTPUT"].as_str().unwrap();
        assert!(out0.ends_with("/Depth_0.0.gpkg'"));
        assert!(out1.ends_with("/Depth_0.5.gpkg'"));
    }

    #[test]
    fn repeated_runs_are_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path(), "a/Depth_1.asc, b/Depth_2.asc\n");

        run(&settings, RowMode::FirstRecord).unwrap();
        let first = std::fs::read(&settings.output_json).unwrap();
        run(&settings, RowMode::FirstRecord).unwrap();
        let second = std::fs::read(&settings.output_json).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn comment_only_csv_writes_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path(), "# no rasters yet\n");

        let summary = run(&settings, RowMode::FirstRecord).unwrap();
        assert_eq!(summary, BatchSummary::default());
        assert_eq!(std::fs::read_to_string(&settings.output_json).unwrap(), "[]\n");
    }

    #[test]
    fn all_records_mode_reads_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path(), "a/Depth_1.asc\nb/Velocity_2.asc\n");

        assert_eq!(run(&settings, RowMode::FirstRecord).unwrap().jobs, 1);
        assert_eq!(run(&settings, RowMode::AllRecords).unwrap().jobs, 2);
    }

    #[test]
    fn unlabeled_raster_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path(), "a/Depth_1.asc,b/bare.asc\n");

        let err = run(&settings, RowMode::FirstRecord).unwrap_err();
        assert!(matches!(err, BatchError::InsufficientLabel { found: 1, .. }));
        assert!(!settings.output_json.exists());
    }

    #[test]
    fn unlabeled_raster_skipped_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            skip_unlabeled: true,
            ..settings_in(dir.path(), "a/Depth_1.asc,b/bare.asc,c/Flow_3.asc\n")
        };

        let summary = run(&settings, RowMode::FirstRecord).unwrap();
        assert_eq!(summary.jobs, 2);
        assert_eq!(summary.skipped, vec!["b/bare.asc"]);
    }

    #[test]
    fn missing_input_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            input_csv: dir.path().join("absent.csv"),
            output_json: dir.path().join("output2.json"),
            ..Settings::default()
        };
        let err = run(&settings, RowMode::FirstRecord).unwrap_err();
        assert!(matches!(err, BatchError::Read { .. }));
        assert!(!settings.output_json.exists());
    }
}
