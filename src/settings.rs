//! Job parameters and file locations.
//!
//! Defaults reproduce the prep_2023 Colima batch. Sources are layered in
//! order: defaults, optional `zonal_batch.*` settings file (or an explicit
//! `--config` path), then `ZONAL_*` environment variables.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{BatchError, Result};

const SETTINGS_BASENAME: &str = "zonal_batch";
const ENV_PREFIX: &str = "ZONAL";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Polygon layer every job aggregates over, in GDAL `path|layername=...` form.
    pub vector_layer_path: String,
    /// Prefix joined to each raster path from the CSV.
    pub raster_base_dir: String,
    /// Directory the per-raster `.gpkg` outputs land in.
    pub output_base_dir: String,
    pub raster_band: u32,
    pub column_prefix: String,
    /// Statistic indices as understood by the zonal statistics algorithm.
    pub statistics: Vec<u32>,
    pub input_csv: PathBuf,
    pub output_json: PathBuf,
    /// Drop rasters whose name has fewer than two label tokens instead of failing.
    pub skip_unlabeled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            vector_layer_path:
                "C:/Users/pedro/Documents/workspace/prep_2023/data/colima/agebs_repro.gpkg|layername=reproyectada"
                    .to_string(),
            raster_base_dir: "C:/Users/pedro/Documents/workspace/prep_2023/".to_string(),
            output_base_dir: "C:/Users/pedro/Documents/workspace/prep_2023/data/zonalStats/"
                .to_string(),
            raster_band: 1,
            column_prefix: "_".to_string(),
            statistics: vec![0, 1, 2],
            input_csv: PathBuf::from("input_rasters.csv"),
            output_json: PathBuf::from("output2.json"),
            skip_unlabeled: false,
        }
    }
}

impl Settings {
    /// Load settings from the settings file and the environment.
    ///
    /// An explicit file must exist; the implicit `zonal_batch.*` file is optional.
    pub fn load(explicit_file: Option<&Path>) -> Result<Self> {
        Self::load_with(explicit_file, true)
    }

    fn load_with(explicit_file: Option<&Path>, with_env: bool) -> Result<Self> {
        let mut builder = Config::builder();
        builder = match explicit_file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(SETTINGS_BASENAME).required(false)),
        };
        if with_env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("statistics"),
            );
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.raster_band == 0 {
            return Err(BatchError::Config("raster_band is 1-based, got 0".to_string()));
        }
        if self.statistics.is_empty() {
            return Err(BatchError::Config("statistics must list at least one index".to_string()));
        }
        if self.input_csv.as_os_str().is_empty() || self.output_json.as_os_str().is_empty() {
            return Err(BatchError::Config("input_csv and output_json must be set".to_string()));
        }
        Ok(())
    }
}
