use itertools::Itertools;
use serde::Serialize;

use crate::label::ClassLabel;
use crate::settings::Settings;

/// One zonal statistics invocation in the batch file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GdalJob {
    #[serde(rename = "PARAMETERS")]
    pub parameters: Parameters,
    #[serde(rename = "OUTPUTS")]
    pub outputs: Outputs,
}

/// String values use the batch runner's expression syntax, so paths and
/// literals carry their own single quotes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Parameters {
    pub input: String,
    pub input_raster: String,
    pub raster_band: String,
    pub column_prefix: String,
    pub statistics: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Outputs {
    pub output: String,
}

fn quoted(s: &str) -> String {
    format!("'{}'", s)
}

pub fn build_job(raster: &str, label: &ClassLabel, settings: &Settings) -> GdalJob {
    GdalJob {
        parameters: Parameters {
            input: quoted(&settings.vector_layer_path),
            input_raster: quoted(&format!("{}{}", settings.raster_base_dir, raster)),
            raster_band: settings.raster_band.to_string(),
            column_prefix: quoted(&settings.column_prefix),
            statistics: format!("[{}]", settings.statistics.iter().join(",")),
        },
        outputs: Outputs {
            output: quoted(&format!("{}{}.gpkg", settings.output_base_dir, label.stem())),
        },
    }
}
