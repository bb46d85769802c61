// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calibration parameters and the files they can be read from.

use std::{fs::File, io::Read, path::Path, str::FromStr};

use itertools::Itertools;
use log::debug;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use super::CalibrateError;
use crate::{constants::*, FilterAlgorithm, FilterOptions};

#[derive(Debug, Display, EnumIter, EnumString)]
enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,

    #[strum(serialize = "json")]
    Json,

    #[strum(serialize = "yaml")]
    Yaml,
}

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");
}

/// Everything that controls a calibration run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationParams {
    /// The measurement-update strategy.
    pub algorithm: FilterAlgorithm,

    /// The fraction of each update that is applied, in (0, 1].
    pub step_control: f64,

    /// The standard deviation of the gains' random walk between time steps.
    pub sigma_f: f64,

    /// The standard deviation of the visibility noise.
    pub sigma_n: f64,

    /// How many filter passes to make. Passes alternate direction.
    pub filter_runs: usize,

    /// How many smoother passes to make. Passes alternate direction.
    pub smoother_runs: usize,

    pub progress_bars: bool,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        CalibrationParams {
            algorithm: FilterAlgorithm::default(),
            step_control: DEFAULT_STEP_CONTROL,
            sigma_f: DEFAULT_SIGMA_F,
            sigma_n: DEFAULT_SIGMA_N,
            filter_runs: DEFAULT_FILTER_RUNS,
            smoother_runs: DEFAULT_SMOOTHER_RUNS,
            progress_bars: false,
        }
    }
}

/// The contents of an argument file. Any field missing from the file takes
/// its default.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArgFile {
    algorithm: Option<String>,
    step_control: Option<f64>,
    sigma_f: Option<f64>,
    sigma_n: Option<f64>,
    filter_runs: Option<usize>,
    smoother_runs: Option<usize>,
    progress_bars: Option<bool>,
}

impl ArgFile {
    fn into_params(self) -> Result<CalibrationParams, CalibrateError> {
        let ArgFile {
            algorithm,
            step_control,
            sigma_f,
            sigma_n,
            filter_runs,
            smoother_runs,
            progress_bars,
        } = self;
        let defaults = CalibrationParams::default();

        let algorithm = match algorithm {
            Some(s) => FilterAlgorithm::parse(&s)?,
            None => defaults.algorithm,
        };
        Ok(CalibrationParams {
            algorithm,
            step_control: step_control.unwrap_or(defaults.step_control),
            sigma_f: sigma_f.unwrap_or(defaults.sigma_f),
            sigma_n: sigma_n.unwrap_or(defaults.sigma_n),
            filter_runs: filter_runs.unwrap_or(defaults.filter_runs),
            smoother_runs: smoother_runs.unwrap_or(defaults.smoother_runs),
            progress_bars: progress_bars.unwrap_or(defaults.progress_bars),
        })
    }
}

impl CalibrationParams {
    /// Read parameters from a toml, json or yaml file, chosen by the file's
    /// extension.
    pub fn from_arg_file(arg_file: &Path) -> Result<CalibrationParams, CalibrateError> {
        debug!("Attempting to parse argument file {}", arg_file.display());

        let arg_file_type = arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok())
            .ok_or_else(|| CalibrateError::ArgFileType {
                path: arg_file.to_path_buf(),
            })?;

        let mut contents = String::new();
        let mut fh = File::open(arg_file)?;
        fh.read_to_string(&mut contents)?;

        let decode_error = |file_type: &'static str, err: String| CalibrateError::ArgFileDecode {
            file_type,
            path: arg_file.to_path_buf(),
            err,
        };
        let args: ArgFile = match arg_file_type {
            ArgFileTypes::Toml => {
                debug!("Parsing toml file...");
                toml::from_str(&contents).map_err(|e| decode_error("toml", e.to_string()))?
            }
            ArgFileTypes::Json => {
                debug!("Parsing json file...");
                serde_json::from_str(&contents).map_err(|e| decode_error("json", e.to_string()))?
            }
            ArgFileTypes::Yaml => {
                debug!("Parsing yaml file...");
                serde_yaml::from_str(&contents).map_err(|e| decode_error("yaml", e.to_string()))?
            }
        };
        let params = args.into_params()?;
        params.validate()?;
        Ok(params)
    }

    /// Check the values that the filter and smoother don't check themselves.
    pub fn validate(&self) -> Result<(), CalibrateError> {
        if self.filter_runs == 0 {
            return Err(CalibrateError::NoRuns { what: "filter" });
        }
        if self.smoother_runs == 0 {
            return Err(CalibrateError::NoRuns { what: "smoother" });
        }
        for (what, value) in [("sigma_f", self.sigma_f), ("sigma_n", self.sigma_n)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(CalibrateError::InvalidSigma { what, value });
            }
        }
        Ok(())
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            algorithm: self.algorithm,
            step_control: self.step_control,
            progress_bars: self.progress_bars,
        }
    }

    /// The diagonal of the process-noise covariance, `sigma_f^2`.
    pub fn process_noise(&self, state_len: usize) -> Array1<f64> {
        Array1::from_elem(state_len, self.sigma_f.powi(2))
    }

    /// The diagonal of the measurement-noise covariance, `2 sigma_n^2`.
    pub fn measurement_noise(&self, num_measurements: usize) -> Array1<f64> {
        Array1::from_elem(num_measurements, 2.0 * self.sigma_n.powi(2))
    }
}
