//! TOML-based run configuration for the `picsim` demonstration binary: a
//! `#[serde(deny_unknown_fields)]` settings tree, read with
//! `toml::from_str` and validated by a free `check_settings` function
//! that `bail!`s on an inconsistent configuration.
//!
//! This belongs entirely to the binary: the core's public API (see
//! `relapic::orchestrator::Simulation`) takes already-validated
//! `Grid`/`BoundaryPolicy`/species values and never parses configuration
//! itself.

use std::fs::File;
use std::io::prelude::*;

use relapic::boundary::BoundaryKind;
use relapic::Float;
use serde_derive::{Deserialize, Serialize};

use crate::errors::*;

/// Which of the two shape families (`relapic::shape`) to instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeFamily {
    BSpline,
    Polynomial,
}

/// Which relativistic pusher (`relapic::pusher`) to instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PusherKind {
    Boris,
    Vay,
    HigueraCary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridSettings {
    /// Cell count per axis; its length fixes the simulation dimension
    /// (must be 1, 2, or 3).
    pub n: Vec<usize>,
    /// Cell size per axis, same length as `n`.
    pub h: Vec<Float>,
    pub epsilon: Float,
    pub mu: Float,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeciesSettings {
    pub name: String,
    pub charge: Float,
    pub mass: Float,
    pub count: usize,
    /// Thermal spread of the initial momentum distribution, `u = γv` units,
    /// per axis (Maxwellian, zero mean).
    #[serde(default)]
    pub thermal_spread: Float,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShapeSettings {
    pub family: ShapeFamily,
    pub order: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSettings {
    /// Write a snapshot every `n`th timestep; `None` disables periodic
    /// snapshots.
    #[serde(default)]
    pub snapshot_every: Option<usize>,
    #[serde(default)]
    pub final_snapshot: bool,
    /// Binary (raw IEEE-754/little-endian) vs. whitespace-separated text
    /// snapshot encoding; see `relapic::snapshot`.
    #[serde(default = "default_true")]
    pub binary: bool,
    /// A snapshot file to resume from, used when `--resume` is passed.
    #[serde(default)]
    pub resume_from: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for OutputSettings {
    fn default() -> OutputSettings {
        OutputSettings {
            snapshot_every: None,
            final_snapshot: true,
            binary: true,
            resume_from: None,
        }
    }
}

/// The full TOML-deserialized run description: grid, boundary policy,
/// species list, shape family, pusher, timestep, run length, RNG seed,
/// and output cadence — exactly the fields named in SPEC_FULL.md's
/// Configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationSettings {
    pub grid: GridSettings,
    pub boundary: BoundaryKind,
    pub species: Vec<SpeciesSettings>,
    pub shape: ShapeSettings,
    pub pusher: PusherKind,
    pub timestep: Float,
    pub number_of_timesteps: usize,
    pub seed: u64,
    #[serde(default)]
    pub output: OutputSettings,
}

/// Reads the content of `filename` into a string.
fn read_from_file(filename: &str) -> Result<String> {
    let mut f = File::open(filename).chain_err(|| "Unable to open parameter file.")?;
    let mut content = String::new();
    f.read_to_string(&mut content)
        .chain_err(|| "Unable to read parameter file.")?;
    Ok(content)
}

/// Reads `param_file` as TOML, deserializes it into [`SimulationSettings`],
/// and validates it with [`check_settings`].
pub fn read_parameter_file(param_file: &str) -> Result<SimulationSettings> {
    let toml_string = read_from_file(param_file)?;
    let settings: SimulationSettings =
        toml::from_str(&toml_string).chain_err(|| "Unable to parse parameter file.")?;

    check_settings(&settings)?;

    Ok(settings)
}

/// Sanity-checks a parsed configuration beyond what serde's types already
/// guarantee: dimension consistency, positivity of physical quantities,
/// and a non-empty species list, mirroring `settings/si.rs`'s
/// `check_settings`.
fn check_settings(s: &SimulationSettings) -> Result<()> {
    let dim = s.grid.n.len();

    if dim == 0 || dim > 3 {
        bail!(
            "Grid dimension must be 1, 2, or 3; got {} axes in `grid.n`",
            dim
        );
    }

    if s.grid.h.len() != dim {
        bail!(
            "`grid.h` must list one cell size per axis ({} axes, got {})",
            dim,
            s.grid.h.len()
        );
    }

    if s.grid.n.iter().any(|&n| n == 0) {
        bail!("`grid.n` entries must all be positive");
    }

    if s.grid.h.iter().any(|&h| h <= 0.0) {
        bail!("`grid.h` entries must all be positive");
    }

    if s.grid.epsilon <= 0.0 || s.grid.mu <= 0.0 {
        bail!("`grid.epsilon` and `grid.mu` must be positive");
    }

    if s.species.is_empty() {
        bail!("`species` must not be empty");
    }

    for sp in &s.species {
        if sp.mass <= 0.0 {
            bail!("species '{}' has non-positive mass", sp.name);
        }
    }

    if s.timestep <= 0.0 {
        bail!("`timestep` must be positive");
    }

    if s.number_of_timesteps == 0 {
        bail!("`number_of_timesteps` must be positive");
    }

    if let Some(every) = s.output.snapshot_every {
        if every == 0 {
            bail!("`output.snapshot_every` must be positive when present");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_toml(dim_axes: &str, h_axes: &str) -> String {
        format!(
            r#"
            boundary = "periodic"
            pusher = "boris"
            timestep = 1.0e-12
            number_of_timesteps = 10
            seed = 42

            [grid]
            n = [{n}]
            h = [{h}]
            epsilon = 1.0
            mu = 1.0

            [shape]
            family = "b_spline"
            order = 1

            [[species]]
            name = "electron"
            charge = -1.0
            mass = 1.0
            count = 4
            "#,
            n = dim_axes,
            h = h_axes
        )
    }

    #[test]
    fn well_formed_settings_parse_and_validate() {
        let toml_string = sample_toml("8, 8", "1.0, 1.0");
        let settings: SimulationSettings = toml::from_str(&toml_string).unwrap();
        assert!(check_settings(&settings).is_ok());
    }

    #[test]
    fn mismatched_axis_counts_are_rejected() {
        let toml_string = sample_toml("8, 8", "1.0");
        let settings: SimulationSettings = toml::from_str(&toml_string).unwrap();
        assert!(check_settings(&settings).is_err());
    }

    #[test]
    fn zero_cell_count_is_rejected() {
        let toml_string = sample_toml("0, 8", "1.0, 1.0");
        let settings: SimulationSettings = toml::from_str(&toml_string).unwrap();
        assert!(check_settings(&settings).is_err());
    }

    #[test]
    fn unknown_field_is_rejected_by_deny_unknown_fields() {
        let mut toml_string = sample_toml("8, 8", "1.0, 1.0");
        toml_string.push_str("\nbogus = true\n");
        let result: std::result::Result<SimulationSettings, _> = toml::from_str(&toml_string);
        assert!(result.is_err());
    }
}
