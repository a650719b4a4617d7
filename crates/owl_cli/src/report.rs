//! Rendering of analysis output as an aligned table, CSV or JSON.

use anyhow::Result;
use clap::ValueEnum;
use num_complex::Complex64;
use owl_core::curves::{ResidualSample, TrajectoryPoint};
use owl_core::StabilityResult;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

/// Flat CSV record; complex eigenvalues are split into real and imaginary parts.
#[derive(Serialize)]
struct StabilityRecord {
    #[serde(rename = "U")]
    habitat: f64,
    equilibrium_index: usize,
    #[serde(rename = "P")]
    pairs: f64,
    #[serde(rename = "S_m")]
    single_males: f64,
    lambda_1_re: f64,
    lambda_1_im: f64,
    lambda_2_re: f64,
    lambda_2_im: f64,
    #[serde(rename = "|lambda_1|")]
    magnitude_1: f64,
    #[serde(rename = "|lambda_2|")]
    magnitude_2: f64,
    #[serde(rename = "max|lambda|")]
    spectral_radius: f64,
    stability: &'static str,
}

impl From<&StabilityResult> for StabilityRecord {
    fn from(row: &StabilityResult) -> Self {
        Self {
            habitat: row.habitat,
            equilibrium_index: row.equilibrium_index,
            pairs: row.pairs,
            single_males: row.single_males,
            lambda_1_re: row.eigenvalue_1.re,
            lambda_1_im: row.eigenvalue_1.im,
            lambda_2_re: row.eigenvalue_2.re,
            lambda_2_im: row.eigenvalue_2.im,
            magnitude_1: row.magnitude_1,
            magnitude_2: row.magnitude_2,
            spectral_radius: row.spectral_radius,
            stability: row.stability.as_str(),
        }
    }
}

#[derive(Serialize)]
struct TrajectoryRecord {
    initial_pairs: f64,
    initial_single_males: f64,
    step: usize,
    pairs: f64,
    single_males: f64,
}

fn format_complex(value: Complex64) -> String {
    if value.im == 0.0 {
        format!("{:.6}", value.re)
    } else {
        let sign = if value.im < 0.0 { '-' } else { '+' };
        format!("{:.6}{}{:.6}i", value.re, sign, value.im.abs())
    }
}

pub fn write_stability<W: Write>(
    out: &mut W,
    rows: &[StabilityResult],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                writeln!(out, "No positive equilibria found.")?;
                return Ok(());
            }
            writeln!(
                out,
                "{:>8} {:>3} {:>12} {:>12} {:>24} {:>24} {:>10} {:>10} {:>11} {:>9}",
                "U",
                "idx",
                "P",
                "S_m",
                "lambda_1",
                "lambda_2",
                "|lambda_1|",
                "|lambda_2|",
                "max|lambda|",
                "stability"
            )?;
            for row in rows {
                write!(
                    out,
                    "{:>8.1} {:>3} {:>12.6} {:>12.6} {:>24} {:>24} ",
                    row.habitat,
                    row.equilibrium_index,
                    row.pairs,
                    row.single_males,
                    format_complex(row.eigenvalue_1),
                    format_complex(row.eigenvalue_2)
                )?;
                writeln!(
                    out,
                    "{:>10.6} {:>10.6} {:>11.6} {:>9}",
                    row.magnitude_1,
                    row.magnitude_2,
                    row.spectral_radius,
                    row.stability
                )?;
            }
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(out);
            for row in rows {
                wtr.serialize(StabilityRecord::from(row))?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, rows)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

pub fn write_samples<W: Write>(
    out: &mut W,
    samples: &[ResidualSample],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            writeln!(out, "{:>8} {:>12} {:>16}", "U", "S_m", "p(S_m)")?;
            for sample in samples {
                writeln!(
                    out,
                    "{:>8.1} {:>12.6} {:>16.8}",
                    sample.habitat, sample.single_males, sample.residual
                )?;
            }
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(out);
            for sample in samples {
                wtr.serialize(sample)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, samples)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Orbits keyed by their initial `(P, S_m)`.
pub type Orbit = ((f64, f64), Vec<TrajectoryPoint>);

pub fn write_trajectories<W: Write>(
    out: &mut W,
    orbits: &[Orbit],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            for ((p0, s0), points) in orbits {
                writeln!(out, "IC: P0={p0}, Sm0={s0}")?;
                writeln!(out, "{:>6} {:>14} {:>14}", "t", "P", "S_m")?;
                for point in points {
                    writeln!(
                        out,
                        "{:>6} {:>14.6} {:>14.6}",
                        point.step, point.pairs, point.single_males
                    )?;
                }
                writeln!(out)?;
            }
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(out);
            for ((p0, s0), points) in orbits {
                for point in points {
                    wtr.serialize(TrajectoryRecord {
                        initial_pairs: *p0,
                        initial_single_males: *s0,
                        step: point.step,
                        pairs: point.pairs,
                        single_males: point.single_males,
                    })?;
                }
            }
            wtr.flush()?;
        }
        OutputFormat::Json => {
            let records: Vec<TrajectoryRecord> = orbits
                .iter()
                .flat_map(|((p0, s0), points)| {
                    points.iter().map(move |point| TrajectoryRecord {
                        initial_pairs: *p0,
                        initial_single_males: *s0,
                        step: point.step,
                        pairs: point.pairs,
                        single_males: point.single_males,
                    })
                })
                .collect();
            serde_json::to_writer_pretty(&mut *out, &records)?;
            writeln!(out)?;
        }
    }
    Ok(())
}
