//! Waveform preamble parsing and raw-sample scaling.
//!
//! The oscilloscope reports capture geometry through `:WAVeform:PREamble?`
//! as ten comma-separated fields. Raw samples from `:WAVeform:DATA?` are
//! plain bytes (or words); the preamble supplies the scaling that turns them
//! into volts, and the main timebase supplies the legacy time axis.

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// Sample encoding used by `:WAVeform:DATA?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveformFormat {
    /// One byte per sample
    Byte,
    /// Two bytes per sample
    Word,
    /// Comma-separated ASCII values
    Ascii,
}

/// Acquisition mode the capture was taken in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveformMode {
    /// Screen-resolution data
    Normal,
    /// Maximum available points for the current state
    Maximum,
    /// Internal-memory data
    Raw,
}

/// Capture geometry reported by the instrument for one acquisition.
///
/// Produced fresh per capture and used to transform exactly one payload;
/// never cached across acquisitions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveformPreamble {
    /// Sample encoding of the pending data transfer
    pub format: WaveformFormat,
    /// Acquisition mode of the capture
    pub mode: WaveformMode,
    /// Number of sample points in the capture
    pub point_count: usize,
    /// Number of averaged frames (1 in non-average modes)
    pub frame_count: u32,
    /// Time between neighboring sample points, in seconds
    pub x_increment: f64,
    /// Time of the first sample relative to the trigger, in seconds
    pub x_origin: f64,
    /// Reference index for the time axis
    pub x_reference: i64,
    /// Volts per raw count
    pub y_increment: f64,
    /// Vertical offset in raw counts
    pub y_origin: f64,
    /// Vertical reference level in raw counts
    pub y_reference: i64,
}

impl WaveformPreamble {
    /// Parse the ten comma-separated fields of a `:WAVeform:PREamble?` reply.
    pub fn parse(reply: &str) -> Result<Self> {
        let fields: Vec<&str> = reply.trim().split(',').collect();
        if fields.len() != 10 {
            return Err(ProtocolError::Parse(format!(
                "expected 10 preamble fields, got {}",
                fields.len()
            )));
        }
        Ok(WaveformPreamble {
            format: match parse_int(fields[0])? {
                0 => WaveformFormat::Byte,
                1 => WaveformFormat::Word,
                2 => WaveformFormat::Ascii,
                other => {
                    return Err(ProtocolError::Parse(format!(
                        "unknown waveform format {other}"
                    )))
                }
            },
            mode: match parse_int(fields[1])? {
                0 => WaveformMode::Normal,
                1 => WaveformMode::Maximum,
                2 => WaveformMode::Raw,
                other => {
                    return Err(ProtocolError::Parse(format!("unknown waveform mode {other}")))
                }
            },
            point_count: parse_int(fields[2])? as usize,
            frame_count: parse_int(fields[3])? as u32,
            x_increment: parse_float(fields[4])?,
            x_origin: parse_float(fields[5])?,
            x_reference: parse_int(fields[6])?,
            y_increment: parse_float(fields[7])?,
            y_origin: parse_float(fields[8])?,
            y_reference: parse_int(fields[9])?,
        })
    }
}

fn parse_int(field: &str) -> Result<i64> {
    field
        .trim()
        .parse()
        .map_err(|_| ProtocolError::Parse(format!("bad integer preamble field {field:?}")))
}

fn parse_float(field: &str) -> Result<f64> {
    field
        .trim()
        .parse()
        .map_err(|_| ProtocolError::Parse(format!("bad float preamble field {field:?}")))
}

/// Scale raw samples into physical values and synthesize the legacy time axis.
///
/// Each sample maps to `(s - y_origin - y_reference) * y_increment`. The time
/// axis is built from the main timebase, not the preamble: point `i` sits at
/// `i * timebase_scale / 10.0 + timebase_offset` with `i` running
/// symmetrically around zero over the sample count. Existing consumers depend
/// on this exact axis, including its fixed screen-geometry assumption; use
/// [`preamble_x_axis`] for an axis derived from the preamble instead.
///
/// Returns `(x_axis, values)`. Errors if the sample count disagrees with the
/// preamble's point count rather than truncating silently.
pub fn to_physical<S>(
    raw_samples: &[S],
    preamble: &WaveformPreamble,
    timebase_scale: f64,
    timebase_offset: f64,
) -> Result<(Vec<f64>, Vec<f64>)>
where
    S: Copy + Into<f64>,
{
    if raw_samples.len() != preamble.point_count {
        return Err(ProtocolError::PointCountMismatch {
            expected: preamble.point_count,
            actual: raw_samples.len(),
        });
    }
    let values = scale_samples(raw_samples, preamble);
    let x_axis = legacy_x_axis(raw_samples.len(), timebase_scale, timebase_offset);
    Ok((x_axis, values))
}

/// Apply the preamble's vertical scaling to each raw sample.
pub fn scale_samples<S>(raw_samples: &[S], preamble: &WaveformPreamble) -> Vec<f64>
where
    S: Copy + Into<f64>,
{
    raw_samples
        .iter()
        .map(|&s| {
            (s.into() - preamble.y_origin - preamble.y_reference as f64) * preamble.y_increment
        })
        .collect()
}

/// Time axis for a full-screen capture, synthesized from the main timebase.
///
/// Index `i` runs over `[-n/2, n/2)` with flooring division, so the axis is
/// centered on `timebase_offset`.
pub fn legacy_x_axis(sample_count: usize, timebase_scale: f64, timebase_offset: f64) -> Vec<f64> {
    let n = sample_count as i64;
    let lo = (-n).div_euclid(2);
    let hi = n.div_euclid(2);
    (lo..hi)
        .map(|i| i as f64 * timebase_scale / 10.0 + timebase_offset)
        .collect()
}

/// Time axis derived from the preamble's x parameters: `i * x_increment + x_origin`.
pub fn preamble_x_axis(preamble: &WaveformPreamble) -> Vec<f64> {
    (0..preamble.point_count)
        .map(|i| i as f64 * preamble.x_increment + preamble.x_origin)
        .collect()
}
