//! Optional loudness normalization for generated audio.
//!
//! Best-effort by contract: normalization never fails a run. Anything it
//! cannot handle, from compressed formats to truncated files, leaves the
//! input untouched and returns the original path.

use hound::{SampleFormat, WavReader, WavWriter};
use std::path::{Path, PathBuf};

use crate::error::DebateError;

/// Peak-normalizes 16-bit WAV files in place.
///
/// The pipeline holds an `Option<PeakNormalizer>`; absence of the capability
/// and a file it cannot process both degrade to the same no-op.
#[derive(Debug, Clone)]
pub struct PeakNormalizer {
    /// Target peak as a fraction of full scale, in (0.0, 1.0].
    target_peak: f32,
}

impl Default for PeakNormalizer {
    fn default() -> Self {
        Self { target_peak: 0.95 }
    }
}

impl PeakNormalizer {
    pub fn new(target_peak: f32) -> Self {
        Self {
            target_peak: target_peak.clamp(0.01, 1.0),
        }
    }

    /// Normalize the file at `path` in place, returning the path. Never
    /// errors; a file that cannot be normalized comes back unchanged.
    pub fn normalize(&self, path: &Path) -> PathBuf {
        // Failures are deliberately ignored.
        let _ = self.try_normalize(path);
        path.to_path_buf()
    }

    fn try_normalize(&self, path: &Path) -> Result<(), DebateError> {
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
        if !is_wav {
            return Ok(());
        }

        let mut reader = WavReader::open(path)
            .map_err(|e| DebateError::Configuration(format!("Failed to open WAV: {}", e)))?;
        let spec = reader.spec();

        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
            return Ok(());
        }

        let samples: Vec<i16> = reader
            .samples::<i16>()
            .collect::<Result<_, _>>()
            .map_err(|e| DebateError::Configuration(format!("Failed to read WAV: {}", e)))?;

        let peak = samples.iter().map(|s| i32::from(*s).abs()).max().unwrap_or(0);
        if peak == 0 {
            return Ok(());
        }

        let target = (self.target_peak * f32::from(i16::MAX)) as i32;
        // Within a couple of quantization steps of the target counts as
        // already normalized, which makes a second pass a no-op.
        if (peak - target).abs() <= 2 {
            return Ok(());
        }

        let gain = target as f32 / peak as f32;
        let mut writer = WavWriter::create(path, spec)
            .map_err(|e| DebateError::Configuration(format!("Failed to rewrite WAV: {}", e)))?;
        for sample in &samples {
            let scaled = (f32::from(*sample) * gain)
                .round()
                .clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16;
            writer
                .write_sample(scaled)
                .map_err(|e| DebateError::Configuration(format!("Failed to write WAV: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| DebateError::Configuration(format!("Failed to finalize WAV: {}", e)))?;

        Ok(())
    }
}
