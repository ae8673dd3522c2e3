//! Oscilloscope retrieval paths: screenshots, full-screen and deep-memory
//! waveform capture.
//!
//! These are the callers of the block codec and sample transform. The wider
//! command catalog (triggers, cursors, measurements) is deliberately not
//! mirrored here; the setters included show the quantize-before-set pattern
//! every discrete register follows.

use chrono::Local;
use log::debug;

use crate::block::decode_block;
use crate::constants::{BLOCK_READ_LEN, FULL_SCREEN_POINTS, MAX_POINTS_PER_BATCH};
use crate::error::{ProtocolError, Result};
use crate::quantize::{decade_steps, quantize};
use crate::scpi::{masked_float, ScpiLink};
use crate::waveform::{preamble_x_axis, scale_samples, to_physical, WaveformPreamble};

/// Reads attempted per batch before a raw capture is abandoned.
const MAX_BATCH_READS: usize = 5;

/// Waveform source, resolved once at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Analog input channel 1-4
    Analog(u8),
    /// The math trace
    Math,
}

impl Channel {
    fn scpi_name(self) -> Result<String> {
        match self {
            Channel::Analog(n) if (1..=4).contains(&n) => Ok(format!("CHAN{n}")),
            Channel::Analog(n) => Err(ProtocolError::OutOfRange {
                name: "channel",
                value: n as i64,
                min: 1,
                max: 4,
            }),
            Channel::Math => Ok("MATH".to_string()),
        }
    }
}

/// Oscilloscope wrapper over any [`ScpiLink`].
pub struct Oscilloscope<L: ScpiLink> {
    link: L,
}

impl<L: ScpiLink> Oscilloscope<L> {
    /// Wrap an open instrument connection.
    pub fn new(link: L) -> Self {
        Oscilloscope { link }
    }

    /// Consume the wrapper, returning the underlying link.
    pub fn into_link(self) -> L {
        self.link
    }

    /// Read the current screen contents as PNG bytes.
    pub fn take_screenshot(&mut self) -> Result<Vec<u8>> {
        let buffer = self
            .link
            .ask_raw(":DISPlay:DATA? ON,OFF,PNG", BLOCK_READ_LEN)?;
        let (payload, consumed) = decode_block(&buffer)?;
        debug!("screenshot block: {} payload bytes, {} consumed", payload.len(), consumed);
        Ok(payload.to_vec())
    }

    /// Capture the screen to a timestamped PNG file, returning the filename.
    pub fn save_screenshot(&mut self) -> Result<String> {
        let png = self.take_screenshot()?;
        let filename = Local::now().format("%Y-%m-%d_%H-%M-%S.png").to_string();
        std::fs::write(&filename, png)?;
        Ok(filename)
    }

    /// Query the main timebase scale in s/div; `None` when masked.
    pub fn get_timebase_scale(&mut self) -> Result<Option<f64>> {
        let reply = self.link.ask(":TIMebase:MAIN:SCALe?")?;
        masked_float(&reply)
    }

    /// Query the main timebase offset in seconds; `None` when masked.
    pub fn get_timebase_offset(&mut self) -> Result<Option<f64>> {
        let reply = self.link.ask(":TIMebase:MAIN:OFFSet?")?;
        masked_float(&reply)
    }

    /// Set the main timebase scale, snapped to the 1-2-5 series the
    /// hardware accepts (5 ns/div up to 1 s/div decades).
    pub fn set_timebase_scale(&mut self, scale: f64) -> Result<()> {
        let candidates: Vec<f64> = decade_steps(-9..=0)
            .into_iter()
            .filter(|&s| s >= 5e-9)
            .collect();
        let scale = quantize(scale, &candidates);
        self.link.write(&format!(":TIMebase:MAIN:SCALe {scale}"))
    }

    /// Query a channel's probe ratio; `None` when masked.
    pub fn get_probe_ratio(&mut self, channel: Channel) -> Result<Option<f64>> {
        let reply = self.link.ask(&format!(":{}:PROBe?", channel.scpi_name()?))?;
        masked_float(&reply)
    }

    /// Set a channel's probe ratio, snapped to the fixed ratio list.
    pub fn set_probe_ratio(&mut self, ratio: f64, channel: Channel) -> Result<()> {
        const PROBE_RATIOS: [f64; 16] = [
            0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0,
            500.0, 1000.0,
        ];
        let ratio = quantize(ratio, &PROBE_RATIOS);
        self.link
            .write(&format!(":{}:PROBe {}", channel.scpi_name()?, ratio))
    }

    /// Set a channel's vertical scale in V/div. The legal scales are the
    /// base list multiplied by the channel's current probe ratio, so the
    /// ratio is queried first and the candidate set derived per call.
    pub fn set_channel_scale(&mut self, scale: f64, channel: Channel) -> Result<()> {
        let name = channel.scpi_name()?;
        let probe_ratio = self.get_probe_ratio(channel)?.unwrap_or(1.0);
        let candidates: Vec<f64> = [1e-3, 2e-3, 5e-3, 1.0, 2.0, 5.0, 1e1, 2e1, 5e1]
            .iter()
            .map(|base| base * probe_ratio)
            .collect();
        let scale = quantize(scale, &candidates);
        self.link.write(&format!(":{name}:SCALe {scale}"))
    }

    /// Set the average count, snapped to the powers of two the acquisition
    /// engine supports.
    pub fn set_averages(&mut self, count: u32) -> Result<()> {
        const COUNTS: [f64; 10] = [2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0, 256.0, 512.0, 1024.0];
        let count = quantize(count as f64, &COUNTS) as u32;
        self.link.write(&format!(":ACQuire:AVERages {count}"))
    }

    /// Capture the full on-screen waveform of one channel as physical
    /// `(time, value)` series.
    ///
    /// This is the legacy screen capture: 1200 byte samples, vertical
    /// scaling from the preamble, time axis synthesized from the main
    /// timebase (see [`crate::waveform::to_physical`]).
    pub fn get_waveform_samples(&mut self, channel: Channel) -> Result<(Vec<f64>, Vec<f64>)> {
        let source = channel.scpi_name()?;
        self.link.write(&format!(":WAVeform:SOURce {source}"))?;
        self.link.write(":WAVeform:FORMat BYTE")?;
        let preamble = WaveformPreamble::parse(&self.link.ask(":WAVeform:PREamble?")?)?;
        self.link.write(":WAVeform:STARt 1")?;
        self.link.write(&format!(":WAVeform:STOP {FULL_SCREEN_POINTS}"))?;
        let buffer = self.link.ask_raw(":WAVeform:DATA?", BLOCK_READ_LEN)?;
        let (payload, _) = decode_block(&buffer)?;
        let samples = payload.to_vec();
        let timebase_scale = self
            .get_timebase_scale()?
            .ok_or_else(|| ProtocolError::Parse("timebase scale is masked".to_string()))?;
        let timebase_offset = self
            .get_timebase_offset()?
            .ok_or_else(|| ProtocolError::Parse("timebase offset is masked".to_string()))?;
        to_physical(&samples, &preamble, timebase_scale, timebase_offset)
    }

    /// Capture one channel's full acquisition memory as physical
    /// `(time, value)` series.
    ///
    /// Raw-mode retrieval: the acquisition is stopped, samples are fetched
    /// in batches of up to [`MAX_POINTS_PER_BATCH`] points, and acquisition
    /// resumes afterwards. A batch that arrives short is read again, since
    /// the instrument streams deep memory slower than it answers; after
    /// `MAX_BATCH_READS` incomplete reads the capture fails. The time axis
    /// comes from the preamble's x parameters, not the screen capture's
    /// synthesized one.
    pub fn get_memory_samples(&mut self, channel: Channel) -> Result<(Vec<f64>, Vec<f64>)> {
        let source = channel.scpi_name()?;
        self.link.write(&format!(":WAVeform:SOURce {source}"))?;
        self.link.write(":WAVeform:MODE RAW")?;
        self.link.write(":WAVeform:FORMat BYTE")?;
        self.link.write(":STOP")?;
        let preamble = WaveformPreamble::parse(&self.link.ask(":WAVeform:PREamble?")?)?;
        let mut samples: Vec<u8> = Vec::with_capacity(preamble.point_count);
        let mut start = 1;
        while start <= preamble.point_count {
            let stop = (start + MAX_POINTS_PER_BATCH - 1).min(preamble.point_count);
            let batch_len = stop - start + 1;
            self.link.write(&format!(":WAVeform:STARt {start}"))?;
            self.link.write(&format!(":WAVeform:STOP {stop}"))?;
            // room for the longest block header ("#9" + nine digits) and a terminator
            let max_len = batch_len + 12;
            let mut reads = 0;
            loop {
                let buffer = self.link.ask_raw(":WAVeform:DATA?", max_len)?;
                match decode_block(&buffer) {
                    Ok((payload, _)) if payload.len() == batch_len => {
                        samples.extend_from_slice(payload);
                        break;
                    }
                    _ => {
                        reads += 1;
                        debug!("points {start}..{stop}: incomplete read {reads}");
                        if reads >= MAX_BATCH_READS {
                            return Err(ProtocolError::Parse(format!(
                                "points {start}..{stop} still incomplete after {reads} reads"
                            )));
                        }
                    }
                }
            }
            start = stop + 1;
        }
        self.link.write(":RUN")?;
        let values = scale_samples(&samples, &preamble);
        let x_axis = preamble_x_axis(&preamble);
        Ok((x_axis, values))
    }
}
