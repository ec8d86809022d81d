//! Synthetic frame source (`stub://` URLs).
//!
//! Renders a static gradient background with low-amplitude sensor noise. On a
//! fixed schedule a bright block walks across the scene, which is enough to
//! exercise the whole detection path without a camera.

use std::time::Duration;

use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{FrameSource, SourceSettings, SourceStats};
use crate::error::AcquisitionError;
use crate::frame::Frame;

/// Configuration for a synthetic scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticConfig {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub warmup: Duration,
    /// A walk starts every `period` frames (0 disables motion).
    pub period: u64,
    /// Number of frames the block stays in the scene per walk.
    pub active_frames: u64,
    /// Side of the moving block, in pixels.
    pub block_size: u32,
    /// Peak-to-peak noise amplitude added to every sample.
    pub noise: u8,
    /// Stop with `AcquisitionError::Exhausted` after this many frames.
    pub frame_limit: Option<u64>,
    pub seed: u64,
}

impl SyntheticConfig {
    pub fn from_settings(settings: &SourceSettings) -> Self {
        Self {
            url: settings.url.clone(),
            width: settings.width,
            height: settings.height,
            warmup: settings.warmup,
            ..Self::default()
        }
    }
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            url: "stub://server_room".to_string(),
            width: 640,
            height: 480,
            warmup: Duration::ZERO,
            period: 50,
            active_frames: 20,
            block_size: 240,
            noise: 6,
            frame_limit: None,
            seed: 0x5eed,
        }
    }
}

pub struct SyntheticSource {
    config: SyntheticConfig,
    rng: StdRng,
    frame_count: u64,
    connected: bool,
    closed: bool,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            frame_count: 0,
            connected: false,
            closed: false,
        }
    }

    /// Position of the moving block for the given frame, if it is in the scene.
    fn block_origin(&self, frame_index: u64) -> Option<(u32, u32)> {
        let cfg = &self.config;
        if cfg.period == 0 || cfg.active_frames == 0 {
            return None;
        }
        let phase = frame_index % cfg.period;
        if phase >= cfg.active_frames {
            return None;
        }
        let size = cfg.block_size.min(cfg.width).min(cfg.height);
        let travel = cfg.width.saturating_sub(size);
        let x = if cfg.active_frames > 1 {
            (travel as u64 * phase / (cfg.active_frames - 1)) as u32
        } else {
            0
        };
        let y = (cfg.height - size) / 2;
        Some((x, y))
    }

    fn render(&mut self, frame_index: u64) -> RgbImage {
        let (width, height) = (self.config.width, self.config.height);
        let noise = self.config.noise as i16;
        let mut image = RgbImage::new(width, height);

        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let base = 60 + ((x + y) * 60 / (width + height).max(1)) as i16;
            let jitter = if noise > 0 {
                self.rng.gen_range(-noise / 2..=noise / 2)
            } else {
                0
            };
            let v = (base + jitter).clamp(0, 255) as u8;
            *pixel = Rgb([v, v, v]);
        }

        if let Some((x0, y0)) = self.block_origin(frame_index) {
            let size = self.config.block_size.min(width).min(height);
            for y in y0..y0 + size {
                for x in x0..x0 + size {
                    image.put_pixel(x, y, Rgb([235, 220, 200]));
                }
            }
        }

        image
    }
}

impl FrameSource for SyntheticSource {
    fn connect(&mut self) -> Result<(), AcquisitionError> {
        if self.closed {
            return Err(AcquisitionError::Closed);
        }
        if self.config.width == 0 || self.config.height == 0 {
            return Err(AcquisitionError::Device(format!(
                "invalid synthetic frame size {}x{}",
                self.config.width, self.config.height
            )));
        }
        self.connected = true;
        log::info!(
            "SyntheticSource: connected to {} ({}x{})",
            self.config.url,
            self.config.width,
            self.config.height
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame, AcquisitionError> {
        if self.closed {
            return Err(AcquisitionError::Closed);
        }
        if !self.connected {
            return Err(AcquisitionError::NotConnected);
        }
        if let Some(limit) = self.config.frame_limit {
            if self.frame_count >= limit {
                return Err(AcquisitionError::Exhausted {
                    frames: self.frame_count,
                });
            }
        }
        let image = self.render(self.frame_count);
        self.frame_count += 1;
        Ok(Frame::new(image, self.frame_count))
    }

    fn close(&mut self) {
        if !self.closed {
            log::info!(
                "SyntheticSource: closed {} after {} frames",
                self.config.url,
                self.frame_count
            );
        }
        self.closed = true;
        self.connected = false;
    }

    fn is_healthy(&self) -> bool {
        self.connected && !self.closed
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            source: self.config.url.clone(),
        }
    }

    fn warmup(&self) -> Duration {
        self.config.warmup
    }
}
