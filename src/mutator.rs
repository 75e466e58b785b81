//! The actual art. Each pass nudges a random scattering of blocks toward the
//! colors of the current weather.

use crate::{canvas::Canvas, palette::PaletteTable, util::Color};
use anyhow::bail;
use log::{debug, info};
use rand::Rng;

/// Weight of the new color in a blend. The rest is the existing color.
const BLEND_WEIGHT: f64 = 0.3;

/// Source of randomness for a mutation pass. Pulled out so tests can script
/// exactly which blocks and colors get picked.
pub trait Entropy {
    /// Pick a block, in block coordinates. Both bounds are exclusive and
    /// always positive.
    fn block(&mut self, blocks_x: u32, blocks_y: u32) -> (u32, u32);

    /// Pick an index into a palette of the given (non-zero) length
    fn index(&mut self, len: usize) -> usize;

    /// Pick an offset in `-max..=max`
    fn offset(&mut self, max: u8) -> i16;
}

/// [Entropy] backed by any [rand] RNG
#[derive(Debug)]
pub struct RandomSource<R>(pub R);

impl<R: Rng> Entropy for RandomSource<R> {
    fn block(&mut self, blocks_x: u32, blocks_y: u32) -> (u32, u32) {
        (self.0.gen_range(0..blocks_x), self.0.gen_range(0..blocks_y))
    }

    fn index(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }

    fn offset(&mut self, max: u8) -> i16 {
        let max = i16::from(max);
        self.0.gen_range(-max..=max)
    }
}

/// Perturb each channel independently by up to `max`, staying in range
pub fn jitter(color: Color, max: u8, entropy: &mut impl Entropy) -> Color {
    let mut channel = |value: u8| {
        (i16::from(value) + entropy.offset(max)).clamp(0, 255) as u8
    };
    Color {
        red: channel(color.red),
        green: channel(color.green),
        blue: channel(color.blue),
    }
}

/// Mix a new color into an existing one. The existing color dominates, so
/// the canvas drifts rather than jumps.
pub fn blend(new: Color, current: Color) -> Color {
    new.zip_map(current, |new, current| {
        (f64::from(new) * BLEND_WEIGHT
            + f64::from(current) * (1.0 - BLEND_WEIGHT))
            .floor() as u8
    })
}

/// Applies weather-driven mutation passes to a canvas
#[derive(Debug)]
pub struct Mutator {
    palettes: PaletteTable,
    /// Fraction of all blocks written per pass
    modification_fraction: f64,
    /// Maximum per-channel jitter
    jitter: u8,
}

impl Mutator {
    pub fn new(
        palettes: PaletteTable,
        modification_fraction: f64,
        jitter: u8,
    ) -> Self {
        Self {
            palettes,
            modification_fraction,
            jitter,
        }
    }

    /// Number of block writes in one pass over the given canvas
    pub fn target_count(&self, canvas: &Canvas) -> usize {
        let (blocks_x, blocks_y) = canvas.blocks();
        let total = u64::from(blocks_x) * u64::from(blocks_y);
        // Truncation is the intent, negatives saturate to zero
        (total as f64 * self.modification_fraction) as usize
    }

    /// Run one mutation pass for the given weather condition. Blocks are
    /// picked with replacement, so a block can be hit more than once and
    /// each hit blends with whatever the previous one left behind. Returns
    /// the number of block writes.
    pub fn mutate(
        &self,
        canvas: &mut Canvas,
        condition: &str,
        night: bool,
        entropy: &mut impl Entropy,
    ) -> anyhow::Result<usize> {
        if condition.is_empty() {
            return Ok(0);
        }

        let palette = self.palettes.select(condition, night);
        if palette.is_empty() {
            bail!("No colors available for condition `{condition}`");
        }

        let (blocks_x, blocks_y) = canvas.blocks();
        if blocks_x == 0 || blocks_y == 0 {
            bail!(
                "Canvas {}x{} has no whole {}px blocks",
                canvas.width(),
                canvas.height(),
                canvas.block_size()
            );
        }

        let count = self.target_count(canvas);
        info!("Modifying {count} blocks for `{condition}`...");
        for _ in 0..count {
            let (x, y) = entropy.block(blocks_x, blocks_y);
            let color = palette[entropy.index(palette.len())];
            let varied = jitter(color, self.jitter, entropy);
            let current = canvas.block_color(x, y);
            canvas.fill_block(x, y, blend(varied, current));
        }
        debug!("Block modification complete");
        Ok(count)
    }
}
