use crate::util::Color;
use anyhow::{bail, Context};
use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point, Size},
    pixelcolor::Rgb888,
    primitives::{Primitive, PrimitiveStyle, Rectangle},
    Drawable, Pixel,
};
use image::{Rgb, RgbImage};
use log::debug;
use std::{convert::Infallible, path::Path};

/// The artwork. A fixed-size grid of pixels, mutated one square block at a
/// time.
#[derive(Clone, Debug)]
pub struct Canvas {
    buffer: RgbImage,
    block_size: u32,
}

impl Canvas {
    /// Create a canvas filled with a single color
    pub fn new(
        width: u32,
        height: u32,
        block_size: u32,
        background: Color,
    ) -> Self {
        Self {
            buffer: RgbImage::from_pixel(
                width,
                height,
                Rgb(background.to_bytes()),
            ),
            block_size,
        }
    }

    /// Load a previously saved canvas from disk
    pub fn load(path: &Path, block_size: u32) -> anyhow::Result<Self> {
        let buffer = image::open(path)
            .with_context(|| {
                format!("Error loading canvas from {}", path.display())
            })?
            .into_rgb8();
        debug!(
            "Loaded {}x{} canvas from {}",
            buffer.width(),
            buffer.height(),
            path.display()
        );
        Ok(Self { buffer, block_size })
    }

    /// Load the canvas at the given path, but only if it has the expected
    /// dimensions
    pub fn resume(
        path: &Path,
        width: u32,
        height: u32,
        block_size: u32,
    ) -> anyhow::Result<Self> {
        let canvas = Self::load(path, block_size)?;
        if canvas.width() != width || canvas.height() != height {
            bail!(
                "Canvas at {} is {}x{}, expected {width}x{height}",
                path.display(),
                canvas.width(),
                canvas.height(),
            );
        }
        Ok(canvas)
    }

    /// Write the canvas to disk, overwriting whatever was there. The format
    /// is determined by the file extension.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        self.buffer.save(path).with_context(|| {
            format!("Error saving canvas to {}", path.display())
        })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Number of whole blocks along (x, y). Partial blocks on the right and
    /// bottom edges don't count.
    pub fn blocks(&self) -> (u32, u32) {
        (
            self.width() / self.block_size,
            self.height() / self.block_size,
        )
    }

    /// Color of a single pixel
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.buffer.get_pixel(x, y).0.into()
    }

    /// Representative color of a block, which is its top-left pixel
    pub fn block_color(&self, block_x: u32, block_y: u32) -> Color {
        self.pixel(block_x * self.block_size, block_y * self.block_size)
    }

    /// Paint an entire block with one color
    pub fn fill_block(&mut self, block_x: u32, block_y: u32, color: Color) {
        let top_left = Point::new(
            (block_x * self.block_size) as i32,
            (block_y * self.block_size) as i32,
        );
        Rectangle::new(top_left, Size::new_equal(self.block_size))
            .into_styled(PrimitiveStyle::with_fill(color.into()))
            .draw(self)
            .unwrap_or_else(|never| match never {});
    }

    /// Iterate over every pixel color, row by row
    pub fn pixels(&self) -> impl '_ + Iterator<Item = Color> {
        self.buffer.pixels().map(|pixel| pixel.0.into())
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = self.buffer.dimensions();
        for Pixel(point, color) in pixels {
            // Anything off-canvas gets dropped
            if let Ok((x, y)) = <(u32, u32)>::try_from(point) {
                if x < width && y < height {
                    let color = Color::from(color);
                    self.buffer.put_pixel(x, y, Rgb(color.to_bytes()));
                }
            }
        }
        Ok(())
    }
}
