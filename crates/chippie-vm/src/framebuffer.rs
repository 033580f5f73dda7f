use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::error::{BoundsError, Error, Result};

/// The two colors a pixel can have
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Color {
    #[default]
    Clear,
    Set,
}

impl Color {
    pub fn is_set(self) -> bool {
        self == Color::Set
    }

    pub fn as_bit(self) -> u8 {
        u8::from(self.is_set())
    }

    /// Any bit other than 0 is set
    pub fn from_bit(bit: u8) -> Self {
        Color::from(bit != 0)
    }
}

impl From<bool> for Color {
    fn from(set: bool) -> Self {
        if set { Color::Set } else { Color::Clear }
    }
}

/// The framebuffer as the cpu and a renderer share it
pub type SharedFramebuffer = Arc<Mutex<Framebuffer>>;

/// Locks a shared framebuffer. A renderer that panicked while holding the lock leaves the
/// pixels as they were, so the data is still usable.
pub fn lock(framebuffer: &SharedFramebuffer) -> MutexGuard<'_, Framebuffer> {
    framebuffer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A black and white bitmap, stored row by row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidConfig(format!(
                "display must be at least 1x1, got {width}x{height}"
            )));
        }
        let Some(size) = width.checked_mul(height) else {
            return Err(Error::InvalidConfig(format!(
                "display {width}x{height} has too many pixels"
            )));
        };

        Ok(Self {
            width,
            height,
            pixels: vec![Color::Clear; size],
        })
    }

    /// Wraps the framebuffer so it can be handed to the cpu and to a renderer
    pub fn shared(self) -> SharedFramebuffer {
        Arc::new(Mutex::new(self))
    }

    /// (width, height)
    pub fn bounds(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn get(&self, x: usize, y: usize) -> std::result::Result<Color, BoundsError> {
        let index = self.index(x, y)?;
        Ok(self.pixels[index])
    }

    pub fn set(
        &mut self,
        x: usize,
        y: usize,
        color: Color,
    ) -> std::result::Result<(), BoundsError> {
        let index = self.index(x, y)?;
        self.pixels[index] = color;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.pixels.fill(Color::Clear);
    }

    /// XORs an 8 pixel wide sprite onto the framebuffer with its top left corner at (x, y).
    /// Every row is one byte, most significant bit on the left. Pixels that fall off an edge
    /// wrap around to the opposite side, the x axis by the width and the y axis by the height.
    ///
    /// Returns true if any pixel that was set got cleared.
    pub fn draw_sprite(&mut self, x: usize, y: usize, rows: &[u8]) -> bool {
        let mut collision = false;

        for (row, bits) in rows.iter().enumerate() {
            let py = (y + row) % self.height;
            for column in 0..8 {
                if bits >> (7 - column) & 1 == 0 {
                    continue;
                }
                let px = (x + column) % self.width;
                let index = px + py * self.width;
                if self.pixels[index].is_set() {
                    collision = true;
                    self.pixels[index] = Color::Clear;
                } else {
                    self.pixels[index] = Color::Set;
                }
            }
        }

        collision
    }

    /// An owned copy, for renderers that should not hold the lock while drawing
    pub fn snapshot(&self) -> Framebuffer {
        self.clone()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Color]> {
        self.pixels.chunks(self.width)
    }

    pub fn is_clear(&self) -> bool {
        self.pixels.iter().all(|pixel| !pixel.is_set())
    }

    fn index(&self, x: usize, y: usize) -> std::result::Result<usize, BoundsError> {
        if x >= self.width || y >= self.height {
            return Err(BoundsError::Display {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(x + y * self.width)
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self {
            width: DISPLAY_WIDTH,
            height: DISPLAY_HEIGHT,
            pixels: vec![Color::Clear; DISPLAY_WIDTH * DISPLAY_HEIGHT],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_map_to_bits() {
        assert_eq!(Color::Set.as_bit(), 1);
        assert_eq!(Color::Clear.as_bit(), 0);
        assert_eq!(Color::from(true), Color::Set);
        assert_eq!(Color::from_bit(0), Color::Clear);
        assert_eq!(Color::from_bit(1), Color::Set);
        assert_eq!(Color::default(), Color::Clear);
    }

    #[test]
    fn rejects_empty_displays() {
        assert!(Framebuffer::new(0, 32).is_err());
        assert!(Framebuffer::new(64, 0).is_err());
        assert!(matches!(
            Framebuffer::new(usize::MAX / 2 + 1, 2),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn set_and_get_are_bounds_checked() {
        let mut framebuffer = Framebuffer::default();
        framebuffer.set(63, 31, Color::Set).unwrap();
        assert_eq!(framebuffer.get(63, 31), Ok(Color::Set));
        assert_eq!(
            framebuffer.set(64, 0, Color::Set),
            Err(BoundsError::Display {
                x: 64,
                y: 0,
                width: 64,
                height: 32
            })
        );
        assert!(framebuffer.get(0, 32).is_err());
    }

    #[test]
    fn clear_turns_every_pixel_off() {
        let mut framebuffer = Framebuffer::new(4, 2).unwrap();
        framebuffer.set(1, 1, Color::Set).unwrap();
        framebuffer.clear();
        assert!(framebuffer.is_clear());
    }

    #[test]
    fn draws_rows_most_significant_bit_first() {
        let mut framebuffer = Framebuffer::default();
        let collision = framebuffer.draw_sprite(2, 2, &[0b1100_0001]);
        assert!(!collision);
        let row: Vec<u8> = framebuffer.rows().nth(2).unwrap()[..11]
            .iter()
            .map(|c| c.as_bit())
            .collect();
        assert_eq!(row, vec![0, 0, 1, 1, 0, 0, 0, 0, 0, 1, 0]);
    }

    #[test]
    fn drawing_twice_erases_and_collides() {
        let mut framebuffer = Framebuffer::default();
        let glyph = [0xF0, 0x90, 0x90, 0x90, 0xF0];
        assert!(!framebuffer.draw_sprite(10, 5, &glyph));
        assert!(!framebuffer.is_clear());
        assert!(framebuffer.draw_sprite(10, 5, &glyph));
        assert!(framebuffer.is_clear());
    }

    #[test]
    fn wraps_each_axis_by_its_own_dimension() {
        // wide and short, so a shared modulus would land somewhere else entirely
        let mut framebuffer = Framebuffer::new(64, 32).unwrap();
        framebuffer.draw_sprite(62, 31, &[0b1110_0000, 0b1000_0000]);
        assert_eq!(framebuffer.get(62, 31), Ok(Color::Set));
        assert_eq!(framebuffer.get(63, 31), Ok(Color::Set));
        assert_eq!(framebuffer.get(0, 31), Ok(Color::Set));
        // second row wraps to the top
        assert_eq!(framebuffer.get(62, 0), Ok(Color::Set));
        assert_eq!(framebuffer.rows().flatten().filter(|c| c.is_set()).count(), 4);
    }

    #[test]
    fn snapshots_do_not_follow_later_draws() {
        let mut framebuffer = Framebuffer::default();
        let snapshot = framebuffer.snapshot();
        framebuffer.draw_sprite(0, 0, &[0xFF]);
        assert!(snapshot.is_clear());
        assert!(!framebuffer.is_clear());
    }
}
