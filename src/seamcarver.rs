// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Seamcarve - The main engine
//!
//! The carving session: one struct owning the pixel buffer and its
//! energy map, carving seams out of (or into) both in lockstep.  The
//! session works in whatever orientation the current operation needs;
//! horizontal seams are vertical seams through the transposed grids,
//! and every public operation puts the grids back the way the caller
//! expects before returning.

use crate::cq;
use crate::energy::{energy_map, is_masked, masked_energy, pixel_energy};
use crate::error::CarveError;
use crate::grid::{Color, Grid};
use crate::seamfinder::minimum_seam;
use image::{GenericImageView, GrayImage, Pixel, Primitive, RgbImage};
use itertools::iproduct;
use log::{debug, trace};
use num_traits::{clamp, NumCast};

/// A struct for holding the image being carved, its energy map, and
/// the current orientation of both.
pub struct SeamCarver {
    pixels: Grid<Color>,
    energy: Grid<i64>,
    transposed: bool,
}

impl SeamCarver {
    /// Start a carving session from any decoded image.  The pixels
    /// are copied into the session's own buffer, and the full energy
    /// map is computed once, here; every carve afterwards repairs it
    /// incrementally.
    pub fn new<I, P, S>(image: &I) -> Self
    where
        I: GenericImageView<Pixel = P>,
        P: Pixel<Subpixel = S> + 'static,
        S: Primitive + 'static,
    {
        #[inline]
        fn channel<S>(sample: S) -> i32
        where
            S: Primitive + 'static,
        {
            NumCast::from(sample).unwrap()
        }

        let (width, height) = image.dimensions();
        let mut pixels = Grid::new(width, height);
        for (y, x) in iproduct!(0..height, 0..width) {
            let rgb = image.get_pixel(x, y).to_rgb();
            let c = rgb.channels();
            pixels[(x, y)] = [channel(c[0]), channel(c[1]), channel(c[2])];
        }
        let energy = energy_map(&pixels);
        SeamCarver {
            pixels,
            energy,
            transposed: false,
        }
    }

    /// The image's current (width, height), as the caller sees it,
    /// regardless of which way the grids happen to be turned.
    pub fn dimensions(&self) -> (u32, u32) {
        cq!(
            self.transposed,
            (self.pixels.height, self.pixels.width),
            (self.pixels.width, self.pixels.height)
        )
    }

    // Physically turn both grids so the requested axis runs top to
    // bottom.  A no-op when they already face the right way.
    fn orient(&mut self, transposed: bool) {
        if self.transposed != transposed {
            self.pixels.transpose();
            self.energy.transpose();
            self.transposed = transposed;
        }
    }

    /// The cheapest top-to-bottom seam of the image as it stands,
    /// with its total cost.
    pub fn vertical_seam(&mut self) -> Result<(i64, Vec<u32>), CarveError> {
        self.orient(false);
        minimum_seam(&self.energy)
    }

    /// The cheapest left-to-right seam, with its total cost.  This
    /// turns the session on its side to reuse the vertical search and
    /// leaves it that way; a following `carve` consumes the seam in
    /// that same orientation, and every other public operation
    /// restores the original one.
    pub fn horizontal_seam(&mut self) -> Result<(i64, Vec<u32>), CarveError> {
        self.orient(true);
        minimum_seam(&self.energy)
    }

    // The color for a pixel spliced in at (x, y): the average of its
    // left and right neighbors, except at border (or append)
    // positions, where the edge pixel is duplicated instead.
    fn inserted_color(&self, x: u32, y: u32) -> Color {
        let (mw, mh) = (self.pixels.width - 1, self.pixels.height - 1);
        if x == 0 || x >= mw || y == 0 || y >= mh {
            return self.pixels[(cq!(x > mw, mw, x), y)];
        }
        let (l, r) = (self.pixels[(x - 1, y)], self.pixels[(x + 1, y)]);
        [
            (l[0] + r[0]) / 2,
            (l[1] + r[1]) / 2,
            (l[2] + r[2]) / 2,
        ]
    }

    /// Remove the given seam from the image (or splice one in, when
    /// `insert` is true), keeping the energy map in lockstep, then
    /// repair the energies alongside the cut.  The seam is one column
    /// per row of the *current* orientation.  Returns how many
    /// masked-for-removal cells the carve consumed, which is how the
    /// mask-driven loop knows how much work is left.
    pub fn carve(&mut self, seam: &[u32], insert: bool) -> usize {
        let height = self.pixels.height;
        debug_assert_eq!(seam.len(), height as usize);

        let mut consumed = 0;
        if insert {
            let colors: Vec<Color> = (0..height)
                .map(|y| self.inserted_color(seam[y as usize], y))
                .collect();
            self.pixels.insert_seam(seam, &colors);
            // Placeholder energies; the repair pass below fills them in.
            self.energy.insert_seam(seam, &vec![0; height as usize]);
        } else {
            for y in 0..height {
                if is_masked(self.energy[(seam[y as usize], y)]) {
                    consumed += 1;
                }
            }
            self.pixels.remove_seam(seam);
            self.energy.remove_seam(seam);
        }

        // Local repair: only the cells that gained a new neighbor can
        // have changed, and those sit in columns {seam-1, seam} of
        // each row after the shift.  Cells still marked negative stay
        // untouched; their masked status has not been consumed yet.
        let width = self.pixels.width;
        for y in 0..height {
            let x = seam[y as usize];
            for k in cq!(x == 0, x, x - 1)..=x {
                if k < width && !is_masked(self.energy[(k, y)]) {
                    self.energy[(k, y)] = pixel_energy(&self.pixels, k, y);
                }
            }
        }
        consumed
    }

    // One orchestration step: find the cheapest seam in the current
    // orientation and carve it.  Removal on a single-line axis has
    // nowhere left to cut.
    fn carve_next(&mut self, remove: bool) -> Result<(), CarveError> {
        if remove && self.pixels.width < 2 {
            return Err(CarveError::DegenerateGrid);
        }
        let (cost, seam) = minimum_seam(&self.energy)?;
        trace!("carving seam of cost {} (insert: {})", cost, !remove);
        self.carve(&seam, !remove);
        Ok(())
    }

    /// Carve the image to exactly `new_width` x `new_height`, seam by
    /// seam: removal while an axis is too large, insertion while it
    /// is too small.  Width is fully resolved before height is
    /// touched, and every step searches the freshly repaired energy
    /// map.  Asking for the current size carves nothing.
    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<(), CarveError> {
        if new_width == 0 || new_height == 0 {
            return Err(CarveError::InvalidDimensions {
                width: new_width,
                height: new_height,
            });
        }
        debug!(
            "resizing {:?} to ({}, {})",
            self.dimensions(),
            new_width,
            new_height
        );
        self.orient(false);
        while self.pixels.width != new_width {
            let remove = self.pixels.width > new_width;
            self.carve_next(remove)?;
        }
        self.orient(true);
        while self.pixels.width != new_height {
            let remove = self.pixels.width > new_height;
            self.carve_next(remove)?;
        }
        self.orient(false);
        Ok(())
    }

    /// Remove every pixel the mask marks `true`, carving whole seams
    /// through the marked region until none of it is left.  Each
    /// round probes both orientations and cuts along whichever one is
    /// strictly cheaper (vertical on ties), so the seams route
    /// through the region whatever its shape.  The mask must match
    /// the image's current dimensions.
    pub fn remove_mask(&mut self, mask: &Grid<bool>) -> Result<(), CarveError> {
        self.orient(false);
        if mask.width != self.pixels.width || mask.height != self.pixels.height {
            return Err(CarveError::InvalidDimensions {
                width: mask.width,
                height: mask.height,
            });
        }

        let mut remaining = 0usize;
        for (y, x) in iproduct!(0..mask.height, 0..mask.width) {
            if mask[(x, y)] {
                remaining += 1;
                self.energy[(x, y)] = masked_energy(self.energy[(x, y)]);
            }
        }
        debug!("{} pixels masked for removal", remaining);

        while remaining > 0 {
            let (width, height) = self.dimensions();
            let (can_vertical, can_horizontal) = (width > 1, height > 1);
            if !can_vertical && !can_horizontal {
                return Err(CarveError::DegenerateGrid);
            }
            let vertical = self.vertical_seam()?;
            let horizontal = self.horizontal_seam()?;
            // Horizontal only on a strictly cheaper seam, and only
            // while its axis can still spare a line.
            let go_horizontal = cq!(
                can_vertical && can_horizontal,
                horizontal.0 < vertical.0,
                can_horizontal
            );
            self.orient(go_horizontal);
            let consumed = cq!(
                go_horizontal,
                self.carve(&horizontal.1, false),
                self.carve(&vertical.1, false)
            );
            debug_assert!(consumed > 0 && consumed <= remaining);
            remaining -= consumed;
            trace!("carve consumed {} masked pixels, {} remaining", consumed, remaining);
        }
        self.orient(false);
        Ok(())
    }

    /// Read the current image out as an 8-bit RGB buffer for the
    /// caller to encode or display, clamping each channel into the
    /// valid sample range.
    pub fn image(&self) -> RgbImage {
        #[inline]
        fn sample(channel: i32) -> u8 {
            clamp(channel, 0, 255) as u8
        }

        let (width, height) = self.dimensions();
        let mut out = RgbImage::new(width, height);
        for (y, x) in iproduct!(0..height, 0..width) {
            let c = cq!(self.transposed, self.pixels[(y, x)], self.pixels[(x, y)]);
            let samples = [sample(c[0]), sample(c[1]), sample(c[2])];
            out.put_pixel(x, y, *Pixel::from_slice(&samples));
        }
        out
    }

    /// Render the current energy map as a normalized grayscale
    /// buffer.  Purely diagnostic.
    pub fn energy_image(&mut self) -> GrayImage {
        self.orient(false);
        crate::energy::energy_image(&self.energy)
    }
}
