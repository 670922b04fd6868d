// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calculate the energy of an image
//!
//! The energy of a pixel is a cheap local-contrast score: the sum,
//! across all three channels, of the absolute differences between its
//! vertical neighbor pair and its horizontal neighbor pair.  Low
//! energy means removing the pixel is visually safe.  Border pixels
//! are pinned to a sentinel maximum so a seam never runs along the
//! edge of the image, and pixels masked for forced removal are pushed
//! below zero so a seam always prefers them (see `masked_energy`).

use crate::grid::{Color, Grid};
use image::{GrayImage, Pixel};
use itertools::{iproduct, zip};
use num_traits::clamp;
use rayon::prelude::*;

/// The border sentinel.  No interior pixel can score higher: three
/// channels of two 0..=255 differences top out at 1530.
pub const MAX_ENERGY: i64 = 1_000_000;

// Scale factor for masked cells.  Ordinary energies live in
// 0..=MAX_ENERGY; a masked cell is rewritten to -(e + 1) * MASK_SCALE,
// which keeps every masked cell at or below -MASK_SCALE while still
// ordering masked cells among themselves by their original energy.
const MASK_SCALE: i64 = MAX_ENERGY * MAX_ENERGY;

// (Pixel, Pixel) -> Energy
//
// The Manhattan distance between two colors: |Δr| + |Δg| + |Δb|.
fn energy_of_pair(p1: &Color, p2: &Color) -> i64 {
    zip(p1, p2).map(|(c1, c2)| i64::from((c1 - c2).abs())).sum()
}

/// Compute the energy of a single pixel against the current grid.
/// Pixels on the border always score `MAX_ENERGY`; everything else
/// scores the gradient sum of its two neighbor pairs.
pub fn pixel_energy(pixels: &Grid<Color>, x: u32, y: u32) -> i64 {
    let (mw, mh) = (pixels.width - 1, pixels.height - 1);
    if x == 0 || x >= mw || y == 0 || y >= mh {
        return MAX_ENERGY;
    }
    energy_of_pair(&pixels[(x, y - 1)], &pixels[(x, y + 1)])
        + energy_of_pair(&pixels[(x - 1, y)], &pixels[(x + 1, y)])
}

/// Compute the energy of every pixel in an image.  This full sweep
/// happens once, when a carving session starts; afterwards the carve
/// engine repairs the map locally around each removed or inserted
/// seam instead of coming back here.  Rows are independent, so they
/// are filled in parallel.
pub fn energy_map(pixels: &Grid<Color>) -> Grid<i64> {
    let (width, height) = (pixels.width, pixels.height);
    let mut cells = vec![0i64; width as usize * height as usize];
    if !cells.is_empty() {
        cells
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, cell) in row.iter_mut().enumerate() {
                    *cell = pixel_energy(pixels, x as u32, y as u32);
                }
            });
    }
    Grid::from_raw(width, height, cells)
}

/// Rewrite an ordinary energy as a forced-removal marker.  The result
/// is always at or below `-MASK_SCALE`, far under anything a real
/// gradient can produce, so the seam search will route through masked
/// cells ahead of any unmasked ones.
pub fn masked_energy(e: i64) -> i64 {
    debug_assert!(
        e >= 0 && e <= MAX_ENERGY,
        "masking an energy outside the ordinary range: {}",
        e
    );
    -(e + 1) * MASK_SCALE
}

/// Is this cell currently marked for forced removal?  The sign *is*
/// the tag: ordinary energies are never negative.
pub fn is_masked(e: i64) -> bool {
    e < 0
}

/// Render the energy map as an 8-bit grayscale buffer, normalized so
/// the hottest cell is white.  Masked cells render black.  Handy for
/// eyeballing what the search considers safe to cut.
pub fn energy_image(energy: &Grid<i64>) -> GrayImage {
    let (width, height) = (energy.width, energy.height);
    let mut factor = 1;
    for (y, x) in iproduct!(0..height, 0..width) {
        factor = factor.max(energy[(x, y)]);
    }
    let mut out = GrayImage::new(width, height);
    for (y, x) in iproduct!(0..height, 0..width) {
        let e = clamp(energy[(x, y)], 0, factor);
        let level = [(e * 255 / factor) as u8];
        out.put_pixel(x, y, *Pixel::from_slice(&level));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel_grid(width: u32, height: u32, seed: &[Color]) -> Grid<Color> {
        Grid::from_raw(width, height, seed.to_vec())
    }

    #[test]
    fn border_pixels_score_the_sentinel() {
        let mut pixels = Grid::<Color>::new(4, 3);
        pixels[(1, 1)] = [200, 50, 9];
        pixels[(2, 1)] = [1, 255, 77];
        for y in 0..3 {
            for x in 0..4 {
                if y == 0 || y == 2 || x == 0 || x == 3 {
                    assert_eq!(pixel_energy(&pixels, x, y), MAX_ENERGY);
                }
            }
        }
    }

    #[test]
    fn single_line_grids_are_all_border() {
        let pixels = Grid::<Color>::new(1, 3);
        for y in 0..3 {
            assert_eq!(pixel_energy(&pixels, 0, y), MAX_ENERGY);
        }
    }

    #[test]
    fn interior_energy_sums_both_neighbor_pairs() {
        let mut pixels = Grid::<Color>::new(3, 3);
        pixels[(1, 0)] = [10, 20, 30];
        pixels[(1, 2)] = [13, 18, 40];
        pixels[(0, 1)] = [5, 5, 5];
        pixels[(2, 1)] = [9, 1, 5];
        // |10-13| + |20-18| + |30-40| = 15, |5-9| + |5-1| + |5-5| = 8
        assert_eq!(pixel_energy(&pixels, 1, 1), 23);
    }

    #[test]
    fn interior_energy_is_reflection_invariant() {
        let mut pixels = Grid::<Color>::new(3, 3);
        pixels[(1, 0)] = [10, 20, 30];
        pixels[(1, 2)] = [13, 18, 40];
        pixels[(0, 1)] = [5, 5, 5];
        pixels[(2, 1)] = [9, 1, 5];
        let mut mirrored = Grid::<Color>::new(3, 3);
        mirrored[(1, 2)] = [10, 20, 30];
        mirrored[(1, 0)] = [13, 18, 40];
        mirrored[(2, 1)] = [5, 5, 5];
        mirrored[(0, 1)] = [9, 1, 5];
        assert_eq!(
            pixel_energy(&pixels, 1, 1),
            pixel_energy(&mirrored, 1, 1)
        );
    }

    #[test]
    fn full_map_matches_per_pixel_computation() {
        let pixels = pixel_grid(
            4,
            4,
            &[
                [9, 9, 9],
                [9, 9, 9],
                [0, 0, 0],
                [9, 9, 9],
                [9, 9, 9],
                [1, 2, 3],
                [9, 9, 9],
                [8, 8, 8],
                [9, 9, 9],
                [9, 9, 9],
                [9, 9, 9],
                [9, 9, 9],
                [9, 9, 9],
                [9, 9, 9],
                [0, 1, 0],
                [9, 9, 9],
            ],
        );
        let energy = energy_map(&pixels);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(energy[(x, y)], pixel_energy(&pixels, x, y));
            }
        }
    }

    #[test]
    fn uniform_interiors_have_zero_energy() {
        let pixels = Grid::from_raw(4, 4, vec![[42, 42, 42]; 16]);
        let energy = energy_map(&pixels);
        assert_eq!(energy[(1, 1)], 0);
        assert_eq!(energy[(2, 2)], 0);
        assert_eq!(energy[(0, 0)], MAX_ENERGY);
        assert_eq!(energy[(3, 1)], MAX_ENERGY);
    }

    #[test]
    fn masked_energies_sit_far_below_zero() {
        assert_eq!(masked_energy(0), -1_000_000_000_000);
        assert_eq!(masked_energy(MAX_ENERGY), -1_000_001_000_000_000_000);
        assert!(is_masked(masked_energy(0)));
        assert!(is_masked(masked_energy(1530)));
        assert!(!is_masked(0));
        assert!(!is_masked(MAX_ENERGY));
        // Deeper original energy means a deeper marker, preserving
        // relative ordering among masked cells.
        assert!(masked_energy(10) < masked_energy(0));
    }

    #[test]
    fn energy_image_normalizes_to_white_and_floors_masks() {
        let energy = Grid::from_raw(2, 1, vec![-5, 10]);
        let shades = energy_image(&energy);
        assert_eq!(shades.get_pixel(0, 0).channels()[0], 0);
        assert_eq!(shades.get_pixel(1, 0).channels()[0], 255);
    }
}
