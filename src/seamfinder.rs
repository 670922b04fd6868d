// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Find the cheapest seam through an energy map
//!
//! A seam is one column index per row, adjacent rows differing by at
//! most one, so it forms a connected top-to-bottom cut.  The search
//! is the classic dynamic program: accumulate, row by row, the
//! cheapest cost of reaching every cell from the top edge, then walk
//! the table back up from the cheapest cell of the bottom row.
//! Horizontal seams are found by handing in a transposed map; the
//! caller owns that choice.

use crate::cq;
use crate::error::CarveError;
use crate::grid::Grid;

/// Given an energy map, return the cheapest vertical seam through it
/// and that seam's total cost.  The result maps with the range
/// (0..height) to give the XY coordinates of each pixel in the seam.
///
/// Masked cells carry hugely negative energies, so the accumulation
/// is checked: a path that no longer fits in an i64 surfaces as
/// `ArithmeticOverflow` rather than wrapping into nonsense.
pub fn minimum_seam(energy: &Grid<i64>) -> Result<(i64, Vec<u32>), CarveError> {
    let (width, height) = (energy.width, energy.height);
    let mut total: Grid<i64> = Grid::new(width, height);

    // The first row is reachable at exactly its own cost.
    for x in 0..width {
        total[(x, 0)] = energy[(x, 0)];
    }

    let maxwidth = width - 1;
    // Every later cell costs its own energy plus the cheapest of the
    // (up to) three cells above it that a connected seam could have
    // come through.
    for y in 1..height {
        for x in 0..width {
            let range = cq!(x == 0, 0, x - 1)..=cq!(x == maxwidth, maxwidth, x + 1);
            let mut cheapest = i64::max_value();
            for parent in range {
                let upper = total[(parent, y - 1)];
                if upper < cheapest {
                    cheapest = upper;
                }
            }
            total[(x, y)] = energy[(x, y)]
                .checked_add(cheapest)
                .ok_or(CarveError::ArithmeticOverflow)?;
        }
    }

    // Find the x coordinate of the bottommost seam with the least
    // energy.  First occurrence wins on ties, here and during the
    // walk back up.
    let last = height - 1;
    let mut seam_col = 0;
    for x in 1..width {
        if total[(x, last)] < total[(seam_col, last)] {
            seam_col = x;
        }
    }
    let cost = total[(seam_col, last)];

    // Working backwards, pick at each row the cheapest cell still
    // reachable from the column chosen below it.
    let mut seam = vec![0u32; height as usize];
    seam[last as usize] = seam_col;
    for y in (0..last).rev() {
        let below = seam[y as usize + 1];
        let range = cq!(below == 0, 0, below - 1)..=cq!(below == maxwidth, maxwidth, below + 1);
        let mut choice = *range.start();
        for x in range {
            if total[(x, y)] < total[(choice, y)] {
                choice = x;
            }
        }
        seam[y as usize] = choice;
    }
    Ok((cost, seam))
}
