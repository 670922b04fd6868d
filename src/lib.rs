// #![deny(missing_docs)]

extern crate image;

pub mod ternary;

pub mod error;
pub use error::CarveError;

pub mod grid;
pub use grid::{Color, Grid};

pub mod energy;
pub use energy::{energy_map, pixel_energy, MAX_ENERGY};

pub mod seamfinder;
pub use seamfinder::minimum_seam;

pub mod seamcarver;
pub use seamcarver::SeamCarver;
