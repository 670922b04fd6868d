use failure::Fail;

/// Everything that can go wrong while carving.  Every operation is
/// deterministic, so there is nothing here worth retrying: the caller
/// either asked for something impossible or the grid has been carved
/// down to nothing.
#[derive(Debug, Fail, PartialEq)]
pub enum CarveError {
    /// A resize target was zero, or a removal mask does not have the
    /// same dimensions as the image it is meant to mask.
    #[fail(display = "invalid dimensions {}x{}", width, height)]
    InvalidDimensions { width: u32, height: u32 },

    /// An axis has been carved down to a single line and another
    /// removal was requested along it.  Seams are undefined below a
    /// 1x1 grid, so this is reported instead of producing an
    /// out-of-range seam.
    #[fail(display = "grid extent reached 1, cannot carve further along this axis")]
    DegenerateGrid,

    /// Cumulative seam costs no longer fit in an i64.  The masked
    /// sentinel values are large enough that a tall, heavily masked
    /// image can get here; wrapping silently would scramble the
    /// ordering the whole search depends on.
    #[fail(display = "cumulative seam energy overflowed")]
    ArithmeticOverflow,
}
