//! Core value types: reads and site intervals.

mod interval;
mod read;

pub use interval::{
    BedInterval,
    SiteInterval,
};
pub use read::{
    Read,
    PAD_CHAR,
    PAT_ALPHABET,
};
