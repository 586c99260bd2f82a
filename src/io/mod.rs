//! Input and output: pat records, bed files, range-query sources and the
//! output writer.

pub mod bed;
pub mod compression;
pub mod record;
pub mod source;
pub mod writer;

pub use bed::{
    check_disjoint,
    read_bed,
};
pub use record::{
    parse_line,
    RecordParser,
};
pub use source::{
    MemoryPatSource,
    PatSource,
    TabixPatSource,
    MAX_PAT_LEN,
};
pub use writer::{
    is_sink_closed,
    PatWriter,
};
