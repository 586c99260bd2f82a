pub use crate::data_structs::{
    BedInterval,
    Read,
    SiteInterval,
};
pub use crate::diagnostics::{
    Diagnostics,
    Warning,
};
pub use crate::error::ViewError;
pub use crate::filter::{
    BoundaryTrimmer,
    FilterConfig,
    FilterPipeline,
    PaddingStripper,
    ReadSampler,
    ViewStats,
};
pub use crate::io::{
    read_bed,
    MemoryPatSource,
    PatSource,
    PatWriter,
    RecordParser,
    TabixPatSource,
};
pub use crate::multi::{
    MultiRegionDriver,
    RegionOutcome,
    RegionResult,
};
pub use crate::reference::ReferenceIndex;
pub use crate::region::{
    RegionRequest,
    RegionResolver,
    ResolvedRegion,
};
pub use crate::view::{
    PatViewer,
    ViewSummary,
};
