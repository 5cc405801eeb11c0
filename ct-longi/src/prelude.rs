//! 常用功能一揽子导入.

pub use crate::Idx3d;

pub use crate::consts::labels::{is_background, is_roi, BACKGROUND, ROI};
pub use crate::consts::MAX_TIMEPOINTS;

pub use crate::{Geometry, GeometryAttr, LabelMask, Volume};

pub use crate::pipeline::{
    LongitudinalStatsPipeline, PipelineError, PipelineResult, Timepoint,
};
pub use crate::resample::{NearestResampler, ResampleError, VolumeResampler};
pub use crate::stats::{
    detect_label, LabelStatsEngine, StatisticsEngine, StatisticsRecord, StatsError,
};
pub use crate::transform::{
    AffineTransform, InvalidTransform, MatrixInverter, TransformProvider,
};
