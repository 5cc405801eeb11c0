//! 管线运行时错误.

use crate::resample::ResampleError;
use crate::stats::StatsError;
use crate::transform::InvalidTransform;

/// 管线运行时错误.
///
/// 每个变体都携带出错时间点序号: 0 代表基线, 1 起按输入顺序代表各随访
/// 时间点. 任一时间点出错即中止整个运行, 不返回部分结果.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PipelineError {
    /// 给定的变换不可逆.
    InvalidTransform {
        /// 出错时间点序号.
        timepoint: usize,

        /// 底层求逆错误.
        source: InvalidTransform,
    },

    /// 掩膜 (基线掩膜, 或重采样后的工作掩膜) 中没有非零标签体素.
    EmptyLabelMask {
        /// 出错时间点序号.
        timepoint: usize,
    },

    /// 重采样组件失败.
    Resample {
        /// 出错时间点序号.
        timepoint: usize,

        /// 底层重采样错误.
        source: ResampleError,
    },

    /// 统计组件失败.
    Stats {
        /// 出错时间点序号.
        timepoint: usize,

        /// 底层统计错误.
        source: StatsError,
    },
}

impl PipelineError {
    /// 获取出错时间点序号. 0 代表基线.
    #[inline]
    pub fn timepoint(&self) -> usize {
        match *self {
            Self::InvalidTransform { timepoint, .. }
            | Self::EmptyLabelMask { timepoint }
            | Self::Resample { timepoint, .. }
            | Self::Stats { timepoint, .. } => timepoint,
        }
    }
}

/// 管线运行结果.
pub type PipelineResult<T> = Result<T, PipelineError>;
