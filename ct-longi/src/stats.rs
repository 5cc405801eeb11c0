//! ROI 标签统计.
//!
//! 给定一个 3D 影像和一张与之网格对齐的标签掩膜, 计算掩膜中给定标签
//! 所覆盖体素的强度描述统计量. 网格不一致的输入会被拒绝:
//! 这类统计在几何上没有意义.

use crate::consts::labels::is_roi;
use crate::data::{GeometryAttr, LabelMask, Volume};
use crate::Idx3d;

/// 单个时间点 ROI 内体素强度的描述统计量.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StatisticsRecord {
    /// ROI 体素个数.
    pub count: u64,

    /// 强度均值.
    pub mean: f64,

    /// 强度总体方差 (除以 N).
    pub variance: f64,

    /// 强度最大值.
    pub max: f64,

    /// 强度最小值.
    pub min: f64,
}

/// 统计计算错误.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsError {
    /// 影像与掩膜网格不一致. 携带两者的网格形状以便定位问题
    /// (形状相同而几何不同时, 两个字段相等).
    GridMismatch {
        /// 影像网格形状.
        volume: Idx3d,

        /// 掩膜网格形状.
        mask: Idx3d,
    },

    /// 掩膜中不存在给定标签的体素.
    LabelNotPresent(u8),
}

/// 探测掩膜中唯一的非零标签值, 即掩膜体素最大值.
///
/// 掩膜中没有非零体素时返回 `None`.
pub fn detect_label(mask: &LabelMask) -> Option<u8> {
    let max = mask.data().iter().copied().max().unwrap_or(0);
    is_roi(max).then_some(max)
}

/// 标签统计服务. 管线通过该接口计算每个时间点的 [`StatisticsRecord`].
pub trait StatisticsEngine {
    /// 计算 `volume` 中被 `mask` 的 `label` 标签覆盖的体素强度统计量.
    fn label_stats(
        &self,
        volume: &Volume,
        mask: &LabelMask,
        label: u8,
    ) -> Result<StatisticsRecord, StatsError>;
}

/// [`StatisticsEngine`] 的默认实现: 单遍累积 count/mean/variance/max/min.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelStatsEngine;

impl StatisticsEngine for LabelStatsEngine {
    fn label_stats(
        &self,
        volume: &Volume,
        mask: &LabelMask,
        label: u8,
    ) -> Result<StatisticsRecord, StatsError> {
        if !volume.geometry().approx_eq(mask.geometry()) {
            return Err(StatsError::GridMismatch {
                volume: volume.shape(),
                mask: mask.shape(),
            });
        }

        let mut count = 0u64;
        let (mut sum, mut sum_sq) = (0.0f64, 0.0f64);
        let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);

        // 两者均为标准布局, 逐体素配对遍历.
        for (&v, &m) in volume.data().iter().zip(mask.data().iter()) {
            if m != label {
                continue;
            }
            let v = v as f64;
            count += 1;
            sum += v;
            sum_sq += v * v;
            min = min.min(v);
            max = max.max(v);
        }

        if count == 0 {
            return Err(StatsError::LabelNotPresent(label));
        }

        let mean = sum / count as f64;
        // 浮点舍入可能产生极小的负值, 截断到 0.
        let variance = (sum_sq / count as f64 - mean * mean).max(0.0);

        Ok(StatisticsRecord {
            count,
            mean,
            variance,
            max,
            min,
        })
    }
}
