//! 纵向 ROI 标签统计管线.
//!
//! 管线接受基线影像、基线 ROI 标签掩膜和至多
//! [`MAX_TIMEPOINTS`] 个 (随访影像, 变换) 对,
//! 输出按 "基线在前, 随访按输入顺序" 排列的统计量序列.
//!
//! 管线自身不持有任何全局状态: 所有输入输出都通过参数显式传递,
//! 三个协作组件 (求逆/重采样/统计) 在构造时注入.

mod error;

pub use error::{PipelineError, PipelineResult};

use log::{debug, info};

use crate::consts::MAX_TIMEPOINTS;
use crate::data::{GeometryAttr, LabelMask, Volume};
use crate::resample::{NearestResampler, VolumeResampler};
use crate::stats::{detect_label, LabelStatsEngine, StatisticsEngine, StatisticsRecord};
use crate::transform::{AffineTransform, MatrixInverter, TransformProvider};

/// 一个随访时间点: 影像 + "该影像空间 -> 基线空间" 的刚性/仿射变换.
#[derive(Debug, Clone)]
pub struct Timepoint {
    /// 时间点身份标识. 用于派生工作掩膜的 tag, 以及日志定位.
    name: String,

    /// 随访影像.
    volume: Volume,

    /// "随访空间 -> 基线空间" 的变换.
    transform: AffineTransform,
}

impl Timepoint {
    /// 构建时间点.
    pub fn new(name: impl Into<String>, volume: Volume, transform: AffineTransform) -> Self {
        Self {
            name: name.into(),
            volume,
            transform,
        }
    }

    /// 获取时间点身份标识.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 获取随访影像.
    #[inline]
    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    /// 获取 "随访空间 -> 基线空间" 的变换.
    #[inline]
    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }
}

/// 纵向 ROI 标签统计管线.
///
/// 三个类型参数分别是变换求逆、掩膜重采样与标签统计组件.
/// [`LongitudinalStatsPipeline::new`] 给出内置默认组合;
/// 需要接入其他后端时用 [`LongitudinalStatsPipeline::with_parts`] 注入.
#[derive(Debug, Clone)]
pub struct LongitudinalStatsPipeline<T, R, S> {
    provider: T,
    resampler: R,
    engine: S,
}

impl LongitudinalStatsPipeline<MatrixInverter, NearestResampler, LabelStatsEngine> {
    /// 以内置默认组件构建管线.
    #[inline]
    pub fn new() -> Self {
        Self::with_parts(MatrixInverter, NearestResampler, LabelStatsEngine)
    }
}

impl Default for LongitudinalStatsPipeline<MatrixInverter, NearestResampler, LabelStatsEngine> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T, R, S> LongitudinalStatsPipeline<T, R, S>
where
    T: TransformProvider,
    R: VolumeResampler,
    S: StatisticsEngine,
{
    /// 以自定义组件构建管线.
    #[inline]
    pub fn with_parts(provider: T, resampler: R, engine: S) -> Self {
        Self {
            provider,
            resampler,
            engine,
        }
    }

    /// 运行管线.
    ///
    /// `mask` 必须与 `baseline` 网格对齐 (构造上对齐; 统计组件仍会校验).
    /// 返回 `1 + timepoints.len()` 条统计记录, 基线在前,
    /// 随访时间点按输入顺序排列. 任一时间点失败即返回该时间点的错误,
    /// 已计算的部分结果被丢弃.
    ///
    /// # Panics
    ///
    /// `timepoints` 个数不在 `1..=MAX_TIMEPOINTS` 范围内时 panic.
    pub fn run(
        &self,
        baseline: &Volume,
        mask: &LabelMask,
        timepoints: &[Timepoint],
    ) -> PipelineResult<Vec<StatisticsRecord>> {
        assert!(
            (1..=MAX_TIMEPOINTS).contains(&timepoints.len()),
            "expect 1..={MAX_TIMEPOINTS} timepoints, got {}",
            timepoints.len()
        );

        let mut results = Vec::with_capacity(1 + timepoints.len());

        // 基线: 掩膜与影像共享网格, 无需重采样.
        info!("obtaining statistics: baseline ({})", mask.tag());
        let label =
            detect_label(mask).ok_or(PipelineError::EmptyLabelMask { timepoint: 0 })?;
        debug!("baseline label value: {label}");
        let record = self
            .engine
            .label_stats(baseline, mask, label)
            .map_err(|source| PipelineError::Stats {
                timepoint: 0,
                source,
            })?;
        results.push(record);

        for (offset, tp) in timepoints.iter().enumerate() {
            let timepoint = offset + 1;
            info!("obtaining statistics: timepoint {timepoint} ({})", tp.name());

            let inverse = self
                .provider
                .invert(tp.transform())
                .map_err(|source| PipelineError::InvalidTransform { timepoint, source })?;

            // 克隆基线掩膜为工作掩膜, 硬化逆变换, 再重采样到随访影像网格.
            let working = mask
                .clone_tagged(format!("{}-label", tp.name()))
                .transformed(&inverse);
            let resampled = self
                .resampler
                .resample(&working, tp.volume().geometry())
                .map_err(|source| PipelineError::Resample { timepoint, source })?;
            // 硬化后的中间掩膜用完即弃.
            drop(working);

            let label =
                detect_label(&resampled).ok_or(PipelineError::EmptyLabelMask { timepoint })?;
            debug!("timepoint {timepoint} label value: {label}");

            let record = self
                .engine
                .label_stats(tp.volume(), &resampled, label)
                .map_err(|source| PipelineError::Stats { timepoint, source })?;
            results.push(record);
        }

        info!("processing completed");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::labels::ROI;
    use crate::data::Geometry;
    use crate::transform::InvalidTransform;
    use nalgebra::{Matrix3, Vector3};
    use ndarray::Array3;

    const SIDE: usize = 8;

    fn grid(origin: [f64; 3]) -> Geometry {
        Geometry::uniform((SIDE, SIDE, SIDE), [1.0; 3], origin)
    }

    /// 全 1 强度基线 + 10 个 ROI 体素的掩膜 (两行各 5 个体素).
    fn baseline_fixture() -> (Volume, LabelMask) {
        let g = grid([0.0; 3]);
        let vol = Volume::from_parts(g.clone(), Array3::from_elem((SIDE, SIDE, SIDE), 1.0));

        let mut data = Array3::<u8>::zeros((SIDE, SIDE, SIDE));
        for w in 1..6 {
            data[[2, 2, w]] = ROI;
            data[[2, 3, w]] = ROI;
        }
        let mask = LabelMask::from_parts(g, data, "baseline-label");
        (vol, mask)
    }

    fn identity_timepoint(name: &str) -> Timepoint {
        let (vol, _) = baseline_fixture();
        Timepoint::new(name, vol, AffineTransform::identity())
    }

    #[test]
    fn test_result_len_and_order() {
        // 重复初始化无害.
        let _ = simple_logger::SimpleLogger::new().init();

        let (vol, mask) = baseline_fixture();
        let tps = [
            identity_timepoint("t1"),
            identity_timepoint("t2"),
            identity_timepoint("t3"),
        ];

        let records = LongitudinalStatsPipeline::new()
            .run(&vol, &mask, &tps)
            .unwrap();
        assert_eq!(records.len(), 4);

        // 恒等时间点与基线记录完全一致.
        for r in &records[1..] {
            assert_eq!(*r, records[0]);
        }
    }

    #[test]
    fn test_baseline_record_matches_mask_census() {
        let (vol, mask) = baseline_fixture();
        let records = LongitudinalStatsPipeline::new()
            .run(&vol, &mask, &[identity_timepoint("t1")])
            .unwrap();

        assert_eq!(records[0].count, mask.count_of(ROI));
        assert_eq!(records[0].count, 10);
        assert_eq!(records[0].mean, 1.0);
        assert_eq!(records[0].variance, 0.0);
        assert_eq!(records[0].max, 1.0);
        assert_eq!(records[0].min, 1.0);
    }

    #[test]
    fn test_idempotent() {
        let (vol, mask) = baseline_fixture();
        let tps = [identity_timepoint("t1"), identity_timepoint("t2")];

        let pipeline = LongitudinalStatsPipeline::new();
        let first = pipeline.run(&vol, &mask, &tps).unwrap();
        let second = pipeline.run(&vol, &mask, &tps).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_translated_followup() {
        let (vol, mask) = baseline_fixture();

        // 随访影像: 网格与基线相同, 但 ROI 强度块整体向 +x 平移 2 体素,
        // 且强度变为 3. 对应的 "随访 -> 基线" 变换即向 -x 平移 2 毫米.
        let g = grid([0.0; 3]);
        let mut data = Array3::from_elem((SIDE, SIDE, SIDE), 0.0f32);
        for w in 1..6 {
            data[[2, 2, w + 2]] = 3.0;
            data[[2, 3, w + 2]] = 3.0;
        }
        let followup = Volume::from_parts(g, data);
        let t = AffineTransform::from_translation([-2.0, 0.0, 0.0]);

        let records = LongitudinalStatsPipeline::new()
            .run(&vol, &mask, &[Timepoint::new("moved", followup, t)])
            .unwrap();

        assert_eq!(records[1].count, 10);
        assert_eq!(records[1].mean, 3.0);
        assert_eq!(records[1].variance, 0.0);
    }

    #[test]
    fn test_noninvertible_transform_aborts() {
        let (vol, mask) = baseline_fixture();
        let singular = AffineTransform::from_parts(Matrix3::zeros(), Vector3::zeros());
        let tp = Timepoint::new("bad", vol.clone(), singular);

        let err = LongitudinalStatsPipeline::new()
            .run(&vol, &mask, &[tp])
            .unwrap_err();
        assert_eq!(
            err,
            PipelineError::InvalidTransform {
                timepoint: 1,
                source: InvalidTransform::Singular,
            }
        );
    }

    #[test]
    fn test_empty_baseline_mask_aborts() {
        let (vol, _) = baseline_fixture();
        let empty = LabelMask::from_parts(
            grid([0.0; 3]),
            Array3::zeros((SIDE, SIDE, SIDE)),
            "empty-label",
        );

        let err = LongitudinalStatsPipeline::new()
            .run(&vol, &empty, &[identity_timepoint("t1")])
            .unwrap_err();
        assert_eq!(err, PipelineError::EmptyLabelMask { timepoint: 0 });
        assert_eq!(err.timepoint(), 0);
    }

    #[test]
    fn test_mask_resampled_to_nowhere_aborts() {
        let (vol, mask) = baseline_fixture();

        // 随访影像网格与基线完全不相交, 重采样后掩膜全为背景.
        let far = Volume::from_parts(
            grid([500.0, 500.0, 500.0]),
            Array3::from_elem((SIDE, SIDE, SIDE), 1.0),
        );
        let tp = Timepoint::new("far", far, AffineTransform::identity());

        let err = LongitudinalStatsPipeline::new()
            .run(&vol, &mask, &[tp])
            .unwrap_err();
        assert_eq!(err, PipelineError::EmptyLabelMask { timepoint: 1 });
    }

    #[test]
    #[should_panic]
    fn test_zero_timepoints_is_contract_violation() {
        let (vol, mask) = baseline_fixture();
        let _ = LongitudinalStatsPipeline::new().run(&vol, &mask, &[]);
    }
}
