//! 标签掩膜重采样.
//!
//! 将一个标签掩膜重采样到目标影像的体素网格上: 对目标网格的每个体素,
//! 求其物理坐标在掩膜索引空间中的连续索引, 取最近邻体素值.
//! 标签值必须保持整型, 因此只提供最近邻一类 (非插值) 重采样.

use itertools::iproduct;
use ndarray::Array3;

use crate::consts::labels::BACKGROUND;
use crate::data::{Geometry, GeometryAttr, LabelMask};

/// 重采样错误.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleError {
    /// 掩膜几何退化 (basis 奇异), 无法建立物理到索引的映射.
    DegenerateGeometry,

    /// 目标网格为空 (某一维形状为 0).
    EmptyTargetGrid,
}

/// 掩膜重采样服务. 管线通过该接口将工作掩膜搬运到随访影像网格上.
pub trait VolumeResampler {
    /// 将 `mask` 重采样到 `target` 网格. 输出掩膜的几何信息即 `target`.
    fn resample(&self, mask: &LabelMask, target: &Geometry) -> Result<LabelMask, ResampleError>;
}

/// [`VolumeResampler`] 的默认实现: 一次性最近邻重采样.
///
/// 落在掩膜网格之外的目标体素取背景值 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestResampler;

impl VolumeResampler for NearestResampler {
    fn resample(&self, mask: &LabelMask, target: &Geometry) -> Result<LabelMask, ResampleError> {
        let (z, h, w) = target.shape();
        if z == 0 || h == 0 || w == 0 {
            return Err(ResampleError::EmptyTargetGrid);
        }

        let inv = mask
            .geometry()
            .basis()
            .try_inverse()
            .ok_or(ResampleError::DegenerateGeometry)?;
        let origin = mask.geometry().origin();
        let (mz, mh, mw) = mask.shape();

        let mut data = Array3::from_elem((z, h, w), BACKGROUND);
        for (k, j, i) in iproduct!(0..z, 0..h, 0..w) {
            let p = target.index_to_physical((k, j, i));
            // (w, h, z) 连续索引.
            let c = inv * (p - origin);
            let (iw, ih, iz) = (c[0].round(), c[1].round(), c[2].round());

            let inside = (0.0..mw as f64).contains(&iw)
                && (0.0..mh as f64).contains(&ih)
                && (0.0..mz as f64).contains(&iz);
            if inside {
                data[[k, j, i]] = mask[(iz as usize, ih as usize, iw as usize)];
            }
        }

        Ok(LabelMask::from_parts(target.clone(), data, mask.tag()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::labels::ROI;
    use crate::transform::AffineTransform;
    use nalgebra::{Matrix3, Vector3};

    fn block_mask(origin: [f64; 3]) -> LabelMask {
        let g = Geometry::uniform((4, 4, 4), [1.0; 3], origin);
        let mut data = Array3::<u8>::zeros((4, 4, 4));
        // (z, h, w) = (1, 1..3, 1..3) 的 2x2 方块.
        for (j, i) in iproduct!(1..3, 1..3) {
            data[[1, j, i]] = ROI;
        }
        LabelMask::from_parts(g, data, "block")
    }

    #[test]
    fn test_same_grid_is_identity() {
        let mask = block_mask([0.0; 3]);
        let out = NearestResampler
            .resample(&mask, mask.geometry())
            .unwrap();
        assert_eq!(out.data(), mask.data());
        assert_eq!(out.tag(), "block");
    }

    #[test]
    fn test_hardened_translation_shifts_labels() {
        let mask = block_mask([0.0; 3]);
        let target = mask.geometry().clone();

        // 向 +x 硬化 1 个体素的平移后, 方块应整体右移一列.
        let t = AffineTransform::from_translation([1.0, 0.0, 0.0]);
        let moved = mask.transformed(&t);
        let out = NearestResampler.resample(&moved, &target).unwrap();

        assert_eq!(out.count_of(ROI), 4);
        for (j, i) in iproduct!(1..3, 2..4) {
            assert_eq!(out[(1, j, i)], ROI);
        }
        assert_eq!(out[(1, 1, 1)], BACKGROUND);
    }

    #[test]
    fn test_outside_reads_background() {
        let mask = block_mask([0.0; 3]);
        // 目标网格与掩膜网格完全不相交.
        let far = Geometry::uniform((4, 4, 4), [1.0; 3], [100.0, 100.0, 100.0]);
        let out = NearestResampler.resample(&mask, &far).unwrap();
        assert_eq!(out.count_of(ROI), 0);
    }

    #[test]
    fn test_degenerate_mask_geometry() {
        let g = Geometry::new((2, 2, 2), Matrix3::zeros(), Vector3::zeros());
        let mask = LabelMask::from_parts(g, Array3::zeros((2, 2, 2)), "bad");
        let target = Geometry::uniform((2, 2, 2), [1.0; 3], [0.0; 3]);
        assert_eq!(
            NearestResampler.resample(&mask, &target).unwrap_err(),
            ResampleError::DegenerateGeometry
        );
    }

    #[test]
    fn test_empty_target_grid() {
        let mask = block_mask([0.0; 3]);
        let empty = Geometry::uniform((0, 4, 4), [1.0; 3], [0.0; 3]);
        assert_eq!(
            NearestResampler.resample(&mask, &empty).unwrap_err(),
            ResampleError::EmptyTargetGrid
        );
    }
}
