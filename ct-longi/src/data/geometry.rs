//! 体素网格几何信息.
//!
//! [`Geometry`] 把离散体素索引空间与物理空间 (毫米) 联系起来:
//! `物理点 = origin + basis * (w, h, z)`. `basis` 的三列分别是
//! w, h, z 索引轴的物理步长向量 (方向余弦乘以 spacing),
//! `origin` 是第 `(0, 0, 0)` 个体素的物理坐标.

use nalgebra::{Matrix3, Vector3};
use nifti::NiftiHeader;

use crate::transform::AffineTransform;
use crate::Idx3d;

/// 网格近似相等时, `basis` 与 `origin` 逐元素允许的相对误差.
const GRID_EQ_TOL: f64 = 1e-6;

#[inline]
fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= GRID_EQ_TOL * f64::max(1.0, f64::max(a.abs(), b.abs()))
}

/// 体素网格几何信息: 网格形状 + 索引空间到物理空间的仿射映射.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    /// 网格形状, 按 `(z, h, w)` 组织.
    shape: Idx3d,

    /// 索引到物理映射的线性部分. 列按 `(w, h, z)` 索引轴排列.
    basis: Matrix3<f64>,

    /// 第 `(0, 0, 0)` 个体素的物理坐标.
    origin: Vector3<f64>,
}

impl Geometry {
    /// 由裸参数直接构建.
    #[inline]
    pub fn new(shape: Idx3d, basis: Matrix3<f64>, origin: Vector3<f64>) -> Self {
        Self {
            shape,
            basis,
            origin,
        }
    }

    /// 构建轴对齐网格. `pix_dim` 为体素分辨率, 按 `(z, h, w)` 组织,
    /// 以毫米为单位; `origin` 为物理坐标 `(x, y, z)`.
    pub fn uniform(shape: Idx3d, pix_dim: [f64; 3], origin: [f64; 3]) -> Self {
        let [z, h, w] = pix_dim;
        Self {
            shape,
            basis: Matrix3::from_diagonal(&Vector3::new(w, h, z)),
            origin: Vector3::from(origin),
        }
    }

    /// 从 nii 文件 header 构建网格几何信息.
    ///
    /// 当 sform 有效时直接取 srow 行向量; 否则退化为 pixdim 对角 +
    /// qoffset 原点的轴对齐网格. qform 的四元数旋转暂未解析. fixme.
    pub fn from_header(h: &NiftiHeader) -> Self {
        // [W, H, z]. 体素个数数组.
        let [_, w, h_, z, ..] = h.dim;
        let shape = (z as usize, h_ as usize, w as usize);

        if h.sform_code > 0 {
            let rows = [h.srow_x, h.srow_y, h.srow_z];
            Self {
                shape,
                basis: Matrix3::from_fn(|r, c| rows[r][c] as f64),
                origin: Vector3::new(rows[0][3] as f64, rows[1][3] as f64, rows[2][3] as f64),
            }
        } else {
            let [_, pw, ph, pz, ..] = h.pixdim;
            Self {
                shape,
                basis: Matrix3::from_diagonal(&Vector3::new(pw as f64, ph as f64, pz as f64)),
                origin: Vector3::new(
                    h.quatern_x as f64,
                    h.quatern_y as f64,
                    h.quatern_z as f64,
                ),
            }
        }
    }

    /// 获取网格形状, 按 `(z, h, w)` 组织.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.shape
    }

    /// 获取索引到物理映射的线性部分.
    #[inline]
    pub fn basis(&self) -> Matrix3<f64> {
        self.basis
    }

    /// 获取第 `(0, 0, 0)` 个体素的物理坐标.
    #[inline]
    pub fn origin(&self) -> Vector3<f64> {
        self.origin
    }

    /// 求体素索引对应的物理坐标.
    #[inline]
    pub fn index_to_physical(&self, (z, h, w): Idx3d) -> Vector3<f64> {
        self.origin + self.basis * Vector3::new(w as f64, h as f64, z as f64)
    }

    /// 求物理坐标对应的连续索引, 按 `(w, h, z)` 分量组织.
    ///
    /// `basis` 奇异 (网格退化) 时返回 `None`.
    pub fn physical_to_continuous(&self, p: &Vector3<f64>) -> Option<Vector3<f64>> {
        Some(self.basis.try_inverse()? * (p - self.origin))
    }

    /// 将仿射变换作用到几何信息上: 新的索引到物理映射为 `t` 与旧映射的复合.
    /// 网格形状不变.
    #[must_use]
    pub fn transformed(&self, t: &AffineTransform) -> Self {
        Self {
            shape: self.shape,
            basis: t.linear() * self.basis,
            origin: t.apply(self.origin),
        }
    }

    /// 判断两个网格是否 (在浮点误差内) 相同: 形状严格相等,
    /// `basis` 与 `origin` 逐元素相对误差不超过 `1e-6`.
    pub fn approx_eq(&self, other: &Geometry) -> bool {
        self.shape == other.shape
            && self
                .basis
                .iter()
                .zip(other.basis.iter())
                .all(|(a, b)| close(*a, *b))
            && self
                .origin
                .iter()
                .zip(other.origin.iter())
                .all(|(a, b)| close(*a, *b))
    }
}
