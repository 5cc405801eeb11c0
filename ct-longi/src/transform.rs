//! 空间仿射变换与求逆.
//!
//! [`AffineTransform`] 建模两个物理空间之间的可逆仿射映射,
//! 覆盖纵向随访配准常见的刚性与仿射两类变换. 变换独立于任何影像持有,
//! 由调用方显式传递.

use nalgebra::{Matrix3, Rotation3, Unit, Vector3};

/// 物理空间之间的仿射映射: `p' = linear * p + translation`.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineTransform {
    linear: Matrix3<f64>,
    translation: Vector3<f64>,
}

impl AffineTransform {
    /// 恒等变换.
    #[inline]
    pub fn identity() -> Self {
        Self {
            linear: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// 纯平移变换. `offset` 为物理坐标 `(x, y, z)` 偏移, 以毫米为单位.
    #[inline]
    pub fn from_translation(offset: [f64; 3]) -> Self {
        Self {
            linear: Matrix3::identity(),
            translation: Vector3::from(offset),
        }
    }

    /// 刚性变换: 绕 `axis` 旋转 `angle` 弧度, 再平移 `offset` (毫米).
    ///
    /// `axis` 接近零向量时无法确定旋转轴, 返回 `None`.
    pub fn rigid(axis: [f64; 3], angle: f64, offset: [f64; 3]) -> Option<Self> {
        let axis = Unit::try_new(Vector3::from(axis), 1e-12)?;
        Some(Self {
            linear: Rotation3::from_axis_angle(&axis, angle).into_inner(),
            translation: Vector3::from(offset),
        })
    }

    /// 由线性部分和平移部分直接构建.
    #[inline]
    pub fn from_parts(linear: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            linear,
            translation,
        }
    }

    /// 获取线性部分.
    #[inline]
    pub fn linear(&self) -> Matrix3<f64> {
        self.linear
    }

    /// 获取平移部分.
    #[inline]
    pub fn translation(&self) -> Vector3<f64> {
        self.translation
    }

    /// 将变换作用于物理点 `p`.
    #[inline]
    pub fn apply(&self, p: Vector3<f64>) -> Vector3<f64> {
        self.linear * p + self.translation
    }

    /// 求代数逆变换.
    ///
    /// 线性部分奇异或参数含非有限值时返回 [`InvalidTransform`].
    pub fn try_inverse(&self) -> Result<Self, InvalidTransform> {
        let finite = self.linear.iter().all(|v| v.is_finite())
            && self.translation.iter().all(|v| v.is_finite());
        if !finite {
            return Err(InvalidTransform::NonFinite);
        }

        let inv = self.linear.try_inverse().ok_or(InvalidTransform::Singular)?;
        Ok(Self {
            linear: inv,
            translation: -(inv * self.translation),
        })
    }
}

/// 变换求逆错误: 变换不可逆.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidTransform {
    /// 线性部分奇异 (行列式为 0).
    Singular,

    /// 变换参数包含非有限值 (NaN 或无穷).
    NonFinite,
}

/// 变换求逆服务. 管线通过该接口取得 "基线空间 -> 随访空间" 的逆变换.
pub trait TransformProvider {
    /// 求 `t` 的代数逆. `t` 不可逆时返回 [`InvalidTransform`].
    fn invert(&self, t: &AffineTransform) -> Result<AffineTransform, InvalidTransform>;
}

/// [`TransformProvider`] 的默认实现: 直接对仿射矩阵求逆.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixInverter;

impl TransformProvider for MatrixInverter {
    #[inline]
    fn invert(&self, t: &AffineTransform) -> Result<AffineTransform, InvalidTransform> {
        t.try_inverse()
    }
}
