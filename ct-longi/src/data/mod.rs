use std::ops::Index;
use std::path::Path;

use ndarray::{Array3, ArrayView, Ix3};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use crate::transform::AffineTransform;
use crate::Idx3d;

mod geometry;

pub use geometry::Geometry;

/// 携带网格几何信息的 3D 影像对象的共用属性.
pub trait GeometryAttr {
    /// 获取网格几何信息.
    fn geometry(&self) -> &Geometry;

    /// 获取数据形状大小, 按 `(z, h, w)` 组织.
    #[inline]
    fn shape(&self) -> Idx3d {
        self.geometry().shape()
    }

    /// 获取水平切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (z, h, w) = self.shape();
        z * h * w
    }

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape();
        *z0 < z && *h0 < h && *w0 < w
    }

    /// 获取单个体素分辨率. 该分辨率以毫米为单位, 分别代表空间
    /// (相邻切片方向), 高 (自然图像的垂直方向), 宽 (自然图像的水平方向).
    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        let basis = self.geometry().basis();
        [
            basis.column(2).norm(),
            basis.column(1).norm(),
            basis.column(0).norm(),
        ]
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    fn voxel(&self) -> f64 {
        self.geometry().basis().determinant().abs()
    }

    /// 体素分辨率在三个维度上是否是各向同的?
    #[inline]
    fn is_isotropic(&self) -> bool {
        let [z, h, w] = self.pix_dim();
        z == h && z == w
    }
}

/// 3D 标量影像, 如一次 CT 扫描. 体素强度以 `f32` 保存.
///
/// 影像一经载入不可变: 本类型不提供任何修改体素数据或几何信息的方法.
#[derive(Debug, Clone)]
pub struct Volume {
    geometry: Geometry,
    data: Array3<f32>,
}

impl GeometryAttr for Volume {
    #[inline]
    fn geometry(&self) -> &Geometry {
        &self.geometry
    }
}

impl Index<Idx3d> for Volume {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl Volume {
    /// 打开 nii 文件格式的 3D 影像. `path` 为 nii 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> nifti::Result<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let geometry = Geometry::from_header(obj.header());

        // nii 数据按 [W, H, z] 存储, 换轴成 [z, H, W] 访问模式.
        let data = obj
            .into_volume()
            .into_ndarray::<f32>()?
            .permuted_axes([2, 1, 0].as_slice());
        debug_assert!(data.is_standard_layout());

        // 形状与数据长度一致, 不会失败.
        let data = Array3::<f32>::from_shape_vec(geometry.shape(), data.into_raw_vec()).unwrap();

        Ok(Self { geometry, data })
    }

    /// 由几何信息和裸体素数据直接构建. `data` 按照 `(z, h, w)` 组织.
    /// 主要用于测试与合成数据场景.
    ///
    /// # Panics
    ///
    /// `data` 形状与 `geometry` 不一致时 panic.
    pub fn from_parts(geometry: Geometry, data: Array3<f32>) -> Self {
        assert_eq!(data.dim(), geometry.shape());
        Self { geometry, data }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }
}

/// 3D 整型标签掩膜. 标签值以 `u8` 保存, 0 为背景.
///
/// 掩膜在创建时与某个具体影像的网格对齐; `tag` 记录掩膜身份,
/// 工作副本的 tag 由其所属时间点派生.
#[derive(Debug, Clone)]
pub struct LabelMask {
    geometry: Geometry,
    data: Array3<u8>,
    tag: String,
}

impl GeometryAttr for LabelMask {
    #[inline]
    fn geometry(&self) -> &Geometry {
        &self.geometry
    }
}

impl Index<Idx3d> for LabelMask {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl LabelMask {
    /// 打开 nii 文件格式的 3D 标签掩膜. `path` 为 nii 文件的本地路径,
    /// `tag` 为掩膜身份标识. 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P, tag: impl Into<String>) -> nifti::Result<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let geometry = Geometry::from_header(obj.header());

        // nii 数据按 [W, H, z] 存储, 换轴成 [z, H, W] 访问模式.
        let data = obj
            .into_volume()
            .into_ndarray::<u8>()?
            .permuted_axes([2, 1, 0].as_slice());
        debug_assert!(data.is_standard_layout());

        // 形状与数据长度一致, 不会失败.
        let data = Array3::<u8>::from_shape_vec(geometry.shape(), data.into_raw_vec()).unwrap();

        Ok(Self {
            geometry,
            data,
            tag: tag.into(),
        })
    }

    /// 由几何信息和裸标签数据直接构建. `data` 按照 `(z, h, w)` 组织.
    /// 主要用于测试与合成数据场景.
    ///
    /// # Panics
    ///
    /// `data` 形状与 `geometry` 不一致时 panic.
    pub fn from_parts(geometry: Geometry, data: Array3<u8>, tag: impl Into<String>) -> Self {
        assert_eq!(data.dim(), geometry.shape());
        Self {
            geometry,
            data,
            tag: tag.into(),
        }
    }

    /// 获取掩膜身份标识.
    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// 克隆出一份新身份的工作掩膜. 体素数据与几何信息逐位相同.
    #[inline]
    pub fn clone_tagged(&self, tag: impl Into<String>) -> Self {
        Self {
            geometry: self.geometry.clone(),
            data: self.data.clone(),
            tag: tag.into(),
        }
    }

    /// 将仿射变换硬化进掩膜的几何信息. 体素数据保持不变.
    #[must_use]
    pub fn transformed(self, t: &AffineTransform) -> Self {
        Self {
            geometry: self.geometry.transformed(t),
            ..self
        }
    }

    /// 统计值等于 `label` 的体素个数.
    pub fn count_of(&self, label: u8) -> u64 {
        self.data.iter().filter(|&&v| v == label).count() as u64
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u8, Ix3> {
        self.data.view()
    }
}
