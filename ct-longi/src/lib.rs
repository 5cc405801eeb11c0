#![warn(missing_docs)]

//! 核心库. 提供共配准纵向 (longitudinal) 3D CT 随访影像的 ROI 标签统计功能.
//!
//! 给定基线 (baseline) 影像及其 ROI 标签掩膜, 以及最多
//! [`consts::MAX_TIMEPOINTS`] 个随访影像和 "随访空间 -> 基线空间"
//! 的刚性/仿射变换, 本 crate 将掩膜逐时间点变换并重采样,
//! 计算每个时间点 ROI 内体素强度的描述统计量
//! (count, mean, variance, max, min).
//!
//! # 注意
//!
//! 1. 影像配准本身 (即变换的求解) 不在本 crate 范围内.
//!    变换由调用方提供, 本 crate 只负责求逆、重采样与统计.
//! 2. 在非期望情况下 (调用方违反文档约定), 程序会直接 panic,
//!    而不会导致内存错误. As what Rust promises.
//!
//! # 管线结构
//!
//! [`pipeline::LongitudinalStatsPipeline`] 按如下顺序处理每个随访时间点:
//!
//! 1. 求给定变换的代数逆 ([`transform::TransformProvider`]);
//! 2. 克隆基线掩膜为工作掩膜, 并将逆变换硬化进其几何信息;
//! 3. 将工作掩膜最近邻重采样到该时间点影像的体素网格
//!    ([`resample::VolumeResampler`]);
//! 4. 以掩膜体素最大值探测唯一的非零标签值;
//! 5. 计算该标签下的 ROI 统计量 ([`stats::StatisticsEngine`]).
//!
//! 基线时间点不做重采样: 掩膜与基线影像在构造上共享网格.
//! 任一时间点失败都会中止整个运行并返回该时间点的错误,
//! 不产生部分结果.
//!
//! 三个协作组件均以 trait 建模, 调用方可以替换为别的后端实现
//! (例如接入其他重采样/统计工具链), 而无需改动管线逻辑.

/// 三维索引, 按 `(z, h, w)` 组织. 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

pub mod consts;

/// 3D 影像与标签掩膜基础数据结构.
mod data;

pub use data::{Geometry, GeometryAttr, LabelMask, Volume};

pub mod pipeline;
pub mod report;
pub mod resample;
pub mod stats;
pub mod transform;

pub mod prelude;
