//! 合成数据演示: 构造基线 + 两个随访时间点的 phantom 影像,
//! 运行纵向 ROI 统计管线, 并输出 CSV 结果表格.
//!
//! 若环境变量 `$LONGISTAT_CSV` 非空, 表格写入该路径; 否则打印到 stdout.

use std::io::Write;
use std::{env, fs, io};

use ct_longi::prelude::*;
use ndarray::Array3;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
fn sep() {
    println!("{SEP}");
}

/// phantom 网格边长 (体素).
const SIDE: usize = 24;

/// phantom ROI: 以 `center` 为球心、`radius` (毫米) 为半径的球.
fn ball(center: (f64, f64, f64), radius: f64, (z, h, w): (usize, usize, usize)) -> bool {
    let (cz, ch, cw) = center;
    let d2 = (z as f64 - cz).powi(2) + (h as f64 - ch).powi(2) + (w as f64 - cw).powi(2);
    d2 <= radius.powi(2)
}

/// 构造一个球形高亮区域的 phantom 影像.
///
/// 球内强度为 `hot`, 球外为 `cold`; `origin` 为网格物理原点.
fn phantom_volume(center: (f64, f64, f64), hot: f32, cold: f32, origin: [f64; 3]) -> Volume {
    let geometry = Geometry::uniform((SIDE, SIDE, SIDE), [1.0; 3], origin);
    let data = Array3::from_shape_fn((SIDE, SIDE, SIDE), |idx| {
        if ball(center, 4.0, idx) {
            hot
        } else {
            cold
        }
    });
    Volume::from_parts(geometry, data)
}

/// 构造与 phantom 影像对齐的球形 ROI 掩膜.
fn phantom_mask(center: (f64, f64, f64), origin: [f64; 3]) -> LabelMask {
    let geometry = Geometry::uniform((SIDE, SIDE, SIDE), [1.0; 3], origin);
    let data = Array3::from_shape_fn((SIDE, SIDE, SIDE), |idx| {
        if ball(center, 4.0, idx) {
            ROI
        } else {
            BACKGROUND
        }
    });
    LabelMask::from_parts(geometry, data, "baseline-label")
}

fn main() {
    simple_logger::SimpleLogger::new().init().unwrap();

    let center = (12.0, 12.0, 12.0);

    // 基线: 球内强度 40 (接近肝实质 HU).
    let baseline = phantom_volume(center, 40.0, -100.0, [0.0; 3]);
    let mask = phantom_mask(center, [0.0; 3]);

    // 随访 1: 与基线完全一致, 恒等变换.
    let t1 = Timepoint::new(
        "followup-1",
        phantom_volume(center, 40.0, -100.0, [0.0; 3]),
        AffineTransform::identity(),
    );

    // 随访 2: 网格整体向 +x 平移 3 毫米 (病人位置变化), 球内强度降到 25.
    // "随访 -> 基线" 的变换就是把这 3 毫米平移回去.
    let t2 = Timepoint::new(
        "followup-2",
        phantom_volume(center, 25.0, -100.0, [3.0, 0.0, 0.0]),
        AffineTransform::from_translation([-3.0, 0.0, 0.0]),
    );

    let pipeline = LongitudinalStatsPipeline::new();
    let records = pipeline
        .run(&baseline, &mask, &[t1, t2])
        .expect("pipeline run failed");

    let out: Box<dyn Write> = match env::var("LONGISTAT_CSV") {
        Ok(path) if !path.is_empty() => {
            println!("writing table to {path}");
            Box::new(fs::File::create(path).expect("create csv file"))
        }
        _ => Box::new(io::stdout()),
    };

    sep();
    ct_longi::report::write_csv(out, &records).expect("write csv table");
    sep();
}
