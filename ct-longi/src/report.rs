//! 统计结果表格输出.
//!
//! 管线本身不落盘; 把结果序列渲染成表格是调用方的事情,
//! 这里只提供惯用的 CSV 形式.

use std::io::Write;

use crate::stats::StatisticsRecord;

/// CSV 表头, 与统计记录字段一一对应.
const HEADERS: [&str; 5] = ["Count", "Mean", "Variance", "Maximum", "Minimum"];

/// 将统计结果序列写成 CSV 表格: 一行表头, 之后每条记录一行,
/// 行序与 `records` 一致 (基线在前).
pub fn write_csv<W: Write>(w: W, records: &[StatisticsRecord]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(w);
    wtr.write_record(HEADERS)?;
    for r in records {
        wtr.write_record([
            r.count.to_string(),
            r.mean.to_string(),
            r.variance.to_string(),
            r.max.to_string(),
            r.min.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
