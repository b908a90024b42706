use chrono::{FixedOffset, Local, Offset};

use bp_tracker_data::models::MeasurementRecord;

const BOM: &str = "\u{feff}";
const HEADER: &str = "日期时间,部位,收缩压(mmHg),舒张压(mmHg),心率(bpm),备注";

/// CSV export of the given records in local time
pub fn export_csv(records: &[MeasurementRecord]) -> String {
    let offset = Local::now().offset().fix();
    export_csv_with_offset(records, offset)
}

/// CSV export with timestamps rendered in `offset`.
///
/// Rows keep the order they are given in and are joined with `\n`, with no
/// trailing newline. Only the note is quoted; the other columns never contain
/// separators.
pub fn export_csv_with_offset(records: &[MeasurementRecord], offset: FixedOffset) -> String {
    let rows = records.iter().map(|record| {
        let local = record.timestamp.with_timezone(&offset);
        format!(
            "{},{},{},{},{},{}",
            local.format("%Y/%-m/%-d %H:%M:%S"),
            record.arm.label(),
            record.systolic,
            record.diastolic,
            record.heart_rate,
            quote(&record.note),
        )
    });

    let body: Vec<String> = std::iter::once(HEADER.to_string()).chain(rows).collect();
    format!("{}{}", BOM, body.join("\n"))
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
