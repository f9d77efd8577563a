use crate::model::{MetricRecord, Row};

// Quantiles are copied onto each row; the nested latency map is left as is.
pub fn normalize(records: &[MetricRecord]) -> Vec<Row> {
    records.iter().map(normalize_record).collect()
}

fn normalize_record(record: &MetricRecord) -> Row {
    let mut row = Row::new(record.clone());
    if let Some(latency) = &record.latency {
        for (quantile, value) in latency {
            row.set_quantile(quantile, *value);
        }
    }
    row
}
