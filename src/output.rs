use anyhow::{Context, Result};
use std::path::Path;

use crate::detail::FinishRecord;

/// Two-space indented JSON array, records in collection order.
pub fn render_records(records: &[FinishRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).context("couldn't serialize results to json")
}

/// Writes the rendered array to `path` in a single write.
pub async fn write_records(path: &Path, records: &[FinishRecord]) -> Result<()> {
    let json = render_records(records)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("couldn't write results to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<FinishRecord> {
        vec![
            FinishRecord {
                name: "Taro Yamada".into(),
                number: 42,
                clock_time: "3:12:45".into(),
                net_time: "3:10:02".into(),
                placement: 3,
            },
            FinishRecord::default(),
        ]
    }

    #[test]
    fn parses_back_field_for_field() {
        let records = sample();
        let json = render_records(&records).unwrap();
        let back: Vec<FinishRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, records);
    }

    #[test]
    fn uses_two_space_indent() {
        let json = render_records(&sample()[..1]).unwrap();
        assert!(json.starts_with("[\n  {\n    \"name\": \"Taro Yamada\""), "{json}");
    }

    #[test]
    fn empty_run_is_an_empty_array() {
        assert_eq!(render_records(&[]).unwrap(), "[]");
    }

    #[tokio::test]
    async fn write_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no/such/dir/marathon.json");
        assert!(write_records(&missing, &sample()).await.is_err());
    }

    #[tokio::test]
    async fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marathon.json");
        write_records(&path, &sample()).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, render_records(&sample()).unwrap());
    }
}
