use anyhow::{Context, Result};
use captrade_core::domain::disclosure::DisclosureRecord;
use std::path::Path;

/// Disclosure documents arrive either as a bare JSON list or wrapped in a
/// `{"disclosures": [...]}` object, depending on which crawler produced
/// them.
pub fn load_disclosures(path: &Path) -> Result<Vec<DisclosureRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read disclosure file {}", path.display()))?;

    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let list = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("disclosures") {
            Some(serde_json::Value::Array(items)) => items,
            _ => anyhow::bail!(
                "{} must be a JSON list or an object with a 'disclosures' list",
                path.display()
            ),
        },
        _ => anyhow::bail!(
            "{} must be a JSON list or an object with a 'disclosures' list",
            path.display()
        ),
    };

    let total = list.len();
    let mut out = Vec::with_capacity(total);
    for item in list {
        // Individually unparseable records are dropped, never fatal.
        match serde_json::from_value::<DisclosureRecord>(item) {
            Ok(record) => out.push(record),
            Err(err) => tracing::warn!(error = %err, "skipping unparseable disclosure record"),
        }
    }

    tracing::info!(
        loaded = out.len(),
        skipped = total - out.len(),
        path = %path.display(),
        "disclosures loaded"
    );
    Ok(out)
}
