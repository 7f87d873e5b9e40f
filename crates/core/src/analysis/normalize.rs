use crate::domain::disclosure::DisclosureRecord;
use std::collections::HashMap;

/// Scales each disclosure's dollar magnitude into [1,2] against that filer's
/// own observed range, so a larger-than-usual trade for that specific person
/// scores higher than the same dollar amount from a habitual big spender.
///
/// Returns a value per input record, aligned by index. None where the record
/// has no filer name or no value range; such records contribute nothing to
/// adjusted volume. A filer with a single observed magnitude maps to exactly
/// 1.
pub fn filer_adjusted_values(disclosures: &[DisclosureRecord]) -> Vec<Option<f64>> {
    struct Range {
        min: f64,
        max: f64,
    }

    let mut ranges: HashMap<String, Range> = HashMap::new();
    for disclosure in disclosures {
        let (Some(name), Some(midpoint)) = (disclosure.filer_name(), disclosure.value_midpoint())
        else {
            continue;
        };
        ranges
            .entry(name)
            .and_modify(|r| {
                r.min = r.min.min(midpoint);
                r.max = r.max.max(midpoint);
            })
            .or_insert(Range {
                min: midpoint,
                max: midpoint,
            });
    }

    disclosures
        .iter()
        .map(|disclosure| {
            let name = disclosure.filer_name()?;
            let midpoint = disclosure.value_midpoint()?;
            let range = ranges.get(&name)?;
            if range.min == range.max {
                Some(1.0)
            } else {
                Some(1.0 + (midpoint - range.min) / (range.max - range.min))
            }
        })
        .collect()
}
