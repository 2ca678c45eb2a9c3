use crate::report::PairDiffRow;
use crate::schema::CanonicalModel;
use crate::utils::{display_value, preview, values_equal};
use std::collections::BTreeSet;

pub const DEFAULT_PREVIEW_LIMIT: usize = 10;

/// Compares two canonical models intent by intent.
pub struct PairDiffer {
    preview_limit: usize,
}

impl Default for PairDiffer {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_LIMIT)
    }
}

impl PairDiffer {
    pub fn new(preview_limit: usize) -> Self {
        Self {
            preview_limit: preview_limit.max(1),
        }
    }

    /// One row per name in either model (restricted to `restrict_to` when
    /// given), sorted by name. Neither model is modified.
    pub fn diff(
        &self,
        a: &CanonicalModel,
        b: &CanonicalModel,
        label_a: &str,
        label_b: &str,
        restrict_to: Option<&BTreeSet<String>>,
    ) -> Vec<PairDiffRow> {
        let names: BTreeSet<&String> = a
            .names()
            .chain(b.names())
            .filter(|name| restrict_to.map_or(true, |allowed| allowed.contains(*name)))
            .collect();

        let empty = BTreeSet::new();
        names
            .into_iter()
            .map(|name| {
                let left = a.get(name);
                let right = b.get(name);

                let priority_a = left.and_then(|i| i.priority.clone());
                let priority_b = right.and_then(|i| i.priority.clone());
                let phrases_a = left.map_or(&empty, |i| &i.phrases);
                let phrases_b = right.map_or(&empty, |i| &i.phrases);

                // BTreeSet differences already iterate in sorted order.
                let added: Vec<String> = phrases_b.difference(phrases_a).cloned().collect();
                let removed: Vec<String> = phrases_a.difference(phrases_b).cloned().collect();

                let priorities_equal = values_equal(&priority_a, &priority_b);
                let fully_equal = phrases_a == phrases_b && priorities_equal;

                let mut parts = Vec::new();
                if !priorities_equal {
                    parts.push(format!(
                        "priority: {} -> {}",
                        display_value(&priority_a),
                        display_value(&priority_b)
                    ));
                }
                if !added.is_empty() {
                    parts.push(format!("added {}", added.len()));
                }
                if !removed.is_empty() {
                    parts.push(format!("removed {}", removed.len()));
                }
                if left.is_none() {
                    parts.push(format!("present only in {}", label_b));
                }
                if right.is_none() {
                    parts.push(format!("present only in {}", label_a));
                }
                let comment = if parts.is_empty() {
                    "matches".to_string()
                } else {
                    parts.join("; ")
                };

                PairDiffRow {
                    name: name.clone(),
                    phrase_count_a: phrases_a.len(),
                    phrase_count_b: phrases_b.len(),
                    added_preview: preview(&added, self.preview_limit),
                    removed_preview: preview(&removed, self.preview_limit),
                    added,
                    removed,
                    priority_a,
                    priority_b,
                    fully_equal,
                    label_a: label_a.to_string(),
                    label_b: label_b.to_string(),
                    comment,
                }
            })
            .collect()
    }
}

/// [`PairDiffer::diff`] with the default preview limit.
pub fn diff_pair(
    a: &CanonicalModel,
    b: &CanonicalModel,
    label_a: &str,
    label_b: &str,
    restrict_to: Option<&BTreeSet<String>>,
) -> Vec<PairDiffRow> {
    PairDiffer::default().diff(a, b, label_a, label_b, restrict_to)
}
