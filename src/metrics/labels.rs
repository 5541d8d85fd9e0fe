//! Identity labels shared by every series the publisher exposes.

use std::collections::BTreeMap;

use crate::error::{MetricsError, Result};

pub const PROFILE_LABEL: &str = "profile";
pub const GROUP_LABEL: &str = "group";
pub const COMMAND_LABEL: &str = "command";
pub const VERSION_LABEL: &str = "version";
pub const RUST_VERSION_LABEL: &str = "rustversion";
/// Grouping key the push gateway attaches itself.
pub const JOB_LABEL: &str = "job";

/// Ordered label set: name -> value, each name once.
pub type Labels = BTreeMap<String, String>;

/// Inserts `add` into `labels`; values from `add` win on collision.
pub fn merge_labels<K, V>(mut labels: Labels, add: impl IntoIterator<Item = (K, V)>) -> Labels
where
    K: Into<String>,
    V: Into<String>,
{
    for (key, value) in add {
        labels.insert(key.into(), value.into());
    }
    labels
}

/// `{profile}` plus `group` when not empty, then the extra labels on top.
pub fn identity_labels(profile: &str, group: Option<&str>, extra: &Labels) -> Labels {
    let mut labels = Labels::new();
    labels.insert(PROFILE_LABEL.to_string(), profile.to_string());
    if let Some(group) = group.filter(|g| !g.is_empty()) {
        labels.insert(GROUP_LABEL.to_string(), group.to_string());
    }
    merge_labels(labels, extra.iter().map(|(k, v)| (k.clone(), v.clone())))
}

fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    !name.starts_with("__") && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Rejects names Prometheus would refuse and names the publisher
/// already uses for its own dimensions.
pub fn validate_label_names(labels: &Labels) -> Result<()> {
    for name in labels.keys() {
        if !is_valid_label_name(name) {
            return Err(MetricsError::InvalidLabelName(name.clone()));
        }
        if [COMMAND_LABEL, VERSION_LABEL, RUST_VERSION_LABEL, JOB_LABEL].contains(&name.as_str()) {
            return Err(MetricsError::ReservedLabel(name.clone()));
        }
    }
    Ok(())
}
