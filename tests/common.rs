#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use resticprofile_metrics::metrics::{Identity, Labels};
use resticprofile_metrics::models::Summary;

pub fn identity(group: Option<&str>, extra: &[(&str, &str)]) -> Identity {
    Identity {
        profile: "home".to_string(),
        group: group.map(str::to_string),
        version: "0.27.0".to_string(),
        restic_version: "0.17.3".to_string(),
        labels: extra
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<Labels>(),
    }
}

pub fn backup_summary() -> Summary {
    Summary {
        files_new: 5,
        files_changed: 2,
        files_unmodified: 10,
        dirs_new: 1,
        dirs_changed: 0,
        dirs_unmodified: 3,
        files_total: 17,
        bytes_added: 1024,
        bytes_added_packed: 512,
        bytes_total: 2048,
        duration: Duration::from_millis(12_500),
    }
}

/// A path in the system temp directory that no other test uses.
pub fn temp_path(suffix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("resticprofile-{}-{}", uuid::Uuid::new_v4(), suffix))
}

/// Series lines of `name` in a text exposition, as (labels, value).
pub fn series<'a>(text: &'a str, name: &str) -> Vec<(&'a str, f64)> {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| {
            let (series, value) = line.rsplit_once(' ')?;
            let labels = match series.strip_prefix(name)? {
                "" => "",
                rest if rest.starts_with('{') => rest,
                _ => return None,
            };
            Some((labels, value.parse().ok()?))
        })
        .collect()
}

/// Value of the single series of `name`.
pub fn gauge_value(text: &str, name: &str) -> Option<f64> {
    match series(text, name).as_slice() {
        [(_, value)] => Some(*value),
        _ => None,
    }
}
