use std::collections::BTreeMap;

/// Camera id encoded in an image file name.
///
/// Two naming conventions exist: `<camera>-<timestamp>.png` and
/// `<camera>_<timestamp>.png`. A `-` anywhere in the name wins over `_`, so an
/// underscore-delimited name whose timestamp contains a dash is split at the
/// dash. Names with neither delimiter are their own camera id.
pub fn camera_id(identifier: &str) -> &str {
    let delimiter = if identifier.contains('-') { '-' } else { '_' };
    identifier
        .split_once(delimiter)
        .map(|(camera, _)| camera)
        .unwrap_or(identifier)
}

/// Partition identifiers into per-camera groups, keeping input order inside
/// each group. Callers sort the input first to get chronological groups.
pub fn group_by_camera(identifiers: &[String]) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for identifier in identifiers {
        groups
            .entry(camera_id(identifier).to_string())
            .or_default()
            .push(identifier.clone());
    }
    groups
}
