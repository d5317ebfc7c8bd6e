use crate::error::SwitchError;
use crate::types::{ResourceDescriptor, ResourceEntry};
use log::debug;
use reqwest::Url;
use std::collections::HashSet;

/// Base name of a URL: everything after its last `/`.
pub fn filename_from_url(url: &str) -> &str {
    match url.rfind('/') {
        Some(idx) => &url[idx + 1..],
        None => url,
    }
}

fn coerce(entry: ResourceEntry) -> ResourceDescriptor {
    match entry {
        ResourceEntry::Url(url) => {
            let filename = filename_from_url(&url).to_string();
            ResourceDescriptor { url, filename }
        }
        ResourceEntry::Descriptor(descriptor) => descriptor,
    }
}

fn usable_filename(filename: &str) -> bool {
    !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(&['/', '\\'][..])
}

/// Resolves a block's raw entries into descriptors with distinct filenames.
pub fn normalize(
    block: &str,
    entries: impl IntoIterator<Item = ResourceEntry>,
) -> Result<Vec<ResourceDescriptor>, SwitchError> {
    let descriptors: Vec<ResourceDescriptor> = entries.into_iter().map(coerce).collect();

    for descriptor in &descriptors {
        if Url::parse(&descriptor.url).is_err() {
            return Err(SwitchError::InvalidUrl {
                block: block.to_string(),
                url: descriptor.url.clone(),
            });
        }
        if !usable_filename(&descriptor.filename) {
            return Err(SwitchError::InvalidFilename {
                block: block.to_string(),
                url: descriptor.url.clone(),
                filename: descriptor.filename.clone(),
            });
        }
    }

    let mut seen = HashSet::with_capacity(descriptors.len());
    for descriptor in &descriptors {
        if !seen.insert(descriptor.filename.as_str()) {
            return Err(SwitchError::DuplicateFilename {
                block: block.to_string(),
                filename: descriptor.filename.clone(),
            });
        }
    }

    debug!("Block '{}': normalized {} resources", block, descriptors.len());
    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> ResourceEntry {
        ResourceEntry::Url(s.to_string())
    }

    #[test]
    fn derives_filename_from_last_segment() {
        let out = normalize(
            "js",
            vec![
                url("https://cdn.example/libs/jquery/3.7.1/jquery.min.js"),
                ResourceEntry::Descriptor(ResourceDescriptor {
                    url: "https://cdn.example/x/lib.min.js".into(),
                    filename: "lib.js".into(),
                }),
            ],
        )
        .unwrap();

        assert_eq!(out[0].filename, "jquery.min.js");
        assert_eq!(out[0].url, "https://cdn.example/libs/jquery/3.7.1/jquery.min.js");
        assert_eq!(out[1].filename, "lib.js");
    }

    #[test]
    fn normalizing_twice_is_identity() {
        let first = normalize(
            "css",
            vec![url("https://a.example/a.css"), url("https://b.example/v2/b.css")],
        )
        .unwrap();
        let second = normalize("css", first.iter().cloned().map(ResourceEntry::from)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_duplicate_filenames() {
        let err = normalize(
            "js",
            vec![url("https://a.example/1/app.js"), url("https://b.example/2/app.js")],
        )
        .unwrap_err();

        match err {
            SwitchError::DuplicateFilename { block, filename } => {
                assert_eq!(block, "js");
                assert_eq!(filename, "app.js");
            }
            other => panic!("expected DuplicateFilename, got {other:?}"),
        }
    }

    #[test]
    fn explicit_filename_collides_with_derived_one() {
        let err = normalize(
            "js",
            vec![
                url("https://a.example/app.js"),
                ResourceEntry::Descriptor(ResourceDescriptor {
                    url: "https://b.example/other.js".into(),
                    filename: "app.js".into(),
                }),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, SwitchError::DuplicateFilename { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn rejects_relative_url_and_bad_filenames() {
        let err = normalize("js", vec![url("vendor/app.js")]).unwrap_err();
        assert!(matches!(err, SwitchError::InvalidUrl { .. }));

        let err = normalize("js", vec![url("https://cdn.example/dir/")]).unwrap_err();
        assert!(matches!(err, SwitchError::InvalidFilename { .. }));

        let err = normalize(
            "js",
            vec![ResourceEntry::Descriptor(ResourceDescriptor {
                url: "https://cdn.example/a.js".into(),
                filename: "../a.js".into(),
            })],
        )
        .unwrap_err();
        assert!(matches!(err, SwitchError::InvalidFilename { .. }));
    }

    #[test]
    fn entries_deserialize_from_either_shape() {
        let entries: Vec<ResourceEntry> = serde_json::from_str(
            r#"["https://cdn.example/a.js", {"url": "https://cdn.example/b.js", "filename": "b2.js"}]"#,
        )
        .unwrap();
        assert_eq!(entries[0], url("https://cdn.example/a.js"));
        assert!(matches!(&entries[1], ResourceEntry::Descriptor(d) if d.filename == "b2.js"));
    }
}
