use crate::config::{Block, RESOURCE_PLACEHOLDER};
use crate::error::SwitchError;
use crate::resources;
use crate::types::ResourceEntry;
use std::collections::BTreeMap;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const MARKER_KEY: &str = "cdn-switch";
const RAW_TEXT_ELEMENTS: [&str; 3] = ["script", "style", "textarea"];

/// Builds the markup that replaces a block's marker, pointing either at the
/// CDN URLs or at `local_ref_path/filename`.
pub fn render_block(block: Block<'_>, link_local: bool) -> Result<String, SwitchError> {
    let (prefix, suffix) = block
        .config
        .html
        .split_once(RESOURCE_PLACEHOLDER)
        .ok_or_else(|| {
            SwitchError::Config(format!(
                "block '{}': html template has no {} placeholder",
                block.name, RESOURCE_PLACEHOLDER
            ))
        })?;

    let targets: Vec<String> = if link_local {
        let local_ref = block.config.local_ref_path();
        resources::normalize(block.name, block.config.resources.iter().cloned())?
            .into_iter()
            .map(|d| format!("{}/{}", local_ref, d.filename))
            .collect()
    } else {
        block
            .config
            .resources
            .iter()
            .map(|entry| match entry {
                ResourceEntry::Url(url) => url.clone(),
                ResourceEntry::Descriptor(d) => d.url.clone(),
            })
            .collect()
    };

    let lines = targets
        .iter()
        .map(|target| format!("{prefix}{target}{suffix}"))
        .chain(block.config.injections.iter().cloned())
        .collect::<Vec<_>>();

    Ok(lines.join("\n"))
}

fn marker_name(comment: &str) -> Option<&str> {
    let (key, name) = comment.trim().split_once('=')?;
    if key.trim() == MARKER_KEY {
        Some(name.trim())
    } else {
        None
    }
}

#[derive(Debug, PartialEq)]
pub struct Spliced {
    pub html: String,
    /// Names of the blocks whose markers were replaced, in document order.
    pub replaced: Vec<String>,
}

/// Replaces every `<!--cdn-switch=NAME-->` comment whose NAME has a fragment.
/// Markers for unknown blocks are copied through unchanged, and so is anything
/// that only looks like a marker: text inside tag attributes or inside
/// `<script>`, `<style>` and `<textarea>` bodies.
pub fn splice(document: &str, fragments: &BTreeMap<String, String>) -> Spliced {
    let lower = document.to_ascii_lowercase();
    let mut html = String::with_capacity(document.len());
    let mut replaced = Vec::new();
    let mut copied = 0;
    let mut pos = 0;

    while let Some(offset) = document[pos..].find('<') {
        let start = pos + offset;

        if document[start..].starts_with(COMMENT_OPEN) {
            let body_start = start + COMMENT_OPEN.len();
            let end = match document[body_start..].find(COMMENT_CLOSE) {
                Some(len) => body_start + len,
                None => break,
            };
            let comment_end = end + COMMENT_CLOSE.len();

            let matched = marker_name(&document[body_start..end])
                .and_then(|name| fragments.get_key_value(name));
            if let Some((name, fragment)) = matched {
                html.push_str(&document[copied..start]);
                html.push_str(fragment);
                replaced.push(name.clone());
                copied = comment_end;
            }
            pos = comment_end;
        } else if opens_tag(&document[start..]) {
            let tag_end = match find_tag_end(&document[start..]) {
                Some(len) => start + len,
                None => break,
            };
            pos = match raw_text_element(&lower[start..]) {
                Some(name) => {
                    let close = format!("</{name}");
                    lower[tag_end..]
                        .find(&close)
                        .map_or(document.len(), |len| tag_end + len)
                }
                None => tag_end,
            };
        } else {
            pos = start + 1;
        }
    }

    html.push_str(&document[copied..]);
    Spliced { html, replaced }
}

fn opens_tag(s: &str) -> bool {
    s.as_bytes().get(1).map_or(false, |b| b.is_ascii_alphabetic())
}

/// Length of the start tag at the front of `s`, up to and including its `>`,
/// skipping any `>` inside quoted attribute values.
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote = None;
    for (i, b) in s.bytes().enumerate().skip(1) {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"') | (None, b'\'') => quote = Some(b),
            (None, b'>') => return Some(i + 1),
            _ => {}
        }
    }
    None
}

/// Name of the raw-text element opened at the front of `lower`, if any.
fn raw_text_element(lower: &str) -> Option<&'static str> {
    RAW_TEXT_ELEMENTS.iter().copied().find(|name| {
        lower[1..].strip_prefix(*name).map_or(false, |rest| {
            rest.bytes()
                .next()
                .map_or(true, |b| !b.is_ascii_alphanumeric() && b != b'-')
        })
    })
}
