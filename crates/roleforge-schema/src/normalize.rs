//! Repair of release manifests written by a YAML emitter that tags base64 data
//! with the local tag `!binary` instead of the core `!!binary` tag.
//!
//! Left alone, the defective tag makes checksum fields parse as their base64
//! text rather than the decoded digest. Normalization runs on the raw text,
//! before any structured parsing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

const DEFECTIVE_TAG: &str = "!binary |-\n";
const CANONICAL_TAG: &str = "!!binary |-";

/// Full normalization pipeline for release manifest text.
pub fn normalize_release_manifest(input: &str) -> String {
    inline_binary_scalars(&fix_binary_tags(input))
}

/// Rewrite every `!binary |-` block tag that is not already preceded by `!`
/// into `!!binary |-`. Already-correct tags are left untouched.
pub fn fix_binary_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    let mut rest = input;
    let mut preceding: Option<char> = None;

    while let Some(idx) = rest.find(DEFECTIVE_TAG) {
        let before = rest[..idx].chars().next_back().or(preceding);
        out.push_str(&rest[..idx]);
        if before != Some('!') {
            out.push('!');
        }
        out.push_str(DEFECTIVE_TAG);
        preceding = Some('\n');
        rest = &rest[idx + DEFECTIVE_TAG.len()..];
    }
    out.push_str(rest);
    out
}

/// Replace `!!binary |-` block scalars with double-quoted plain scalars
/// holding the decoded text.
///
/// The YAML parser surfaces core-tagged binary scalars as their encoded text,
/// so decoding happens here. Blocks that are not valid base64, or whose
/// payload is not printable UTF-8, are kept verbatim.
pub fn inline_binary_scalars(input: &str) -> String {
    let lines: Vec<&str> = input.split_inclusive('\n').collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let body = line.trim_end_matches(['\n', '\r']);
        if let Some(prefix) = body.strip_suffix(CANONICAL_TAG) {
            let (end, encoded) = collect_block(&lines, i + 1);
            if let Some(decoded) = decode_block(&encoded) {
                out.push_str(prefix);
                out.push_str(&double_quote(&decoded));
                out.push('\n');
                i = end;
                continue;
            }
        }
        out.push_str(line);
        i += 1;
    }
    out
}

/// Gather the indented content lines of a block scalar starting at `start`.
/// Returns the index of the first line past the block and the joined payload.
fn collect_block(lines: &[&str], start: usize) -> (usize, String) {
    let Some(first) = lines.get(start) else {
        return (start, String::new());
    };
    let indent = leading_spaces(first);
    if indent == 0 || first.trim().is_empty() {
        return (start, String::new());
    }

    let mut payload = String::new();
    let mut end = start;
    while let Some(line) = lines.get(end) {
        if line.trim().is_empty() || leading_spaces(line) < indent {
            break;
        }
        payload.push_str(line.trim());
        end += 1;
    }
    (end, payload)
}

fn decode_block(encoded: &str) -> Option<String> {
    let bytes = STANDARD.decode(encoded).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    if text.chars().any(char::is_control) {
        return None;
    }
    Some(text)
}

fn leading_spaces(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b' ').count()
}

fn double_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
