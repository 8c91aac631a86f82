/// Horizontal whitespace tolerated between `[[` and the link target.
const LINK_PADDING: [char; 3] = [' ', '\t', '\u{0C}'];

/// A wikilink occurrence pointing at a specific title.
///
/// `start` and `len` describe the byte span of the whole link, from the
/// opening `[[` through the closing `]]`.
#[derive(Debug, PartialEq, Eq)]
pub struct WikilinkOccurrence {
    /// The link target, without surrounding padding.
    pub target: String,
    /// Display text after the `|`, verbatim. `None` for bare links.
    pub alias: Option<String>,
    /// Byte offset of the opening `[[`
    pub start: usize,
    /// Byte length of the full link markup
    pub len: usize,
}

/// A text edit: replace `remove_len` bytes at `offset` with `insert_text`.
#[derive(Debug, PartialEq, Eq)]
pub struct TextEdit {
    /// Byte offset in source
    pub offset: usize,
    /// Number of bytes to remove
    pub remove_len: usize,
    /// Replacement text
    pub insert_text: String,
}

/// Output of [`rewrite`].
#[derive(Debug, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    pub changed: bool,
}

/// Try to recognize `[[ <title> ]]` or `[[ <title> |<alias>]]` starting at
/// byte `start`, which must point at `[[`.
///
/// Returns the alias (if any) and the byte length of the link.
fn match_link_at<'a>(text: &'a str, start: usize, title: &str) -> Option<(Option<&'a str>, usize)> {
    let rest = text[start..].strip_prefix("[[")?;
    let rest = rest.trim_start_matches(LINK_PADDING);
    let rest = rest.strip_prefix(title)?;
    let rest = rest.trim_start_matches(LINK_PADDING);

    let (alias, rest) = match rest.strip_prefix('|') {
        Some(after_pipe) => {
            let alias_len = after_pipe
                .find(|c: char| c == '[' || c == ']')
                .unwrap_or(after_pipe.len());
            if alias_len == 0 {
                return None;
            }
            (Some(&after_pipe[..alias_len]), &after_pipe[alias_len..])
        }
        None => (None, rest),
    };

    let rest = rest.strip_prefix("]]")?;
    let end = text.len() - rest.len();
    Some((alias, end - start))
}

/// Find every wikilink whose target is exactly `title`.
///
/// Links may pad the target with spaces, tabs or form feeds. An alias runs
/// from the `|` up to the closing `]]` and may not contain `[` or `]`, so a
/// match never spans into a neighbouring link. Occurrences are returned in
/// document order and never overlap.
pub fn find_occurrences(text: &str, title: &str) -> Vec<WikilinkOccurrence> {
    let mut occurrences = Vec::new();
    if title.is_empty() {
        return occurrences;
    }

    let mut cursor = 0;
    while let Some(found) = text[cursor..].find("[[") {
        let start = cursor + found;
        match match_link_at(text, start, title) {
            Some((alias, len)) => {
                occurrences.push(WikilinkOccurrence {
                    target: title.to_string(),
                    alias: alias.map(str::to_string),
                    start,
                    len,
                });
                cursor = start + len;
            }
            // `[` is one byte, so this stays on a char boundary and still
            // catches a link opening inside a run like `[[[[Old]]`.
            None => cursor = start + 1,
        }
    }

    occurrences
}

/// Build the replacement markup for one occurrence of the old title.
fn relink(occ: &WikilinkOccurrence, old_title: &str, new_title: &str, keep_alias: bool) -> String {
    match occ.alias.as_deref() {
        Some(alias) if alias == new_title => format!("[[{}]]", new_title),
        Some(alias) => format!("[[{}|{}]]", new_title, alias),
        None if keep_alias => format!("[[{}|{}]]", new_title, old_title),
        None => format!("[[{}]]", new_title),
    }
}

/// Compute the edits that retarget every `[[old_title]]` link at `new_title`.
///
/// - an alias equal to the new title is dropped, it would be redundant
/// - any other alias is kept verbatim
/// - bare links get `old_title` as alias when `keep_alias_for_bare_links`
///   is set, so the rendered text does not change
///
/// Returns edits in reverse offset order for safe sequential application.
pub fn compute_wikilink_rename_edits(
    markdown: &str,
    old_title: &str,
    new_title: &str,
    keep_alias_for_bare_links: bool,
) -> Vec<TextEdit> {
    if old_title == new_title {
        return Vec::new();
    }

    let mut edits: Vec<TextEdit> = find_occurrences(markdown, old_title)
        .into_iter()
        .map(|occ| TextEdit {
            offset: occ.start,
            remove_len: occ.len,
            insert_text: relink(&occ, old_title, new_title, keep_alias_for_bare_links),
        })
        .collect();

    edits.sort_by(|a, b| b.offset.cmp(&a.offset));
    edits
}

/// Apply edits produced by [`compute_wikilink_rename_edits`].
/// Edits must be in reverse offset order.
pub fn apply_edits(text: &mut String, edits: &[TextEdit]) {
    for edit in edits {
        text.replace_range(edit.offset..edit.offset + edit.remove_len, &edit.insert_text);
    }
}

/// Rewrite all links to `old_title` so they point at `new_title`.
///
/// Pure and deterministic. `changed` is true only when at least one link
/// matched and the output differs from the input. Renaming a title to
/// itself is a no-op.
pub fn rewrite(
    text: &str,
    old_title: &str,
    new_title: &str,
    keep_alias_for_bare_links: bool,
) -> Rewrite {
    let edits = compute_wikilink_rename_edits(text, old_title, new_title, keep_alias_for_bare_links);
    if edits.is_empty() {
        return Rewrite {
            text: text.to_string(),
            changed: false,
        };
    }

    let mut rewritten = text.to_string();
    apply_edits(&mut rewritten, &edits);
    let changed = rewritten != text;
    Rewrite {
        text: rewritten,
        changed,
    }
}
