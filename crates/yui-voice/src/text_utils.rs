//! Reply cleanup before segmentation.
//!
//! Language models occasionally emit markdown or chain-of-thought blocks even
//! when told not to. None of it should be read aloud, so the session runs
//! [`prepare_for_speech`] over the reply (when enabled) before handing it to
//! [`segment`](crate::segment::segment).

/// Opening prefix / closing tag pairs whose contents are never spoken.
const HIDDEN_BLOCKS: [(&str, &str); 3] = [
    ("<think", "</think>"),
    ("<reasoning>", "</reasoning>"),
    ("<|START_THINKING|>", "<|END_THINKING|>"),
];

const CODE_PLACEHOLDER: &str = "Code omitted.";

const MAX_ORDINAL_DIGITS: usize = 3;

/// Emphasis delimiters, longest first so `**` is consumed before `*`.
const EMPHASIS: [&str; 4] = ["**", "__", "~~", "*"];

/// Turn a raw reply into plain text suitable for synthesis.
///
/// - reasoning blocks are removed entirely
/// - fenced code blocks collapse to a short placeholder sentence
/// - headers, blockquotes, list markers, emphasis, inline code, links,
///   images and HTML tags are reduced to their visible text
/// - horizontal rules are dropped and whitespace is collapsed
#[must_use]
pub fn prepare_for_speech(text: &str) -> String {
    let visible = HIDDEN_BLOCKS
        .iter()
        .fold(text.to_string(), |acc, (open, close)| {
            remove_blocks(&acc, open, close)
        });

    let mut out: Vec<String> = Vec::new();
    let mut in_fence = false;

    for line in visible.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("```") {
            if !in_fence {
                out.push(CODE_PLACEHOLDER.to_string());
            }
            in_fence = !in_fence;
            continue;
        }
        if in_fence || is_rule(trimmed) {
            continue;
        }

        let plain = plain_line(trimmed);
        if !plain.is_empty() {
            out.push(plain);
        }
    }

    collapse_whitespace(&out.join(" "))
}

/// Remove every `open…close` block, matching tags case-insensitively.
///
/// `open` may be a prefix such as `<think` so that attributes
/// (`<think duration="3">`) still match. An unterminated block is left alone.
fn remove_blocks(text: &str, open: &str, close: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();
    let open_lc = open.to_ascii_lowercase();
    let close_lc = close.to_ascii_lowercase();

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    while let Some(rel) = lower[cursor..].find(&open_lc) {
        let start = cursor + rel;
        let block_end = lower[start..].find('>').and_then(|gt| {
            let body = start + gt + 1;
            lower[body..].find(&close_lc).map(|c| body + c + close.len())
        });

        match block_end {
            Some(end) => {
                out.push_str(&text[cursor..start]);
                cursor = end;
            }
            None => {
                let skip = start + open.len();
                out.push_str(&text[cursor..skip]);
                cursor = skip;
            }
        }
    }
    out.push_str(&text[cursor..]);
    out
}

fn is_rule(line: &str) -> bool {
    let marks: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
    marks.len() >= 3 && matches!(marks[0], '-' | '*' | '_') && marks.iter().all(|&c| c == marks[0])
}

fn plain_line(line: &str) -> String {
    let mut s = line.trim_start_matches('>').trim_start();
    s = s.trim_start_matches('#').trim_start();
    let s = strip_list_marker(s);
    let s = unwrap_brackets(s);
    let s = strip_inline_markup(&s);
    s.trim().to_string()
}

fn strip_list_marker(line: &str) -> &str {
    for bullet in ["- ", "* ", "+ "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return rest;
        }
    }
    // Short ordinals only: "2024. " is a year, not a marker.
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if (1..=MAX_ORDINAL_DIGITS).contains(&digits) {
        let after = &line[digits..];
        if let Some(rest) = after.strip_prefix(". ").or_else(|| after.strip_prefix(") ")) {
            return rest;
        }
    }
    line
}

/// `[text](url)` → `text`, `![alt](url)` → `image: alt`.
fn unwrap_brackets(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(open) = rest.find('[') {
        let is_image = rest[..open].ends_with('!');
        let label_start = open + 1;
        let parsed = rest[label_start..].find("](").and_then(|close| {
            let label_end = label_start + close;
            let url_start = label_end + 2;
            rest[url_start..]
                .find(')')
                .map(|u| (label_end, url_start + u + 1))
        });

        let Some((label_end, after)) = parsed else {
            out.push_str(&rest[..label_start]);
            rest = &rest[label_start..];
            continue;
        };

        let label = &rest[label_start..label_end];
        if is_image {
            out.push_str(&rest[..open - 1]);
            if !label.is_empty() {
                out.push_str("image: ");
                out.push_str(label);
            }
        } else {
            out.push_str(&rest[..open]);
            out.push_str(label);
        }
        rest = &rest[after..];
    }
    out.push_str(rest);
    out
}

/// Drop HTML tags, backticks, and paired emphasis delimiters.
fn strip_inline_markup(line: &str) -> String {
    let mut s = strip_html_tags(line).replace('`', "");
    for marker in EMPHASIS {
        s = strip_paired(&s, marker);
    }
    s
}

/// Remove `<tag …>` spans closed on the same line.
///
/// A `<` counts as a tag opener only when followed by a letter, `/` or `!`;
/// anything else (`2 < 3`) is kept as text.
fn strip_html_tags(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(lt) = rest.find('<') {
        let after = &rest[lt + 1..];
        let opens = after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!');

        match after.find('>').filter(|_| opens) {
            Some(gt) => {
                out.push_str(&rest[..lt]);
                rest = &after[gt + 1..];
            }
            None => {
                out.push_str(&rest[..=lt]);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// `*text*` → `text` for one delimiter. The opener must be followed and the
/// closer preceded by non-whitespace; unpaired delimiters stay.
fn strip_paired(text: &str, marker: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find(marker) {
        let body_start = open + marker.len();
        let body = &rest[body_start..];
        let opens = body.chars().next().is_some_and(|c| !c.is_whitespace());

        match find_closer(body, marker).filter(|_| opens) {
            Some(close) => {
                out.push_str(&rest[..open]);
                out.push_str(&body[..close]);
                rest = &body[close + marker.len()..];
            }
            None => {
                out.push_str(&rest[..body_start]);
                rest = body;
            }
        }
    }
    out.push_str(rest);
    out
}

fn find_closer(body: &str, marker: &str) -> Option<usize> {
    body.match_indices(marker).map(|(i, _)| i).find(|&i| {
        body[..i]
            .chars()
            .next_back()
            .is_some_and(|c| !c.is_whitespace())
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
