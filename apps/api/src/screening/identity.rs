//! Identity Resolver: best-effort candidate name from a filename, with the
//! extracted text's first line as a fallback. Heuristic only; the result is
//! a display name, not a verified identity.

const SENTINEL: &str = "Unknown Candidate";

const DOCUMENT_EXTENSIONS: [&str; 3] = ["pdf", "docx", "doc"];
const NAME_TOKENS: [&str; 2] = ["resume", "cv"];

/// Minimum and maximum plausible name length, in characters.
const MIN_NAME_CHARS: usize = 2;
const MAX_NAME_CHARS: usize = 50;

/// Derives a candidate display name. Total: never fails, never returns an
/// empty string (falls back to `"Unknown Candidate"`).
pub fn resolve_candidate_name(filename: &str, extracted_text: &str) -> String {
    let stem = strip_document_extension(filename);
    let stem = strip_leading_token(stem);
    let stem = strip_trailing_token(stem);

    let mut name = stem.replace(['_', '-'], " ").trim().to_string();

    // Too short to be a name, or too long to be one: try the first line of
    // the resume text instead, which usually carries the candidate's name.
    let chars = name.chars().count();
    if !(MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&chars) {
        if let Some(first_line) = extracted_text.lines().next() {
            let first_line = first_line.trim();
            if !first_line.is_empty() && first_line.chars().count() < MAX_NAME_CHARS {
                name = first_line.to_string();
            }
        }
    }

    if name.is_empty() {
        SENTINEL.to_string()
    } else {
        name
    }
}

fn strip_document_extension(filename: &str) -> &str {
    if let Some(idx) = filename.rfind('.') {
        let ext = &filename[idx + 1..];
        if DOCUMENT_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
        {
            return &filename[..idx];
        }
    }
    filename
}

fn is_separator(c: char) -> bool {
    c == '-' || c == '_' || c.is_whitespace()
}

fn strip_leading_token(name: &str) -> &str {
    for token in NAME_TOKENS {
        if name.len() >= token.len()
            && name.is_char_boundary(token.len())
            && name[..token.len()].eq_ignore_ascii_case(token)
        {
            return name[token.len()..].trim_start_matches(is_separator);
        }
    }
    name
}

fn strip_trailing_token(name: &str) -> &str {
    for token in NAME_TOKENS {
        if name.len() >= token.len() {
            let start = name.len() - token.len();
            if name.is_char_boundary(start) && name[start..].eq_ignore_ascii_case(token) {
                return name[..start].trim_end_matches(is_separator);
            }
        }
    }
    name
}
