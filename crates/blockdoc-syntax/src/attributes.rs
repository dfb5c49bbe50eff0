//! Attribute list parsing for start tags.
//!
//! Accepts the forms browsers accept: `key="value"`, `key='value'`,
//! `key=value` and bare `key`. Names are lower-cased, values entity-decoded.
//! Duplicate names are kept in source order; consumers decide which wins.

/// Parse the attribute portion of a start tag (everything after the name).
pub fn parse_attributes(input: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut chars = input.char_indices().peekable();

    loop {
        // Skip separators, including a trailing self-closing slash
        while let Some(&(_, c)) = chars.peek() {
            if c.is_whitespace() || c == '/' {
                chars.next();
            } else {
                break;
            }
        }

        let Some(&(name_start, _)) = chars.peek() else {
            break;
        };

        let mut name_end = input.len();
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() || c == '=' || c == '/' {
                name_end = i;
                break;
            }
            chars.next();
        }
        let name = input[name_start..name_end].to_ascii_lowercase();

        while let Some(&(_, c)) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
            } else {
                break;
            }
        }

        if chars.peek().map(|&(_, c)| c) != Some('=') {
            if !name.is_empty() {
                attrs.push((name, String::new()));
            }
            continue;
        }
        chars.next();

        while let Some(&(_, c)) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
            } else {
                break;
            }
        }

        let value = match chars.peek().map(|&(_, c)| c) {
            Some(quote @ ('"' | '\'')) => {
                chars.next();
                let mut raw = String::new();
                for (_, c) in chars.by_ref() {
                    if c == quote {
                        break;
                    }
                    raw.push(c);
                }
                raw
            }
            Some(_) => {
                let mut raw = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    raw.push(c);
                    chars.next();
                }
                raw
            }
            None => String::new(),
        };

        if !name.is_empty() {
            attrs.push((name, html_escape::decode_html_entities(&value).into_owned()));
        }
    }

    attrs
}

/// Serialize an attribute list as it appears inside a start tag, each entry
/// preceded by a single space. Empty values serialize as bare names.
pub fn serialize_attributes(attrs: &[(String, String)]) -> String {
    let mut out = String::new();
    for (name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        if !value.is_empty() {
            out.push_str("=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(value));
            out.push('"');
        }
    }
    out
}
