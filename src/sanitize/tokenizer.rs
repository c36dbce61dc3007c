//! Forgiving HTML tokenizer.
//!
//! Produces text, start-tag and end-tag tokens. Comments, doctypes and
//! processing instructions are consumed silently. Anything that does not
//! look like markup stays text, so `a < b` survives unchanged.

/// A single lexical unit of an HTML fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Text(&'a str),
    StartTag {
        /// Lowercased tag name
        name: String,
        /// Lowercased attribute names with raw (undecoded) values
        attrs: Vec<(String, &'a str)>,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
}

/// Elements whose body is raw text until the matching end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

pub(crate) struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    raw_text_until: Option<String>,
}

impl<'a> Tokenizer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            raw_text_until: None,
        }
    }

    fn bytes(&self) -> &'a [u8] {
        self.input.as_bytes()
    }

    fn byte_at(&self, idx: usize) -> Option<u8> {
        self.bytes().get(idx).copied()
    }

    /// Finds the next `<` that opens real markup.
    fn find_markup(&self, from: usize) -> Option<usize> {
        let bytes = self.bytes();
        let mut idx = from;
        while let Some(offset) = bytes[idx..].iter().position(|&b| b == b'<') {
            let lt = idx + offset;
            match self.byte_at(lt + 1) {
                Some(b) if b.is_ascii_alphabetic() || b == b'!' || b == b'?' => return Some(lt),
                Some(b'/') if self.byte_at(lt + 2).is_some_and(|b| b.is_ascii_alphabetic()) => {
                    return Some(lt);
                }
                _ => idx = lt + 1,
            }
        }
        None
    }

    fn skip_whitespace(&mut self) {
        while self.byte_at(self.pos).is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn skip_past(&mut self, needle: &str) {
        match self.input[self.pos..].find(needle) {
            Some(offset) => self.pos += offset + needle.len(),
            None => self.pos = self.input.len(),
        }
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        while self
            .byte_at(self.pos)
            .is_some_and(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.'))
        {
            self.pos += 1;
        }
        self.input[start..self.pos].to_ascii_lowercase()
    }

    fn read_raw_text(&mut self, tag: &str) -> &'a str {
        let closing = format!("</{tag}");
        let start = self.pos;
        // An ASCII '<' match always lands on a char boundary.
        let end = self.bytes()[start..]
            .windows(closing.len())
            .position(|window| window.eq_ignore_ascii_case(closing.as_bytes()))
            .map(|offset| start + offset)
            .unwrap_or(self.input.len());
        self.pos = end;
        &self.input[start..end]
    }

    fn read_end_tag(&mut self) -> Token<'a> {
        self.pos += 2; // "</"
        let name = self.read_name();
        self.skip_past(">");
        Token::EndTag { name }
    }

    fn read_attr_value(&mut self) -> &'a str {
        match self.byte_at(self.pos) {
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let start = self.pos;
                let end = self.bytes()[start..]
                    .iter()
                    .position(|&b| b == quote)
                    .map(|offset| start + offset)
                    .unwrap_or(self.input.len());
                self.pos = (end + 1).min(self.input.len());
                &self.input[start..end]
            }
            _ => {
                let start = self.pos;
                while self
                    .byte_at(self.pos)
                    .is_some_and(|b| !b.is_ascii_whitespace() && b != b'>')
                {
                    self.pos += 1;
                }
                &self.input[start..self.pos]
            }
        }
    }

    fn read_start_tag(&mut self) -> Token<'a> {
        self.pos += 1; // "<"
        let name = self.read_name();
        let mut attrs = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            match self.byte_at(self.pos) {
                None => break,
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b'/') => {
                    self.pos += 1;
                    if self.byte_at(self.pos) == Some(b'>') {
                        self.pos += 1;
                        self_closing = true;
                        break;
                    }
                }
                Some(_) => {
                    let attr_start = self.pos;
                    while self.byte_at(self.pos).is_some_and(|b| {
                        !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/')
                    }) {
                        self.pos += 1;
                    }
                    if self.pos == attr_start {
                        // Stray '=' or similar: skip it.
                        self.pos += 1;
                        continue;
                    }
                    let attr_name = self.input[attr_start..self.pos].to_ascii_lowercase();

                    self.skip_whitespace();
                    let value = if self.byte_at(self.pos) == Some(b'=') {
                        self.pos += 1;
                        self.skip_whitespace();
                        self.read_attr_value()
                    } else {
                        ""
                    };
                    attrs.push((attr_name, value));
                }
            }
        }

        if !self_closing && RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            self.raw_text_until = Some(name.clone());
        }

        Token::StartTag {
            name,
            attrs,
            self_closing,
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.pos >= self.input.len() {
                return None;
            }

            if let Some(tag) = self.raw_text_until.take() {
                let text = self.read_raw_text(&tag);
                if !text.is_empty() {
                    return Some(Token::Text(text));
                }
                continue;
            }

            let Some(lt) = self.find_markup(self.pos) else {
                let text = &self.input[self.pos..];
                self.pos = self.input.len();
                return Some(Token::Text(text));
            };

            if lt > self.pos {
                let text = &self.input[self.pos..lt];
                self.pos = lt;
                return Some(Token::Text(text));
            }

            let rest = &self.input[self.pos..];
            if rest.starts_with("<!--") {
                self.pos += 4;
                self.skip_past("-->");
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.skip_past(">");
            } else if rest.starts_with("</") {
                return Some(self.read_end_tag());
            } else {
                return Some(self.read_start_tag());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token<'_>> {
        Tokenizer::new(input).collect()
    }

    fn start(name: &str, attrs: Vec<(&str, &'static str)>) -> Token<'static> {
        Token::StartTag {
            name: name.to_string(),
            attrs: attrs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            self_closing: false,
        }
    }

    fn end(name: &str) -> Token<'static> {
        Token::EndTag {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(tokens("just words"), vec![Token::Text("just words")]);
        assert!(tokens("").is_empty());
    }

    #[test]
    fn test_paragraph_with_link() {
        assert_eq!(
            tokens(r#"<p>Hi <a href="http://x" rel="nofollow">there</a></p>"#),
            vec![
                start("p", vec![]),
                Token::Text("Hi "),
                start("a", vec![("href", "http://x"), ("rel", "nofollow")]),
                Token::Text("there"),
                end("a"),
                end("p"),
            ]
        );
    }

    #[test]
    fn test_attribute_forms() {
        assert_eq!(
            tokens("<A HREF='single' data-x=bare disabled class = \"spaced\">"),
            vec![start(
                "a",
                vec![
                    ("href", "single"),
                    ("data-x", "bare"),
                    ("disabled", ""),
                    ("class", "spaced"),
                ]
            )]
        );
    }

    #[test]
    fn test_self_closing_tag() {
        assert_eq!(
            tokens("a<br/>b"),
            vec![
                Token::Text("a"),
                Token::StartTag {
                    name: "br".into(),
                    attrs: vec![],
                    self_closing: true,
                },
                Token::Text("b"),
            ]
        );
    }

    #[test]
    fn test_lone_angle_brackets_are_text() {
        assert_eq!(tokens("1 < 2 > 0"), vec![Token::Text("1 < 2 > 0")]);
        assert_eq!(tokens("x </ y"), vec![Token::Text("x </ y")]);
    }

    #[test]
    fn test_comments_and_doctype_are_dropped() {
        assert_eq!(
            tokens("<!DOCTYPE html>a<!-- <b>hidden</b> -->b<?xml x?>c"),
            vec![Token::Text("a"), Token::Text("b"), Token::Text("c")]
        );
    }

    #[test]
    fn test_unterminated_comment_swallows_rest() {
        assert_eq!(tokens("a<!-- never closed"), vec![Token::Text("a")]);
    }

    #[test]
    fn test_script_body_is_raw_text() {
        assert_eq!(
            tokens("<script>if (a<b) { x = '<p>' }</script>done"),
            vec![
                start("script", vec![]),
                Token::Text("if (a<b) { x = '<p>' }"),
                end("script"),
                Token::Text("done"),
            ]
        );
    }

    #[test]
    fn test_raw_text_closer_is_case_insensitive() {
        assert_eq!(
            tokens("<STYLE>p { color: red }</StYlE><title>Ünïcode ✓</TITLE>ok"),
            vec![
                start("style", vec![]),
                Token::Text("p { color: red }"),
                end("style"),
                start("title", vec![]),
                Token::Text("Ünïcode ✓"),
                end("title"),
                Token::Text("ok"),
            ]
        );
    }

    #[test]
    fn test_unterminated_raw_text_runs_to_end() {
        assert_eq!(
            tokens("<script>a"),
            vec![start("script", vec![]), Token::Text("a")]
        );
    }

    #[test]
    fn test_many_raw_text_elements() {
        let html = "<style>x</STYLE>".repeat(5_000);
        let all = tokens(&html);
        assert_eq!(all.len(), 15_000);
        assert!(all.chunks(3).all(|chunk| chunk[1] == Token::Text("x")));
    }

    #[test]
    fn test_unterminated_tag_at_end_of_input() {
        assert_eq!(
            tokens(r#"text <a href="http://x"#),
            vec![Token::Text("text "), start("a", vec![("href", "http://x")])]
        );
    }

    #[test]
    fn test_multibyte_text_boundaries() {
        assert_eq!(
            tokens("привет <b>мир</b> 🎉"),
            vec![
                Token::Text("привет "),
                start("b", vec![]),
                Token::Text("мир"),
                end("b"),
                Token::Text(" 🎉"),
            ]
        );
    }
}
