use serde_json::Value;

use crate::errors::{ConfigError, Result};

/// A parsed field path: an ordered list of object keys and array indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub segments: Vec<Segment>,
    raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),  // .foo, [foo] or ['foo']
    Index(usize), // [0]
}

impl Path {
    /// Parse dot/bracket notation. `a.b.c` and `a[b][c]` are equivalent;
    /// purely numeric bracket segments address array elements.
    pub fn parse(input: &str) -> Result<Path> {
        let mut p = Parser::new(input);
        p.parse().map_err(|reason| ConfigError::Path {
            path: input.to_string(),
            reason,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Last key segment, used as the default field label.
    pub fn last_key(&self) -> &str {
        self.segments
            .iter()
            .rev()
            .find_map(|s| match s {
                Segment::Key(k) => Some(k.as_str()),
                Segment::Index(_) => None,
            })
            .unwrap_or(&self.raw)
    }
}

// Shared by dotted identifiers and unquoted bracket bodies so the two
// notations accept the same keys. ASCII only; anything else needs quoting.
fn is_ident_char(c: char) -> bool {
    c == '_' || c == '-' || c.is_ascii_alphanumeric()
}

struct Parser<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Parser<'a> {
    fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    fn parse(&mut self) -> std::result::Result<Path, String> {
        let mut segments = Vec::new();
        self.skip_ws();
        if self.eof() {
            return Err("empty path".into());
        }
        loop {
            if self.consume_char('[') {
                segments.push(self.parse_bracket()?);
            } else {
                let key = self.parse_identifier()?;
                segments.push(Segment::Key(key));
            }
            if self.eof() {
                break;
            }
            if self.consume_char('.') {
                if self.eof() {
                    return Err("trailing `.`".into());
                }
                continue;
            }
            if self.peek_char() == Some('[') {
                continue;
            }
            return Err(format!("unexpected character at offset {}", self.i));
        }
        Ok(Path {
            segments,
            raw: self.s.to_string(),
        })
    }

    fn parse_bracket(&mut self) -> std::result::Result<Segment, String> {
        self.skip_ws();
        let seg = if self.peek_char() == Some('\'') || self.peek_char() == Some('"') {
            Segment::Key(self.parse_quoted_string()?)
        } else {
            let body = self.capture_until(']')?.trim().to_string();
            if body.is_empty() {
                return Err("empty bracket segment".into());
            }
            if body.chars().all(|c| c.is_ascii_digit()) {
                let idx = body
                    .parse::<usize>()
                    .map_err(|_| "bad array index".to_string())?;
                Segment::Index(idx)
            } else if body.chars().all(is_ident_char) {
                Segment::Key(body)
            } else {
                return Err(format!("bad bracket segment `{body}`"));
            }
        };
        self.expect(']')?;
        Ok(seg)
    }

    fn parse_identifier(&mut self) -> std::result::Result<String, String> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if is_ident_char(c) {
                self.i += 1;
            } else {
                break;
            }
        }
        if self.i == start {
            return Err("identifier expected".into());
        }
        Ok(self.s[start..self.i].to_string())
    }

    fn parse_quoted_string(&mut self) -> std::result::Result<String, String> {
        let quote = self.peek_char().ok_or_else(|| "string expected".to_string())?;
        self.i += 1;
        let mut out = String::new();
        while let Some(c) = self.peek_char() {
            self.i += c.len_utf8();
            if c == quote {
                return Ok(out);
            }
            if c == '\\' {
                if let Some(nc) = self.peek_char() {
                    self.i += nc.len_utf8();
                    match nc {
                        '\\' => out.push('\\'),
                        '"' => out.push('"'),
                        '\'' => out.push('\''),
                        _ => {
                            out.push('\\');
                            out.push(nc);
                        }
                    }
                } else {
                    break;
                }
            } else {
                out.push(c);
            }
        }
        Err("unterminated string".into())
    }

    fn capture_until(&mut self, end: char) -> std::result::Result<&'a str, String> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == end {
                break;
            }
            self.i += c.len_utf8();
        }
        if self.peek_char() != Some(end) {
            return Err(format!("expected '{end}'"));
        }
        Ok(&self.s[start..self.i])
    }

    fn expect(&mut self, c: char) -> std::result::Result<(), String> {
        if self.consume_char(c) {
            Ok(())
        } else {
            Err(format!("expected '{c}'"))
        }
    }

    fn consume_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.i += 1;
            true
        } else {
            false
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.s[self.i..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.i += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn eof(&self) -> bool {
        self.i >= self.s.len()
    }
}

/// Read the value at `path`, or None when any container along the way is
/// missing or of the wrong shape.
pub fn get<'a>(tree: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = tree;
    for seg in &path.segments {
        current = match (seg, current) {
            (Segment::Key(k), Value::Object(map)) => map.get(k)?,
            (Segment::Index(i), Value::Array(arr)) => arr.get(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

/// True when every container along `path` exists and the final key/index is
/// present, even if the stored value is null.
pub fn has(tree: &Value, path: &Path) -> bool {
    get(tree, path).is_some()
}

/// Write `value` at `path`, creating intermediate containers as needed: an
/// index segment creates an array (padded with nulls), a key segment creates
/// an object. A scalar in the way is replaced by the needed container.
pub fn set(tree: &mut Value, path: &Path, value: Value) {
    let mut current = tree;
    let last = path.segments.len() - 1;
    for (depth, seg) in path.segments.iter().enumerate() {
        match seg {
            Segment::Key(k) => {
                if !current.is_object() {
                    *current = Value::Object(serde_json::Map::new());
                }
                let map = current.as_object_mut().unwrap();
                if depth == last {
                    map.insert(k.clone(), value);
                    return;
                }
                current = map.entry(k.clone()).or_insert(Value::Null);
            }
            Segment::Index(i) => {
                if !current.is_array() {
                    *current = Value::Array(Vec::new());
                }
                let arr = current.as_array_mut().unwrap();
                while arr.len() <= *i {
                    arr.push(Value::Null);
                }
                if depth == last {
                    arr[*i] = value;
                    return;
                }
                current = &mut arr[*i];
            }
        }
    }
}
