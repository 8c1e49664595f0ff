use std::collections::BTreeMap;

use crate::{CanonError, CanonicalValue};

/// Parse canonical bytes (the output of [`CanonicalValue::encode`]) back
/// into a [`CanonicalValue`], rejecting duplicate object keys.
///
/// This is a small recursive-descent parser over the strict canonical
/// grammar (no insignificant whitespace) rather than a general JSON
/// parser, since the only legitimate input is our own encoder's output.
pub fn parse(bytes: &[u8]) -> Result<CanonicalValue, CanonError> {
    let mut p = Parser { input: bytes, pos: 0 };
    let value = p.parse_value()?;
    if p.pos != p.input.len() {
        return Err(CanonError::Malformed("trailing bytes after value".to_string()));
    }
    Ok(value)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn expect(&mut self, byte: u8) -> Result<(), CanonError> {
        match self.bump() {
            Some(b) if b == byte => Ok(()),
            other => Err(CanonError::Malformed(format!(
                "expected {:?}, got {:?}",
                byte as char,
                other.map(|b| b as char)
            ))),
        }
    }

    fn parse_value(&mut self) -> Result<CanonicalValue, CanonError> {
        match self.peek() {
            Some(b'{') => self.parse_object(),
            Some(b'[') => self.parse_array(),
            Some(b'"') => Ok(CanonicalValue::String(self.parse_string()?)),
            Some(b't') | Some(b'f') => self.parse_bool(),
            Some(b'-') | Some(b'0'..=b'9') => self.parse_integer(),
            other => Err(CanonError::Malformed(format!(
                "unexpected byte {:?}",
                other.map(|b| b as char)
            ))),
        }
    }

    fn parse_object(&mut self) -> Result<CanonicalValue, CanonError> {
        self.expect(b'{')?;
        let mut map = BTreeMap::new();
        if self.peek() == Some(b'}') {
            self.bump();
            return Ok(CanonicalValue::Object(map));
        }
        loop {
            let key = self.parse_string()?;
            self.expect(b':')?;
            let value = self.parse_value()?;
            if map.insert(key.clone(), value).is_some() {
                return Err(CanonError::DuplicateKey(key));
            }
            match self.bump() {
                Some(b',') => continue,
                Some(b'}') => break,
                other => {
                    return Err(CanonError::Malformed(format!(
                        "expected ',' or '}}', got {:?}",
                        other.map(|b| b as char)
                    )))
                }
            }
        }
        Ok(CanonicalValue::Object(map))
    }

    fn parse_array(&mut self) -> Result<CanonicalValue, CanonError> {
        self.expect(b'[')?;
        let mut items = Vec::new();
        if self.peek() == Some(b']') {
            self.bump();
            return Ok(CanonicalValue::Array(items));
        }
        loop {
            items.push(self.parse_value()?);
            match self.bump() {
                Some(b',') => continue,
                Some(b']') => break,
                other => {
                    return Err(CanonError::Malformed(format!(
                        "expected ',' or ']', got {:?}",
                        other.map(|b| b as char)
                    )))
                }
            }
        }
        Ok(CanonicalValue::Array(items))
    }

    fn parse_bool(&mut self) -> Result<CanonicalValue, CanonError> {
        if self.input[self.pos..].starts_with(b"true") {
            self.pos += 4;
            Ok(CanonicalValue::Bool(true))
        } else if self.input[self.pos..].starts_with(b"false") {
            self.pos += 5;
            Ok(CanonicalValue::Bool(false))
        } else {
            Err(CanonError::Malformed("invalid literal".to_string()))
        }
    }

    fn parse_integer(&mut self) -> Result<CanonicalValue, CanonError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.bump();
        }
        let digits_start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.bump();
        }
        if self.pos == digits_start {
            return Err(CanonError::Malformed("expected digits".to_string()));
        }
        let text = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|e| CanonError::Malformed(e.to_string()))?;
        text.parse::<i64>()
            .map(CanonicalValue::Integer)
            .map_err(|e| CanonError::Malformed(e.to_string()))
    }

    fn parse_string(&mut self) -> Result<String, CanonError> {
        self.expect(b'"')?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(b'"') => break,
                Some(b'\\') => match self.bump() {
                    Some(b'"') => out.push('"'),
                    Some(b'\\') => out.push('\\'),
                    Some(b'/') => out.push('/'),
                    Some(b'n') => out.push('\n'),
                    Some(b'r') => out.push('\r'),
                    Some(b't') => out.push('\t'),
                    Some(b'u') => {
                        if self.pos + 4 > self.input.len() {
                            return Err(CanonError::Malformed("truncated \\u escape".to_string()));
                        }
                        let hex = std::str::from_utf8(&self.input[self.pos..self.pos + 4])
                            .map_err(|e| CanonError::Malformed(e.to_string()))?;
                        let code = u32::from_str_radix(hex, 16)
                            .map_err(|e| CanonError::Malformed(e.to_string()))?;
                        self.pos += 4;
                        out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                    }
                    other => {
                        return Err(CanonError::Malformed(format!(
                            "invalid escape {:?}",
                            other.map(|b| b as char)
                        )))
                    }
                },
                Some(b) if b < 0x80 => out.push(b as char),
                Some(b) => {
                    // Multi-byte UTF-8 sequence: walk it through manually.
                    let len = utf8_len(b)?;
                    let start = self.pos - 1;
                    for _ in 1..len {
                        self.bump();
                    }
                    let slice = &self.input[start..self.pos];
                    let s = std::str::from_utf8(slice)
                        .map_err(|e| CanonError::Malformed(e.to_string()))?;
                    out.push_str(s);
                }
                None => return Err(CanonError::Malformed("unterminated string".to_string())),
            }
        }
        Ok(out)
    }
}

fn utf8_len(first_byte: u8) -> Result<usize, CanonError> {
    if first_byte & 0b1110_0000 == 0b1100_0000 {
        Ok(2)
    } else if first_byte & 0b1111_0000 == 0b1110_0000 {
        Ok(3)
    } else if first_byte & 0b1111_1000 == 0b1111_0000 {
        Ok(4)
    } else {
        Err(CanonError::Malformed("invalid utf-8 lead byte".to_string()))
    }
}
