use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::CanonicalValue;

/// Write the canonical encoding of `value` into `out`.
pub fn write(value: &CanonicalValue, out: &mut Vec<u8>) {
    match value {
        CanonicalValue::Bool(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        CanonicalValue::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
        CanonicalValue::String(s) => write_string(s, out),
        CanonicalValue::Bytes(b) => write_string(&URL_SAFE_NO_PAD.encode(b), out),
        CanonicalValue::Array(items) => {
            out.push(b'[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(b',');
                }
                write(item, out);
            }
            out.push(b']');
        }
        CanonicalValue::Object(map) => {
            out.push(b'{');
            for (idx, (key, value)) in map.iter().enumerate() {
                if idx > 0 {
                    out.push(b',');
                }
                write_string(key, out);
                out.push(b':');
                write(value, out);
            }
            out.push(b'}');
        }
    }
}

/// Write a JSON string literal, escaping the minimal required set of
/// characters (`"`, `\`, and control characters).
fn write_string(s: &str, out: &mut Vec<u8>) {
    out.push(b'"');
    for ch in s.chars() {
        match ch {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            c if (c as u32) < 0x20 => {
                out.extend_from_slice(format!("\\u{:04x}", c as u32).as_bytes());
            }
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    out.push(b'"');
}
