//! Canonical JSON bytes: the single serialization-for-signing implementation.
//!
//! **Exactly one place** produces canonical JSON bytes in the kernel. The
//! signer and the verifier both route through [`canonical_json_bytes`]; any
//! divergence between the two silently invalidates every bundle signed before
//! it was introduced.
//!
//! # Canonicalization rules
//!
//! 1. Object keys are sorted lexicographically (byte order, which for UTF-8 is
//!    also Unicode code point order).
//! 2. No extraneous whitespace (compact form: `{"a":1,"b":2}`).
//! 3. Strings are JSON-escaped and the output is pure ASCII: `\"`, `\\`,
//!    `\n`, `\r`, `\t`, `\b`, `\f` use short escapes, every other code point
//!    below U+0020 or at/above U+007F becomes `\uXXXX` (lowercase hex), and
//!    code points above U+FFFF become a UTF-16 surrogate pair.
//! 4. A number literal without fraction or exponent is an integer of any
//!    width, written with all its digits (`-0` becomes `0`). Every other
//!    literal is a float, written with the shortest round-trip digits:
//!    positional when the decimal exponent is in `-4..16` (always with a
//!    fractional part, `1.0`), scientific otherwise (`1e-05`, `1e+16`).
//!    Parsing relies on serde_json's `float_roundtrip` and
//!    `arbitrary_precision` features; without them reloaded floats can drift
//!    by one ulp and wide integers collapse to floats.
//! 5. `null`, `true`, `false` are written literally.
//!
//! These rules reproduce the byte output of the reference signer
//! (`sort_keys=True`, `separators=(",", ":")`, ASCII escaping), so bundles
//! produced by the existing tooling verify unchanged.
//!
//! # Storage form
//!
//! [`storage_json_bytes`] renders the same value with two-space indentation
//! and `": "` separators. It is the on-disk layout of `.signed` files and is
//! **never** signed or verified.

use std::io::Write;

/// Produce canonical JSON bytes from a `serde_json::Value`.
///
/// This is the single canonical JSON implementation in the kernel.
/// Signing, verification and request bodies built from JSON must use it.
#[must_use]
pub fn canonical_json_bytes(value: &serde_json::Value) -> Vec<u8> {
    let mut buf = Vec::new();
    write_value(&mut buf, value, Layout::Compact, 0);
    buf
}

/// Produce the human-readable storage form of a value (sorted keys,
/// two-space indent, `", "`/`": "` separators, no trailing newline).
#[must_use]
pub fn storage_json_bytes(value: &serde_json::Value) -> Vec<u8> {
    let mut buf = Vec::new();
    write_value(&mut buf, value, Layout::Storage, 0);
    buf
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Layout {
    Compact,
    Storage,
}

const INDENT: &[u8] = b"  ";

fn write_value(buf: &mut Vec<u8>, value: &serde_json::Value, layout: Layout, depth: usize) {
    match value {
        serde_json::Value::Null => {
            buf.extend_from_slice(b"null");
        }
        serde_json::Value::Bool(b) => {
            if *b {
                buf.extend_from_slice(b"true");
            } else {
                buf.extend_from_slice(b"false");
            }
        }
        serde_json::Value::Number(n) => {
            write_number(buf, n);
        }
        serde_json::Value::String(s) => {
            write_string(buf, s);
        }
        serde_json::Value::Array(arr) => {
            if arr.is_empty() {
                buf.extend_from_slice(b"[]");
                return;
            }
            buf.push(b'[');
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                open_line(buf, layout, depth + 1);
                write_value(buf, item, layout, depth + 1);
            }
            open_line(buf, layout, depth);
            buf.push(b']');
        }
        serde_json::Value::Object(map) => {
            if map.is_empty() {
                buf.extend_from_slice(b"{}");
                return;
            }
            // Sorted keys (lexicographic byte order).
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            buf.push(b'{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                open_line(buf, layout, depth + 1);
                write_string(buf, key);
                match layout {
                    Layout::Compact => buf.push(b':'),
                    Layout::Storage => buf.extend_from_slice(b": "),
                }
                write_value(buf, &map[*key], layout, depth + 1);
            }
            open_line(buf, layout, depth);
            buf.push(b'}');
        }
    }
}

fn open_line(buf: &mut Vec<u8>, layout: Layout, depth: usize) {
    if layout == Layout::Storage {
        buf.push(b'\n');
        for _ in 0..depth {
            buf.extend_from_slice(INDENT);
        }
    }
}

/// Numbers follow their source literal: an integer literal stays an
/// integer of any width, anything with a fraction or exponent is a float.
fn write_number(buf: &mut Vec<u8>, n: &serde_json::Number) {
    let literal = n.to_string();
    if literal.contains(['.', 'e', 'E']) {
        match n.as_f64().or_else(|| literal.parse().ok()) {
            Some(f) => write_float(buf, f),
            None => buf.extend_from_slice(literal.as_bytes()),
        }
        return;
    }
    // Integer zero has no sign.
    match literal.strip_prefix('-') {
        Some(digits) if digits.bytes().all(|b| b == b'0') => buf.push(b'0'),
        _ => buf.extend_from_slice(literal.as_bytes()),
    }
}

/// Shortest round-trip float rendering with a decimal exponent window of
/// `-4..16` for positional notation.
fn write_float(buf: &mut Vec<u8>, f: f64) {
    if !f.is_finite() {
        let word: &[u8] = if f.is_nan() {
            b"NaN"
        } else if f.is_sign_negative() {
            b"-Infinity"
        } else {
            b"Infinity"
        };
        buf.extend_from_slice(word);
        return;
    }
    if f == 0.0 {
        let zero: &[u8] = if f.is_sign_negative() { b"-0.0" } else { b"0.0" };
        buf.extend_from_slice(zero);
        return;
    }
    if f.is_sign_negative() {
        buf.push(b'-');
    }

    // `{:e}` yields the shortest digits that round-trip, e.g. "1.25e1".
    let sci = format!("{:e}", f.abs());
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let n_digits = i32::try_from(digits.len()).unwrap_or(i32::MAX);

    if !(-4..16).contains(&exponent) {
        let (lead, rest) = digits.split_at(1);
        buf.extend_from_slice(lead.as_bytes());
        if !rest.is_empty() {
            buf.push(b'.');
            buf.extend_from_slice(rest.as_bytes());
        }
        let sign = if exponent < 0 { '-' } else { '+' };
        let _ = write!(buf, "e{sign}{:02}", exponent.unsigned_abs());
        return;
    }

    // Position of the decimal point relative to the first digit.
    let point = exponent + 1;
    if point <= 0 {
        buf.extend_from_slice(b"0.");
        for _ in 0..(-point) {
            buf.push(b'0');
        }
        buf.extend_from_slice(digits.as_bytes());
    } else if point >= n_digits {
        buf.extend_from_slice(digits.as_bytes());
        for _ in 0..(point - n_digits) {
            buf.push(b'0');
        }
        buf.extend_from_slice(b".0");
    } else {
        let split = usize::try_from(point).unwrap_or(0);
        let (int_part, frac_part) = digits.split_at(split);
        buf.extend_from_slice(int_part.as_bytes());
        buf.push(b'.');
        buf.extend_from_slice(frac_part.as_bytes());
    }
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for ch in s.chars() {
        match ch {
            '"' => buf.extend_from_slice(b"\\\""),
            '\\' => buf.extend_from_slice(b"\\\\"),
            '\n' => buf.extend_from_slice(b"\\n"),
            '\r' => buf.extend_from_slice(b"\\r"),
            '\t' => buf.extend_from_slice(b"\\t"),
            '\u{0008}' => buf.extend_from_slice(b"\\b"),
            '\u{000c}' => buf.extend_from_slice(b"\\f"),
            ' '..='~' => buf.push(ch as u8),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(buf, "\\u{unit:04x}");
                }
            }
        }
    }
    buf.push(b'"');
}
