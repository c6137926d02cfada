//! CTF decoding.
//!
//! This module holds the decoder that rebuilds a [`Value`] from CTF text,
//! and [`ValueDeserializer`], which feeds a [`Value`] to any
//! `T: Deserialize`.
//!
//! ## Overview
//!
//! Decoding runs in two phases over the input's lines:
//!
//! 1. **References**: leading `^id=value` lines (and blank lines) fill the
//!    reference table.
//! 2. **Structure**: recursive descent driven by indentation. A `key:` line
//!    with nothing after the colon opens a nested object whose level is set
//!    by its first child line; `key@n…:` headers hand the following lines to
//!    the tabular, columnar or list reader.
//!
//! The first error aborts the decode; no partial value is returned.
//!
//! ## Usage
//!
//! ```rust
//! use ctf_format::{ctf, decode, Error};
//!
//! let value = decode("user:\n  name:Ann\n  tags:[a b]").unwrap();
//! assert_eq!(value, ctf!({"user": {"name": "Ann", "tags": ["a", "b"]}}));
//!
//! // Three rows declared, two present.
//! let err = decode("users@3|id,name:\n1|Alice\n2|Bob").unwrap_err();
//! assert!(matches!(err, Error::Validation { .. }));
//! ```

use crate::escape;
use crate::references::ReferenceManager;
use crate::ser::{LIST_KEY, ROOT_KEY};
use crate::{DecodeOptions, Error, Result, Value, ValueMap};
use serde::de::IntoDeserializer;
use serde::{de, forward_to_deserialize_any};
use std::collections::HashMap;

/// Decodes `input` into a value.
pub(crate) fn decode_str(input: &str, options: DecodeOptions) -> Result<Value> {
    let mut decoder = Decoder::new(input, options);
    decoder.read_references();
    let root = decoder.parse_object(None)?;

    if let Some(pos) = decoder.next_nonblank() {
        if options.strict {
            return Err(Error::parse_at(pos + 1, "Unexpected indentation"));
        }
        log::debug!("ignoring trailing lines from line {}", pos + 1);
    }

    if root.is_empty() {
        return Ok(Value::Object(root));
    }
    Ok(match finish_object(root) {
        Value::Object(mut map)
            if map.len() == 1 && map.get(ROOT_KEY).is_some_and(|v| !v.is_object()) =>
        {
            map.remove(ROOT_KEY).unwrap_or(Value::Null)
        }
        other => other,
    })
}

/// An accumulated object becomes `null` when empty, and its value when its
/// only key is `-`.
fn finish_object(mut map: ValueMap) -> Value {
    if map.is_empty() {
        Value::Null
    } else if map.len() == 1 && map.contains_key(LIST_KEY) {
        map.remove(LIST_KEY).unwrap_or(Value::Null)
    } else {
        Value::Object(map)
    }
}

/// Leading indentation in columns; a tab counts as two.
fn indent_of(line: &str) -> usize {
    line.chars()
        .map_while(|c| match c {
            ' ' => Some(1),
            '\t' => Some(2),
            _ => None,
        })
        .sum()
}

fn strip_indent(line: &str) -> &str {
    line.trim_start_matches(|c| c == ' ' || c == '\t')
}

/// Splits a line body into its key and the rest, which starts at the `:` or
/// `@` that ends the key.
fn split_key(content: &str) -> Option<(String, &str)> {
    if content.starts_with('"') {
        let end = escape::quoted_len(content)?;
        let key = escape::unescape(&content[..end])?;
        Some((key, &content[end..]))
    } else {
        let end = content.find(|c| c == ':' || c == '@')?;
        Some((content[..end].to_string(), &content[end..]))
    }
}

/// Parses `^id=value` with a positive integer id and a non-empty value.
fn parse_definition(line: &str) -> Option<(u32, &str)> {
    let (id, value) = line.strip_prefix('^')?.split_once('=')?;
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) || value.is_empty() {
        return None;
    }
    let id = id.parse::<u32>().ok().filter(|&id| id >= 1)?;
    Some((id, value))
}

fn parse_fields(spec: &str, line_no: usize) -> Result<Vec<String>> {
    let list = spec
        .strip_suffix(':')
        .ok_or_else(|| Error::parse_at(line_no, "Expected ':' in line"))?;
    Ok(escape::split_quoted(list, ',')
        .into_iter()
        .map(|field| escape::unescape_if_quoted(field.trim()))
        .collect())
}

/// `[a..b]` column data.
fn parse_range(inner: &str) -> Option<(i64, i64)> {
    let (lo, hi) = inner.split_once("..")?;
    let lo = lo.trim().parse::<i64>().ok()?;
    let hi = hi.trim().parse::<i64>().ok()?;
    (lo <= hi).then_some((lo, hi))
}

struct Decoder<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    options: DecodeOptions,
    refs: ReferenceManager,
}

impl<'a> Decoder<'a> {
    fn new(input: &'a str, options: DecodeOptions) -> Self {
        Decoder {
            lines: input.split('\n').map(str::trim_end).collect(),
            pos: 0,
            options,
            refs: ReferenceManager::new(),
        }
    }

    fn read_references(&mut self) {
        while let Some(&line) = self.lines.get(self.pos) {
            if line.is_empty() {
                self.pos += 1;
                continue;
            }
            match parse_definition(line) {
                Some((id, value)) => {
                    self.refs.define(id, escape::unescape_if_quoted(value));
                    self.pos += 1;
                }
                None => break,
            }
        }
        log::debug!("read {} reference definitions", self.refs.len());
    }

    /// Skips blank lines and returns the index of the next line, if any.
    fn next_nonblank(&mut self) -> Option<usize> {
        while let Some(line) = self.lines.get(self.pos) {
            if !line.trim().is_empty() {
                return Some(self.pos);
            }
            self.pos += 1;
        }
        None
    }

    /// Reads the entries of one object. The level is the indent of the first
    /// entry, which must be deeper than `parent`; reading stops at any line on
    /// another level.
    fn parse_object(&mut self, parent: Option<usize>) -> Result<ValueMap> {
        let mut map = ValueMap::new();
        let mut level = None;

        while let Some(pos) = self.next_nonblank() {
            let indent = indent_of(self.lines[pos]);
            match level {
                None if parent.is_some_and(|p| indent <= p) => break,
                None => level = Some(indent),
                Some(l) if l != indent => break,
                Some(_) => {}
            }
            let (key, value) = self.parse_entry(indent)?;
            map.insert(key, value);
        }

        Ok(map)
    }

    /// Parses the entry on the current line, consuming every line that
    /// belongs to it.
    fn parse_entry(&mut self, indent: usize) -> Result<(String, Value)> {
        let line_no = self.pos + 1;
        let content = strip_indent(self.lines[self.pos]);
        let (key, rest) =
            split_key(content).ok_or_else(|| Error::parse_at(line_no, "Expected ':' in line"))?;
        self.pos += 1;

        if let Some(value_part) = rest.strip_prefix(':') {
            let value_part = value_part.trim();
            let value = if value_part.is_empty() {
                finish_object(self.parse_object(Some(indent))?)
            } else {
                self.parse_primitive(value_part)
                    .map_err(|e| e.at_line(line_no))?
            };
            Ok((key, value))
        } else if let Some(header) = rest.strip_prefix('@') {
            let value = self.parse_array(&key, header, indent, line_no)?;
            Ok((key, value))
        } else {
            Err(Error::parse_at(line_no, "Expected ':' in line"))
        }
    }

    fn parse_array(
        &mut self,
        key: &str,
        header: &str,
        indent: usize,
        line_no: usize,
    ) -> Result<Value> {
        let digits = header
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(header.len());
        let count: usize = header[..digits].parse().map_err(|_| {
            Error::parse_at(line_no, format!("Invalid array length for '{}'", key))
        })?;
        let rest = &header[digits..];

        if let Some(spec) = rest.strip_prefix("||") {
            let fields = parse_fields(spec, line_no)?;
            self.parse_columnar(key, count, &fields, indent)
        } else if rest == ":" {
            self.parse_list(key, count, indent)
        } else {
            match rest.chars().next() {
                Some(delimiter @ ('|' | ',' | '\t')) => {
                    let fields = parse_fields(&rest[1..], line_no)?;
                    self.parse_tabular(key, count, delimiter, &fields)
                }
                _ => Err(Error::parse_at(line_no, "Invalid array header")),
            }
        }
    }

    fn check_count(&self, key: &str, declared: usize, found: usize) -> Result<()> {
        if found < declared {
            if self.options.enforces_counts() {
                return Err(Error::validation(format!(
                    "Array '{}' declares {} items but only {} found",
                    key, declared, found
                )));
            }
            log::debug!("array '{}' truncated to {} of {} items", key, found, declared);
        }
        Ok(())
    }

    fn parse_tabular(
        &mut self,
        key: &str,
        count: usize,
        delimiter: char,
        fields: &[String],
    ) -> Result<Value> {
        let mut rows = Vec::with_capacity(count.min(self.lines.len() - self.pos));

        while rows.len() < count {
            let Some(&line) = self.lines.get(self.pos) else {
                break;
            };
            let line_no = self.pos + 1;
            self.pos += 1;

            if line.trim().is_empty() {
                if self.options.strict {
                    return Err(Error::parse_at(line_no, "Blank row in tabular array"));
                }
                continue;
            }

            let cells = escape::split_quoted(strip_indent(line), delimiter);
            if cells.len() != fields.len() {
                if self.options.strict {
                    return Err(Error::parse_at(
                        line_no,
                        format!("Expected {} fields, found {}", fields.len(), cells.len()),
                    ));
                }
                log::debug!("line {}: padding row of {} cells", line_no, cells.len());
            }

            let mut row = ValueMap::with_capacity(fields.len());
            for (i, field) in fields.iter().enumerate() {
                let value = match cells.get(i) {
                    Some(cell) => self.parse_primitive(cell).map_err(|e| e.at_line(line_no))?,
                    None => Value::String(String::new()),
                };
                row.insert(field.clone(), value);
            }
            rows.push(Value::Object(row));
        }

        self.check_count(key, count, rows.len())?;
        Ok(Value::Array(rows))
    }

    fn parse_list(&mut self, key: &str, count: usize, indent: usize) -> Result<Value> {
        let mut items = Vec::with_capacity(count.min(self.lines.len() - self.pos));
        let mut level = None;

        while items.len() < count {
            let Some(pos) = self.next_nonblank() else {
                break;
            };
            let entry_indent = indent_of(self.lines[pos]);
            if entry_indent <= indent || level.is_some_and(|l| l != entry_indent) {
                break;
            }
            level = Some(entry_indent);

            let (entry_key, value) = self.parse_entry(entry_indent)?;
            if entry_key != LIST_KEY {
                return Err(Error::parse_at(
                    pos + 1,
                    format!("Expected '-' entry in list '{}'", key),
                ));
            }
            items.push(value);
        }

        self.check_count(key, count, items.len())?;
        Ok(Value::Array(items))
    }

    fn parse_columnar(
        &mut self,
        key: &str,
        count: usize,
        fields: &[String],
        indent: usize,
    ) -> Result<Value> {
        let mut columns: HashMap<String, Vec<Value>> = HashMap::new();

        while let Some(pos) = self.next_nonblank() {
            let line = self.lines[pos];
            if indent_of(line) <= indent {
                break;
            }
            let line_no = pos + 1;
            let (field, rest) = strip_indent(line)
                .strip_prefix('|')
                .and_then(split_key)
                .ok_or_else(|| Error::parse_at(line_no, "Expected '|field:' column line"))?;
            let data = rest
                .strip_prefix(':')
                .ok_or_else(|| Error::parse_at(line_no, "Expected ':' in line"))?;
            self.pos += 1;

            let values = self
                .parse_column(data.trim(), count)
                .map_err(|e| e.at_line(line_no))?;
            if values.len() != count {
                if self.options.enforces_counts() {
                    return Err(Error::validation(format!(
                        "Column '{}' of '{}' has {} values, expected {}",
                        field,
                        key,
                        values.len(),
                        count
                    )));
                }
                log::debug!("column '{}' has {} of {} values", field, values.len(), count);
            }
            columns.insert(field, values);
        }

        if count > 0 && self.options.enforces_counts() {
            if let Some(missing) = fields.iter().find(|field| !columns.contains_key(*field)) {
                return Err(Error::validation(format!(
                    "Column '{}' of '{}' is missing",
                    missing, key
                )));
            }
        }

        // Rows never outnumber the longest column actually read.
        let available = columns.values().map(Vec::len).max().unwrap_or(0);
        let rows = (0..count.min(available))
            .map(|i| {
                let mut row = ValueMap::with_capacity(fields.len());
                for field in fields {
                    if let Some(value) = columns.get(field).and_then(|column| column.get(i)) {
                        row.insert(field.clone(), value.clone());
                    }
                }
                Value::Object(row)
            })
            .collect();
        Ok(Value::Array(rows))
    }

    /// Expands one column. Never produces more than `count + 1` values, so
    /// an over-long column is still detected without unbounded expansion.
    fn parse_column(&self, data: &str, count: usize) -> Result<Vec<Value>> {
        let inner = data
            .strip_prefix('[')
            .and_then(|d| d.strip_suffix(']'))
            .ok_or_else(|| Error::parse("Expected bracketed column data"))?;
        let limit = count.saturating_add(1);

        if let Some((lo, hi)) = parse_range(inner) {
            return Ok((lo..=hi).take(limit).map(|n| Value::Number(n as f64)).collect());
        }

        let mut values = Vec::new();
        if inner.trim().is_empty() {
            return Ok(values);
        }
        for item in escape::split_quoted(inner, ',') {
            let item = item.trim();
            match escape::rfind_unquoted(item, '=') {
                Some(eq) => {
                    let run: usize = item[eq + 1..]
                        .trim()
                        .parse()
                        .map_err(|_| Error::parse(format!("Invalid run length in '{}'", item)))?;
                    let value = self.parse_primitive(&item[..eq])?;
                    let room = limit - values.len();
                    values.extend(std::iter::repeat(value).take(run.min(room)));
                }
                None => values.push(self.parse_primitive(item)?),
            }
            if values.len() >= limit {
                break;
            }
        }
        Ok(values)
    }

    fn parse_primitive(&self, text: &str) -> Result<Value> {
        let text = text.trim();
        match text {
            "_" => return Ok(Value::Null),
            "+" => return Ok(Value::Bool(true)),
            "-" => return Ok(Value::Bool(false)),
            "{}" => return Ok(Value::Object(ValueMap::new())),
            _ => {}
        }

        if let Some(id) = text.strip_prefix('^') {
            let id: u32 = id
                .parse()
                .map_err(|_| Error::parse(format!("Invalid reference: {}", text)))?;
            return self
                .refs
                .get_value(id)
                .map(|s| Value::String(s.to_string()))
                .ok_or_else(|| Error::parse(format!("Undefined reference: ^{}", id)));
        }

        if text.len() >= 2 && text.starts_with('[') && text.ends_with(']') {
            return escape::split_whitespace_quoted(&text[1..text.len() - 1])
                .into_iter()
                .map(|token| self.parse_primitive(token))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array);
        }

        if text.starts_with('"') {
            if let Some(s) = escape::unescape(text) {
                return Ok(Value::String(s));
            }
        }

        if self.options.type_hints {
            if let Some(n) = escape::parse_number(text) {
                return Ok(Value::Number(n));
            }
        }

        Ok(Value::String(text.to_string()))
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(vec: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, Value>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(map: ValueMap) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer::new(Value::String(key)))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ValueDeserializer::new(Value::String(self.variant)))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Some(Value::Null) | None => Ok(()),
            _ => Err(Error::custom("Expected unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("Expected newtype variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Array(arr)) => visitor.visit_seq(SeqDeserializer::new(arr)),
            _ => Err(Error::custom("Expected tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Object(obj)) => visitor.visit_map(MapDeserializer::new(obj)),
            _ => Err(Error::custom("Expected struct variant")),
        }
    }
}

/// Deserializer reading from an owned [`Value`].
///
/// Whole numbers are offered to visitors as `i64`, other numbers as `f64`.
///
/// # Examples
///
/// ```rust
/// use ctf_format::{ctf, de::ValueDeserializer};
/// use serde::Deserialize;
///
/// #[derive(Deserialize, Debug, PartialEq)]
/// struct Point { x: i32, y: i32 }
///
/// let point = Point::deserialize(ValueDeserializer::new(ctf!({"x": 1, "y": 2}))).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
pub struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    #[must_use]
    pub fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(n) => match crate::value::whole_number(n) {
                Some(i) => visitor.visit_i64(i),
                None => visitor.visit_f64(n),
            },
            Value::String(s) => visitor.visit_string(s),
            Value::Array(arr) => visitor.visit_seq(SeqDeserializer::new(arr)),
            Value::Object(obj) => visitor.visit_map(MapDeserializer::new(obj)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(s) => visitor.visit_enum(s.into_deserializer()),
            Value::Object(obj) if obj.len() == 1 => {
                let mut entries = obj.into_iter();
                match entries.next() {
                    Some((variant, value)) => visitor.visit_enum(EnumDeserializer {
                        variant,
                        value: Some(value),
                    }),
                    None => Err(Error::custom("Expected enum variant")),
                }
            }
            _ => Err(Error::custom("Expected enum")),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctf;

    fn decode(input: &str) -> Result<Value> {
        decode_str(input, DecodeOptions::default())
    }

    fn lenient(input: &str) -> Result<Value> {
        decode_str(input, DecodeOptions::new().with_strict(false))
    }

    #[test]
    fn test_tabular_scenario() {
        let value = decode("users@3|id,name,role:\n1|Alice|admin\n2|Bob|user\n3|Charlie|dev").unwrap();
        assert_eq!(
            value,
            ctf!({"users": [
                {"id": 1, "name": "Alice", "role": "admin"},
                {"id": 2, "name": "Bob", "role": "user"},
                {"id": 3, "name": "Charlie", "role": "dev"}
            ]})
        );
    }

    #[test]
    fn test_reference_scenario() {
        let value = decode("^1=Engineering\n\nitems@3|dept:\n^1\n^1\n^1").unwrap();
        assert_eq!(
            value,
            ctf!({"items": [{"dept": "Engineering"}, {"dept": "Engineering"}, {"dept": "Engineering"}]})
        );
    }

    #[test]
    fn test_undefined_reference() {
        let err = decode("a:^7").unwrap_err();
        assert_eq!(err.line(), Some(1));
        assert!(err.to_string().contains("Undefined reference: ^7"));
    }

    #[test]
    fn test_missing_colon_reports_line() {
        let err = decode("a:1\nb 2").unwrap_err();
        assert!(matches!(err, Error::Parse { line: Some(2), .. }));
    }

    #[test]
    fn test_short_row_strict_and_lenient() {
        let input = "t@3|a,b:\n1|x\n2\n3|z";
        assert!(matches!(decode(input), Err(Error::Parse { line: Some(3), .. })));

        let value = lenient(input).unwrap();
        assert_eq!(
            value,
            ctf!({"t": [{"a": 1, "b": "x"}, {"a": 2, "b": ""}, {"a": 3, "b": "z"}]})
        );
    }

    #[test]
    fn test_blank_row_strict_and_lenient() {
        let input = "t@3|a:\n1\n\n2\n3";
        assert!(matches!(decode(input), Err(Error::Parse { line: Some(3), .. })));
        assert_eq!(lenient(input).unwrap(), ctf!({"t": [{"a": 1}, {"a": 2}, {"a": 3}]}));
    }

    #[test]
    fn test_missing_rows_validation() {
        let err = decode("t@3|a:\n1\n2").unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let relaxed = decode_str("t@3|a:\n1\n2", DecodeOptions::new().with_validate(false)).unwrap();
        assert_eq!(relaxed, ctf!({"t": [{"a": 1}, {"a": 2}]}));
    }

    #[test]
    fn test_nested_objects_and_unwinding() {
        let input = "a:\n  b:\n    c:1\n  d:2\ne:3";
        assert_eq!(
            decode(input).unwrap(),
            ctf!({"a": {"b": {"c": 1}, "d": 2}, "e": 3})
        );
    }

    #[test]
    fn test_empty_forms() {
        assert_eq!(decode("").unwrap(), ctf!({}));
        assert_eq!(decode("a:{}").unwrap(), ctf!({"a": {}}));
        assert_eq!(decode("a:\nb:1").unwrap(), ctf!({"a": null, "b": 1}));
        assert_eq!(decode("a@0:").unwrap(), ctf!({"a": []}));
        assert_eq!(decode("a:[]").unwrap(), ctf!({"a": []}));
    }

    #[test]
    fn test_list_entries() {
        let input = "m@3:\n  -:1\n  -:\n    k:v\n  -:[2 x]";
        assert_eq!(decode(input).unwrap(), ctf!({"m": [1, {"k": "v"}, [2, "x"]]}));

        let err = decode("m@3:\n  -:1").unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_columnar_forms() {
        let input = "r@4||id,s,n:\n  |id:[7..10]\n  |s:[a=2,\"b,c\"=1,a=1]\n  |n:[1.5,_,+,\"x\"]";
        assert_eq!(
            decode(input).unwrap(),
            ctf!({"r": [
                {"id": 7, "s": "a", "n": 1.5},
                {"id": 8, "s": "a", "n": null},
                {"id": 9, "s": "b,c", "n": true},
                {"id": 10, "s": "a", "n": "x"}
            ]})
        );
    }

    #[test]
    fn test_columnar_length_mismatch() {
        let input = "r@3||id:\n  |id:[1..5]";
        assert!(matches!(decode(input), Err(Error::Validation { .. })));
        let value = lenient(input).unwrap();
        assert_eq!(value, ctf!({"r": [{"id": 1}, {"id": 2}, {"id": 3}]}));
    }

    #[test]
    fn test_columnar_header_without_columns() {
        let input = "r@3000000||a:";
        assert!(matches!(decode(input), Err(Error::Validation { .. })));
        assert_eq!(lenient(input).unwrap(), ctf!({"r": []}));

        let input = "r@4||a,b:\n  |a:[1..2]";
        assert!(matches!(decode(input), Err(Error::Validation { .. })));
        assert_eq!(lenient(input).unwrap(), ctf!({"r": [{"a": 1}, {"a": 2}]}));
    }

    #[test]
    fn test_root_unwrap() {
        assert_eq!(decode("data:[1 2]").unwrap(), ctf!([1, 2]));
        assert_eq!(decode("data:x").unwrap(), Value::from("x"));
        assert_eq!(decode("data:\n  k:1").unwrap(), ctf!({"data": {"k": 1}}));
    }

    #[test]
    fn test_unexpected_indentation() {
        let input = "a:1\n    b:2";
        assert!(matches!(decode(input), Err(Error::Parse { line: Some(2), .. })));
        assert_eq!(lenient(input).unwrap(), ctf!({"a": 1}));
    }

    #[test]
    fn test_type_hints_off_keeps_strings() {
        let options = DecodeOptions::new().with_type_hints(false);
        assert_eq!(
            decode_str("n:42\nb:+", options).unwrap(),
            ctf!({"n": "42", "b": true})
        );
    }

    #[test]
    fn test_numeric_grammar_in_decoder() {
        assert_eq!(
            decode("a:NaN\nb:Infinity\nc:1e3").unwrap(),
            ctf!({"a": "NaN", "b": "Infinity", "c": 1000})
        );
    }

    #[test]
    fn test_quoted_keys_and_values() {
        let input = "\"a:b\":\"x|y\"\n\"@\"@2:\n  -:1\n  -:2";
        assert_eq!(decode(input).unwrap(), ctf!({"a:b": "x|y", "@": [1, 2]}));
    }

    #[test]
    fn test_tab_indentation_counts_two() {
        assert_eq!(decode("a:\n\tb:1\n  c:2").unwrap(), ctf!({"a": {"b": 1, "c": 2}}));
    }

    #[test]
    fn test_value_deserializer_options_and_enums() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        enum Shape {
            Unit,
            Circle(f64),
            Rect { w: u8, h: u8 },
        }

        let none: Option<i32> = de::Deserialize::deserialize(ValueDeserializer::new(Value::Null)).unwrap();
        assert_eq!(none, None);
        let some: Option<i32> = de::Deserialize::deserialize(ValueDeserializer::new(Value::from(3))).unwrap();
        assert_eq!(some, Some(3));

        let shapes: Vec<Shape> = de::Deserialize::deserialize(ValueDeserializer::new(ctf!([
            "Unit",
            {"Circle": 0.5},
            {"Rect": {"w": 1, "h": 2}}
        ])))
        .unwrap();
        assert_eq!(
            shapes,
            vec![Shape::Unit, Shape::Circle(0.5), Shape::Rect { w: 1, h: 2 }]
        );
    }
}
