//! CTF encoding.
//!
//! This module holds the encoder that turns a [`Value`] tree into CTF text,
//! and [`ValueSerializer`], which turns any `T: Serialize` into a [`Value`].
//!
//! ## Overview
//!
//! Each encode call first settles its choices (delimiter, reference table,
//! columnar eligibility) and then walks the tree once. Every array picks the
//! first encoding it qualifies for:
//!
//! - **Columnar**: 1000+ uniform rows with a repetitive field, one line per
//!   field holding a range, run-length or plain column
//! - **Tabular**: 3+ uniform objects with primitive values, a header and one
//!   row per element
//! - **Inline**: all primitives, `key:[a b c]`
//! - **List**: anything else, one `-` entry per element
//!
//! ## Usage
//!
//! ```rust
//! use ctf_format::{ctf, encode};
//!
//! let data = ctf!({
//!     "users": [
//!         {"id": 1, "name": "Alice"},
//!         {"id": 2, "name": "Bob"},
//!         {"id": 3, "name": "Carol"}
//!     ],
//!     "tags": ["a", "b"]
//! });
//!
//! assert_eq!(
//!     encode(&data),
//!     "users@3|id,name:\n  1|Alice\n  2|Bob\n  3|Carol\ntags:[a b]"
//! );
//! ```

use crate::escape;
use crate::optimizer;
use crate::references::ReferenceManager;
use crate::{EncodeOptions, Error, OptimizeLevel, Result, Toggle, Value, ValueMap};
use serde::{ser, Serialize};
use std::collections::HashSet;

/// Key under which a non-object root is emitted.
pub(crate) const ROOT_KEY: &str = "data";

/// Key of every list-array entry.
pub(crate) const LIST_KEY: &str = "-";

/// `Auto` references are built when the estimate exceeds this (balanced).
const REFERENCE_ESTIMATE_THRESHOLD: i64 = 50;

/// Encodes `value` with `options`. Total over finite, acyclic values.
pub(crate) fn encode_value(value: &Value, options: &EncodeOptions) -> String {
    let mut encoder = Encoder::new(value, options);
    match value {
        Value::Object(map) => {
            for (key, item) in map {
                encoder.emit(key, item, 0);
            }
        }
        other => encoder.emit(ROOT_KEY, other, 0),
    }
    encoder.finish()
}

/// State of a single encode call. Never reused.
struct Encoder {
    indent: usize,
    delimiter: char,
    columnar: bool,
    refs: ReferenceManager,
    lines: Vec<String>,
}

impl Encoder {
    fn new(value: &Value, options: &EncodeOptions) -> Self {
        let analysis = match options.optimize {
            OptimizeLevel::None => None,
            OptimizeLevel::Balanced | OptimizeLevel::Aggressive => Some(optimizer::analyze(value)),
        };

        let delimiter = options
            .delimiter
            .as_char()
            .or_else(|| {
                analysis
                    .as_ref()
                    .and_then(|a| optimizer::choose_delimiter(a).as_char())
            })
            .unwrap_or('|');

        let use_references = match options.references {
            Toggle::On => true,
            Toggle::Off => false,
            Toggle::Auto => analysis.as_ref().is_some_and(|a| {
                let estimate = optimizer::estimate_reference_savings(a);
                match options.optimize {
                    OptimizeLevel::Aggressive => estimate > 0,
                    _ => estimate > REFERENCE_ESTIMATE_THRESHOLD,
                }
            }),
        };

        let columnar = match options.columnar {
            Toggle::On => true,
            Toggle::Off => false,
            Toggle::Auto => options.optimize != OptimizeLevel::None,
        };

        let mut refs = ReferenceManager::new();
        if use_references {
            refs.build(value);
        }

        if let Some(analysis) = &analysis {
            log::debug!(
                "strategy {}, delimiter {:?}, references {} ({} entries), columnar {}",
                optimizer::recommend_strategy(analysis),
                delimiter,
                use_references,
                refs.len(),
                columnar
            );
        }

        Encoder {
            indent: options.indent.max(1) as usize,
            delimiter,
            columnar,
            refs,
            lines: Vec::new(),
        }
    }

    fn finish(self) -> String {
        let definitions = self.refs.definitions();
        let mut out = Vec::with_capacity(definitions.len() + 1 + self.lines.len());
        if !definitions.is_empty() {
            out.extend(definitions);
            out.push(String::new());
        }
        out.extend(self.lines);
        out.join("\n")
    }

    fn push(&mut self, depth: usize, text: String) {
        let width = depth * self.indent;
        self.lines.push(format!("{:width$}{}", "", text, width = width));
    }

    fn emit(&mut self, key: &str, value: &Value, depth: usize) {
        let key = escape::format_key(key);
        match value {
            Value::Array(items) => self.emit_array(&key, items, depth),
            Value::Object(map) if map.is_empty() => self.push(depth, format!("{}:{{}}", key)),
            Value::Object(map) => {
                self.push(depth, format!("{}:", key));
                for (child_key, child) in map {
                    self.emit(child_key, child, depth + 1);
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                let text = self.scalar(value);
                self.push(depth, format!("{}:{}", key, text));
            }
        }
    }

    fn emit_array(&mut self, key: &str, items: &[Value], depth: usize) {
        if items.is_empty() {
            self.push(depth, format!("{}@0:", key));
            return;
        }

        if let Some(fields) = optimizer::tabular_fields(items) {
            if self.columnar && optimizer::is_columnar(items, &fields) {
                log::trace!("{}: columnar ({} rows)", key, items.len());
                self.emit_columnar(key, items, &fields, depth);
            } else {
                log::trace!("{}: tabular ({} rows)", key, items.len());
                self.emit_tabular(key, items, &fields, depth);
            }
        } else if items.iter().all(Value::is_primitive) {
            let body: Vec<String> = items.iter().map(|item| self.inline_scalar(item)).collect();
            self.push(depth, format!("{}:[{}]", key, body.join(" ")));
        } else {
            log::trace!("{}: list ({} entries)", key, items.len());
            self.push(depth, format!("{}@{}:", key, items.len()));
            for item in items {
                self.emit(LIST_KEY, item, depth + 1);
            }
        }
    }

    fn emit_tabular(&mut self, key: &str, items: &[Value], fields: &[&String], depth: usize) {
        self.push(
            depth,
            format!("{}@{}{}{}:", key, items.len(), self.delimiter, header(fields)),
        );

        let delimiter = self.delimiter.to_string();
        for row in items.iter().filter_map(Value::as_object) {
            let cells: Vec<String> = fields
                .iter()
                .map(|field| row.get(field).map_or_else(|| "_".to_string(), |v| self.scalar(v)))
                .collect();
            self.push(depth + 1, cells.join(&delimiter));
        }
    }

    fn emit_columnar(&mut self, key: &str, items: &[Value], fields: &[&String], depth: usize) {
        self.push(depth, format!("{}@{}||{}:", key, items.len(), header(fields)));

        for field in fields {
            let column: Vec<&Value> = items
                .iter()
                .filter_map(|item| item.as_object()?.get(field))
                .collect();
            let data = self.column(&column);
            self.push(depth + 1, format!("|{}:{}", escape::format_key(field), data));
        }
    }

    /// Range when the column counts up by one, run-length pairs when fewer
    /// than 30% of the values are distinct and the runs are at most half as
    /// many as the values, a plain list otherwise.
    fn column(&self, values: &[&Value]) -> String {
        if let Some((lo, hi)) = contiguous_range(values) {
            return format!("[{}..{}]", lo, hi);
        }

        let distinct: HashSet<String> = values
            .iter()
            .map(|value| escape::format_primitive(value))
            .collect();

        if distinct.len() * 10 < values.len() * 3 {
            let runs = runs(values);
            if runs.len() * 2 <= values.len() {
                let body: Vec<String> = runs
                    .into_iter()
                    .map(|(value, count)| format!("{}={}", self.run_value(value), count))
                    .collect();
                return format!("[{}]", body.join(","));
            }
        }

        let body: Vec<String> = values.iter().map(|value| self.scalar(value)).collect();
        format!("[{}]", body.join(","))
    }

    /// Run values are written `"v"=n`: strings are always quoted unless
    /// they are referenced.
    fn run_value(&self, value: &Value) -> String {
        match value {
            Value::String(s) => match self.refs.get_reference(s) {
                Some(id) => format!("^{}", id),
                None => escape::quote(s),
            },
            other => escape::format_primitive(other),
        }
    }

    fn scalar(&self, value: &Value) -> String {
        match value {
            Value::String(s) => match self.refs.get_reference(s) {
                Some(id) => format!("^{}", id),
                None => escape::escape_string(s),
            },
            other => escape::format_primitive(other),
        }
    }

    fn inline_scalar(&self, value: &Value) -> String {
        match value {
            Value::String(s) => match self.refs.get_reference(s) {
                Some(id) => format!("^{}", id),
                None => escape::escape_inline(s),
            },
            other => escape::format_primitive(other),
        }
    }
}

fn header(fields: &[&String]) -> String {
    fields
        .iter()
        .map(|field| escape::format_key(field))
        .collect::<Vec<_>>()
        .join(",")
}

/// Consecutive runs of equal values, in order.
fn runs<'a>(values: &[&'a Value]) -> Vec<(&'a Value, usize)> {
    let mut runs: Vec<(&Value, usize)> = Vec::new();
    for &value in values {
        match runs.last_mut() {
            Some((last, count)) if *last == value => *count += 1,
            _ => runs.push((value, 1)),
        }
    }
    runs
}

/// `Some((first, last))` when the column is `first, first + 1, …, last`.
fn contiguous_range(values: &[&Value]) -> Option<(i64, i64)> {
    let first = values.first()?.as_i64()?;
    for (offset, value) in values.iter().enumerate() {
        if value.as_i64()? != first.checked_add(offset as i64)? {
            return None;
        }
    }
    Some((first, first + values.len() as i64 - 1))
}

/// Serializer whose output is a [`Value`] tree.
///
/// Integers become `f64` numbers. Enum variants carrying data are written
/// externally tagged, as `{variant: content}`.
///
/// # Examples
///
/// ```rust
/// use ctf_format::{ser::ValueSerializer, Value};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let value = Point { x: 1, y: 2 }.serialize(ValueSerializer).unwrap();
/// assert_eq!(value.as_object().and_then(|o| o.get("x")), Some(&Value::Number(1.0)));
/// ```
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<Value>,
}

pub struct SerializeTupleVariant {
    name: String,
    vec: Vec<Value>,
}

pub struct SerializeMap {
    map: ValueMap,
    current_key: Option<String>,
}

pub struct SerializeStructVariant {
    name: String,
    map: ValueMap,
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Number(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Number(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Array(v.iter().map(|&b| Value::from(b)).collect()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        let mut map = ValueMap::with_capacity(1);
        map.insert(variant.to_string(), to_value(value)?);
        Ok(Value::Object(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant> {
        Ok(SerializeTupleVariant {
            name: variant.to_string(),
            vec: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeStructVariant> {
        Ok(SerializeStructVariant {
            name: variant.to_string(),
            map: ValueMap::with_capacity(len),
        })
    }
}

impl SerializeVec {
    fn new(capacity: usize) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(capacity),
        }
    }
}

impl SerializeMap {
    fn new() -> Self {
        SerializeMap {
            map: ValueMap::new(),
            current_key: None,
        }
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Array(self.vec))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Array(self.vec))
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Array(self.vec))
    }
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        let mut map = ValueMap::with_capacity(1);
        map.insert(self.name, Value::Array(self.vec));
        Ok(Value::Object(map))
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = match to_value(key)? {
            Value::String(s) => s,
            Value::Number(n) => escape::format_number(n),
            Value::Bool(b) => b.to_string(),
            _ => return Err(Error::custom("Map keys must be strings, numbers or booleans")),
        };
        self.current_key = Some(key);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Object(self.map))
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Object(self.map))
    }
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        let mut outer = ValueMap::with_capacity(1);
        outer.insert(self.name, Value::Object(self.map));
        Ok(Value::Object(outer))
    }
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    value.serialize(ValueSerializer)
}
