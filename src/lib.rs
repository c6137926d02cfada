//! # ctf_format
//!
//! Encoder and decoder for CTF (Compressed Text Format), a deterministic,
//! round-trip-safe, line-oriented alternative to JSON that spends as few
//! tokens as possible.
//!
//! ## What does CTF look like?
//!
//! ```text
//! ^1=Engineering
//!
//! company:Acme
//! employees@3|id,name,dept:
//!   1|Alice|^1
//!   2|Bob|^1
//!   3|Carol|^1
//! tags:[remote hybrid]
//! ```
//!
//! - `_`, `+` and `-` are null, true and false
//! - nested objects are indented under a bare `key:`
//! - arrays pick one of four layouts: tabular rows, columnar data for very
//!   large repetitive arrays, inline `[a b c]` for primitives, or a list of
//!   `-` entries
//! - strings repeated often enough are replaced by `^id` references defined
//!   once at the top
//!
//! ## Quick Start
//!
//! ```rust
//! use ctf_format::{ctf, decode, encode};
//!
//! let data = ctf!({
//!     "users": [
//!         {"id": 1, "name": "Alice", "role": "admin"},
//!         {"id": 2, "name": "Bob", "role": "user"},
//!         {"id": 3, "name": "Charlie", "role": "dev"}
//!     ]
//! });
//!
//! let text = encode(&data);
//! assert_eq!(text, "users@3|id,name,role:\n  1|Alice|admin\n  2|Bob|user\n  3|Charlie|dev");
//! assert_eq!(decode(&text).unwrap(), data);
//! ```
//!
//! ### Typed data through serde
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use ctf_format::{from_str, to_string};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     active: bool,
//! }
//!
//! let user = User { id: 123, name: "Alice".to_string(), active: true };
//! let text = to_string(&user).unwrap();
//! assert_eq!(text, "id:123\nname:Alice\nactive:+");
//!
//! let back: User = from_str(&text).unwrap();
//! assert_eq!(user, back);
//! ```
//!
//! ### Options
//!
//! ```rust
//! use ctf_format::{ctf, decode_with_options, encode_with_options};
//! use ctf_format::{DecodeOptions, Delimiter, EncodeOptions, OptimizeLevel};
//!
//! let data = ctf!({"rows": [{"a": 1}, {"a": 2}, {"a": 3}]});
//! let options = EncodeOptions::new()
//!     .with_delimiter(Delimiter::Comma)
//!     .with_optimize(OptimizeLevel::None);
//! let text = encode_with_options(&data, &options);
//!
//! let lenient = DecodeOptions::new().with_strict(false);
//! assert_eq!(decode_with_options(&text, &lenient).unwrap(), data);
//! ```
//!
//! ## Format limitations
//!
//! - An object whose only key is `-` decodes as that key's value.
//! - A root object whose only key is `data` with a non-object value decodes
//!   as that value.
//! - Numbers are `f64`; integers beyond ±2^53 lose precision.

pub mod de;
pub mod error;
pub mod escape;
pub mod macros;
pub mod map;
pub mod optimizer;
pub mod options;
pub mod references;
pub mod ser;
pub mod stats;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use de::ValueDeserializer;
pub use error::{Error, Result};
pub use map::ValueMap;
pub use optimizer::{
    analyze, choose_delimiter, estimate_reference_savings, recommend_strategy, DataAnalysis,
    DelimiterFrequency, Strategy,
};
pub use options::{DecodeOptions, Delimiter, EncodeOptions, OptimizeLevel, Toggle};
pub use references::{ReferenceEntry, ReferenceManager, ReferenceStats, ReferenceThresholds};
pub use ser::ValueSerializer;
pub use stats::{get_stats, EncodeStats};
pub use value::Value;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;

/// Encodes a value with the default options.
///
/// # Examples
///
/// ```rust
/// use ctf_format::{ctf, encode};
///
/// assert_eq!(encode(&ctf!({"x": null, "y": true, "z": false})), "x:_\ny:+\nz:-");
/// ```
#[must_use]
pub fn encode(value: &Value) -> String {
    encode_with_options(value, &EncodeOptions::default())
}

/// Encodes a value with custom options.
///
/// Encoding never fails; non-finite numbers are written as null.
#[must_use]
pub fn encode_with_options(value: &Value, options: &EncodeOptions) -> String {
    ser::encode_value(value, options)
}

/// Decodes CTF text with the default (strict) options.
///
/// # Examples
///
/// ```rust
/// use ctf_format::{ctf, decode};
///
/// let value = decode("^1=Engineering\n\nitems@3|dept:\n^1\n^1\n^1").unwrap();
/// assert_eq!(value, ctf!({"items": [
///     {"dept": "Engineering"},
///     {"dept": "Engineering"},
///     {"dept": "Engineering"}
/// ]}));
/// ```
///
/// # Errors
///
/// Returns [`Error::Parse`] for malformed lines and undefined references,
/// and [`Error::Validation`] when an array declares more items than follow.
pub fn decode(input: &str) -> Result<Value> {
    decode_with_options(input, &DecodeOptions::default())
}

/// Decodes CTF text with custom options.
///
/// # Errors
///
/// See [`decode`]. Lenient options tolerate blank and short tabular rows.
pub fn decode_with_options(input: &str, options: &DecodeOptions) -> Result<Value> {
    de::decode_str(input, *options)
}

/// Convert any `T: Serialize` to a [`Value`].
///
/// # Examples
///
/// ```rust
/// use ctf_format::{to_value, Value};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let value = to_value(&Point { x: 1, y: 2 }).unwrap();
/// assert!(value.is_object());
/// ```
///
/// # Errors
///
/// Returns an error if the `Serialize` impl fails or produces a map key that
/// is not a string, number or boolean.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}

/// Deserialize a `T` from a [`Value`].
///
/// # Errors
///
/// Returns an error if the value does not have the shape `T` expects.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(value))
}

/// Serialize any `T: Serialize` to a CTF string.
///
/// # Errors
///
/// Returns an error if the value cannot be converted to a [`Value`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, &EncodeOptions::default())
}

/// Serialize any `T: Serialize` to a CTF string with custom options.
///
/// # Examples
///
/// ```rust
/// use ctf_format::{to_string_with_options, Delimiter, EncodeOptions};
///
/// let rows = vec![(1, "a"), (2, "b")];
/// let options = EncodeOptions::new().with_delimiter(Delimiter::Tab);
/// let text = to_string_with_options(&rows, &options).unwrap();
/// assert_eq!(text, "data@2:\n  -:[1 a]\n  -:[2 b]");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be converted to a [`Value`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T>(value: &T, options: &EncodeOptions) -> Result<String>
where
    T: ?Sized + Serialize,
{
    Ok(encode_with_options(&to_value(value)?, options))
}

/// Serialize any `T: Serialize` to a writer in CTF format.
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    to_writer_with_options(writer, value, &EncodeOptions::default())
}

/// Serialize any `T: Serialize` to a writer in CTF format with custom options.
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W, T>(mut writer: W, value: &T, options: &EncodeOptions) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let text = to_string_with_options(value, options)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::io(&e.to_string()))
}

/// Deserialize an instance of type `T` from CTF text.
///
/// # Examples
///
/// ```rust
/// use ctf_format::from_str;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_str("x:1\ny:2").unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if the text is not valid CTF or does not match `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_str_with_options(s, &DecodeOptions::default())
}

/// Deserialize an instance of type `T` from CTF text with custom options.
///
/// # Errors
///
/// Returns an error if the text is not valid CTF or does not match `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str_with_options<T>(s: &str, options: &DecodeOptions) -> Result<T>
where
    T: DeserializeOwned,
{
    from_value(decode_with_options(s, options)?)
}

/// Deserialize an instance of type `T` from an I/O stream of CTF.
///
/// # Examples
///
/// ```rust
/// use ctf_format::from_reader;
/// use serde::Deserialize;
/// use std::io::Cursor;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_reader(Cursor::new(b"x:1\ny:2")).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if reading fails, the input is not valid CTF, or the
/// data does not match `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut string = String::new();
    reader
        .read_to_string(&mut string)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_str(&string)
}

/// Deserialize an instance of type `T` from bytes of CTF text.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8, not valid CTF, or do
/// not match `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(v: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let s = std::str::from_utf8(v).map_err(|e| Error::custom(e.to_string()))?;
    from_str(s)
}
