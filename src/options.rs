//! Configuration options for CTF encoding and decoding.
//!
//! - [`EncodeOptions`]: indentation, delimiter, reference compression,
//!   columnar encoding and optimization level
//! - [`DecodeOptions`]: strictness and validation policy
//!
//! Options are immutable for the duration of a call and are passed by value.
//!
//! ## Examples
//!
//! ```rust
//! use ctf_format::{ctf, encode_with_options, Delimiter, EncodeOptions, Toggle};
//!
//! let data = ctf!({"x": 1});
//!
//! let options = EncodeOptions::new()
//!     .with_delimiter(Delimiter::Comma)
//!     .with_references(Toggle::Off);
//! assert_eq!(encode_with_options(&data, &options), "x:1");
//! ```

use crate::Error;
use std::str::FromStr;

/// Delimiter used between the cells of a tabular row.
///
/// `Auto` lets the optimizer pick whichever of the three concrete delimiters
/// occurs least in the data (ties prefer `|`).
///
/// # Examples
///
/// ```rust
/// use ctf_format::Delimiter;
///
/// assert_eq!(Delimiter::Pipe.as_char(), Some('|'));
/// assert_eq!(Delimiter::Tab.as_char(), Some('\t'));
/// assert_eq!(Delimiter::Auto.as_char(), None);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Delimiter {
    Pipe,
    Comma,
    Tab,
    #[default]
    Auto,
}

impl Delimiter {
    /// The concrete delimiters, in tie-breaking preference order.
    pub const CONCRETE: [Delimiter; 3] = [Delimiter::Pipe, Delimiter::Comma, Delimiter::Tab];

    /// Returns the delimiter character, or `None` for [`Delimiter::Auto`].
    #[must_use]
    pub const fn as_char(&self) -> Option<char> {
        match self {
            Delimiter::Pipe => Some('|'),
            Delimiter::Comma => Some(','),
            Delimiter::Tab => Some('\t'),
            Delimiter::Auto => None,
        }
    }

    /// Maps a delimiter character back to its variant.
    #[must_use]
    pub const fn from_char(ch: char) -> Option<Delimiter> {
        match ch {
            '|' => Some(Delimiter::Pipe),
            ',' => Some(Delimiter::Comma),
            '\t' => Some(Delimiter::Tab),
            _ => None,
        }
    }
}

impl FromStr for Delimiter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pipe" | "|" => Ok(Delimiter::Pipe),
            "comma" | "," => Ok(Delimiter::Comma),
            "tab" | "\t" => Ok(Delimiter::Tab),
            "auto" => Ok(Delimiter::Auto),
            other => Err(Error::custom(format!("unknown delimiter '{}'", other))),
        }
    }
}

/// A tri-state switch: force on, force off, or let the optimizer decide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Toggle {
    On,
    Off,
    #[default]
    Auto,
}

impl From<bool> for Toggle {
    fn from(value: bool) -> Self {
        if value {
            Toggle::On
        } else {
            Toggle::Off
        }
    }
}

impl FromStr for Toggle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" | "true" => Ok(Toggle::On),
            "off" | "false" => Ok(Toggle::Off),
            "auto" => Ok(Toggle::Auto),
            other => Err(Error::custom(format!("expected on, off or auto, found '{}'", other))),
        }
    }
}

/// How much analysis the encoder performs before emitting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OptimizeLevel {
    /// Skip analysis; `Auto` settings fall back to `|`, no references, no columnar.
    None,
    #[default]
    Balanced,
    /// Like `Balanced`, but builds references whenever the estimate is positive.
    Aggressive,
}

impl FromStr for OptimizeLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(OptimizeLevel::None),
            "balanced" => Ok(OptimizeLevel::Balanced),
            "aggressive" => Ok(OptimizeLevel::Aggressive),
            other => Err(Error::custom(format!("unknown optimize level '{}'", other))),
        }
    }
}

/// Configuration options for CTF encoding.
///
/// # Examples
///
/// ```rust
/// use ctf_format::{Delimiter, EncodeOptions, OptimizeLevel, Toggle};
///
/// let options = EncodeOptions::new()
///     .with_indent(4)
///     .with_delimiter(Delimiter::Tab)
///     .with_columnar(Toggle::Off)
///     .with_optimize(OptimizeLevel::Aggressive);
/// assert_eq!(options.indent, 4);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Spaces per nesting level.
    pub indent: u32,
    pub delimiter: Delimiter,
    pub references: Toggle,
    pub columnar: Toggle,
    pub optimize: OptimizeLevel,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            indent: 2,
            delimiter: Delimiter::Auto,
            references: Toggle::Auto,
            columnar: Toggle::Auto,
            optimize: OptimizeLevel::Balanced,
        }
    }
}

impl EncodeOptions {
    /// Creates default options (2-space indent, everything on `Auto`, balanced).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ctf_format::EncodeOptions;
    ///
    /// let options = EncodeOptions::new();
    /// assert_eq!(options.indent, 2);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the indentation size (number of spaces per level). Values below
    /// 1 are raised to 1, since nesting is carried by indentation alone.
    #[must_use]
    pub fn with_indent(mut self, indent: u32) -> Self {
        self.indent = indent.max(1);
        self
    }

    /// Sets the delimiter for tabular rows.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Forces reference compression on or off, or leaves it to the optimizer.
    #[must_use]
    pub fn with_references(mut self, references: impl Into<Toggle>) -> Self {
        self.references = references.into();
        self
    }

    /// Enables or disables columnar encoding of large repetitive arrays.
    #[must_use]
    pub fn with_columnar(mut self, columnar: impl Into<Toggle>) -> Self {
        self.columnar = columnar.into();
        self
    }

    /// Sets the optimization level.
    #[must_use]
    pub fn with_optimize(mut self, optimize: OptimizeLevel) -> Self {
        self.optimize = optimize;
        self
    }
}

/// Configuration options for CTF decoding.
///
/// Non-strict mode changes policy only: blank tabular rows are skipped and
/// rows with missing trailing cells are padded with empty strings.
///
/// # Examples
///
/// ```rust
/// use ctf_format::DecodeOptions;
///
/// let lenient = DecodeOptions::new().with_strict(false);
/// assert!(!lenient.strict);
/// assert!(lenient.validate);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeOptions {
    pub strict: bool,
    /// Check declared array lengths against the data (effective with `strict`).
    pub validate: bool,
    /// Coerce unquoted numeric tokens into numbers.
    pub type_hints: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            strict: true,
            validate: true,
            type_hints: true,
        }
    }
}

impl DecodeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    #[must_use]
    pub fn with_type_hints(mut self, type_hints: bool) -> Self {
        self.type_hints = type_hints;
        self
    }

    /// Whether cardinality mismatches are reported as validation errors.
    #[must_use]
    pub(crate) fn enforces_counts(&self) -> bool {
        self.strict && self.validate
    }
}
