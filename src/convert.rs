//! Type-inference value converters.
//!
//! A converter takes the raw captured string and produces a richer
//! [`Value`]. Converters are attached to assumption triggers (see
//! `assume.rs`); the scalar ones back the generic base rules, the
//! structured ones ([`KeyValue`], [`NumberArray`], [`TimeOfDay`]) are wired
//! in by user schemas.
//!
//! Fallback policy: a converter that cannot make sense of its input returns
//! the original string unchanged (logging through `tracing` where that is
//! worth a note). Misconfiguration — a key-value pattern without the
//! required `key`/`value` markers, a number-array pattern without a
//! `number` group — is a fatal [`Error`] instead.

use std::collections::BTreeMap;

use once_cell::sync::OnceCell;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::value::Value;

/// Scalar projection applied to captured key/value fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    Str,
    Int,
    Float,
}

impl Projection {
    /// Project a fragment, falling back to the raw string when it does not
    /// parse.
    pub(crate) fn apply(&self, fragment: &str) -> Value {
        match self {
            Projection::Str => Value::Str(fragment.to_string()),
            Projection::Int => match fragment.parse::<i64>() {
                Ok(n) => Value::Int(n),
                Err(_) => {
                    debug!(fragment, "int projection fell back to string");
                    Value::Str(fragment.to_string())
                }
            },
            Projection::Float => match fragment.parse::<f64>() {
                Ok(n) => Value::Float(n),
                Err(_) => {
                    debug!(fragment, "float projection fell back to string");
                    Value::Str(fragment.to_string())
                }
            },
        }
    }
}

/// Converter attached to an assumption trigger.
#[derive(Debug, Clone)]
pub enum Convert {
    /// Signed decimal integer.
    Int,
    /// Signed decimal with a fractional part.
    Float,
    /// The null sentinel (none/null/nil tokens).
    Null,
    KeyValue(KeyValue),
    NumberArray(NumberArray),
    TimeOfDay(TimeOfDay),
}

impl Convert {
    pub(crate) fn apply(&self, value: &str) -> Result<Value> {
        match self {
            Convert::Int => Ok(Projection::Int.apply(value)),
            Convert::Float => Ok(Projection::Float.apply(value)),
            Convert::Null => Ok(Value::Null),
            Convert::KeyValue(kv) => kv.apply(value),
            Convert::NumberArray(na) => na.apply(value),
            Convert::TimeOfDay(t) => t.apply(value),
        }
    }
}

impl From<KeyValue> for Convert {
    fn from(kv: KeyValue) -> Self {
        Convert::KeyValue(kv)
    }
}

impl From<NumberArray> for Convert {
    fn from(na: NumberArray) -> Self {
        Convert::NumberArray(na)
    }
}

impl From<TimeOfDay> for Convert {
    fn from(t: TimeOfDay) -> Self {
        Convert::TimeOfDay(t)
    }
}

/// Extracts a `{key: value}` map out of a string.
///
/// The extraction pattern must carry `key` and `value` named groups. With a
/// `prefix_pattern` (which must carry a `key` group of its own), one prefix
/// is extracted from the string first and *all* key/value occurrences are
/// collected, keyed as `prefix + key`:
///
/// ```
/// use logquarry::{KeyValue, Projection};
///
/// let convert = KeyValue::new(r"(?P<key>\w+)\s+(?P<value>\d+)")
///     .value_type(Projection::Int)
///     .prefix_pattern(r"(?P<key>^\w+\s)");
/// let map = convert.call("transmission      samples  2 / depth  8").unwrap();
/// assert_eq!(map.to_string(), "{transmission depth: 8, transmission samples: 2}");
/// ```
#[derive(Debug, Clone, Default)]
pub struct KeyValue {
    pattern: String,
    key_type: Projection,
    value_type: Projection,
    prefix_pattern: String,
    compiled: OnceCell<Regex>,
    compiled_prefix: OnceCell<Regex>,
}

impl KeyValue {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self { pattern: pattern.into(), ..Self::default() }
    }

    pub fn key_type(mut self, projection: Projection) -> Self {
        self.key_type = projection;
        self
    }

    pub fn value_type(mut self, projection: Projection) -> Self {
        self.value_type = projection;
        self
    }

    pub fn prefix_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.prefix_pattern = pattern.into();
        self
    }

    /// Convert `value` into a one-or-more-entry map.
    ///
    /// When the extraction pattern does not match at all, the sentinel map
    /// `{value: ""}` is returned instead of failing.
    pub fn call(&self, value: &str) -> Result<Value> {
        self.apply(value)
    }

    fn apply(&self, value: &str) -> Result<Value> {
        // Marker validation happens per call so that a misconfigured
        // converter fails loudly on first use, not silently never-matching.
        if !self.pattern.contains("?P<key>") {
            return Err(Error::MissingMarker { converter: "key-value", marker: "key" });
        }
        if !self.pattern.contains("?P<value>") {
            return Err(Error::MissingMarker { converter: "key-value", marker: "value" });
        }
        if !self.prefix_pattern.is_empty() && !self.prefix_pattern.contains("?P<key>") {
            return Err(Error::MissingMarker { converter: "key-value prefix", marker: "key" });
        }

        let re = self.compiled.get_or_try_init(|| Regex::new(&self.pattern))?;

        let mut entries = BTreeMap::new();
        if self.prefix_pattern.is_empty() {
            // Assume unique keys and values; a single search is enough.
            if let Some(caps) = re.captures(value) {
                let key = self.key_type.apply(&caps["key"]).to_string();
                entries.insert(key, self.value_type.apply(&caps["value"]));
                return Ok(Value::Map(entries));
            }
        } else {
            // Prefixed keys only make sense as strings.
            if self.key_type != Projection::Str {
                return Err(Error::PrefixKeyType);
            }
            let prefix_re = self.compiled_prefix.get_or_try_init(|| Regex::new(&self.prefix_pattern))?;
            let prefix = prefix_re
                .captures(value)
                .and_then(|caps| caps.name("key"))
                .ok_or_else(|| Error::PrefixNotFound {
                    pattern: self.prefix_pattern.clone(),
                    value: value.to_string(),
                })?
                .as_str()
                .to_string();

            let mut found = false;
            for caps in re.captures_iter(value) {
                found = true;
                let key = format!("{prefix}{}", &caps["key"]);
                entries.insert(key, self.value_type.apply(&caps["value"]));
            }
            if found {
                return Ok(Value::Map(entries));
            }
        }

        // No match: keep the raw string around as a no-op sentinel entry.
        entries.insert(value.to_string(), Value::Str(String::new()));
        Ok(Value::Map(entries))
    }
}

/// Collects all `number` matches in a string and groups them into
/// fixed-width rows of floats.
///
/// `"(1, -2, 3) >> (-6.0)"` with a row width of 3 becomes
/// `[[1.0, -2.0, 3.0], [-6.0]]`. A string without any numbers is returned
/// unchanged.
#[derive(Debug, Clone)]
pub struct NumberArray {
    pattern: String,
    item_array_size: usize,
    compiled: OnceCell<Regex>,
}

impl NumberArray {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self { pattern: pattern.into(), item_array_size: 1, compiled: OnceCell::new() }
    }

    /// Width of each row. Values below 1 are clamped to 1.
    pub fn item_array_size(mut self, size: usize) -> Self {
        self.item_array_size = size.max(1);
        self
    }

    fn apply(&self, value: &str) -> Result<Value> {
        if !self.pattern.contains("?P<number>") {
            return Err(Error::MissingMarker { converter: "number-array", marker: "number" });
        }
        let re = self.compiled.get_or_try_init(|| Regex::new(&self.pattern))?;

        let mut numbers = Vec::new();
        for caps in re.captures_iter(value) {
            match caps["number"].parse::<f64>() {
                Ok(n) => numbers.push(n),
                Err(_) => {
                    warn!(fragment = &caps["number"], "number group did not parse as a float");
                    return Ok(Value::Str(value.to_string()));
                }
            }
        }
        if numbers.is_empty() {
            return Ok(Value::Str(value.to_string()));
        }

        let rows = numbers
            .chunks(self.item_array_size)
            .map(|chunk| Value::List(chunk.iter().map(|n| Value::Float(*n)).collect()))
            .collect();
        Ok(Value::List(rows))
    }
}

/// Detects an `h:m:s` time signature with optional `:microseconds`.
///
/// Accepted signatures are colon separated, carry at least
/// hour:minute:second, and stay in range (hour < 24, minute <= 60,
/// second < 60, microsecond <= 999999). Anything else is handed back as the
/// original string; an out-of-range signature is logged but never fatal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeOfDay;

impl TimeOfDay {
    pub fn new() -> Self {
        Self
    }

    fn apply(&self, value: &str) -> Result<Value> {
        let re = regex!(r"^(?P<h>\d{1,2}):(?P<m>\d{1,2}):(?P<s>\d{1,2})(:(?P<us>\d{1,6}))?$");
        let Some(caps) = re.captures(value) else {
            return Ok(Value::Str(value.to_string()));
        };

        // Group widths are bounded, so these always parse.
        let hour: u32 = caps["h"].parse().unwrap_or(u32::MAX);
        let minute: u32 = caps["m"].parse().unwrap_or(u32::MAX);
        let second: u32 = caps["s"].parse().unwrap_or(u32::MAX);
        let micro: u32 = caps.name("us").map_or(0, |m| m.as_str().parse().unwrap_or(0));

        if hour < 24 && minute <= 60 && second < 60 && micro <= 999_999 {
            if let Some(time) = chrono::NaiveTime::from_hms_micro_opt(hour, minute, second, micro) {
                return Ok(Value::Time(time));
            }
        }
        warn!(value, "unable to convert to a time value, keeping the string");
        Ok(Value::Str(value.to_string()))
    }
}
