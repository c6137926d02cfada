/// Builds a [`Value`](crate::Value) from JSON-like literal syntax.
///
/// Object keys must be string literals. Anything that is not `null`,
/// `true`, `false`, an array or an object is converted through
/// [`to_value`](crate::to_value); wrap compound expressions in parentheses.
///
/// # Examples
///
/// ```rust
/// use ctf_format::{ctf, Value};
///
/// let name = "Alice";
/// let user = ctf!({
///     "name": name,
///     "age": 30,
///     "tags": ["admin", null],
///     "score": (10 * 4)
/// });
/// assert_eq!(user.as_object().and_then(|o| o.get("score")), Some(&Value::Number(40.0)));
/// ```
#[macro_export]
macro_rules! ctf {
    (null) => {
        $crate::Value::Null
    };
    (true) => {
        $crate::Value::Bool(true)
    };
    (false) => {
        $crate::Value::Bool(false)
    };
    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(::std::vec![$($crate::ctf!($elem)),*])
    };
    ({}) => {
        $crate::Value::Object($crate::ValueMap::new())
    };
    ({ $($key:literal : $value:tt),+ $(,)? }) => {
        $crate::Value::Object(
            [$((::std::string::String::from($key), $crate::ctf!($value))),+]
                .into_iter()
                .collect::<$crate::ValueMap>(),
        )
    };
    // Values that do not serialize (non-string map keys and the like) become null.
    ($other:expr) => {
        match $crate::to_value(&$other) {
            ::std::result::Result::Ok(value) => value,
            ::std::result::Result::Err(_) => $crate::Value::Null,
        }
    };
}
