use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;

use crate::errors::{ConfigError, Result};

/// Trait for pluggable sanitizers: pure transforms that never produce a
/// validation error. An `Err` here means the primitive was misused (bad
/// arguments) and is fatal.
pub trait Sanitize: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, value: &Value, args: &[Value]) -> Result<Value>;
}

/// Trait for pluggable validators: pure predicates over the current value.
pub trait Check: Send + Sync {
    fn name(&self) -> &'static str;
    fn default_message(&self) -> &'static str;
    fn check(&self, value: &Value, args: &[Value]) -> Result<bool>;
}

/// Thread-safe catalogue binding operation names to primitives. Lookup
/// happens at evaluation time; an unknown name is a fatal configuration
/// error, never a per-request validation error.
#[derive(Clone, Default)]
pub struct Catalog {
    sanitizers: Arc<HashMap<&'static str, Arc<dyn Sanitize>>>,
    checks: Arc<HashMap<&'static str, Arc<dyn Check>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut sanitizers: HashMap<&'static str, Arc<dyn Sanitize>> = HashMap::new();
        sanitizers.insert("trim", Arc::new(builtins::Trim));
        sanitizers.insert("toLower", Arc::new(builtins::ToLower));
        sanitizers.insert("toUpper", Arc::new(builtins::ToUpper));
        sanitizers.insert("toInt", Arc::new(builtins::ToInt));
        sanitizers.insert("toFloat", Arc::new(builtins::ToFloat));
        sanitizers.insert("truncate", Arc::new(builtins::Truncate));

        let mut checks: HashMap<&'static str, Arc<dyn Check>> = HashMap::new();
        checks.insert("notEmpty", Arc::new(builtins::NotEmpty));
        checks.insert("isEmail", Arc::new(builtins::IsEmail));
        checks.insert("isUrl", Arc::new(builtins::IsUrl));
        checks.insert("isIP", Arc::new(builtins::IsIp));
        checks.insert("isAlpha", Arc::new(builtins::IsAlpha));
        checks.insert("isAlphanumeric", Arc::new(builtins::IsAlphanumeric));
        checks.insert("isNumeric", Arc::new(builtins::IsNumeric));
        checks.insert("isInt", Arc::new(builtins::IsInt));
        checks.insert("isDecimal", Arc::new(builtins::IsDecimal));
        checks.insert("isFloat", Arc::new(builtins::IsFloat));
        checks.insert("isDate", Arc::new(builtins::IsDate));
        checks.insert("isLowercase", Arc::new(builtins::IsLowercase));
        checks.insert("isUppercase", Arc::new(builtins::IsUppercase));
        checks.insert("equals", Arc::new(builtins::Equals));
        checks.insert("contains", Arc::new(builtins::Contains));
        checks.insert("notContains", Arc::new(builtins::NotContains));
        checks.insert("minLength", Arc::new(builtins::MinLength));
        checks.insert("maxLength", Arc::new(builtins::MaxLength));
        // `is`/`not` are the documented names; `regex`/`notRegex` are aliases.
        checks.insert("is", Arc::new(builtins::Matches));
        checks.insert("regex", Arc::new(builtins::Matches));
        checks.insert("not", Arc::new(builtins::NotMatches));
        checks.insert("notRegex", Arc::new(builtins::NotMatches));

        Self {
            sanitizers: Arc::new(sanitizers),
            checks: Arc::new(checks),
        }
    }

    pub fn register_sanitizer<S: Sanitize + 'static>(&mut self, s: S) {
        Arc::make_mut(&mut self.sanitizers).insert(s.name(), Arc::new(s));
    }

    pub fn register_check<C: Check + 'static>(&mut self, c: C) {
        Arc::make_mut(&mut self.checks).insert(c.name(), Arc::new(c));
    }

    pub fn sanitizer(&self, name: &str) -> Result<Arc<dyn Sanitize>> {
        self.sanitizers
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownOperation {
                kind: "sanitizer",
                name: name.to_string(),
            })
    }

    pub fn check(&self, name: &str) -> Result<Arc<dyn Check>> {
        self.checks
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownOperation {
                kind: "validator",
                name: name.to_string(),
            })
    }
}

/// Loose string view of a value, matching the original engine's habit of
/// validating everything through its string form. Null reads as "".
pub fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

pub mod builtins {
    use super::*;
    use chrono::NaiveDate;
    use std::net::IpAddr;

    fn arg_str(args: &[Value], idx: usize, op: &'static str) -> Result<String> {
        args.get(idx)
            .map(text)
            .ok_or_else(|| ConfigError::Operation {
                name: op.to_string(),
                reason: format!("missing argument {idx}"),
            })
    }

    fn arg_usize(args: &[Value], idx: usize, op: &'static str) -> Result<usize> {
        let raw = args.get(idx).ok_or_else(|| ConfigError::Operation {
            name: op.to_string(),
            reason: format!("missing argument {idx}"),
        })?;
        raw.as_u64()
            .map(|n| n as usize)
            .or_else(|| text(raw).parse().ok())
            .ok_or_else(|| ConfigError::Operation {
                name: op.to_string(),
                reason: format!("argument {idx} is not a non-negative integer"),
            })
    }

    fn build_regex(args: &[Value], op: &'static str) -> Result<Regex> {
        let pattern = arg_str(args, 0, op)?;
        let flags = args.get(1).map(text).unwrap_or_default();
        let full = if flags.contains('i') {
            format!("(?i){pattern}")
        } else {
            pattern
        };
        Regex::new(&full).map_err(|e| ConfigError::Operation {
            name: op.to_string(),
            reason: format!("bad pattern: {e}"),
        })
    }

    static EMAIL_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());
    static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^(?:(?:https?|ftp)://)?[\w-]+(?:\.[\w-]+)+(?::\d+)?(?:/\S*)?$").unwrap()
    });
    static INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+$").unwrap());
    static DECIMAL_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^-?(?:\d+|\d*\.\d+)$").unwrap());

    pub struct Trim;
    impl Sanitize for Trim {
        fn name(&self) -> &'static str {
            "trim"
        }
        fn apply(&self, value: &Value, _args: &[Value]) -> Result<Value> {
            Ok(match value {
                Value::String(s) => Value::String(s.trim().to_string()),
                other => other.clone(),
            })
        }
    }

    pub struct ToLower;
    impl Sanitize for ToLower {
        fn name(&self) -> &'static str {
            "toLower"
        }
        fn apply(&self, value: &Value, _args: &[Value]) -> Result<Value> {
            Ok(match value {
                Value::String(s) => Value::String(s.to_lowercase()),
                other => other.clone(),
            })
        }
    }

    pub struct ToUpper;
    impl Sanitize for ToUpper {
        fn name(&self) -> &'static str {
            "toUpper"
        }
        fn apply(&self, value: &Value, _args: &[Value]) -> Result<Value> {
            Ok(match value {
                Value::String(s) => Value::String(s.to_uppercase()),
                other => other.clone(),
            })
        }
    }

    pub struct ToInt;
    impl Sanitize for ToInt {
        fn name(&self) -> &'static str {
            "toInt"
        }
        fn apply(&self, value: &Value, _args: &[Value]) -> Result<Value> {
            // Unparseable input becomes null, not a fatal error.
            Ok(match value {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().map(|f| f as i64))
                    .map(Value::from)
                    .unwrap_or(Value::Null),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(|f| Value::from(f as i64))
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            })
        }
    }

    pub struct ToFloat;
    impl Sanitize for ToFloat {
        fn name(&self) -> &'static str {
            "toFloat"
        }
        fn apply(&self, value: &Value, _args: &[Value]) -> Result<Value> {
            Ok(match value {
                Value::Number(n) => n.as_f64().map(Value::from).unwrap_or(Value::Null),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::from)
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            })
        }
    }

    pub struct Truncate;
    impl Sanitize for Truncate {
        fn name(&self) -> &'static str {
            "truncate"
        }
        fn apply(&self, value: &Value, args: &[Value]) -> Result<Value> {
            let limit = arg_usize(args, 0, "truncate")?;
            Ok(match value {
                Value::String(s) => Value::String(s.chars().take(limit).collect()),
                other => other.clone(),
            })
        }
    }

    pub struct NotEmpty;
    impl Check for NotEmpty {
        fn name(&self) -> &'static str {
            "notEmpty"
        }
        fn default_message(&self) -> &'static str {
            "%s has no value or is only whitespace"
        }
        fn check(&self, value: &Value, _args: &[Value]) -> Result<bool> {
            Ok(!text(value).trim().is_empty())
        }
    }

    pub struct IsEmail;
    impl Check for IsEmail {
        fn name(&self) -> &'static str {
            "isEmail"
        }
        fn default_message(&self) -> &'static str {
            "%s is not an email address"
        }
        fn check(&self, value: &Value, _args: &[Value]) -> Result<bool> {
            Ok(EMAIL_RE.is_match(&text(value)))
        }
    }

    pub struct IsUrl;
    impl Check for IsUrl {
        fn name(&self) -> &'static str {
            "isUrl"
        }
        fn default_message(&self) -> &'static str {
            "%s is not a URL"
        }
        fn check(&self, value: &Value, _args: &[Value]) -> Result<bool> {
            Ok(URL_RE.is_match(&text(value)))
        }
    }

    pub struct IsIp;
    impl Check for IsIp {
        fn name(&self) -> &'static str {
            "isIP"
        }
        fn default_message(&self) -> &'static str {
            "%s is not an IP address"
        }
        fn check(&self, value: &Value, _args: &[Value]) -> Result<bool> {
            Ok(text(value).parse::<IpAddr>().is_ok())
        }
    }

    pub struct IsAlpha;
    impl Check for IsAlpha {
        fn name(&self) -> &'static str {
            "isAlpha"
        }
        fn default_message(&self) -> &'static str {
            "%s contains non-letter characters"
        }
        fn check(&self, value: &Value, _args: &[Value]) -> Result<bool> {
            let s = text(value);
            Ok(!s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()))
        }
    }

    pub struct IsAlphanumeric;
    impl Check for IsAlphanumeric {
        fn name(&self) -> &'static str {
            "isAlphanumeric"
        }
        fn default_message(&self) -> &'static str {
            "%s contains non-alphanumeric characters"
        }
        fn check(&self, value: &Value, _args: &[Value]) -> Result<bool> {
            let s = text(value);
            Ok(!s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()))
        }
    }

    pub struct IsNumeric;
    impl Check for IsNumeric {
        fn name(&self) -> &'static str {
            "isNumeric"
        }
        fn default_message(&self) -> &'static str {
            "%s is not a number"
        }
        fn check(&self, value: &Value, _args: &[Value]) -> Result<bool> {
            Ok(INT_RE.is_match(&text(value)))
        }
    }

    pub struct IsInt;
    impl Check for IsInt {
        fn name(&self) -> &'static str {
            "isInt"
        }
        fn default_message(&self) -> &'static str {
            "%s is not an integer"
        }
        fn check(&self, value: &Value, _args: &[Value]) -> Result<bool> {
            Ok(match value {
                Value::Number(n) => n.is_i64() || n.is_u64(),
                other => INT_RE.is_match(&text(other)),
            })
        }
    }

    pub struct IsDecimal;
    impl Check for IsDecimal {
        fn name(&self) -> &'static str {
            "isDecimal"
        }
        fn default_message(&self) -> &'static str {
            "%s is not a decimal"
        }
        fn check(&self, value: &Value, _args: &[Value]) -> Result<bool> {
            Ok(match value {
                Value::Number(_) => true,
                other => DECIMAL_RE.is_match(&text(other)),
            })
        }
    }

    pub struct IsFloat;
    impl Check for IsFloat {
        fn name(&self) -> &'static str {
            "isFloat"
        }
        fn default_message(&self) -> &'static str {
            "%s is not a float"
        }
        fn check(&self, value: &Value, args: &[Value]) -> Result<bool> {
            // Same value space as isDecimal; only the message differs.
            IsDecimal.check(value, args)
        }
    }

    pub struct IsDate;
    impl Check for IsDate {
        fn name(&self) -> &'static str {
            "isDate"
        }
        fn default_message(&self) -> &'static str {
            "%s is not a date"
        }
        fn check(&self, value: &Value, _args: &[Value]) -> Result<bool> {
            let s = text(value);
            Ok(["%Y-%m-%d", "%m/%d/%Y"]
                .iter()
                .any(|fmt| NaiveDate::parse_from_str(&s, fmt).is_ok()))
        }
    }

    pub struct IsLowercase;
    impl Check for IsLowercase {
        fn name(&self) -> &'static str {
            "isLowercase"
        }
        fn default_message(&self) -> &'static str {
            "%s contains uppercase characters"
        }
        fn check(&self, value: &Value, _args: &[Value]) -> Result<bool> {
            let s = text(value);
            Ok(s == s.to_lowercase())
        }
    }

    pub struct IsUppercase;
    impl Check for IsUppercase {
        fn name(&self) -> &'static str {
            "isUppercase"
        }
        fn default_message(&self) -> &'static str {
            "%s contains lowercase characters"
        }
        fn check(&self, value: &Value, _args: &[Value]) -> Result<bool> {
            let s = text(value);
            Ok(s == s.to_uppercase())
        }
    }

    pub struct Equals;
    impl Check for Equals {
        fn name(&self) -> &'static str {
            "equals"
        }
        fn default_message(&self) -> &'static str {
            "%s does not equal the expected value"
        }
        fn check(&self, value: &Value, args: &[Value]) -> Result<bool> {
            let expected = arg_str(args, 0, "equals")?;
            Ok(text(value) == expected)
        }
    }

    pub struct Contains;
    impl Check for Contains {
        fn name(&self) -> &'static str {
            "contains"
        }
        fn default_message(&self) -> &'static str {
            "%s does not contain the required characters"
        }
        fn check(&self, value: &Value, args: &[Value]) -> Result<bool> {
            let needle = arg_str(args, 0, "contains")?;
            Ok(text(value).contains(&needle))
        }
    }

    pub struct NotContains;
    impl Check for NotContains {
        fn name(&self) -> &'static str {
            "notContains"
        }
        fn default_message(&self) -> &'static str {
            "%s contains invalid characters"
        }
        fn check(&self, value: &Value, args: &[Value]) -> Result<bool> {
            let needle = arg_str(args, 0, "notContains")?;
            Ok(!text(value).contains(&needle))
        }
    }

    pub struct MinLength;
    impl Check for MinLength {
        fn name(&self) -> &'static str {
            "minLength"
        }
        fn default_message(&self) -> &'static str {
            "%s is too short"
        }
        fn check(&self, value: &Value, args: &[Value]) -> Result<bool> {
            let min = arg_usize(args, 0, "minLength")?;
            Ok(text(value).chars().count() >= min)
        }
    }

    pub struct MaxLength;
    impl Check for MaxLength {
        fn name(&self) -> &'static str {
            "maxLength"
        }
        fn default_message(&self) -> &'static str {
            "%s is too long"
        }
        fn check(&self, value: &Value, args: &[Value]) -> Result<bool> {
            let max = arg_usize(args, 0, "maxLength")?;
            Ok(text(value).chars().count() <= max)
        }
    }

    pub struct Matches;
    impl Check for Matches {
        fn name(&self) -> &'static str {
            "is"
        }
        fn default_message(&self) -> &'static str {
            "%s has invalid characters"
        }
        fn check(&self, value: &Value, args: &[Value]) -> Result<bool> {
            Ok(build_regex(args, "is")?.is_match(&text(value)))
        }
    }

    pub struct NotMatches;
    impl Check for NotMatches {
        fn name(&self) -> &'static str {
            "not"
        }
        fn default_message(&self) -> &'static str {
            "%s has invalid characters"
        }
        fn check(&self, value: &Value, args: &[Value]) -> Result<bool> {
            Ok(!build_regex(args, "not")?.is_match(&text(value)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn unknown_names_fail_fast() {
        let cat = Catalog::with_builtins();
        assert!(cat.sanitizer("trim").is_ok());
        assert!(matches!(
            cat.sanitizer("nope"),
            Err(ConfigError::UnknownOperation { .. })
        ));
        assert!(matches!(
            cat.check("isWombat"),
            Err(ConfigError::UnknownOperation { .. })
        ));
    }

    #[test]
    fn to_int_coerces_or_yields_null() {
        let cat = Catalog::with_builtins();
        let to_int = cat.sanitizer("toInt").unwrap();
        assert_eq!(to_int.apply(&json!("42"), &[]).unwrap(), json!(42));
        assert_eq!(to_int.apply(&json!("4.9"), &[]).unwrap(), json!(4));
        assert_eq!(to_int.apply(&json!("wat"), &[]).unwrap(), Value::Null);
    }

    #[test]
    fn truncate_requires_a_limit() {
        let cat = Catalog::with_builtins();
        let truncate = cat.sanitizer("truncate").unwrap();
        assert_eq!(
            truncate.apply(&json!("hello"), &[json!(3)]).unwrap(),
            json!("hel")
        );
        assert!(matches!(
            truncate.apply(&json!("hello"), &[]),
            Err(ConfigError::Operation { .. })
        ));
    }

    #[test]
    fn representative_checks() {
        let cat = Catalog::with_builtins();
        let cases = [
            ("isEmail", json!("a@b.co"), true),
            ("isEmail", json!("not-an-email"), false),
            ("isIP", json!("192.168.0.1"), true),
            ("isIP", json!("999.1.1.1"), false),
            ("isNumeric", json!("-12"), true),
            ("isNumeric", json!("12.5"), false),
            ("isDecimal", json!("12.5"), true),
            ("isDate", json!("2024-02-29"), true),
            ("isDate", json!("2023-02-29"), false),
            ("notEmpty", json!("  "), false),
        ];
        for (name, value, expect) in cases {
            let ok = cat.check(name).unwrap().check(&value, &[]).unwrap();
            assert_eq!(ok, expect, "{name} on {value}");
        }
    }

    #[test]
    fn is_float_has_its_own_message() {
        let cat = Catalog::with_builtins();
        let is_float = cat.check("isFloat").unwrap();
        assert_eq!(is_float.default_message(), "%s is not a float");
        assert!(is_float.check(&json!("1.5"), &[]).unwrap());
        assert!(!is_float.check(&json!("wat"), &[]).unwrap());
    }

    #[test]
    fn regex_check_honors_i_flag_and_rejects_bad_patterns() {
        let cat = Catalog::with_builtins();
        let is = cat.check("is").unwrap();
        assert!(is
            .check(&json!("HELLO"), &[json!("^hello$"), json!("i")])
            .unwrap());
        assert!(!is.check(&json!("HELLO"), &[json!("^hello$")]).unwrap());
        assert!(matches!(
            is.check(&json!("x"), &[json!("(")]),
            Err(ConfigError::Operation { .. })
        ));
    }

    #[test]
    fn validators_see_null_as_empty_text() {
        let cat = Catalog::with_builtins();
        assert!(!cat
            .check("isEmail")
            .unwrap()
            .check(&Value::Null, &[])
            .unwrap());
    }
}
