use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

/// Synchronous custom operation. Returning `Ok(Some(v))` replaces the field
/// value, `Ok(None)` leaves it untouched, `Err(msg)` records a validation
/// error and the chain continues with the value unchanged. The second
/// argument is the read-only merged source tree.
pub type CustomSyncFn =
    Arc<dyn Fn(&Value, &Value) -> std::result::Result<Option<Value>, String> + Send + Sync>;

/// Callback-style custom operation: the chain suspends here until the
/// returned future resolves, with the same replace/no-op/error contract as
/// [`CustomSyncFn`].
pub type CustomAsyncFn = Arc<
    dyn Fn(Value, Value) -> BoxFuture<'static, std::result::Result<Option<Value>, String>>
        + Send
        + Sync,
>;

/// One step in a field's pipeline. Sanitizers and checks carry only a name
/// and arguments here; binding to the primitive happens at evaluation time.
#[derive(Clone)]
pub(crate) enum Op {
    Sanitize {
        name: String,
        args: Vec<Value>,
    },
    Check {
        name: String,
        args: Vec<Value>,
        message: Option<String>,
    },
    Required {
        placeholder: Option<Value>,
        message: Option<String>,
    },
    CustomSync {
        f: CustomSyncFn,
        message: Option<String>,
    },
    CustomAsync {
        f: CustomAsyncFn,
        message: Option<String>,
    },
}

impl Op {
    fn message_slot(&mut self) -> Option<&mut Option<String>> {
        match self {
            Op::Sanitize { .. } => None,
            Op::Check { message, .. }
            | Op::Required { message, .. }
            | Op::CustomSync { message, .. }
            | Op::CustomAsync { message, .. } => Some(message),
        }
    }
}

/// Declarative spec for one field: a path, an optional label, the
/// array-broadcast flag, and an ordered operation list. Pure data
/// accumulation; nothing runs until [`crate::Form::validate`].
#[derive(Clone)]
pub struct FieldSpec {
    pub(crate) path: String,
    pub(crate) label: Option<String>,
    pub(crate) array_mode: bool,
    pub(crate) ops: Vec<Op>,
}

/// Start a field spec for the given dot/bracket path.
pub fn field(path: &str) -> FieldSpec {
    FieldSpec {
        path: path.to_string(),
        label: None,
        array_mode: false,
        ops: Vec::new(),
    }
}

impl FieldSpec {
    /// Human-readable name substituted for `%s` in messages. Defaults to the
    /// path's last key segment.
    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    /// Broadcast mode: the raw value is coerced to a sequence and every
    /// operation applies to each element independently.
    pub fn array(mut self) -> Self {
        self.array_mode = true;
        self
    }

    /// Append a catalogue sanitizer by name.
    pub fn sanitize(mut self, name: &str, args: Vec<Value>) -> Self {
        self.ops.push(Op::Sanitize {
            name: name.to_string(),
            args,
        });
        self
    }

    /// Append a catalogue validator by name.
    pub fn check(mut self, name: &str, args: Vec<Value>) -> Self {
        self.ops.push(Op::Check {
            name: name.to_string(),
            args,
            message: None,
        });
        self
    }

    /// Override the message of the most recently appended operation. An
    /// empty string falls back to that operation's default message.
    pub fn message(mut self, message: &str) -> Self {
        if let Some(slot) = self.ops.last_mut().and_then(Op::message_slot) {
            *slot = if message.is_empty() {
                None
            } else {
                Some(message.to_string())
            };
        }
        self
    }

    pub fn required(mut self) -> Self {
        self.ops.push(Op::Required {
            placeholder: None,
            message: None,
        });
        self
    }

    /// A value that, even when present, counts as "not provided" for the
    /// most recent `required()` (e.g. a form's ghost text).
    pub fn placeholder(mut self, value: impl Into<Value>) -> Self {
        if let Some(Op::Required { placeholder, .. }) = self
            .ops
            .iter_mut()
            .rev()
            .find(|op| matches!(op, Op::Required { .. }))
        {
            *placeholder = Some(value.into());
        }
        self
    }

    pub fn custom<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &Value) -> std::result::Result<Option<Value>, String>
            + Send
            + Sync
            + 'static,
    {
        self.ops.push(Op::CustomSync {
            f: Arc::new(f),
            message: None,
        });
        self
    }

    pub fn custom_async<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Value, Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = std::result::Result<Option<Value>, String>>
            + Send
            + 'static,
    {
        let wrapped: CustomAsyncFn = Arc::new(move |value, tree| Box::pin(f(value, tree)));
        self.ops.push(Op::CustomAsync {
            f: wrapped,
            message: None,
        });
        self
    }

    // Sanitizer sugar.

    pub fn trim(self) -> Self {
        self.sanitize("trim", vec![])
    }

    pub fn to_lower(self) -> Self {
        self.sanitize("toLower", vec![])
    }

    pub fn to_upper(self) -> Self {
        self.sanitize("toUpper", vec![])
    }

    pub fn to_int(self) -> Self {
        self.sanitize("toInt", vec![])
    }

    pub fn to_float(self) -> Self {
        self.sanitize("toFloat", vec![])
    }

    pub fn truncate(self, limit: usize) -> Self {
        self.sanitize("truncate", vec![Value::from(limit)])
    }

    // Validator sugar.

    pub fn not_empty(self) -> Self {
        self.check("notEmpty", vec![])
    }

    pub fn is_email(self) -> Self {
        self.check("isEmail", vec![])
    }

    pub fn is_url(self) -> Self {
        self.check("isUrl", vec![])
    }

    pub fn is_ip(self) -> Self {
        self.check("isIP", vec![])
    }

    pub fn is_alpha(self) -> Self {
        self.check("isAlpha", vec![])
    }

    pub fn is_alphanumeric(self) -> Self {
        self.check("isAlphanumeric", vec![])
    }

    pub fn is_numeric(self) -> Self {
        self.check("isNumeric", vec![])
    }

    pub fn is_int(self) -> Self {
        self.check("isInt", vec![])
    }

    pub fn is_decimal(self) -> Self {
        self.check("isDecimal", vec![])
    }

    pub fn is_float(self) -> Self {
        self.check("isFloat", vec![])
    }

    pub fn is_date(self) -> Self {
        self.check("isDate", vec![])
    }

    pub fn is_lowercase(self) -> Self {
        self.check("isLowercase", vec![])
    }

    pub fn is_uppercase(self) -> Self {
        self.check("isUppercase", vec![])
    }

    /// Equality against a literal, or against another field's merged-source
    /// value when given a `field::<path>` token.
    pub fn equals(self, expected: impl Into<Value>) -> Self {
        self.check("equals", vec![expected.into()])
    }

    pub fn contains(self, needle: impl Into<Value>) -> Self {
        self.check("contains", vec![needle.into()])
    }

    pub fn not_contains(self, needle: impl Into<Value>) -> Self {
        self.check("notContains", vec![needle.into()])
    }

    pub fn min_length(self, min: usize) -> Self {
        self.check("minLength", vec![Value::from(min)])
    }

    pub fn max_length(self, max: usize) -> Self {
        self.check("maxLength", vec![Value::from(max)])
    }

    /// Regex match; `flags` currently understands `i` (case-insensitive).
    pub fn matches(self, pattern: &str, flags: &str) -> Self {
        self.check("is", vec![Value::from(pattern), Value::from(flags)])
    }

    pub fn not_matches(self, pattern: &str, flags: &str) -> Self {
        self.check("not", vec![Value::from(pattern), Value::from(flags)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_in_order() {
        let spec = field("user.name")
            .label("Username")
            .trim()
            .required()
            .min_length(3);
        assert_eq!(spec.path, "user.name");
        assert_eq!(spec.label.as_deref(), Some("Username"));
        assert_eq!(spec.ops.len(), 3);
        assert!(matches!(spec.ops[0], Op::Sanitize { ref name, .. } if name == "trim"));
        assert!(matches!(spec.ops[1], Op::Required { .. }));
        assert!(matches!(spec.ops[2], Op::Check { ref name, .. } if name == "minLength"));
    }

    #[test]
    fn message_targets_the_last_operation_only() {
        let spec = field("age").is_int().message("Age must be a number");
        match &spec.ops[0] {
            Op::Check { message, .. } => {
                assert_eq!(message.as_deref(), Some("Age must be a number"));
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn empty_message_restores_the_default() {
        let spec = field("age").is_int().message("custom").message("");
        match &spec.ops[0] {
            Op::Check { message, .. } => assert!(message.is_none()),
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn placeholder_attaches_to_required() {
        let spec = field("username").required().placeholder("Type here");
        match &spec.ops[0] {
            Op::Required { placeholder, .. } => {
                assert_eq!(placeholder.as_ref().unwrap(), "Type here");
            }
            _ => panic!("expected required"),
        }
    }
}
