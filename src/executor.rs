use serde_json::Value;
use tracing::{debug, trace};

use crate::catalog::Catalog;
use crate::errors::Result;
use crate::field::{FieldSpec, Op};
use crate::path::{self, Path};
use crate::report::{fill, ValidationError};

const REQUIRED_MESSAGE: &str = "%s is required";
const FIELD_TOKEN: &str = "field::";

/// What one field's chain produced: the value to write back at its path and
/// any validation errors, in operation order.
pub(crate) struct FieldOutcome {
    pub value: Value,
    pub errors: Vec<ValidationError>,
}

/// The array-or-scalar shape of a field's working value, decided once per
/// evaluation.
enum Resolved {
    Scalar(Option<Value>),
    Sequence(Vec<Value>),
}

/// Run one field's operation chain against the read-only merged tree.
/// Validation failures accumulate in the outcome; only configuration errors
/// (unknown operation, primitive misuse, bad cross-field path) are `Err`.
pub(crate) async fn run_field(
    spec: &FieldSpec,
    fpath: &Path,
    tree: &Value,
    catalog: &Catalog,
    auto_trim: bool,
) -> Result<FieldOutcome> {
    let chain = Chain {
        spec,
        fpath,
        tree,
        catalog,
        label: spec
            .label
            .clone()
            .unwrap_or_else(|| fpath.last_key().to_string()),
        implicit_trim: auto_trim && !starts_with_trim(&spec.ops),
    };
    let raw = path::get(tree, fpath).cloned();
    debug!(field = %fpath.as_str(), array = spec.array_mode, "evaluating field");

    let mut errors = Vec::new();
    let value = match resolve(raw, spec.array_mode) {
        Resolved::Scalar(mut current) => {
            chain.run(&mut current, &mut errors).await?;
            current.unwrap_or(Value::Null)
        }
        Resolved::Sequence(elements) => {
            let mut out = Vec::with_capacity(elements.len());
            for element in elements {
                let mut current = Some(element);
                chain.run(&mut current, &mut errors).await?;
                out.push(current.unwrap_or(Value::Null));
            }
            Value::Array(out)
        }
    };

    Ok(FieldOutcome { value, errors })
}

fn starts_with_trim(ops: &[Op]) -> bool {
    matches!(ops.first(), Some(Op::Sanitize { name, .. }) if name == "trim")
}

fn resolve(raw: Option<Value>, array_mode: bool) -> Resolved {
    if array_mode {
        Resolved::Sequence(match raw {
            None | Some(Value::Null) => vec![],
            Some(Value::String(s)) if s.is_empty() => vec![],
            Some(Value::Array(items)) => items,
            Some(scalar) => vec![scalar],
        })
    } else {
        Resolved::Scalar(match raw {
            // Scalar mode keeps only the first element of a sequence.
            Some(Value::Array(items)) => items.into_iter().next(),
            other => other,
        })
    }
}

/// One field's bound chain: the spec plus everything the operations read.
struct Chain<'a> {
    spec: &'a FieldSpec,
    fpath: &'a Path,
    tree: &'a Value,
    catalog: &'a Catalog,
    label: String,
    implicit_trim: bool,
}

impl Chain<'_> {
    /// Apply the operation list, in declared order, to one working value.
    /// Validators never short-circuit the rest of the chain.
    async fn run(
        &self,
        current: &mut Option<Value>,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        if self.implicit_trim {
            self.apply_sanitizer("trim", &[], current)?;
        }
        for op in &self.spec.ops {
            match op {
                Op::Sanitize { name, args } => {
                    self.apply_sanitizer(name, args, current)?;
                }
                Op::Check { name, args, message } => {
                    let primitive = self.catalog.check(name)?;
                    let args = self.resolve_args(args)?;
                    let probe = current.clone().unwrap_or(Value::Null);
                    let ok = primitive.check(&probe, &args)?;
                    trace!(field = %self.fpath.as_str(), op = %name, ok, "check");
                    if !ok {
                        let template =
                            message.as_deref().unwrap_or(primitive.default_message());
                        self.push_error(errors, template);
                    }
                }
                Op::Required { placeholder, message } => {
                    if is_missing(current, placeholder.as_ref()) {
                        let template = message.as_deref().unwrap_or(REQUIRED_MESSAGE);
                        self.push_error(errors, template);
                    }
                }
                Op::CustomSync { f, message } => {
                    let probe = current.clone().unwrap_or(Value::Null);
                    match f(&probe, self.tree) {
                        Ok(Some(replacement)) => *current = Some(replacement),
                        Ok(None) => {}
                        Err(raised) => {
                            let template = message.as_deref().unwrap_or(&raised);
                            self.push_error(errors, template);
                        }
                    }
                }
                Op::CustomAsync { f, message } => {
                    let probe = current.clone().unwrap_or(Value::Null);
                    // The only suspension point in a chain: wait for the
                    // user-supplied completion before the next operation.
                    match f(probe, self.tree.clone()).await {
                        Ok(Some(replacement)) => *current = Some(replacement),
                        Ok(None) => {}
                        Err(raised) => {
                            let template = message.as_deref().unwrap_or(&raised);
                            self.push_error(errors, template);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn apply_sanitizer(
        &self,
        name: &str,
        args: &[Value],
        current: &mut Option<Value>,
    ) -> Result<()> {
        let primitive = self.catalog.sanitizer(name)?;
        // An absent value passes through sanitizers untouched.
        if let Some(value) = current.as_ref() {
            *current = Some(primitive.apply(value, args)?);
        }
        Ok(())
    }

    /// Replace `field::<path>` token arguments with the value at that path
    /// in the merged source tree, read at comparison time. Deliberately
    /// never reads another field's sanitized output, so field evaluation
    /// order cannot be observed.
    fn resolve_args(&self, args: &[Value]) -> Result<Vec<Value>> {
        args.iter()
            .map(|arg| match arg {
                Value::String(s) if s.starts_with(FIELD_TOKEN) => {
                    let referenced = Path::parse(&s[FIELD_TOKEN.len()..])?;
                    Ok(path::get(self.tree, &referenced)
                        .cloned()
                        .unwrap_or(Value::Null))
                }
                other => Ok(other.clone()),
            })
            .collect()
    }

    fn push_error(&self, errors: &mut Vec<ValidationError>, template: &str) {
        errors.push(ValidationError {
            field: self.fpath.as_str().to_string(),
            label: self.label.clone(),
            message: fill(template, &self.label),
        });
    }
}

fn is_missing(current: &Option<Value>, placeholder: Option<&Value>) -> bool {
    match current {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) if s.is_empty() => true,
        Some(value) => placeholder.is_some_and(|p| p == value),
    }
}
