use futures::future::join_all;
use serde_json::Value;
use tracing::debug;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::errors::Result;
use crate::executor::run_field;
use crate::field::FieldSpec;
use crate::merge::{merge, Sources};
use crate::path::{self, Path};
use crate::report::Report;

/// A declared set of field specs plus the configuration and primitive
/// catalogue they bind against. Built once ahead of time; `validate` may run
/// any number of times, each evaluation owning its own working tree.
pub struct Form {
    config: Config,
    catalog: Catalog,
    fields: Vec<FieldSpec>,
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            catalog: Catalog::with_builtins(),
            fields: Vec::new(),
        }
    }

    /// Swap in a catalogue with extra registered primitives.
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Merge the named sources and run every field's chain. Fields are
    /// independent and run concurrently; they share the merged tree
    /// read-only and results are joined back in declaration order, so the
    /// error list and write-backs are deterministic even when async custom
    /// operations complete out of order. Overlapping declared paths resolve
    /// by declaration order (the later field wins).
    ///
    /// A custom async operation that never resolves stalls its field and
    /// therefore this whole call; the engine imposes no timeout.
    pub async fn validate(&self, sources: &Sources) -> Result<Report> {
        let tree = merge(sources, &self.config.sources);
        debug!(fields = self.fields.len(), "validating form");

        // Bind paths before evaluating anything: a malformed path is a
        // declaration bug and aborts the whole run.
        let paths = self
            .fields
            .iter()
            .map(|spec| Path::parse(&spec.path))
            .collect::<Result<Vec<_>>>()?;

        let runs = self
            .fields
            .iter()
            .zip(&paths)
            .map(|(spec, fpath)| run_field(spec, fpath, &tree, &self.catalog, self.config.auto_trim));
        let outcomes = join_all(runs).await;

        let mut values = tree;
        let mut errors = Vec::new();
        for (outcome, fpath) in outcomes.into_iter().zip(&paths) {
            let outcome = outcome?;
            // Guarantees the declared path exists in the output tree even
            // when the input had no such key.
            path::set(&mut values, fpath, outcome.value);
            errors.extend(outcome.errors);
        }

        Ok(Report { errors, values })
    }
}

/// Convenience: validate one already-merged tree (single source, filed
/// under the form's highest-priority source name).
pub async fn validate_tree(form: &Form, tree: Value) -> Result<Report> {
    let name = form
        .config
        .sources
        .first()
        .cloned()
        .unwrap_or_else(|| "body".to_string());
    let sources = Sources::from([(name, tree)]);
    form.validate(&sources).await
}
