/// Evaluation defaults, threaded explicitly into a [`crate::Form`] at
/// construction time rather than living in process-global state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Source names in priority order for [`crate::merge::merge`].
    pub sources: Vec<String>,
    /// When true, every field gets an implicit leading `trim` unless its
    /// chain already starts with one.
    pub auto_trim: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: vec!["body".into(), "query".into(), "params".into()],
            auto_trim: false,
        }
    }
}

impl Config {
    pub fn sources<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn auto_trim(mut self, on: bool) -> Self {
        self.auto_trim = on;
        self
    }
}
