//! CQL statements issued over the control connection.

/// Consistency level of a request.
///
/// Every control-plane read runs at [`Consistency::One`]; the full set is kept
/// so that embedders reuse the same type on the data plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Consistency {
    Any,
    #[default]
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    LocalOne,
}

/// An unprepared CQL statement with positional values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    contents: String,
    values: Vec<String>,
    consistency: Consistency,
}

impl Statement {
    /// Creates a new statement with no bound values, at consistency `ONE`.
    pub fn new(contents: impl Into<String>) -> Self {
        Statement {
            contents: contents.into(),
            values: Vec::new(),
            consistency: Consistency::One,
        }
    }

    /// Binds positional values to the statement's `?` markers.
    pub fn with_values(mut self, values: Vec<String>) -> Self {
        self.values = values;
        self
    }

    /// Overrides the consistency level.
    pub fn with_consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = consistency;
        self
    }

    /// The query text.
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Positional values, in marker order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn consistency(&self) -> Consistency {
        self.consistency
    }
}
