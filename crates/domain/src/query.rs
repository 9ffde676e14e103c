use serde::{Deserialize, Serialize};

/// Classification of a query for permission purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// A `SELECT` statement.
    Read,
    /// Any other statement.
    Write,
}

impl QueryKind {
    /// Classifies a statement by its leading keyword.
    ///
    /// Leading whitespace is trimmed and the first keyword is compared
    /// case-insensitively. Substring containment is deliberately not used:
    /// a write keyword inside a quoted literal or identifier must not flip
    /// the classification.
    #[must_use]
    pub fn classify(query: &str) -> Self {
        let keyword: String = query
            .trim_start()
            .chars()
            .take_while(char::is_ascii_alphabetic)
            .collect();

        if keyword.eq_ignore_ascii_case("select") {
            Self::Read
        } else {
            Self::Write
        }
    }
}

/// Tabular query result: ordered named columns and ordered rows.
///
/// Values are carried as rendered strings; `NULL` renders as an empty
/// string. A read returning zero rows yields an empty table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Column names in result order.
    pub columns: Vec<String>,
    /// Row values, one entry per column.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Returns the number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result carries no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
