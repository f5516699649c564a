//! Paths addressing containers, tables and arrays.

use std::fmt;
use std::str::FromStr;

use crate::util::Error;

/// `Container/Table/Array` address. Trailing parts may be empty when a path
/// names a table or a whole container.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataArrayPath {
    pub container: String,
    pub table: String,
    pub array: String,
}

impl DataArrayPath {
    /// Path to an array.
    pub fn new(container: impl Into<String>, table: impl Into<String>, array: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            table: table.into(),
            array: array.into(),
        }
    }

    /// Path to a table.
    pub fn table(container: impl Into<String>, table: impl Into<String>) -> Self {
        Self::new(container, table, "")
    }

    /// True if no part is set.
    pub fn is_empty(&self) -> bool {
        self.container.is_empty() && self.table.is_empty() && self.array.is_empty()
    }

    /// True if both paths point into the same table.
    pub fn same_table(&self, other: &Self) -> bool {
        self.container == other.container && self.table == other.table
    }
}

impl fmt::Display for DataArrayPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.container, self.table, self.array)
    }
}

impl FromStr for DataArrayPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        let container = parts.next().unwrap_or_default();
        let table = parts.next().unwrap_or_default();
        let array = parts.next().unwrap_or_default();
        if parts.next().is_some() || container.is_empty() {
            return Err(Error::shape("data array path", "Container/Table/Array", s));
        }
        Ok(Self::new(container, table, array))
    }
}
