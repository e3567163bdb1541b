//! Columnar per-point attribute table.
//!
//! This is the handoff format between file parsing and Gaussian
//! construction: named `f32` columns, one row per point.

/// Named float columns in insertion order.
///
/// The table does not force equal column lengths; consumers validate the
/// columns they need (see [`crate::core::GaussianBuilder`]).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeTable {
    columns: Vec<(String, Vec<f32>)>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, replacing any existing column with the same name.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f32>) {
        let name = name.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((name, values)),
        }
    }

    /// Builder-style [`AttributeTable::insert`].
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f32>) -> Self {
        self.insert(name, values);
        self
    }

    pub fn column(&self, name: &str) -> Option<&[f32]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<f32>> {
        let pos = self.columns.iter().position(|(n, _)| n == name)?;
        Some(self.columns.remove(pos).1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Row count shared by every column, or `None` if the columns disagree.
    /// An empty table has zero rows.
    pub fn row_count(&self) -> Option<usize> {
        let mut lens = self.columns.iter().map(|(_, v)| v.len());
        match lens.next() {
            None => Some(0),
            Some(first) => lens.all(|l| l == first).then_some(first),
        }
    }
}
