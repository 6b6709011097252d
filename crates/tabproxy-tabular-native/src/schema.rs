use std::fmt;
use std::sync::Arc;

use crate::field::Field;

/// Outcome of looking a field up by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameLookup {
    Missing,
    Unique(usize),
    Ambiguous(usize),
}

/// Ordered, immutable list of fields. Duplicate names are allowed; they only
/// make name lookups ambiguous. Positions here are 0-based.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Arc<Field>>,
}

impl Schema {
    pub fn new(fields: Vec<Arc<Field>>) -> Self {
        Self { fields }
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[Arc<Field>] {
        &self.fields
    }

    pub fn field(&self, i: usize) -> Option<&Arc<Field>> {
        self.fields.get(i)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|f| f.name())
    }

    pub fn lookup(&self, name: &str) -> NameLookup {
        let mut found = None;
        let mut matches = 0usize;
        for (i, field) in self.fields.iter().enumerate() {
            if field.name() == name {
                matches += 1;
                found.get_or_insert(i);
            }
        }
        match (matches, found) {
            (1, Some(i)) => NameLookup::Unique(i),
            (0, _) => NameLookup::Missing,
            (n, _) => NameLookup::Ambiguous(n),
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}
