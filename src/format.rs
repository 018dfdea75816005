//! Output field registry
//!
//! The registry is built once from the format string and fixes the output columns for the whole
//! run. Each packet assigns values by name, the emitter reads them in column order and the
//! registry is reset before the next packet.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::errors::Error;

/// Emitted for a field that got no value from the current packet.
pub const PLACEHOLDER: &str = "-";

/// Case-insensitive field name comparison, used for both configuration and assignment.
pub fn name_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// One output column.
#[derive(Debug)]
pub struct Field {
    name: String,
    value: String,
    set: bool,
}

impl Field {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: String::new(),
            set: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        if self.set {
            Some(&self.value)
        } else {
            None
        }
    }

    fn assign(&mut self, value: &str) {
        // The value buffer is kept across packets.
        self.value.clear();
        self.value.push_str(value);
        self.set = true;
    }

    fn reset(&mut self) {
        self.value.clear();
        self.set = false;
    }
}

#[derive(Debug)]
pub struct FieldRegistry {
    fields: Vec<Field>,
}

impl FieldRegistry {
    /// Build the registry from field names in output order.
    ///
    /// Names are trimmed and empty names skipped. A name repeating an earlier one (ignoring
    /// case) is rejected with a warning and the first occurrence keeps its position. No names
    /// left at all is a configuration error.
    pub fn configure<I, S>(names: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fields: Vec<Field> = Vec::new();

        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if fields.iter().any(|f| name_eq(&f.name, name)) {
                log::warn!("Format element '{}' already provided", name);
                continue;
            }
            fields.push(Field::new(name));
        }

        if fields.is_empty() {
            return Err(Error::Config(
                "no valid fields found in format string".to_string(),
            ));
        }

        Ok(Self { fields })
    }

    /// Build the registry from a comma separated format string.
    pub fn from_format_str(format: &str) -> Result<Self, Error> {
        if format.trim().is_empty() {
            return Err(Error::Config("empty format string provided".to_string()));
        }

        Self::configure(format.split(','))
    }

    /// Set the value of the field called `name`.
    ///
    /// Returns `false`, and changes nothing, when no such field is configured. A later
    /// assignment to the same field overwrites an earlier one.
    pub fn assign(&mut self, name: &str, value: &str) -> bool {
        match self.fields.iter_mut().find(|f| name_eq(&f.name, name)) {
            Some(field) => {
                field.assign(value);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(Field::name)
    }

    /// Configured names in order, comma joined.
    pub fn header_line(&self) -> String {
        self.names().collect::<Vec<_>>().join(",")
    }

    /// Hand the current values to `emit` and clear every field afterwards.
    ///
    /// The reset happens whatever `emit` returns, so no value outlives its packet.
    pub fn emit_and_reset<F, R>(&mut self, emit: F) -> R
    where
        F: FnOnce(Record<'_>) -> R,
    {
        let result = emit(Record {
            fields: &self.fields,
        });
        self.fields.iter_mut().for_each(Field::reset);

        result
    }
}

/// The values of one packet, in column order.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    fields: &'a [Field],
}

impl<'a> Record<'a> {
    pub fn values(&self) -> impl Iterator<Item = Option<&'a str>> + 'a {
        let fields = self.fields;
        fields.iter().map(Field::value)
    }

    /// Values with [`PLACEHOLDER`] for the unset ones.
    pub fn columns(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.values().map(|v| v.unwrap_or(PLACEHOLDER))
    }
}

// Json object keyed by field name, unset fields are `null`.
impl Serialize for Record<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in self.fields {
            map.serialize_entry(field.name(), &field.value())?;
        }
        map.end()
    }
}
