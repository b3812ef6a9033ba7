use super::model::{Table, Value};

// ---------------------------------------------------------------------------
// Lookup tables: short code → display label
// ---------------------------------------------------------------------------

/// A code as it appears in the source file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Code {
    Text(&'static str),
    Number(i64),
}

impl Code {
    /// Numeric codes also match integral floats (`100.0` is code `100`).
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Code::Text(code), Value::String(s)) => s.as_str() == *code,
            (Code::Number(code), Value::Integer(i)) => i == code,
            (Code::Number(code), Value::Float(f)) => *f == *code as f64,
            _ => false,
        }
    }
}

/// A fixed mapping for one column.
#[derive(Debug)]
pub struct Lookup {
    pub column: &'static str,
    pub entries: &'static [(Code, &'static str)],
}

impl Lookup {
    /// Label for a known code; anything else passes through unchanged.
    pub fn apply(&self, value: &Value) -> Value {
        self.entries
            .iter()
            .find(|(code, _)| code.matches(value))
            .map(|(_, label)| Value::from(*label))
            .unwrap_or_else(|| value.clone())
    }
}

pub const EXPERIENCE_LEVEL: Lookup = Lookup {
    column: "experience_level",
    entries: &[
        (Code::Text("EN"), "Débutant"),
        (Code::Text("MI"), "Intermédiaire"),
        (Code::Text("SE"), "Senior"),
        (Code::Text("EX"), "Expert"),
    ],
};

pub const COMPANY_SIZE: Lookup = Lookup {
    column: "company_size",
    entries: &[
        (Code::Text("S"), "Petite"),
        (Code::Text("M"), "Moyenne"),
        (Code::Text("L"), "Grande"),
    ],
};

pub const EMPLOYMENT_TYPE: Lookup = Lookup {
    column: "employment_type",
    entries: &[
        (Code::Text("FT"), "Temps plein"),
        (Code::Text("PT"), "Temps partiel"),
        (Code::Text("CT"), "Contrat"),
        (Code::Text("FL"), "Freelance"),
    ],
};

pub const REMOTE_RATIO: Lookup = Lookup {
    column: "remote_ratio",
    entries: &[
        (Code::Number(0), "Présentiel"),
        (Code::Number(50), "Hybride"),
        (Code::Number(100), "Télétravail"),
    ],
};

/// Label of fully remote rows after recoding.
pub const FULLY_REMOTE: &str = "Télétravail";

pub const ALL_LOOKUPS: [&Lookup; 4] = [
    &EXPERIENCE_LEVEL,
    &COMPANY_SIZE,
    &EMPLOYMENT_TYPE,
    &REMOTE_RATIO,
];

// ---------------------------------------------------------------------------
// Recoding
// ---------------------------------------------------------------------------

/// Recode one column through `lookup`. A missing column leaves the table as is.
pub fn recode_column(table: &Table, lookup: &Lookup) -> Table {
    if table.column_index(lookup.column).is_none() {
        log::warn!("column '{}' not found, skipping recode", lookup.column);
        return table.clone();
    }
    table.map_column(lookup.column, |v| lookup.apply(v))
}

/// Replace the categorical codes of the four coded columns by their labels.
pub fn recode(table: &Table) -> Table {
    ALL_LOOKUPS
        .iter()
        .fold(table.clone(), |acc, lookup| recode_column(&acc, lookup))
}
