//! Symbols, their types, and the allocator that mints fresh ones.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Name prefix of every symbol holding a precomputed hash value.
pub const HASH_SYMBOL_HINT: &str = "$hashvalue";

/// An opaque column identifier, unique within one plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Wrap a name as a symbol. Uniqueness is the allocator's job.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The symbol's name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// SQL data type of a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Boolean.
    Boolean,
    /// 8-bit signed integer.
    TinyInt,
    /// 16-bit signed integer.
    SmallInt,
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    BigInt,
    /// 32-bit float.
    Real,
    /// 64-bit float.
    Double,
    /// Variable-length string.
    Varchar,
    /// Variable-length binary.
    Varbinary,
    /// Calendar date.
    Date,
    /// Timestamp.
    Timestamp,
    /// Array of elements.
    Array(Box<Self>),
    /// Type of a bare NULL.
    Unknown,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "boolean"),
            Self::TinyInt => write!(f, "tinyint"),
            Self::SmallInt => write!(f, "smallint"),
            Self::Integer => write!(f, "integer"),
            Self::BigInt => write!(f, "bigint"),
            Self::Real => write!(f, "real"),
            Self::Double => write!(f, "double"),
            Self::Varchar => write!(f, "varchar"),
            Self::Varbinary => write!(f, "varbinary"),
            Self::Date => write!(f, "date"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::Array(element) => write!(f, "array({element})"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Read-only symbol → type lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeProvider {
    types: HashMap<Symbol, DataType>,
}

impl TypeProvider {
    /// Build a provider from explicit entries.
    pub fn new(types: impl IntoIterator<Item = (Symbol, DataType)>) -> Self {
        Self {
            types: types.into_iter().collect(),
        }
    }

    /// Type of `symbol`, if known.
    pub fn get(&self, symbol: &Symbol) -> Option<&DataType> {
        self.types.get(symbol)
    }

    /// Whether `symbol` is known and has the given type.
    pub fn is(&self, symbol: &Symbol, data_type: &DataType) -> bool {
        self.get(symbol) == Some(data_type)
    }

    /// Number of typed symbols.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no symbol is typed.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Mints symbols that are unique within one planning session.
///
/// Allocation is deterministic: two allocators in the same state hand out the
/// same sequence of names.
#[derive(Debug, Clone, Default)]
pub struct SymbolAllocator {
    symbols: IndexMap<Symbol, DataType>,
    next_id: u64,
}

impl SymbolAllocator {
    /// Create an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh symbol named after `hint`.
    ///
    /// The hint is used verbatim when free, otherwise a numeric suffix is
    /// appended until the name is unused.
    pub fn new_symbol(&mut self, hint: &str, data_type: DataType) -> Symbol {
        let mut candidate = Symbol::new(hint);
        while self.symbols.contains_key(&candidate) {
            self.next_id += 1;
            candidate = Symbol::new(format!("{hint}_{}", self.next_id));
        }
        self.symbols.insert(candidate.clone(), data_type);
        candidate
    }

    /// Allocate a fresh `bigint` symbol for a precomputed hash.
    pub fn new_hash_symbol(&mut self) -> Symbol {
        self.new_symbol(HASH_SYMBOL_HINT, DataType::BigInt)
    }

    /// Type of a symbol handed out by this allocator.
    pub fn type_of(&self, symbol: &Symbol) -> Option<&DataType> {
        self.symbols.get(symbol)
    }

    /// Snapshot of all known symbol types.
    pub fn types(&self) -> TypeProvider {
        TypeProvider::new(
            self.symbols
                .iter()
                .map(|(symbol, data_type)| (symbol.clone(), data_type.clone())),
        )
    }
}
