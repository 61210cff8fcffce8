//! Hash computations and the combine-hash expression they compile to.

use std::collections::HashSet;
use std::fmt;

use common_error::{StrataError, StrataResult};
use strata_plan::expr::{Expression, Literal};
use strata_plan::Symbol;

/// Seed of the combine-hash fold.
pub const INITIAL_HASH_VALUE: i64 = 0;

/// Hash contributed by a NULL key.
pub const NULL_HASH_CODE: i64 = 0;

/// Scalar operator hashing a single value.
pub const HASH_CODE_FUNCTION: &str = "$operator$HASH_CODE";

/// Scalar function mixing a running hash with the next value's hash.
pub const COMBINE_HASH_FUNCTION: &str = "combine_hash";

/// The combined hash of an ordered, non-empty list of columns.
///
/// Equality is element-wise: order and repeated columns are significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HashComputation {
    fields: Vec<Symbol>,
}

impl HashComputation {
    /// Hash over `fields`. An empty list is an internal error.
    pub fn new(fields: Vec<Symbol>) -> StrataResult<Self> {
        if fields.is_empty() {
            return Err(StrataError::internal("hash computation fields can not be empty"));
        }
        Ok(Self { fields })
    }

    /// The hashed columns, in order.
    pub fn fields(&self) -> &[Symbol] {
        &self.fields
    }

    /// Whether every hashed column is in `available`.
    pub fn can_compute_with(&self, available: &HashSet<Symbol>) -> bool {
        self.fields.iter().all(|field| available.contains(field))
    }

    /// Rename every column through `translator`; `None` if any column is unmapped.
    pub fn translate<F>(&self, translator: F) -> Option<Self>
    where
        F: Fn(&Symbol) -> Option<Symbol>,
    {
        let fields = self
            .fields
            .iter()
            .map(translator)
            .collect::<Option<Vec<_>>>()?;
        Some(Self { fields })
    }

    /// Scalar expression computing this hash.
    pub fn to_expression(&self) -> Expression {
        fold_hash(&self.fields)
    }
}

impl fmt::Display for HashComputation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hash(")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}")?;
        }
        write!(f, ")")
    }
}

/// Hash computation over `fields`, or `None` for an empty list.
pub fn compute_hash(fields: &[Symbol]) -> Option<HashComputation> {
    if fields.is_empty() {
        return None;
    }
    Some(HashComputation {
        fields: fields.to_vec(),
    })
}

/// Combine-hash expression over `fields`, or `None` for an empty list.
///
/// ```text
/// combine_hash(combine_hash(BIGINT '0', COALESCE($operator$HASH_CODE(a), 0)), COALESCE($operator$HASH_CODE(b), 0))
/// ```
pub fn hash_expression(fields: &[Symbol]) -> Option<Expression> {
    if fields.is_empty() {
        return None;
    }
    Some(fold_hash(fields))
}

fn fold_hash(fields: &[Symbol]) -> Expression {
    fields.iter().fold(
        Expression::Literal(Literal::BigInt(INITIAL_HASH_VALUE)),
        |accumulator, field| {
            let field_hash = Expression::Coalesce(vec![
                Expression::call(HASH_CODE_FUNCTION, vec![Expression::symbol(field)]),
                Expression::Literal(Literal::Long(NULL_HASH_CODE)),
            ]);
            Expression::call(COMBINE_HASH_FUNCTION, vec![accumulator, field_hash])
        },
    )
}
