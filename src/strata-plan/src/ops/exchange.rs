//! Exchanges: data movement between stages and workers.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{OrderingScheme, PlanNode};
use crate::expr::Literal;
use crate::{PlanNodeId, Symbol};

/// System partitioning functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartitioningHandle {
    /// Everything on one worker.
    Single,
    /// Rows hash-distributed on the partitioning arguments.
    FixedHash,
    /// Rows spread without regard to content.
    FixedArbitrary,
    /// Every row sent to every worker.
    FixedBroadcast,
    /// Partitioning inherited from the data source.
    Source,
}

impl fmt::Display for PartitioningHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Single => "SINGLE",
            Self::FixedHash => "HASH",
            Self::FixedArbitrary => "ROUND_ROBIN",
            Self::FixedBroadcast => "BROADCAST",
            Self::Source => "SOURCE",
        };
        f.write_str(name)
    }
}

/// An argument of a partitioning function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgumentBinding {
    /// A column of the partitioned rows.
    Column(Symbol),
    /// A constant.
    Constant(Literal),
}

impl ArgumentBinding {
    /// The column, for column bindings.
    pub fn column(&self) -> Option<&Symbol> {
        match self {
            Self::Column(symbol) => Some(symbol),
            Self::Constant(_) => None,
        }
    }
}

/// Partitioning function and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partitioning {
    /// Partitioning function.
    pub handle: PartitioningHandle,
    /// Function arguments.
    pub arguments: Vec<ArgumentBinding>,
}

impl Partitioning {
    /// Partitioning with column arguments only.
    pub fn on_columns(handle: PartitioningHandle, columns: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            handle,
            arguments: columns.into_iter().map(ArgumentBinding::Column).collect(),
        }
    }

    /// The argument columns, or `None` if any argument is a constant.
    pub fn column_arguments(&self) -> Option<Vec<Symbol>> {
        self.arguments
            .iter()
            .map(|argument| argument.column().cloned())
            .collect()
    }
}

/// How an exchange lays out and routes its output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitioningScheme {
    /// Partitioning function.
    pub partitioning: Partitioning,
    /// Output columns, in order.
    pub output_layout: Vec<Symbol>,
    /// Output column holding the precomputed partitioning hash.
    pub hash_column: Option<Symbol>,
    /// Send null-keyed rows (and one arbitrary row) to every partition.
    pub replicate_nulls_and_any: bool,
    /// Explicit bucket → partition assignment.
    pub bucket_to_partition: Option<Vec<u32>>,
}

impl PartitioningScheme {
    /// Scheme with the given function and layout and no extras.
    pub fn new(partitioning: Partitioning, output_layout: Vec<Symbol>) -> Self {
        Self {
            partitioning,
            output_layout,
            hash_column: None,
            replicate_nulls_and_any: false,
            bucket_to_partition: None,
        }
    }

    /// Whether this is the system hash distribution over plain columns.
    pub fn is_fixed_hash_on_columns(&self) -> bool {
        self.partitioning.handle == PartitioningHandle::FixedHash
            && self.partitioning.column_arguments().is_some()
    }
}

/// Kind of data movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExchangeType {
    /// All sources to one consumer.
    Gather,
    /// Rows routed by the partitioning function.
    Repartition,
    /// Every row to every consumer.
    Replicate,
}

/// Where the exchange runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExchangeScope {
    /// Between drivers of one worker.
    Local,
    /// Between workers.
    Remote,
}

/// Stage boundary fanning in one or more sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeNode {
    pub id: PlanNodeId,
    /// Kind of movement.
    pub exchange_type: ExchangeType,
    /// Local or remote.
    pub scope: ExchangeScope,
    /// Output layout and routing.
    pub partitioning_scheme: PartitioningScheme,
    /// Inputs.
    pub sources: Vec<PlanNode>,
    /// Per source, the source column feeding each output layout position.
    pub inputs: Vec<Vec<Symbol>>,
    /// Merge ordering, for sorted exchanges.
    pub ordering_scheme: Option<OrderingScheme>,
}

impl ExchangeNode {
    /// Output layout position → column of source `source_index`.
    pub fn output_to_input(&self, source_index: usize) -> HashMap<Symbol, Symbol> {
        let inputs = self.inputs.get(source_index).map_or(&[][..], Vec::as_slice);
        self.partitioning_scheme
            .output_layout
            .iter()
            .cloned()
            .zip(inputs.iter().cloned())
            .collect()
    }
}
