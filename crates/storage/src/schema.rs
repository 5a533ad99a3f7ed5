//! Per-chain table and index names.

const TABLE_SUFFIX: &str = "sys_x_stored_vector";
const INDEX_PREFIX: &str = "idx_";

pub const COLUMN_CONTEXT: &str = "context";
pub const COLUMN_ID: &str = "id";
pub const COLUMN_EMBEDDING: &str = "embedding";

const INDEX_CONTEXT_ID: &str = "context_id";
/// L2 index from the first schema revision; dropped on every initialize.
const INDEX_EMBEDDING_HNSW_L2: &str = "embedding_hnsw_index";
const INDEX_EMBEDDING_HNSW_COSINE: &str = "embedding_hnsw_index_cosine";

/// Names of the vector table and its indexes for one chain.
///
/// Derived only from the chain's numeric id, so they are always valid
/// unquoted SQL identifiers in both PostgreSQL and SQLite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub table: String,
    pub context_id_index: String,
    pub legacy_l2_index: String,
    pub cosine_index: String,
}

impl TableNames {
    #[must_use]
    pub fn for_chain(chain_iid: u64) -> Self {
        let table = format!("c{chain_iid}_{TABLE_SUFFIX}");
        let index = |name: &str| format!("{INDEX_PREFIX}{table}_{name}");
        Self {
            context_id_index: index(INDEX_CONTEXT_ID),
            legacy_l2_index: index(INDEX_EMBEDDING_HNSW_L2),
            cosine_index: index(INDEX_EMBEDDING_HNSW_COSINE),
            table,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_scoped_by_chain() {
        let names = TableNames::for_chain(7);
        assert_eq!(names.table, "c7_sys_x_stored_vector");
        assert_eq!(names.context_id_index, "idx_c7_sys_x_stored_vector_context_id");
        assert_eq!(names.legacy_l2_index, "idx_c7_sys_x_stored_vector_embedding_hnsw_index");
        assert_eq!(
            names.cosine_index,
            "idx_c7_sys_x_stored_vector_embedding_hnsw_index_cosine"
        );
        assert_ne!(TableNames::for_chain(8).table, names.table);
    }
}
