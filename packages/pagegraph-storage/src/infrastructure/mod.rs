pub mod fm_index;
pub mod fs;
pub mod memory;
pub mod reindex;
pub mod tantivy_index;
