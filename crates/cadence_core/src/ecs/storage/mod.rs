// mod.rs - Component storage: typed columns and the per-type locked store

mod column;
mod store;

pub use column::Column;
pub(crate) use column::ErasedColumn;
pub use store::ComponentStore;
