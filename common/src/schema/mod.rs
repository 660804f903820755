pub mod model;
pub mod normalize;
pub mod persist;

pub use model::{BackendKind, Column, Constraint, Schema, Table};
pub use normalize::{
    normalize, CatalogColumnRow, CatalogConstraintRow, PartitionListing, RawDescriptors,
    RawRelationalTable, RawWarehouseTable, Row,
};
pub use persist::{load_schema, save_schema};
