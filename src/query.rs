mod key_value;
mod query_builders;
mod query_spec;

pub use key_value::{KeyValueSettings, build_key_value_replace};
pub use query_builders::{
    build_bulk_insert, build_delete, build_insert, build_truncate, build_update,
};
pub use query_spec::QuerySpec;
