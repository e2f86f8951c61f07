//! Built-in storage adapters.

mod embedded;
mod key_value;
mod null;
mod relational;

pub use embedded::EmbeddedAdapter;
pub use key_value::KeyValueAdapter;
pub use null::{NullAdapter, UnimplementedAdapter};
pub use relational::{OrmAdapter, RelationalAdapter};

use quarry_core::Error;

fn not_connected(adapter: &str) -> Error {
    Error::storage(format!(
        "the {adapter} adapter has no datastore; connect one first"
    ))
}
