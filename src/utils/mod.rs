pub mod extract;
pub mod payload;

pub use extract::JsonBody;
pub use payload::normalize_data;
