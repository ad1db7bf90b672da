pub mod csv;
pub mod serialization;
pub mod synthetic;
