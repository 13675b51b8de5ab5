pub mod escape_store;
pub mod escaper;
pub mod restorer;
