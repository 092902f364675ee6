pub mod extract;
pub mod slice;
