pub mod context;
pub mod dom;
pub mod extract;
pub mod highlight;
