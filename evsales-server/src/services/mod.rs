mod sales_context;

pub use sales_context::*;
