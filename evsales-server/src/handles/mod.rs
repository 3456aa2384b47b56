mod index_handle;
mod sales_handle;

pub use index_handle::*;
pub use sales_handle::*;
