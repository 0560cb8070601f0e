pub mod block;
pub mod cursor;
pub mod doc_lengths;
pub mod page_table;

pub use cursor::Cursor;
