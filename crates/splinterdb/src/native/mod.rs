//! Backend that drives libsplinterdb through `splinterdb-sys`.

mod callbacks;
mod cursor;
mod db;

pub use cursor::SplinterCursor;
pub use db::SplinterDb;
