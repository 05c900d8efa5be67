/*!
 * Translation history persistence.
 *
 * Every completed run appends one record: the source file, the language
 * pair, how many pages were processed, which of them failed and the output
 * files written. Records are stored in SQLite.
 */

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

pub use connection::DatabaseConnection;
pub use models::{HistoryRecord, NewHistoryRecord};
pub use repository::HistoryRepository;
