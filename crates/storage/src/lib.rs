pub mod db;

pub use db::{
    create_db, delete_check, get_all_checks, insert_check, is_processed,
    prune_orphan_confidences, DbPool, LedgerEntry,
};
