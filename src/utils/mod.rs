//! Helpers shared by the infrastructure adapters.
//!
//! - [`db_error`] - Mapping of database write failures onto application errors

pub mod db_error;
