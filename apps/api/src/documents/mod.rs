//! Document intake and retrieval: text extraction, object storage, the
//! `documents` table and its HTTP handlers.

pub mod extract;
pub mod handlers;
pub mod storage;
pub mod store;
pub mod upload;
