pub mod adapter;
pub mod feed;
pub mod firestore;
pub mod identity;
