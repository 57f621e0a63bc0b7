//! Row models for the chat database.

mod message_row;

pub use message_row::MessageRow;
