pub mod channel;
pub mod summarize;
