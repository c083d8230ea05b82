pub mod decoding;
pub mod seq2seq;

pub use seq2seq::Seq2SeqProvider;
