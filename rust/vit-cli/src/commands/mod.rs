pub mod infer;
pub mod summarize;
pub mod validate;
