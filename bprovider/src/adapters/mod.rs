#[cfg(feature = "provider-openai")]
pub mod openai;
