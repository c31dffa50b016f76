pub mod normalizer;
pub mod reporter;
pub mod scorer;
