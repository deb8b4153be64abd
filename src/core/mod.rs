pub mod dedup;
pub mod frame;
pub mod grouping;
pub mod imaging;
pub mod preprocess;
pub mod scorer;
