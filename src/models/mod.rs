pub mod enums;
pub mod lab;
pub mod patient;
pub mod report;

pub use lab::*;
pub use patient::*;
pub use report::*;
