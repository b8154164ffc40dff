pub mod responders;
pub mod storage;
