pub mod dashboard;
pub mod topic_detail;
pub mod topics;
