pub mod account;
pub mod follower;
pub mod result;
