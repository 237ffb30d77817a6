pub mod actor;
pub mod courier;
pub mod feedback;
pub mod fraud;
pub mod menu;
pub mod order;
