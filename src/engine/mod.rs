pub mod claim;
pub mod lifecycle;
pub mod verify;
