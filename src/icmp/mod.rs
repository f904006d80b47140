pub mod v4;
