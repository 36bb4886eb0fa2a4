//! Data Transfer Objects for responses the gateway answers itself.

pub mod health;
