//! Core value types shared by every layer: addresses, networks, constants.

pub mod address;
pub mod keys;
pub mod network;
