//! # IO Module
//!
//! Interface layer that exposes backend functionality to the UI.

pub mod rest;
