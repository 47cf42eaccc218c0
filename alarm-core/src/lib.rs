#![no_std]

// Shared logic for the camper alarm controller.
//
// This crate stays portable across MCU firmware and host tooling by avoiding the
// Rust standard library. Hardware sits behind the small collaborator traits in
// `keypad`, `sensors` and `dashboard`; everything else is plain state driven by
// a millisecond clock.

pub mod alarm;
pub mod charger;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod debounce;
pub mod encoder;
pub mod inputs;
pub mod keypad;
pub mod passphrase;
pub mod script;
pub mod sensors;
pub mod telemetry;
pub mod time;
