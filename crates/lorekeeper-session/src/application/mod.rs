//! Scenario selection and activation.

pub mod scenarios;
