//! Shared business-logic services, decoupled from the CLI surface

pub mod matching;
