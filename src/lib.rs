//! pysh: turn Python scripts into self-bootstrapping shell executables.
//!
//! A generated script starts with `#!/bin/sh -e` and a block of shell lines
//! that locate a Python interpreter and hand the file to the PySH runtime.
//! The same block is inert when the file is later compiled as Python. The
//! original script body is never altered, and regenerating an already
//! generated script reproduces it exactly.
#![allow(clippy::multiple_crate_versions)]

pub mod archive;
pub mod bootstrap;
pub mod config;
pub mod document;
pub mod error;
pub mod generate;
pub mod scanner;
pub mod section;

pub use error::{Error, Result};
