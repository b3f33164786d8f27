//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises a subsystem against the
//! recording mock fabric.  Everything runs on the host with no module
//! hardware attached.

mod enumeration_tests;
mod mock_fabric;
