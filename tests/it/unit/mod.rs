//! Unit tests for cardboard.

mod config_tests;
mod layout_tests;
mod urls_tests;
