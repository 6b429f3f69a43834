//! Shared test utilities: canned-response transport and WFS document fixtures.

pub mod fixtures;
pub mod mocks;
