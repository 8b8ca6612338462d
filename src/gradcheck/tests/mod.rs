//! Tests for the gradient checker

mod unit_check;
