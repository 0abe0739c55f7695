//! Scenario-based tests for jobflow

mod dependency_errors;
mod failure_handling;
mod success_chain;
