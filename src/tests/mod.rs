//! Scenario tests run on the simulated uniprocessor.

mod condvar;
mod helpers;
mod property;
