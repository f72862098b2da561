//! Scoring of collected input. [aggregator] turns one session of raw statistics into a single
//! percentage, [passive] is the coarse in-window estimator that runs next to the timer.

pub mod aggregator;
pub mod movement;
pub mod passive;
