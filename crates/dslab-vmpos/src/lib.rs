#![doc = include_str!("../readme.md")]

pub mod algorithm;
pub mod commitment;
pub mod config;
pub mod datacenter;
pub mod error;
pub mod initialization;
pub mod local_search;
pub mod objectives;
pub mod pareto;
pub mod parsers;
pub mod placement;
pub mod power_model;
pub mod problem;
pub mod repair;
pub mod report;
pub mod solution;
pub mod sorting;
pub mod utilization;
pub mod variation;
