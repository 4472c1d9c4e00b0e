//! Site bracketer: development scoring and bracket analysis of athletes'
//! power and acceleration tests.

pub mod analysis;
pub mod assembler;
pub mod bracket;
pub mod config;
pub mod development;
pub mod domain;
pub mod error;
pub mod formulas;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod prefilter;
pub mod region;
pub mod report;
pub mod standards;
