//! Inference for a pretrained BicycleGAN generator/encoder pair.
//!
//! Loads the two networks from checkpoint files, runs one composite
//! edge|photo image through the generator under a collection of latent
//! codes, and tiles the results into a single visualization image.

pub mod checkpoint;
pub mod config;
pub mod data;
pub mod encoder;
pub mod generator;
pub mod sampler;
