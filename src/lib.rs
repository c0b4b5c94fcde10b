//! Batch speech-to-text for corpora of `waveform.wav` files.
//!
//! Inputs, outputs and model checkpoints can each live on the local
//! filesystem or in a cloud object-storage bucket. The run is strictly
//! sequential: resolve configuration, stage a remote checkpoint if needed,
//! discover inputs, load one model, transcribe each file in turn, then
//! write the aggregated results as JSON.

pub mod audio;
pub mod checkpoint;
pub mod config;
pub mod discover;
pub mod driver;
pub mod results;
pub mod storage;
pub mod transcribe;
