//! Rig-backed front end for the consensus debate.
//!
//! Wires the `coordination` core to an OpenAI-compatible endpoint: persona
//! generator and consensus judge agents, configuration loading, and plain-text
//! rendering for the `consensus-chat` binary.

pub mod agents;
pub mod config;
pub mod prompts;
pub mod render;
