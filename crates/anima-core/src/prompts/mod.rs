//! Prompt construction for the bridge: the per-turn system directive, the
//! reflection instruction, and the self-directed (latent) generations.

mod directive;
mod latent;

pub use directive::{reflection_prompt, system_directive};
pub use latent::{
    dream_prompt, introspection_prompt, proactive_prompt, INTROSPECTION_THEMES,
};
