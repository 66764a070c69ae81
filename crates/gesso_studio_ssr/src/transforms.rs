//! Per-node rendering for the server pass.

pub mod component;
pub mod element;
pub mod slot_outlet;
pub mod v_model;

pub use element::is_ssr_safe_attr_name;
