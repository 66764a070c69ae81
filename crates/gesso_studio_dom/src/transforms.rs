//! DOM node and directive transforms.

pub mod ignore_side_effect_tags;
pub mod transform_style;
pub mod transition;
pub mod v_html;
pub mod v_model;
pub mod v_on;
pub mod v_show;
pub mod v_text;

pub use ignore_side_effect_tags::ignore_side_effect_tags;
pub use transform_style::transform_style;
pub use transition::warn_transition_children;
pub use v_html::transform_v_html;
pub use v_model::transform_v_model;
pub use v_on::transform_v_on;
pub use v_show::transform_v_show;
pub use v_text::transform_v_text;
