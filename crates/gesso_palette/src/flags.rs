//! Optimization hints shared between the compiler and the runtime it targets.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Positive patch flag bits. A VNode call carries any combination of
    /// these, telling the runtime which parts need diffing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PatchFlags: i32 {
        /// Dynamic text content.
        const TEXT = 1;
        /// Dynamic class binding.
        const CLASS = 1 << 1;
        /// Dynamic style binding.
        const STYLE = 1 << 2;
        /// Dynamic non-class/style props, listed in `dynamicProps`.
        const PROPS = 1 << 3;
        /// Props with dynamic keys; requires a full diff.
        const FULL_PROPS = 1 << 4;
        /// Needs props hydration (`.prop` bindings, event listeners on SSR).
        const NEED_HYDRATION = 1 << 5;
        /// Fragment whose children order never changes.
        const STABLE_FRAGMENT = 1 << 6;
        /// Fragment with keyed children.
        const KEYED_FRAGMENT = 1 << 7;
        /// Fragment with unkeyed children.
        const UNKEYED_FRAGMENT = 1 << 8;
        /// Only non-props patching (refs, directives, vnode hooks).
        const NEED_PATCH = 1 << 9;
        /// Component with dynamic slots.
        const DYNAMIC_SLOTS = 1 << 10;
        /// Root fragment created only because of user comments.
        const DEV_ROOT_FRAGMENT = 1 << 11;
    }
}

/// The complete patch flag of a VNode call.
///
/// The two negative sentinels are exclusive: they never carry positive bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatchFlag {
    Dynamic(PatchFlags),
    /// Static, hoisted vnode. Never needs patching.
    Hoisted,
    /// Exit optimized mode and diff fully.
    Bail,
}

impl PatchFlag {
    /// Numeric value as emitted into generated code.
    pub fn value(self) -> i32 {
        match self {
            Self::Dynamic(flags) => flags.bits(),
            Self::Hoisted => -1,
            Self::Bail => -2,
        }
    }

    /// Names of the set flags, comma separated.
    pub fn names(self) -> crate::String {
        match self {
            Self::Dynamic(flags) => {
                let mut out = crate::String::default();
                for (i, (name, _)) in flags.iter_names().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(name);
                }
                out
            }
            Self::Hoisted => crate::String::const_new("HOISTED"),
            Self::Bail => crate::String::const_new("BAIL"),
        }
    }

    /// Code form with an explanatory comment, e.g. `9 /* TEXT, PROPS */`.
    pub fn to_code(self) -> crate::String {
        crate::format_compact!("{} /* {} */", self.value(), self.names())
    }

    /// Adds positive bits. Sentinels are left untouched.
    pub fn with(self, bits: PatchFlags) -> Self {
        match self {
            Self::Dynamic(flags) => Self::Dynamic(flags | bits),
            other => other,
        }
    }

    pub fn contains(self, bits: PatchFlags) -> bool {
        matches!(self, Self::Dynamic(flags) if flags.contains(bits))
    }

    pub fn is_empty(self) -> bool {
        matches!(self, Self::Dynamic(flags) if flags.is_empty())
    }
}

impl From<PatchFlags> for PatchFlag {
    fn from(flags: PatchFlags) -> Self {
        Self::Dynamic(flags)
    }
}

/// How a component's slots may be cached across re-renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SlotFlags {
    /// Slots only reference slot props or context state.
    Stable = 1,
    /// Slots reference scope variables or are conditional/iterated.
    Dynamic = 2,
    /// `<slot/>` forwarded into a child component; decided at runtime.
    Forwarded = 3,
}

impl SlotFlags {
    pub fn name(self) -> &'static str {
        match self {
            Self::Stable => "STABLE",
            Self::Dynamic => "DYNAMIC",
            Self::Forwarded => "FORWARDED",
        }
    }

    pub fn to_code(self) -> crate::String {
        crate::format_compact!("{} /* {} */", self as u8, self.name())
    }
}
