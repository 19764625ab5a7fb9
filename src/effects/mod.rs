pub mod modifier;
pub mod record;
pub mod resolver;

pub use modifier::{keys, Modifier, ModifierMode, Rounding};
pub use record::{EffectDelta, EffectDuration, EffectOrigin, EffectRecord, EffectSet, EffectTemplate};
pub use resolver::{find_first, resolve, resolve_key, resolve_with, ResolveReport};
