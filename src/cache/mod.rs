//! Bounded, self-evicting containers for streamed updates.
//!
//! Every cache keeps the freshest `capacity` items in arrival order and drops
//! the oldest on overflow; producers are never blocked. On top of that each
//! cache tracks how many *new* updates arrived since a consumer last asked
//! (see [`UpdateCache::get_limit`]), which is what a watch call uses to decide
//! how much of the window to hand back.
//!
//! | Cache | Deduplicates by | Progress accounting |
//! |-------|-----------------|---------------------|
//! | [`UpdateCache`] | nothing | arrivals per symbol + global |
//! | [`IdentityCache`] | `(symbol, id)`, moved to tail | distinct ids per symbol + global |
//! | [`SideCache`] | `(symbol, side)`, moved to tail | distinct sides per symbol + global |
//! | [`TimeKeyedCache`] | leading timestamp, merged in place | distinct keys |

mod bounded;
mod identity;
mod progress;
mod timestamp;
mod update;

pub use bounded::BoundedSequence;
pub use identity::{ById, BySide, IdentityCache, KeyOf, KeyedCache, SideCache};
pub use timestamp::TimeKeyedCache;
pub use update::UpdateCache;
