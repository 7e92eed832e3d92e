//! # sniffy-core
//!
//! Flow model shared by the capture pipeline and the exporter: what a frame
//! looks like once summarised, which way it travelled, how it is keyed and
//! how long its key stays alive.
//!
//! ### Key Submodules:
//! - `flow`: `FlowDescriptor` extraction and TCP flag classification
//! - `direction`: outgoing / incoming / generic by local MAC
//! - `field`: ordered field selection after exclusions
//! - `key`: injective flow key codec
//! - `ttl`: last-seen table with expiry sweeps
//! - `time`: wall and manual clocks

pub mod direction;
pub mod field;
pub mod flow;
pub mod key;
pub mod time;
pub mod ttl;

pub mod prelude {
    pub use crate::direction::Direction;
    pub use crate::field::{FieldError, FieldSelector, FlowField, LabelValues};
    pub use crate::flow::{classify_tcp_flags, FlowDescriptor};
    pub use crate::key::{FlowKey, KeyCodec, KeyError};
    pub use crate::time::{Clock, ManualClock, SystemClock};
    pub use crate::ttl::{SweepReport, TtlStore};
}
