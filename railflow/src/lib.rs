//! RailFlow: dual-rail, four-phase asynchronous channel protocol engine.
//!
//! A producer stage drives a channel from NULL to a DATA codeword — the
//! wavefront itself is the request. The consumer detects completion
//! locally, raises the acknowledge, and the producer returns the channel
//! to NULL before the next wavefront. Chaining such channels between
//! stages yields a pipelined, clockless dataflow with no shared clock
//! edge anywhere.

// # Tries to deny all lints (`rustc -W help`).
#![deny(absolute_paths_not_starting_with_crate)]
#![deny(anonymous_parameters)]
#![deny(deprecated_in_future)]
#![deny(explicit_outlives_requirements)]
#![deny(keyword_idents)]
#![deny(macro_use_extern_crate)]
#![deny(missing_debug_implementations)]
#![deny(non_ascii_idents)]
#![deny(rust_2018_idioms)]
#![deny(trivial_numeric_casts)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(unused_extern_crates)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
//
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::private_doc_tests)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_html_tags)]
#![deny(rustdoc::invalid_rust_codeblocks)]
#![deny(rustdoc::bare_urls)]
#![deny(unreachable_pub)]
//
#![allow(elided_lifetimes_in_paths)]

pub mod channel;
pub mod control;
pub mod fault;
pub mod layout;
pub mod link;
pub mod multi;
pub mod phase;
pub mod rail;

pub use channel::{Channel, Wires};
pub use control::ControlChannel;
pub use fault::Fault;
pub use layout::{LayoutError, RailOrder};
pub use link::{Consumer, LinkError, Producer};
pub use multi::MultiChannel;
pub use phase::{FourPhase, Phase};
pub use rail::{RailPair, RailState};
