#![warn(unsafe_op_in_unsafe_fn)]
#![allow(unused_unsafe)]
#![doc = include_str!("crate-doc.md")]

mod error;
mod fast;
mod handle;
mod layout;
mod macros;
mod owner;
mod pointer;
mod protocol;
mod resolve;
mod shared;
mod simple;

pub use error::*;
pub use fast::*;
pub use handle::*;
pub use layout::probe;
pub use owner::*;
pub use pointer::*;
pub use protocol::*;
pub use resolve::*;
pub use shared::*;
pub use simple::*;
