// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Grammar IR for the OMeta compiler.
//!
//! This crate defines the operator tree handed over by a grammar-source
//! parser, the value domain shared by literals, input items and rule
//! results, and the holder for embedded host code.

pub mod build;
pub mod host;
pub mod node;
pub mod value;

pub use host::{Bindings, HostCode, NativeHost};
pub use node::{Dispatch, Node, NodeKind, SUPER_TAG};
pub use value::Value;
