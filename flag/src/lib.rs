//! getopt-style flags: a typed flag registry and a POSIX/GNU argument
//! parser.
//!
//! - [`FlagSet`] — registry of named flags, parsing and listings.
//! - [`Value`] — the text contract every flag value implements, with the
//!   boolean-flag and hidden capability markers.
//! - [`Var`] — shared storage for built-in typed values; keep a clone to read
//!   the parsed result.
//! - Structured values — string lists and `key=value` maps with a shared
//!   quoting convention ([`parse_list`], [`parse_map`]).
//!
//! Syntax accepted by [`FlagSet::parse`]:
//!
//! ```text
//! -a          short boolean flag
//! -abc        clustered short booleans
//! -c 12 -c12  short flag with separate or stuck value
//! --all       long boolean flag
//! --all=false long boolean flag with explicit value
//! --count 12  long flag, value in the next argument
//! --count=12  long flag, inline value
//! --          end of flags
//! -           positional argument
//! ```
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use cmder_flag::FlagSet;
//!
//! let mut fs = FlagSet::new("serve");
//! let addr = fs.string("addr", ":8080", "listen `address`");
//! fs.alias("addr", "a");
//! let verbose = fs.bool("v", false, "verbose logging");
//! let timeout = fs.duration("timeout", Duration::from_secs(30), "request timeout");
//! let labels = fs.map("label", "extra `key=value` labels");
//!
//! fs.parse(["-va", ":9000", "--timeout=1m30s", "--label", "env=prod,zone=\"eu, west\"", "site"])
//!     .unwrap();
//!
//! assert!(verbose.get());
//! assert_eq!(addr.get(), ":9000");
//! assert_eq!(timeout.get(), Duration::from_secs(90));
//! assert_eq!(labels.borrow()["zone"], "eu, west");
//! assert_eq!(fs.args(), ["site"]);
//! ```

mod duration;
mod error;
mod flagset;
mod parser;
mod primitive;
mod structured;
mod timestamp;
mod value;

pub use duration::{format_duration, parse_duration};
pub use error::{FlagError, FlagNameError, ValueError};
pub use flagset::{Flag, FlagSet, validate_flag_name};
pub use primitive::parse_bool;
pub use structured::{format_list, format_map, parse_list, parse_map};
pub use value::{
    BoolFuncValue, FlagType, FuncValue, Hidden, SharedValue, TextValue, Value, ValueKind,
    Var, value_identity,
};
