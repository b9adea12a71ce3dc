//! XML-RPC payload codec: the value domain and its wire grammar.

mod value;
mod xml;

pub use value::Value;
pub use xml::{MethodCall, MethodResponse};
