use base64::{Engine, engine::general_purpose::STANDARD};
use rand::{Rng, distr::Alphanumeric};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::Res;

const INDENT: &[u8] = b"    ";

pub fn generate_session_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Encodes `user:password` for an HTTP Basic `Authorization` header.
pub fn basic_credentials(user: &str, password: &str) -> String {
    STANDARD.encode(format!("{}:{}", user, password))
}

pub fn to_indented_json<T: Serialize>(value: &T) -> Res<String> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
