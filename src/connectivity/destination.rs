use std::{
    collections::HashMap,
    io::ErrorKind,
    path::PathBuf,
};

use async_trait::async_trait;

use crate::{Res, error::GatewayError, types::DestinationProperties};

/// Supplies the configuration of named destinations.
#[async_trait]
pub trait DestinationResolver: Send + Sync {
    async fn get_properties(&self, name: &str) -> Res<DestinationProperties>;
}

/// Destinations held in memory, for tests and embedded setups.
#[derive(Debug, Clone, Default)]
pub struct StaticDestinations {
    destinations: HashMap<String, HashMap<String, String>>,
}

impl StaticDestinations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<K, V>(mut self, name: &str, properties: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let values = properties
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.destinations.insert(name.to_string(), values);
        self
    }
}

#[async_trait]
impl DestinationResolver for StaticDestinations {
    async fn get_properties(&self, name: &str) -> Res<DestinationProperties> {
        let values = self
            .destinations
            .get(name)
            .ok_or_else(|| GatewayError::DestinationNotFound(name.to_string()))?;
        Ok(DestinationProperties::new(name, values.clone()))
    }
}

/// Destinations stored as properties files, one per destination, the way the
/// hosting platform exports them.
///
/// A destination named `concur-api` is read from `<dir>/concur-api`, falling
/// back to `<dir>/concur-api.properties`. Files are read on every lookup.
#[derive(Debug, Clone)]
pub struct FileDestinations {
    dir: PathBuf,
}

impl FileDestinations {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileDestinations { dir: dir.into() }
    }

    async fn read(&self, name: &str) -> Res<Option<String>> {
        // names come from code, but never let one escape the directory
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Ok(None);
        }

        for file in [name.to_string(), format!("{}.properties", name)] {
            match async_fs::read_to_string(self.dir.join(&file)).await {
                Ok(content) => return Ok(Some(content)),
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl DestinationResolver for FileDestinations {
    async fn get_properties(&self, name: &str) -> Res<DestinationProperties> {
        let content = self
            .read(name)
            .await?
            .ok_or_else(|| GatewayError::DestinationNotFound(name.to_string()))?;
        Ok(DestinationProperties::new(name, parse_properties(&content)))
    }
}

/// Parses `key=value` lines in Java properties style: `#` and `!` start
/// comments, `=` or `:` separate key and value, backslash escapes the next
/// character (`https\://host`).
pub fn parse_properties(content: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let mut key = String::new();
        let mut chars = line.chars();
        let mut separated = false;
        while let Some(c) = chars.next() {
            match c {
                '\\' => key.extend(chars.next()),
                '=' | ':' => {
                    separated = true;
                    break;
                }
                _ => key.push(c),
            }
        }
        let raw_value = if separated { chars.as_str() } else { "" };

        let key = key.trim().to_string();
        if key.is_empty() {
            continue;
        }
        values.insert(key, unescape(raw_value.trim()));
    }

    values
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
