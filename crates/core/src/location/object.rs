use std::fmt;
use std::str::FromStr;

use crate::error::ResolutionError;

use super::{split_pair, Protocol, Segment};

/// Object-name address: a domain plus an ordered list of key properties,
/// e.g. `java.lang:type=GarbageCollector,name=*`.
///
/// Key properties keep declaration order. There is no relative addressing
/// for object names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectName {
    domain: String,
    keys: Vec<Segment>,
}

impl ObjectName {
    pub fn new(domain: impl Into<String>, keys: Vec<Segment>) -> Self {
        Self {
            domain: domain.into(),
            keys,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn keys(&self) -> &[Segment] {
        &self.keys
    }

    /// Look up a key property by name.
    pub fn key(&self, name: &str) -> Option<&Segment> {
        self.keys.iter().find(|k| k.name == name)
    }
}

impl FromStr for ObjectName {
    type Err = ResolutionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| ResolutionError::Malformed {
            protocol: Protocol::Object,
            input: input.to_string(),
            reason: reason.to_string(),
        };
        let (domain, props) = input
            .trim()
            .split_once(':')
            .ok_or_else(|| malformed("missing ':' between domain and key properties"))?;
        if props.is_empty() {
            return Err(malformed("no key properties"));
        }
        let mut keys: Vec<Segment> = Vec::new();
        for pair in props.split(',') {
            let (name, value) = split_pair(Protocol::Object, input, pair)?;
            if keys.iter().any(|k| k.name == name) {
                return Err(malformed("duplicate key property"));
            }
            keys.push(Segment::new(name, value));
        }
        Ok(Self {
            domain: domain.to_string(),
            keys,
        })
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.domain)?;
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_declaration_order() {
        let name: ObjectName = "domain:name=value,matchme=*".parse().unwrap();
        assert_eq!(name.domain(), "domain");
        assert_eq!(name.keys()[0].name, "name");
        assert_eq!(name.keys()[1].name, "matchme");
        assert!(name.key("matchme").unwrap().is_wildcard());
        assert_eq!(name.to_string(), "domain:name=value,matchme=*");
    }

    #[test]
    fn rejects_malformed_names() {
        assert!("no-colon".parse::<ObjectName>().is_err());
        assert!("domain:".parse::<ObjectName>().is_err());
        assert!("domain:a=1,a=2".parse::<ObjectName>().is_err());
        assert!("domain:a".parse::<ObjectName>().is_err());
    }
}
