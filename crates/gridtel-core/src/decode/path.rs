use std::collections::BTreeMap;
use std::fmt;

use gridtel_api::proto::{Path, PathElem};

use super::DecodeError;

/// One element of a decoded path: a local name, the module qualifier it
/// arrived with (if any), and its key selectors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathSegment {
    pub name: String,
    pub module: Option<String>,
    pub selectors: BTreeMap<String, String>,
}

impl PathSegment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build a segment from a possibly module-qualified name such as
    /// `srl_nokia-interfaces:interface`.
    pub fn qualified(raw: &str, selectors: BTreeMap<String, String>) -> Self {
        let (module, name) = match raw.split_once(':') {
            Some((module, name)) if !module.is_empty() && !name.is_empty() => {
                (Some(module.to_owned()), name.to_owned())
            }
            _ => (None, raw.to_owned()),
        };
        Self {
            name,
            module,
            selectors,
        }
    }

    pub fn with_selector(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.selectors.insert(key.into(), value.into());
        self
    }

    pub fn selector(&self, key: &str) -> Option<&str> {
        self.selectors.get(key).map(String::as_str)
    }

    fn qualified_name(&self) -> String {
        match &self.module {
            Some(module) => format!("{module}:{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// An ordered sequence of path segments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedPath {
    segments: Vec<PathSegment>,
}

impl DecodedPath {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Parse a textual path like `/interface[name=ethernet-1/1]/statistics`.
    ///
    /// Selectors are `[key=value]` groups; several groups per element and
    /// comma-separated pairs inside one group are both accepted. Slashes
    /// inside brackets belong to the value, and `\` escapes the next
    /// character anywhere. Empty elements (leading, trailing, or doubled
    /// slashes) are skipped.
    pub fn parse(input: &str) -> Result<Self, DecodeError> {
        let fail = |reason| DecodeError::InvalidPath {
            path: input.to_owned(),
            reason,
        };

        let mut segments = Vec::new();
        let mut pending = PendingSegment::default();
        let mut state = ParseState::Name;
        let mut chars = input.chars();

        while let Some(c) = chars.next() {
            let (c, escaped) = if c == '\\' {
                (chars.next().ok_or_else(|| fail("dangling escape"))?, true)
            } else {
                (c, false)
            };

            state = match (state, c, escaped) {
                (ParseState::Name | ParseState::AfterGroup, '/', false) => {
                    pending.finish(&mut segments).map_err(fail)?;
                    ParseState::Name
                }
                (ParseState::Name | ParseState::AfterGroup, '[', false) => ParseState::Key,
                (ParseState::Name, c, _) => {
                    pending.name.push(c);
                    ParseState::Name
                }
                (ParseState::AfterGroup, _, _) => {
                    return Err(fail("unexpected character after selector"));
                }
                (ParseState::Key, '=', false) => ParseState::Value,
                (ParseState::Key, ']' | ',', false) => {
                    return Err(fail("selector without value"));
                }
                (ParseState::Key, c, _) => {
                    pending.key.push(c);
                    ParseState::Key
                }
                (ParseState::Value, ',', false) => {
                    pending.push_selector().map_err(fail)?;
                    ParseState::Key
                }
                (ParseState::Value, ']', false) => {
                    pending.push_selector().map_err(fail)?;
                    ParseState::AfterGroup
                }
                (ParseState::Value, c, _) => {
                    pending.value.push(c);
                    ParseState::Value
                }
            };
        }

        if matches!(state, ParseState::Key | ParseState::Value) {
            return Err(fail("unterminated selector"));
        }
        pending.finish(&mut segments).map_err(fail)?;

        Ok(Self { segments })
    }

    /// Join a notification prefix and an update path into one path.
    ///
    /// Pre-0.4 targets that only fill the string `element` list are
    /// accepted; each element is parsed as a textual segment.
    pub fn from_proto(prefix: Option<&Path>, path: Option<&Path>) -> Self {
        let segments = prefix
            .into_iter()
            .chain(path)
            .flat_map(proto_segments)
            .collect();
        Self { segments }
    }

    /// Convert back to a wire path, restoring module qualifiers.
    pub fn to_proto(&self) -> Path {
        Path {
            elem: self
                .segments
                .iter()
                .map(|seg| PathElem {
                    name: seg.qualified_name(),
                    key: seg
                        .selectors
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                })
                .collect(),
            ..Path::default()
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Local name of the first segment.
    pub fn root(&self) -> Option<&str> {
        self.segments.first().map(|s| s.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.segments.iter().position(|s| s.name == name)
    }

    /// First segment with the given local name.
    pub fn find(&self, name: &str) -> Option<&PathSegment> {
        self.segments.iter().find(|s| s.name == name)
    }

    /// Look up `key` on the first segment named `name`.
    pub fn selector(&self, name: &str, key: &str) -> Option<&str> {
        self.find(name).and_then(|s| s.selector(key))
    }

    /// Look up `key` on any segment.
    pub fn any_selector(&self, key: &str) -> Option<&str> {
        self.segments.iter().find_map(|s| s.selector(key))
    }

    /// Segments strictly after the first one named `name`.
    pub fn after(&self, name: &str) -> &[PathSegment] {
        match self.position(name) {
            Some(idx) => self.segments.get(idx + 1..).unwrap_or_default(),
            None => &[],
        }
    }
}

impl fmt::Display for DecodedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for seg in &self.segments {
            write!(f, "/{}", escape(&seg.qualified_name(), &['/', '[']))?;
            for (key, value) in &seg.selectors {
                write!(
                    f,
                    "[{}={}]",
                    escape(key, &['=', ']', ',']),
                    escape(value, &[']', ','])
                )?;
            }
        }
        Ok(())
    }
}

// ── Parser internals ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum ParseState {
    Name,
    Key,
    Value,
    AfterGroup,
}

#[derive(Default)]
struct PendingSegment {
    name: String,
    key: String,
    value: String,
    selectors: BTreeMap<String, String>,
}

impl PendingSegment {
    fn push_selector(&mut self) -> Result<(), &'static str> {
        if self.key.is_empty() {
            return Err("empty selector key");
        }
        self.selectors
            .insert(std::mem::take(&mut self.key), std::mem::take(&mut self.value));
        Ok(())
    }

    fn finish(&mut self, segments: &mut Vec<PathSegment>) -> Result<(), &'static str> {
        let name = std::mem::take(&mut self.name);
        let selectors = std::mem::take(&mut self.selectors);
        if name.is_empty() {
            return if selectors.is_empty() {
                Ok(())
            } else {
                Err("selector without element name")
            };
        }
        segments.push(PathSegment::qualified(&name, selectors));
        Ok(())
    }
}

fn proto_segments(path: &Path) -> Vec<PathSegment> {
    if path.elem.is_empty() {
        return path
            .element
            .iter()
            .flat_map(|raw| match DecodedPath::parse(raw) {
                Ok(parsed) => parsed.segments,
                Err(_) => vec![PathSegment::new(raw.as_str())],
            })
            .collect();
    }

    path.elem
        .iter()
        .map(|elem| {
            let selectors = elem
                .key
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            PathSegment::qualified(&elem.name, selectors)
        })
        .collect()
}

/// Backslash-escape `special` and the backslash itself.
fn escape(raw: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
