//! Front matter splitting, parsing and re-emission.
//!
//! Front matter is kept as an ordered [`Mapping`] together with the verbatim
//! block text. Untouched documents are re-emitted byte-for-byte; only a
//! document whose mapping was edited is re-serialized.

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Invalid YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Front matter is not a mapping (found {0})")]
    NotMapping(&'static str),

    #[error("Front matter block is not terminated by a closing `---` line")]
    Unterminated,
}

/// The `tags` field, which authors write either as a bare scalar or a list.
///
/// Always read through [`TagField::values`], which flattens both shapes into
/// one ordered sequence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TagField {
    One(String),
    Many(Vec<Value>),
}

impl TagField {
    /// Ordered tag values. A scalar may hold a comma-separated list.
    pub fn values(&self) -> Vec<String> {
        match self {
            TagField::One(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            TagField::Many(items) => items.iter().filter_map(scalar_to_string).collect(),
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.values().iter().any(|t| t == tag)
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parsed front matter of one document
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    raw: String,
    fields: Mapping,
    edited: bool,
}

impl FrontMatter {
    /// Parse the text between the `---` delimiters.
    pub fn parse(raw: &str) -> Result<Self, FrontmatterError> {
        let fields = match serde_yaml::from_str::<Value>(raw)? {
            Value::Mapping(map) => map,
            Value::Null => Mapping::new(),
            Value::Sequence(_) => return Err(FrontmatterError::NotMapping("a sequence")),
            Value::Tagged(_) => return Err(FrontmatterError::NotMapping("a tagged value")),
            _ => return Err(FrontmatterError::NotMapping("a scalar")),
        };

        Ok(Self {
            raw: raw.to_string(),
            fields,
            edited: false,
        })
    }

    /// Build front matter from scratch (for generated pages).
    pub fn from_fields(fields: Mapping) -> Self {
        Self {
            raw: String::new(),
            fields,
            edited: true,
        }
    }

    pub fn fields(&self) -> &Mapping {
        &self.fields
    }

    pub fn is_edited(&self) -> bool {
        self.edited
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The `title` as text; numbers and booleans are accepted too.
    pub fn title(&self) -> Option<String> {
        self.get("title").and_then(scalar_to_string)
    }

    /// The `tags` field, or `None` when absent or of an unusable shape.
    pub fn tags(&self) -> Option<TagField> {
        let value = self.get("tags")?;
        serde_yaml::from_value(value.clone()).ok()
    }

    pub fn tag_values(&self) -> Vec<String> {
        self.tags().map(|t| t.values()).unwrap_or_default()
    }

    /// Boolean flag lookup; `Some` only for real YAML booleans.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Remove every occurrence of `tag` from `tags`, keeping the remaining
    /// order. Returns whether anything was removed.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let Some(field) = self.tags() else {
            return false;
        };
        if !field.contains(tag) {
            return false;
        }

        let remaining: Vec<Value> = match field {
            TagField::One(_) => field
                .values()
                .into_iter()
                .filter(|t| t != tag)
                .map(Value::String)
                .collect(),
            TagField::Many(items) => items
                .into_iter()
                .filter(|item| scalar_to_string(item).as_deref() != Some(tag))
                .collect(),
        };

        self.fields
            .insert(Value::from("tags"), Value::Sequence(remaining));
        self.edited = true;
        true
    }

    pub fn remove_key(&mut self, key: &str) -> bool {
        let removed = self.fields.shift_remove(key).is_some();
        self.edited |= removed;
        removed
    }

    /// Text to place between the delimiters, always newline-terminated
    /// unless empty.
    pub fn render(&self) -> Result<String, FrontmatterError> {
        if !self.edited {
            return Ok(self.raw.clone());
        }
        if self.fields.is_empty() {
            return Ok(String::new());
        }
        Ok(serde_yaml::to_string(&self.fields)?)
    }
}

/// A markdown document split into front matter and body
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub front_matter: Option<FrontMatter>,
    pub body: String,
}

impl ParsedDocument {
    /// Serialize back to markdown with a `---` delimited block.
    pub fn render(&self) -> Result<String, FrontmatterError> {
        match &self.front_matter {
            Some(fm) => {
                let mut block = fm.render()?;
                if !block.is_empty() && !block.ends_with('\n') {
                    block.push('\n');
                }
                Ok(format!("---\n{}---\n{}", block, self.body))
            }
            None => Ok(self.body.clone()),
        }
    }
}

fn is_boundary(line: &str) -> bool {
    line.trim_end() == "---"
}

/// Split raw document text into `(front matter block, body)`.
///
/// Returns `Ok(None)` when the document does not open with a `---` line.
pub fn split_front_matter(content: &str) -> Result<Option<(&str, &str)>, FrontmatterError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');

    let Some(first) = lines.next() else {
        return Ok(None);
    };
    if !is_boundary(first) {
        return Ok(None);
    }

    let block_start = first.len();
    let mut offset = block_start;
    for line in lines {
        if is_boundary(line) {
            let block = &content[block_start..offset];
            let body = &content[offset + line.len()..];
            return Ok(Some((block, body)));
        }
        offset += line.len();
    }

    Err(FrontmatterError::Unterminated)
}

/// Parse markdown content into front matter and body
///
/// # Example
///
/// ```
/// use notepress_core::frontmatter::parse_document;
///
/// let content = "---\ntitle: My Post\ntags: [note, publish]\n---\n# Hello World\n";
///
/// let doc = parse_document(content).unwrap();
/// let fm = doc.front_matter.unwrap();
/// assert_eq!(fm.title().as_deref(), Some("My Post"));
/// assert_eq!(fm.tag_values(), vec!["note", "publish"]);
/// assert!(doc.body.starts_with("# Hello World"));
/// ```
pub fn parse_document(content: &str) -> Result<ParsedDocument, FrontmatterError> {
    match split_front_matter(content)? {
        Some((block, body)) => Ok(ParsedDocument {
            front_matter: Some(FrontMatter::parse(block)?),
            body: body.to_string(),
        }),
        None => Ok(ParsedDocument {
            front_matter: None,
            body: content.to_string(),
        }),
    }
}
