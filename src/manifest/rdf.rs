//! Line based triple format used by `install.rdf`
//!
//! Each statement sits on its own line:
//!
//! ```text
//! @prefix aebl: <urn:2008:03:aebl-syntax-ns#> .
//! <urn:aebl:install-manifest> aebl:id "viewer@example.com" .
//! <urn:aebl:install-manifest> aebl:targetApplication _:app .
//! _:app aebl:minVersion "4.0" .
//! ```
//!
//! Subjects are IRIs or blank nodes, predicates are IRIs or prefixed names
//! and objects are IRIs, blank nodes or quoted literals. Blank lines and `#`
//! comments are ignored. Lookups hand back plain strings: literal text, IRI
//! text, or `_:label` for blank nodes, which can be used as a subject again.

use std::collections::HashMap;
use std::fmt::Write as _;

/// Object of a statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Iri(String),
    Blank(String),
    Literal(String),
}

impl Term {
    fn key(&self) -> &str {
        match self {
            Term::Iri(s) | Term::Blank(s) | Term::Literal(s) => s,
        }
    }

    fn render(&self, out: &mut String) {
        match self {
            Term::Iri(iri) => {
                let _ = write!(out, "<{iri}>");
            }
            Term::Blank(label) => out.push_str(label),
            Term::Literal(text) => {
                out.push('"');
                for c in text.chars() {
                    match c {
                        '"' => out.push_str("\\\""),
                        '\\' => out.push_str("\\\\"),
                        '\n' => out.push_str("\\n"),
                        '\r' => out.push_str("\\r"),
                        '\t' => out.push_str("\\t"),
                        c => out.push(c),
                    }
                }
                out.push('"');
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Triple {
    subject: Term,
    predicate: String,
    object: Term,
}

/// In-memory set of statements
#[derive(Debug, Clone, Default)]
pub struct TripleStore {
    triples: Vec<Triple>,
}

impl TripleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse statements, reporting the first malformed line
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut store = Self::new();
        let mut prefixes: HashMap<String, String> = HashMap::new();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut cursor = Cursor::new(line, &prefixes);
            let parsed = if line.starts_with("@prefix") {
                cursor.prefix().map(|(name, iri)| {
                    prefixes.insert(name, iri);
                })
            } else {
                cursor.statement().map(|triple| store.triples.push(triple))
            };
            parsed.map_err(|reason| format!("line {}: {}", index + 1, reason))?;
        }

        Ok(store)
    }

    /// Add a statement whose subject is an IRI or `_:label`
    pub fn add(&mut self, subject: &str, predicate: &str, object: Term) {
        let subject = if subject.starts_with("_:") {
            Term::Blank(subject.to_string())
        } else {
            Term::Iri(subject.to_string())
        };
        self.triples.push(Triple {
            subject,
            predicate: predicate.to_string(),
            object,
        });
    }

    pub fn add_literal(&mut self, subject: &str, predicate: &str, value: impl Into<String>) {
        self.add(subject, predicate, Term::Literal(value.into()));
    }

    /// All objects of `subject predicate ?`, in document order
    pub fn objects(&self, subject: &str, predicate: &str) -> Vec<&str> {
        self.triples
            .iter()
            .filter(|t| t.subject.key() == subject && t.predicate == predicate)
            .map(|t| t.object.key())
            .collect()
    }

    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for triple in &self.triples {
            triple.subject.render(&mut out);
            let _ = write!(out, " <{}> ", triple.predicate);
            triple.object.render(&mut out);
            out.push_str(" .\n");
        }
        out
    }
}

struct Cursor<'a> {
    rest: &'a str,
    prefixes: &'a HashMap<String, String>,
}

impl<'a> Cursor<'a> {
    fn new(line: &'a str, prefixes: &'a HashMap<String, String>) -> Self {
        Self {
            rest: line,
            prefixes,
        }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn expect_end(&mut self) -> Result<(), String> {
        self.skip_ws();
        let Some(rest) = self.rest.strip_prefix('.') else {
            return Err("expected '.' at end of statement".to_string());
        };
        let rest = rest.trim();
        if rest.is_empty() || rest.starts_with('#') {
            Ok(())
        } else {
            Err(format!("unexpected text after statement: {rest}"))
        }
    }

    fn prefix(&mut self) -> Result<(String, String), String> {
        self.rest = &self.rest["@prefix".len()..];
        self.skip_ws();
        let colon = self
            .rest
            .find(':')
            .ok_or_else(|| "prefix name must end with ':'".to_string())?;
        let name = self.rest[..colon].to_string();
        self.rest = &self.rest[colon + 1..];
        self.skip_ws();
        let iri = self.iri()?;
        self.expect_end()?;
        Ok((name, iri))
    }

    fn statement(&mut self) -> Result<Triple, String> {
        let subject = match self.term()? {
            Term::Literal(_) => return Err("a literal cannot be a subject".to_string()),
            term => term,
        };
        let predicate = match self.term()? {
            Term::Iri(iri) => iri,
            _ => return Err("predicate must be an IRI".to_string()),
        };
        let object = self.term()?;
        self.expect_end()?;
        Ok(Triple {
            subject,
            predicate,
            object,
        })
    }

    fn term(&mut self) -> Result<Term, String> {
        self.skip_ws();
        match self.rest.chars().next() {
            None => Err("unexpected end of line".to_string()),
            Some('<') => self.iri().map(Term::Iri),
            Some('"') => self.literal().map(Term::Literal),
            Some('_') if self.rest.starts_with("_:") => Ok(Term::Blank(self.blank())),
            Some(_) => self.prefixed_name().map(Term::Iri),
        }
    }

    fn iri(&mut self) -> Result<String, String> {
        let body = self
            .rest
            .strip_prefix('<')
            .ok_or_else(|| "expected '<'".to_string())?;
        let end = body.find('>').ok_or_else(|| "unterminated IRI".to_string())?;
        let iri = body[..end].to_string();
        self.rest = &body[end + 1..];
        Ok(iri)
    }

    fn blank(&mut self) -> String {
        let end = self.rest[2..]
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
            .map_or(self.rest.len(), |i| i + 2);
        let label = self.rest[..end].to_string();
        self.rest = &self.rest[end..];
        label
    }

    fn prefixed_name(&mut self) -> Result<String, String> {
        let mut end = self.rest.find(char::is_whitespace).unwrap_or(self.rest.len());
        // `p:name.` at the end of a line: the dot terminates the statement
        if end == self.rest.len() && self.rest.ends_with('.') {
            end -= 1;
        }
        let token = &self.rest[..end];
        let (prefix, local) = token
            .split_once(':')
            .ok_or_else(|| format!("unknown term: {token}"))?;
        let namespace = self
            .prefixes
            .get(prefix)
            .ok_or_else(|| format!("undeclared prefix: {prefix}"))?;
        self.rest = &self.rest[end..];
        Ok(format!("{namespace}{local}"))
    }

    fn literal(&mut self) -> Result<String, String> {
        let mut value = String::new();
        let mut chars = self.rest.char_indices().skip(1);
        let end = loop {
            let Some((i, c)) = chars.next() else {
                return Err("unterminated literal".to_string());
            };
            match c {
                '"' => break i + 1,
                '\\' => match chars.next().map(|(_, e)| e) {
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    other => return Err(format!("invalid escape: \\{}", other.unwrap_or(' '))),
                },
                c => value.push(c),
            }
        };
        self.rest = &self.rest[end..];

        // Language tags and datatypes carry no meaning for manifests
        if let Some(tagged) = self.rest.strip_prefix('@') {
            let len = tagged
                .find(|c: char| !(c.is_alphanumeric() || c == '-'))
                .unwrap_or(tagged.len());
            self.rest = &tagged[len..];
        } else if let Some(typed) = self.rest.strip_prefix("^^") {
            self.rest = typed;
            if self.rest.starts_with('<') {
                self.iri()?;
            } else {
                self.prefixed_name()?;
            }
        }
        Ok(value)
    }
}
