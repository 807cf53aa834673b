//! Minimal RDF dataset model and N-Quads serialization.

use std::fmt;

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
pub const RDF_JSON: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#JSON";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    pub value: String,
    pub datatype: String,
    pub language: Option<String>,
}

impl Literal {
    pub fn string(value: impl Into<String>) -> Self {
        Self::typed(value, XSD_STRING)
    }

    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: datatype.into(),
            language: None,
        }
    }

    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: RDF_LANG_STRING.to_string(),
            language: Some(language.into()),
        }
    }
}

/// Subject, object or graph name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Iri(String),
    /// Label including the `_:` prefix.
    Blank(String),
    Literal(Literal),
}

impl Term {
    pub fn iri(value: impl Into<String>) -> Self {
        Self::Iri(value.into())
    }

    pub fn blank_label(&self) -> Option<&str> {
        match self {
            Self::Blank(label) => Some(label),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quad {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
    pub graph: Option<Term>,
}

impl Quad {
    /// Blank node labels in this quad with their position (`s`, `o`, `g`).
    pub fn blank_nodes(&self) -> impl Iterator<Item = (&str, char)> {
        [
            (Some(&self.subject), 's'),
            (Some(&self.object), 'o'),
            (self.graph.as_ref(), 'g'),
        ]
        .into_iter()
        .filter_map(|(term, position)| Some((term?.blank_label()?, position)))
    }

    /// Copy with every blank node label passed through `relabel`.
    pub fn map_blank_nodes(&self, mut relabel: impl FnMut(&str) -> String) -> Self {
        let mut map = |term: &Term| match term {
            Term::Blank(label) => Term::Blank(relabel(label)),
            other => other.clone(),
        };
        Quad {
            subject: map(&self.subject),
            predicate: self.predicate.clone(),
            object: map(&self.object),
            graph: self.graph.as_ref().map(&mut map),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write_iri(f, iri),
            Term::Blank(label) => f.write_str(label),
            Term::Literal(literal) => {
                f.write_str("\"")?;
                for c in literal.value.chars() {
                    match c {
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        _ => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")?;
                if let Some(language) = &literal.language {
                    write!(f, "@{language}")
                } else if literal.datatype != XSD_STRING {
                    f.write_str("^^")?;
                    write_iri(f, &literal.datatype)
                } else {
                    Ok(())
                }
            }
        }
    }
}

fn write_iri(f: &mut fmt::Formatter<'_>, iri: &str) -> fmt::Result {
    f.write_str("<")?;
    for c in iri.chars() {
        match c {
            '\x00'..='\x20' | '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                write!(f, "\\u{:04X}", u32::from(c))?
            }
            _ => write!(f, "{c}")?,
        }
    }
    f.write_str(">")
}

/// One N-Quads line including the trailing `" .\n"`.
impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.subject)?;
        write_iri(f, &self.predicate)?;
        write!(f, " {}", self.object)?;
        if let Some(graph) = &self.graph {
            write!(f, " {graph}")?;
        }
        f.write_str(" .\n")
    }
}

/// An RDF dataset. Duplicate quads are kept out on insert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    quads: Vec<Quad>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, quad: Quad) {
        if !self.quads.contains(&quad) {
            self.quads.push(quad);
        }
    }

    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Serialize as N-Quads with lines in code point order.
    pub fn to_nquads(&self) -> String {
        let mut lines: Vec<String> = self.quads.iter().map(ToString::to_string).collect();
        lines.sort();
        lines.concat()
    }
}
