//! JSON-LD to RDF dataset conversion.

use std::collections::HashMap;

use serde_json::{Map, Number, Value};

use crate::context::{ActiveContext, ContextRegistry, TermDefinition};
use crate::error::CanonicalizationError;
use crate::rdf::{
    Dataset, Literal, Quad, Term, RDF_FIRST, RDF_JSON, RDF_NIL, RDF_REST, RDF_TYPE, XSD_BOOLEAN,
    XSD_DOUBLE, XSD_INTEGER,
};

/// Convert a JSON-LD document into an RDF dataset.
///
/// Terms no context defines are expanded under `fallback_vocab`.
pub fn to_rdf(
    document: &Value,
    registry: &ContextRegistry,
    fallback_vocab: &str,
) -> Result<Dataset, CanonicalizationError> {
    let mut converter = Converter {
        registry,
        fallback_vocab,
        dataset: Dataset::new(),
        blank_counter: 0,
        blank_labels: HashMap::new(),
    };
    let root = ActiveContext::default();

    match document {
        Value::Object(obj) => {
            converter.node(obj, &root, None)?;
        }
        Value::Array(items) => {
            for item in items {
                let Value::Object(obj) = item else {
                    return Err(CanonicalizationError::Malformed(
                        "top-level array entries must be objects".into(),
                    ));
                };
                converter.node(obj, &root, None)?;
            }
        }
        _ => {
            return Err(CanonicalizationError::Malformed(
                "document must be a JSON object or array".into(),
            ))
        }
    }
    Ok(converter.dataset)
}

struct Converter<'a> {
    registry: &'a ContextRegistry,
    fallback_vocab: &'a str,
    dataset: Dataset,
    blank_counter: usize,
    blank_labels: HashMap<String, String>,
}

impl Converter<'_> {
    fn fresh_label(&mut self) -> String {
        let label = format!("_:b{}", self.blank_counter);
        self.blank_counter += 1;
        label
    }

    fn fresh_blank(&mut self) -> Term {
        Term::Blank(self.fresh_label())
    }

    /// Input blank node labels are relabeled so they never collide with
    /// generated ones.
    fn input_blank(&mut self, label: &str) -> Term {
        if let Some(existing) = self.blank_labels.get(label) {
            return Term::Blank(existing.clone());
        }
        let fresh = self.fresh_label();
        self.blank_labels.insert(label.to_string(), fresh.clone());
        Term::Blank(fresh)
    }

    fn node_reference(&mut self, id: &str, ctx: &ActiveContext) -> Result<Term, CanonicalizationError> {
        if id.starts_with("_:") {
            return Ok(self.input_blank(id));
        }
        let iri = ctx
            .expand_iri(id, false, true)?
            .ok_or_else(|| CanonicalizationError::InvalidIri(id.to_string()))?;
        Ok(Term::Iri(iri))
    }

    fn vocab_iri(&self, value: &str, ctx: &ActiveContext) -> Result<String, CanonicalizationError> {
        Ok(ctx
            .expand_iri(value, true, false)?
            .unwrap_or_else(|| format!("{}{}", self.fallback_vocab, value)))
    }

    fn vocab_term(&mut self, value: &str, ctx: &ActiveContext) -> Result<Term, CanonicalizationError> {
        if value.starts_with("_:") {
            return Ok(self.input_blank(value));
        }
        Ok(Term::Iri(self.vocab_iri(value, ctx)?))
    }

    fn emit(&mut self, subject: &Term, predicate: &str, object: Term, graph: Option<&Term>) {
        self.dataset.insert(Quad {
            subject: subject.clone(),
            predicate: predicate.to_string(),
            object,
            graph: graph.cloned(),
        });
    }

    /// Emit the statements of a node object and return its subject.
    fn node(
        &mut self,
        obj: &Map<String, Value>,
        parent: &ActiveContext,
        graph: Option<&Term>,
    ) -> Result<Term, CanonicalizationError> {
        let ctx = match obj.get("@context") {
            Some(local) => parent.process(local, self.registry)?,
            None => parent.clone(),
        };

        let mut id_value = None;
        let mut type_values: Vec<&Value> = Vec::new();
        let mut graph_value = None;
        let mut properties = Vec::new();

        for (key, value) in obj {
            if key == "@context" {
                continue;
            }
            match ctx.keyword_alias(key) {
                Some("@id") => id_value = Some(value),
                Some("@type") => type_values.push(value),
                Some("@graph") => graph_value = Some(value),
                Some("@value") | Some("@list") | Some("@set") | Some("@language") => {
                    return Err(CanonicalizationError::Malformed(format!(
                        "{key} is not allowed in a node object"
                    )))
                }
                Some("@index") => {}
                Some(other) => {
                    return Err(CanonicalizationError::UnsupportedKeyword(other.to_string()))
                }
                None => properties.push((key, value)),
            }
        }

        let subject = match id_value {
            Some(Value::String(id)) => self.node_reference(id, &ctx)?,
            Some(_) => {
                return Err(CanonicalizationError::Malformed(
                    "@id must be a string".into(),
                ))
            }
            None => self.fresh_blank(),
        };

        for value in type_values {
            let types: Vec<&Value> = match value {
                Value::Array(items) => items.iter().collect(),
                other => vec![other],
            };
            for t in types {
                let Value::String(t) = t else {
                    return Err(CanonicalizationError::Malformed(
                        "@type values must be strings".into(),
                    ));
                };
                let object = self.vocab_term(t, &ctx)?;
                self.emit(&subject, RDF_TYPE, object, graph);
            }
        }

        for (key, value) in &properties {
            let predicate = self.vocab_iri(key, &ctx)?;
            if predicate.starts_with("_:") {
                return Err(CanonicalizationError::InvalidTerm {
                    term: key.to_string(),
                    reason: "blank node used as a property".into(),
                });
            }
            let def = ctx.terms.get(key.as_str()).cloned();
            for object in self.values(value, def.as_ref(), &ctx, graph)? {
                self.emit(&subject, &predicate, object, graph);
            }
        }

        if let Some(value) = graph_value {
            let named = id_value.is_some() || !properties.is_empty();
            let inner = if named { Some(subject.clone()) } else { graph.cloned() };
            self.graph_entries(value, &ctx, inner.as_ref())?;
        }

        Ok(subject)
    }

    fn graph_entries(
        &mut self,
        value: &Value,
        ctx: &ActiveContext,
        graph: Option<&Term>,
    ) -> Result<(), CanonicalizationError> {
        let entries: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for entry in entries {
            let Value::Object(obj) = entry else {
                return Err(CanonicalizationError::Malformed(
                    "@graph entries must be node objects".into(),
                ));
            };
            self.node(obj, ctx, graph)?;
        }
        Ok(())
    }

    /// Objects for one property value, honoring the term's container.
    fn values(
        &mut self,
        value: &Value,
        def: Option<&TermDefinition>,
        ctx: &ActiveContext,
        graph: Option<&Term>,
    ) -> Result<Vec<Term>, CanonicalizationError> {
        let container = def.and_then(|d| d.container.as_deref());
        match (value, container) {
            (Value::Null, _) => Ok(Vec::new()),
            (Value::Array(items), Some("@list")) => Ok(vec![self.list(items, def, ctx, graph)?]),
            (Value::Array(items), _) => {
                let mut out = Vec::new();
                for item in items {
                    out.extend(self.values(item, def, ctx, graph)?);
                }
                Ok(out)
            }
            (Value::Object(obj), Some("@graph")) if !is_value_object(obj, ctx) => {
                let name = self.fresh_blank();
                self.node(obj, ctx, Some(&name))?;
                Ok(vec![name])
            }
            (Value::Object(obj), Some("@language")) => {
                let mut out = Vec::new();
                for (language, strings) in obj {
                    let strings: Vec<&Value> = match strings {
                        Value::Array(items) => items.iter().collect(),
                        other => vec![other],
                    };
                    for s in strings {
                        match s {
                            Value::Null => {}
                            Value::String(s) => out.push(Term::Literal(Literal::lang(
                                s.clone(),
                                language.to_lowercase(),
                            ))),
                            _ => {
                                return Err(CanonicalizationError::Malformed(
                                    "language map values must be strings".into(),
                                ))
                            }
                        }
                    }
                }
                Ok(out)
            }
            (Value::Object(obj), Some("@index")) => {
                let inner = def.map(without_container);
                let mut out = Vec::new();
                for item in obj.values() {
                    out.extend(self.values(item, inner.as_ref(), ctx, graph)?);
                }
                Ok(out)
            }
            _ => self.value(value, def, ctx, graph),
        }
    }

    fn value(
        &mut self,
        value: &Value,
        def: Option<&TermDefinition>,
        ctx: &ActiveContext,
        graph: Option<&Term>,
    ) -> Result<Vec<Term>, CanonicalizationError> {
        let type_mapping = def.and_then(|d| d.type_mapping.as_deref());
        if type_mapping == Some("@json") {
            return Ok(vec![Term::Literal(Literal::typed(
                canonical_json(value),
                RDF_JSON,
            ))]);
        }

        let term = match value {
            Value::Null => return Ok(Vec::new()),
            Value::String(s) => match type_mapping {
                Some("@id") => self.node_reference(s, ctx)?,
                Some("@vocab") => self.vocab_term(s, ctx)?,
                Some(datatype) if !datatype.starts_with('@') => {
                    Term::Literal(Literal::typed(s.clone(), datatype))
                }
                _ => {
                    let language = match def.and_then(|d| d.language.clone()) {
                        Some(explicit) => explicit,
                        None => ctx.language.clone(),
                    };
                    match language {
                        Some(language) => Term::Literal(Literal::lang(s.clone(), language)),
                        None => Term::Literal(Literal::string(s.clone())),
                    }
                }
            },
            Value::Bool(b) => Term::Literal(Literal::typed(b.to_string(), XSD_BOOLEAN)),
            Value::Number(n) => Term::Literal(number_literal(n)),
            Value::Array(_) => return self.values(value, def, ctx, graph),
            Value::Object(obj) => {
                if let Some(key) = find_keyword(obj, ctx, "@value") {
                    return Ok(self.value_object(obj, key, ctx)?.into_iter().collect());
                }
                if let Some(key) = find_keyword(obj, ctx, "@list") {
                    let items: Vec<Value> = match &obj[key] {
                        Value::Array(items) => items.clone(),
                        other => vec![other.clone()],
                    };
                    return Ok(vec![self.list(&items, def, ctx, graph)?]);
                }
                if let Some(key) = find_keyword(obj, ctx, "@set") {
                    let inner = def.map(without_container);
                    return self.values(&obj[key], inner.as_ref(), ctx, graph);
                }
                self.node(obj, ctx, graph)?
            }
        };
        Ok(vec![term])
    }

    fn value_object(
        &mut self,
        obj: &Map<String, Value>,
        value_key: &str,
        ctx: &ActiveContext,
    ) -> Result<Option<Term>, CanonicalizationError> {
        let datatype = match find_keyword(obj, ctx, "@type").map(|k| &obj[k]) {
            Some(Value::String(t)) => Some(self.vocab_iri(t, ctx)?),
            Some(_) => {
                return Err(CanonicalizationError::Malformed(
                    "@type in a value object must be a string".into(),
                ))
            }
            None => None,
        };
        let language = match find_keyword(obj, ctx, "@language").map(|k| &obj[k]) {
            Some(Value::String(l)) => Some(l.to_lowercase()),
            Some(_) => {
                return Err(CanonicalizationError::Malformed(
                    "@language must be a string".into(),
                ))
            }
            None => None,
        };

        let literal = match (&obj[value_key], datatype, language) {
            (Value::Null, _, _) => return Ok(None),
            (Value::String(s), Some(dt), _) => Literal::typed(s.clone(), dt),
            (Value::String(s), None, Some(language)) => Literal::lang(s.clone(), language),
            (Value::String(s), None, None) => Literal::string(s.clone()),
            (Value::Bool(b), dt, _) => Literal::typed(b.to_string(), dt.unwrap_or_else(|| XSD_BOOLEAN.into())),
            (Value::Number(n), dt, _) => {
                let native = number_literal(n);
                match dt {
                    Some(dt) => Literal::typed(native.value, dt),
                    None => native,
                }
            }
            _ => {
                return Err(CanonicalizationError::Malformed(
                    "@value must be a scalar".into(),
                ))
            }
        };
        Ok(Some(Term::Literal(literal)))
    }

    fn list(
        &mut self,
        items: &[Value],
        def: Option<&TermDefinition>,
        ctx: &ActiveContext,
        graph: Option<&Term>,
    ) -> Result<Term, CanonicalizationError> {
        let inner = def.map(without_container);
        let mut objects = Vec::new();
        for item in items {
            objects.extend(self.values(item, inner.as_ref(), ctx, graph)?);
        }
        if objects.is_empty() {
            return Ok(Term::iri(RDF_NIL));
        }

        let heads: Vec<Term> = objects.iter().map(|_| self.fresh_blank()).collect();
        for (i, object) in objects.into_iter().enumerate() {
            let rest = heads
                .get(i + 1)
                .cloned()
                .unwrap_or_else(|| Term::iri(RDF_NIL));
            self.emit(&heads[i], RDF_FIRST, object, graph);
            self.emit(&heads[i], RDF_REST, rest, graph);
        }
        Ok(heads[0].clone())
    }
}

fn without_container(def: &TermDefinition) -> TermDefinition {
    TermDefinition {
        container: None,
        ..def.clone()
    }
}

fn find_keyword<'m>(obj: &'m Map<String, Value>, ctx: &ActiveContext, keyword: &str) -> Option<&'m str> {
    obj.keys()
        .find(|k| ctx.keyword_alias(k) == Some(keyword))
        .map(String::as_str)
}

fn is_value_object(obj: &Map<String, Value>, ctx: &ActiveContext) -> bool {
    ["@value", "@list", "@set"]
        .iter()
        .any(|kw| find_keyword(obj, ctx, kw).is_some())
}

/// RDF literal for a native JSON number.
///
/// Integral values below 10^21 are `xsd:integer`; everything else is an
/// `xsd:double` in canonical `1.5E1` form.
fn number_literal(n: &Number) -> Literal {
    if let Some(i) = n.as_i64() {
        return Literal::typed(i.to_string(), XSD_INTEGER);
    }
    if let Some(u) = n.as_u64() {
        return Literal::typed(u.to_string(), XSD_INTEGER);
    }
    let f = n.as_f64().unwrap_or_default();
    if f.fract() == 0.0 && f.abs() < 1e21 {
        return Literal::typed(format!("{}", f as i128), XSD_INTEGER);
    }
    let formatted = format!("{f:E}");
    let lexical = match formatted.split_once('E') {
        Some((mantissa, exponent)) if !mantissa.contains('.') => format!("{mantissa}.0E{exponent}"),
        _ => formatted,
    };
    Literal::typed(lexical, XSD_DOUBLE)
}

/// JSON text with object keys sorted and no insignificant whitespace.
fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(obj) => {
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            let members: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}:{}", Value::String(k.clone()), canonical_json(&obj[k])))
                .collect();
            format!("{{{}}}", members.join(","))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CREDENTIALS_V1;
    use serde_json::json;

    const FALLBACK: &str = "https://www.w3.org/ns/credentials/issuer-dependent#";

    fn convert(document: Value) -> Dataset {
        to_rdf(&document, &ContextRegistry::with_defaults(), FALLBACK).unwrap()
    }

    #[test]
    fn test_credential_statements() {
        let dataset = convert(json!({
            "@context": [CREDENTIALS_V1],
            "id": "urn:uuid:1",
            "type": ["VerifiableCredential"],
            "issuer": "did:example:issuer",
            "issuanceDate": "2024-01-01T00:00:00Z",
            "credentialSubject": { "id": "did:example:subject", "degree": "BSc" }
        }));
        let nquads = dataset.to_nquads();
        assert!(nquads.contains(
            "<urn:uuid:1> <https://www.w3.org/2018/credentials#issuer> <did:example:issuer> ."
        ));
        assert!(nquads.contains(
            "<urn:uuid:1> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://www.w3.org/2018/credentials#VerifiableCredential> ."
        ));
        assert!(nquads.contains("\"2024-01-01T00:00:00Z\"^^<http://www.w3.org/2001/XMLSchema#dateTime>"));
        // Undefined term falls back to the issuer-dependent vocabulary.
        assert!(nquads.contains(
            "<did:example:subject> <https://www.w3.org/ns/credentials/issuer-dependent#degree> \"BSc\" ."
        ));
    }

    #[test]
    fn test_numbers_and_booleans() {
        let dataset = convert(json!({
            "@id": "http://example.org/s",
            "count": 5,
            "ratio": 1.5,
            "big": 10.0,
            "flag": true
        }));
        let nquads = dataset.to_nquads();
        assert!(nquads.contains("\"5\"^^<http://www.w3.org/2001/XMLSchema#integer>"));
        assert!(nquads.contains("\"1.5E0\"^^<http://www.w3.org/2001/XMLSchema#double>"));
        assert!(nquads.contains("\"10\"^^<http://www.w3.org/2001/XMLSchema#integer>"));
        assert!(nquads.contains("\"true\"^^<http://www.w3.org/2001/XMLSchema#boolean>"));
    }

    #[test]
    fn test_double_lexical_form() {
        assert_eq!(number_literal(&Number::from_f64(1.0e25).unwrap()).value, "1.0E25");
        assert_eq!(number_literal(&Number::from_f64(-0.011).unwrap()).value, "-1.1E-2");
    }

    #[test]
    fn test_list_container() {
        let dataset = convert(json!({
            "@context": { "ex": "http://example.org/", "items": { "@id": "ex:items", "@container": "@list" } },
            "@id": "ex:s",
            "items": ["a", "b"]
        }));
        let firsts = dataset
            .quads()
            .iter()
            .filter(|q| q.predicate == RDF_FIRST)
            .count();
        assert_eq!(firsts, 2);
        assert!(dataset
            .quads()
            .iter()
            .any(|q| q.predicate == RDF_REST && q.object == Term::iri(RDF_NIL)));
    }

    #[test]
    fn test_empty_list_is_nil() {
        let dataset = convert(json!({
            "@id": "http://example.org/s",
            "http://example.org/items": { "@list": [] }
        }));
        assert_eq!(dataset.quads()[0].object, Term::iri(RDF_NIL));
    }

    #[test]
    fn test_value_objects() {
        let dataset = convert(json!({
            "@id": "http://example.org/s",
            "http://example.org/name": { "@value": "Bonjour", "@language": "FR" },
            "http://example.org/age": { "@value": "42", "@type": "http://www.w3.org/2001/XMLSchema#integer" }
        }));
        let nquads = dataset.to_nquads();
        assert!(nquads.contains("\"Bonjour\"@fr"));
        assert!(nquads.contains("\"42\"^^<http://www.w3.org/2001/XMLSchema#integer>"));
    }

    #[test]
    fn test_graph_container_names_graph() {
        let dataset = convert(json!({
            "@context": [CREDENTIALS_V1],
            "id": "urn:uuid:vp",
            "type": "VerifiablePresentation",
            "verifiableCredential": { "id": "urn:uuid:vc", "issuer": "did:example:i" }
        }));
        let inner = dataset
            .quads()
            .iter()
            .find(|q| q.subject == Term::iri("urn:uuid:vc"))
            .unwrap();
        assert!(matches!(inner.graph, Some(Term::Blank(_))));
    }

    #[test]
    fn test_json_literal() {
        let dataset = convert(json!({
            "@context": { "jwk": { "@id": "http://example.org/jwk", "@type": "@json" } },
            "@id": "http://example.org/s",
            "jwk": { "y": 1, "x": "a" }
        }));
        let Term::Literal(literal) = &dataset.quads()[0].object else {
            panic!("expected literal");
        };
        assert_eq!(literal.value, r#"{"x":"a","y":1}"#);
        assert_eq!(literal.datatype, RDF_JSON);
    }

    #[test]
    fn test_input_blank_labels_relabelled() {
        let dataset = convert(json!({
            "@id": "_:b0",
            "http://example.org/knows": { "@id": "_:other" }
        }));
        let quad = &dataset.quads()[0];
        assert_ne!(quad.subject, quad.object);
    }

    #[test]
    fn test_rejects_scalar_document() {
        assert!(to_rdf(&json!("text"), &ContextRegistry::new(), FALLBACK).is_err());
    }

    #[test]
    fn test_unsupported_keyword() {
        let err = to_rdf(
            &json!({ "@reverse": { "http://example.org/p": { "@id": "http://example.org/o" } } }),
            &ContextRegistry::new(),
            FALLBACK,
        )
        .unwrap_err();
        assert!(matches!(err, CanonicalizationError::UnsupportedKeyword(_)));
    }
}
